use crate::config::DrawMode;
use crate::context::{BoneDraw, ViewerContext, ViewerHandle};
use crate::types::{Matrix, Position};
use bevy::prelude::*;
use bevy_panorbit_camera::{PanOrbitCamera, PanOrbitCameraPlugin};

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Debug, Resource)]
pub struct ViewerState {
    pub ctx: ViewerContext,
    pub handle: ViewerHandle,
    pub debug_text: bool,
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Open a window and play whatever `ctx` holds. Further clips can be dropped onto it.
pub fn run_viewer(ctx: ViewerContext) {
    let handle = ctx.handle();

    App::new()
        .insert_resource(ViewerState {
            ctx,
            handle,
            debug_text: false,
        })
        .add_plugins(DefaultPlugins)
        .add_plugins(PanOrbitCameraPlugin)
        .add_systems(Startup, setup)
        .add_systems(
            Update,
            (
                (handle_keyboard, handle_dropped_files),
                tick_playback,
                (draw_skeleton, draw_grid, update_debug_text),
            )
                .chain(),
        )
        .run();
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[derive(Component)]
struct DebugText;

fn setup(mut commands: Commands) {
    //// Orbit camera
    commands.spawn((
        Camera3dBundle {
            transform: Transform::from_xyz(0., 1.5, 6.).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        PanOrbitCamera::default(),
    ));

    // draw instructions
    commands.spawn(
        TextBundle::from_section(
            "Drop a .bvh file onto the window to load it\n\
            Press 'Space' to play or pause\n\
            Press 'I' to toggle interpolation\n\
            Press '1' / '2' / '3' for mesh, wireframe or shadeless bones\n\
            Press 'G' to toggle the grid, 'F' to pin the root\n\
            Press 'R' for the rest pose, 'Left' or 'Right' to step frames\n\
            Press 'D' to toggle debug text\n",
            TextStyle {
                font_size: 15.,
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        }),
    );

    commands.spawn((
        TextBundle::from_section(
            "",
            TextStyle {
                font_size: 17.,
                color: Color::rgba(1.0, 1.0, 1.0, 0.5),
                ..default()
            },
        )
        .with_style(Style {
            position_type: PositionType::Absolute,
            top: Val::Px(12.0),
            left: Val::Px(12.0),
            ..default()
        }),
        DebugText,
    ));
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

/// Input never touches the context directly; it goes through the command queue like
/// any other producer.
fn handle_keyboard(keyboard: Res<ButtonInput<KeyCode>>, mut state: ResMut<ViewerState>) {
    let handle = &state.handle;

    if keyboard.just_released(KeyCode::Space) {
        handle.toggle_playback();
    }
    if keyboard.just_released(KeyCode::KeyI) {
        handle.toggle_interpolation();
    }
    if keyboard.just_released(KeyCode::Digit1) {
        handle.set_draw_mode(DrawMode::MESH);
    }
    if keyboard.just_released(KeyCode::Digit2) {
        handle.set_draw_mode(DrawMode::WIREFRAME);
    }
    if keyboard.just_released(KeyCode::Digit3) {
        handle.set_draw_mode(DrawMode::SHADELESS);
    }
    if keyboard.just_released(KeyCode::KeyG) {
        handle.toggle_grid();
    }
    if keyboard.just_released(KeyCode::KeyF) {
        handle.toggle_fix_origin();
    }
    if keyboard.just_released(KeyCode::KeyR) {
        handle.rest_pose();
    }
    if keyboard.just_released(KeyCode::ArrowRight) {
        handle.step_forward();
    }
    if keyboard.just_released(KeyCode::ArrowLeft) {
        handle.step_backward();
    }

    if keyboard.just_released(KeyCode::KeyD) {
        state.debug_text = !state.debug_text;
    }
}

fn handle_dropped_files(mut events: EventReader<FileDragAndDrop>, state: Res<ViewerState>) {
    for event in events.read() {
        if let FileDragAndDrop::DroppedFile { path_buf, .. } = event {
            match state.handle.request_load(path_buf) {
                Ok(true) => info!("loading {}", path_buf.display()),
                Ok(false) => {}
                Err(err) => error!("could not load {}: {}", path_buf.display(), err),
            }
        }
    }
}

fn tick_playback(mut state: ResMut<ViewerState>) {
    state.ctx.tick();
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn to_vec3(position: Position, scale: f32) -> Vec3 {
    Vec3::new(position.x as f32, position.y as f32, position.z as f32) * scale
}

fn to_mat4(matrix: &Matrix) -> Mat4 {
    let cols: [[f64; 4]; 4] = (*matrix).into();
    let mut flat = [0.0f32; 16];
    for (i, value) in cols.iter().flatten().enumerate() {
        flat[i] = *value as f32;
    }
    Mat4::from_cols_array(&flat)
}

fn bone_color(bone: &BoneDraw) -> Color {
    let [r, g, b] = bone.color;
    Color::rgb(r, g, b)
}

/// The unit bone spans y in [0, 1]; the gizmo cuboid is centred on the origin.
fn draw_bone(gizmos: &mut Gizmos, bone: &BoneDraw, scale: f32) {
    let color = bone_color(bone);
    if bone.mode.contains(DrawMode::WIREFRAME) {
        gizmos.line(to_vec3(bone.head, scale), to_vec3(bone.tail, scale), color);
        return;
    }
    let model = Mat4::from_scale(Vec3::splat(scale))
        * to_mat4(&bone.model)
        * Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0));
    gizmos.cuboid(Transform::from_matrix(model), color);
    if bone.mode.contains(DrawMode::SHADELESS) {
        gizmos.line(to_vec3(bone.head, scale), to_vec3(bone.tail, scale), color);
    }
}

fn draw_skeleton(mut gizmos: Gizmos, state: Res<ViewerState>) {
    let Some(animation) = state.ctx.animation() else {
        return;
    };
    let scale = state.ctx.config.scale as f32;

    //// Bones
    for bone in state.ctx.draw_list() {
        draw_bone(&mut gizmos, &bone, scale);
    }

    //// Joints
    let positions = animation.world_positions();
    let radius = (animation.thickness() as f32 * 0.5 * scale).max(0.005);
    for position in &positions {
        gizmos.sphere(to_vec3(*position, scale), Quat::IDENTITY, radius, Color::WHITE);
    }

    if state.ctx.config.draw_mode.contains(DrawMode::WIREFRAME) {
        for chain in animation.kinematic_chains() {
            gizmos.linestrip(
                chain.iter().map(|&index| to_vec3(positions[index], scale)),
                Color::YELLOW,
            );
        }
    }
}

fn draw_grid(mut gizmos: Gizmos, state: Res<ViewerState>) {
    if !state.ctx.config.show_grid {
        return;
    }
    let half = 10;
    let color = Color::rgba(1.0, 1.0, 1.0, 0.2);
    for i in -half..=half {
        let t = i as f32;
        let h = half as f32;
        gizmos.line(Vec3::new(t, 0.0, -h), Vec3::new(t, 0.0, h), color);
        gizmos.line(Vec3::new(-h, 0.0, t), Vec3::new(h, 0.0, t), color);
    }
    gizmos.line(Vec3::ZERO, Vec3::X, Color::RED);
    gizmos.line(Vec3::ZERO, Vec3::Y, Color::GREEN);
    gizmos.line(Vec3::ZERO, Vec3::Z, Color::BLUE);
}

///////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

fn update_debug_text(mut query: Query<&mut Text, With<DebugText>>, state: Res<ViewerState>) {
    let mut t = String::new();
    if state.debug_text {
        let ctx = &state.ctx;
        match ctx.animation() {
            Some(animation) => {
                t += &format!(
                    "Frame: {} / {}  ({:.1} fps)\n",
                    animation.frame(),
                    animation.frame_count(),
                    animation.fps()
                );
                t += &format!(
                    "paused: {}  interpolate: {}  fix origin: {}  mode: {:?}\n",
                    ctx.config.paused,
                    ctx.config.interpolate,
                    ctx.config.fix_origin,
                    ctx.config.draw_mode
                );
                t += "=============== WORLD POSITIONS ===============\n";
                for (joint, pos) in animation.joints().iter().zip(animation.world_positions()) {
                    t += &format!("{:.<30} {: ^40}\n", joint.name, format!("{:6.2?}", pos));
                }
            }
            None => t += "No clip loaded\n",
        }
    }
    for mut text in &mut query {
        text.sections[0].value = t.clone();
    }
}
