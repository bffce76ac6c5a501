use approx::assert_abs_diff_eq;
use bvh_viewer::clock::ManualClock;
use bvh_viewer::types::Position;
use bvh_viewer::{
    load_bvh_from_file, load_bvh_from_string, PlaybackStep, ViewerConfig, ViewerContext,
};
use pretty_assertions::assert_eq;
use std::io::Write;

const TURN: &str = "HIERARCHY
ROOT Root
{
    OFFSET 0 0 0
    CHANNELS 1 Yrotation
    JOINT Child
    {
        OFFSET 0 0 2
        CHANNELS 3 Zrotation Xrotation Yrotation
        End Site
        {
            OFFSET 0 1 0
        }
    }
}
MOTION
Frames: 2
Frame Time: 0.04
0 0 0 0
90 0 0 0
";

#[test]
fn root_rotation_carries_children() {
    let mut animation = load_bvh_from_string(TURN).unwrap();
    let child = animation.find_joint_by_name("Child").unwrap().index;

    assert_abs_diff_eq!(
        animation.world_positions()[child],
        Position::new(0.0, 0.0, 2.0),
        epsilon = 1e-12
    );
    animation.set_frame(1);
    assert_abs_diff_eq!(
        animation.world_positions()[child],
        Position::new(2.0, 0.0, 0.0),
        epsilon = 1e-12
    );
}

#[test]
fn viewer_plays_loaded_file() {
    let mut file = tempfile::Builder::new().suffix(".bvh").tempfile().unwrap();
    file.write_all(TURN.as_bytes()).unwrap();

    let clock = ManualClock::new();
    let mut ctx = ViewerContext::with_clock(ViewerConfig::default(), clock.clone());
    let handle = ctx.handle();

    assert!(handle.request_load(file.path()).unwrap());
    handle.toggle_playback();
    assert_eq!(ctx.tick(), PlaybackStep::Held);

    clock.advance(0.05);
    assert_eq!(ctx.tick(), PlaybackStep::Advanced(1));
    let positions = ctx.animation().unwrap().world_positions();
    assert_abs_diff_eq!(positions[1], Position::new(2.0, 0.0, 0.0), epsilon = 1e-12);
}

#[test]
fn broken_drop_keeps_current_clip() {
    let mut broken = tempfile::Builder::new().suffix(".bvh").tempfile().unwrap();
    broken
        .write_all(b"HIERARCHY\nROOT A\n{\nOFFSET 0 0 0\n}\nMOTION\nFrames: 2\nFrame Time: 0.1\n")
        .unwrap();

    let clock = ManualClock::new();
    let mut ctx = ViewerContext::with_clock(ViewerConfig::default(), clock.clone());
    let handle = ctx.handle();
    handle.request_load_str(TURN).unwrap();
    handle.toggle_playback();
    ctx.tick();
    clock.advance(0.05);
    assert_eq!(ctx.tick(), PlaybackStep::Advanced(1));
    handle.toggle_playback();
    ctx.tick();

    let frame = ctx.animation().unwrap().frame();
    let pose = ctx.animation().unwrap().world_positions();
    let paused = ctx.config.paused;
    assert!(paused);

    assert!(handle.request_load(broken.path()).is_err());
    assert!(handle.request_load("missing.bvh").is_err());
    assert!(handle.request_load_str("HIERARCHY\nROOT A\n{\n").is_err());
    ctx.tick();

    let animation = ctx.animation().unwrap();
    assert_eq!(animation.joints().len(), 3);
    assert_eq!(animation.frame(), frame);
    assert_eq!(animation.world_positions(), pose);
    assert_eq!(ctx.config.paused, paused);
}

#[test]
fn commands_from_threads_apply_in_order() {
    let mut ctx = ViewerContext::with_clock(ViewerConfig::default(), ManualClock::new());
    let handle = ctx.handle();
    handle.request_load_str(TURN).unwrap();

    let worker = handle.clone();
    std::thread::spawn(move || {
        worker.step_forward();
        worker.step_forward();
        worker.push(|ctx| ctx.config.show_grid = false);
    })
    .join()
    .unwrap();

    ctx.tick();
    assert_eq!(ctx.animation().unwrap().frame(), 1);
    assert!(!ctx.config.show_grid);
}

#[test]
fn file_and_string_loaders_agree() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(TURN.as_bytes()).unwrap();

    let from_file = load_bvh_from_file(file.path()).unwrap();
    let from_string = load_bvh_from_string(TURN).unwrap();
    assert_eq!(from_file.motion(), from_string.motion());
    assert_eq!(from_file.world_positions(), from_string.world_positions());
}
