//! Application state owned by the render loop, and the handle other threads use to
//! request changes to it.

use crate::animation::{Animation, PlaybackStep};
use crate::clock::{Clock, PlaybackTimer, SystemClock};
use crate::commands::CommandQueue;
use crate::config::{DrawMode, ViewerConfig};
use crate::error::{BvhError, MalformedFileError};
use crate::parse::{load_bvh_from_file, load_bvh_from_string};
use crate::types::{Color, Index, Matrix, Position};
use crate::utils::{origin_of, point_of};
use std::path::Path;

/// One bone for the renderer to draw this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneDraw {
    pub index: Index,
    pub name: String,
    /// `global * shape`, places the unit bone mesh.
    pub model: Matrix,
    pub head: Position,
    pub tail: Position,
    pub color: Color,
    pub mode: DrawMode,
}

#[derive(Debug)]
pub struct ViewerContext {
    pub config: ViewerConfig,
    animation: Option<Animation>,
    timer: PlaybackTimer,
    commands: CommandQueue<ViewerContext>,
}

impl ViewerContext {
    pub fn new(config: ViewerConfig) -> Self {
        ViewerContext::with_clock(config, SystemClock::default())
    }

    pub fn with_clock(config: ViewerConfig, clock: impl Clock + 'static) -> Self {
        let mut timer = PlaybackTimer::new(clock);
        if config.paused {
            timer.pause();
        }
        ViewerContext {
            config,
            animation: None,
            timer,
            commands: CommandQueue::new(),
        }
    }

    /// Cheap, cloneable, `Send` handle for input handlers.
    pub fn handle(&self) -> ViewerHandle {
        ViewerHandle {
            commands: self.commands.clone(),
        }
    }

    pub fn animation(&self) -> Option<&Animation> {
        self.animation.as_ref()
    }

    pub fn animation_mut(&mut self) -> Option<&mut Animation> {
        self.animation.as_mut()
    }

    pub fn elapsed(&self) -> f64 {
        self.timer.elapsed()
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////

    /// One iteration of the render loop: apply queued commands, then advance or blend
    /// the active clip.
    pub fn tick(&mut self) -> PlaybackStep {
        let commands = self.commands.clone();
        let applied = commands.drain(self);
        if applied > 0 {
            log::debug!("applied {} queued command(s)", applied);
        }

        if self.config.paused {
            return PlaybackStep::Paused;
        }
        let animation = match self.animation.as_mut() {
            Some(animation) => animation,
            None => return PlaybackStep::Idle,
        };
        let step = animation.update(self.timer.elapsed(), self.config.interpolate);
        if let PlaybackStep::Advanced(_) = step {
            // the remainder past the frame boundary is dropped
            self.timer.reset();
        }
        step
    }

    /// Swap in a freshly imported clip. Playback comes back paused and idle.
    pub fn set_animation(&mut self, mut animation: Animation) {
        animation.set_fix_origin(self.config.fix_origin);
        animation.set_all_colors(self.config.bone_color);
        self.animation = Some(animation);
        self.config.paused = true;
        self.timer.reset();
        self.timer.pause();
    }

    /// Space: resume or pause, and start an idle clip.
    pub fn toggle_playback(&mut self) {
        if self.config.paused {
            self.timer.resume();
        } else {
            self.timer.pause();
        }
        self.config.paused = !self.config.paused;

        if let Some(animation) = self.animation.as_mut() {
            if !animation.is_playing() {
                animation.start();
                self.timer.reset();
            }
        }
    }

    pub fn step(&mut self, forward: bool) {
        if let Some(animation) = self.animation.as_mut() {
            if !self.config.paused {
                self.config.paused = true;
                self.timer.pause();
            }
            if forward {
                animation.advance();
            } else {
                animation.step_back();
            }
            self.timer.reset();
        }
    }

    pub fn rest_pose(&mut self) {
        if let Some(animation) = self.animation.as_mut() {
            animation.rest_pose();
        }
    }

    pub fn set_fix_origin(&mut self, fix_origin: bool) {
        self.config.fix_origin = fix_origin;
        if let Some(animation) = self.animation.as_mut() {
            animation.set_fix_origin(fix_origin);
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////

    /// Bones with an enabled mesh, in joint order.
    pub fn draw_list(&self) -> Vec<BoneDraw> {
        let animation = match self.animation.as_ref() {
            Some(animation) => animation,
            None => return Vec::new(),
        };
        let graph = animation.graph();
        animation
            .joints()
            .iter()
            .filter_map(|joint| {
                if !joint.mesh_enabled() {
                    return None;
                }
                let mesh = joint.mesh.as_ref()?;
                let global = graph.global(joint.node);
                Some(BoneDraw {
                    index: joint.index,
                    name: joint.name.clone(),
                    model: graph.model_matrix(joint.node),
                    head: origin_of(&global),
                    tail: point_of(&global, joint.offset),
                    color: mesh.color,
                    mode: self.config.draw_mode,
                })
            })
            .collect()
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

/// Requests changes to a `ViewerContext` from outside the render loop. Nothing here
/// touches the context directly; every request is queued and applied on the next tick.
#[derive(Debug, Clone)]
pub struct ViewerHandle {
    commands: CommandQueue<ViewerContext>,
}

impl ViewerHandle {
    pub fn push(&self, command: impl FnOnce(&mut ViewerContext) + Send + 'static) {
        self.commands.push(command);
    }

    /// Import a dropped file. Files without a `.bvh` extension are ignored (`Ok(false)`).
    /// On error nothing is queued and the current clip stays loaded.
    pub fn request_load(&self, path: impl AsRef<Path>) -> Result<bool, BvhError> {
        let path = path.as_ref();
        let is_bvh = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("bvh"));
        if !is_bvh {
            log::warn!("ignoring dropped file {}: not a .bvh file", path.display());
            return Ok(false);
        }
        let animation = load_bvh_from_file(path).map_err(|err| {
            log::warn!("failed to load {}: {}", path.display(), err);
            err
        })?;
        self.push(move |ctx| ctx.set_animation(animation));
        Ok(true)
    }

    pub fn request_load_str(&self, text: &str) -> Result<(), MalformedFileError> {
        let animation = load_bvh_from_string(text)?;
        self.push(move |ctx| ctx.set_animation(animation));
        Ok(())
    }

    pub fn toggle_playback(&self) {
        self.push(|ctx| ctx.toggle_playback());
    }

    pub fn toggle_interpolation(&self) {
        self.push(|ctx| ctx.config.interpolate = !ctx.config.interpolate);
    }

    pub fn set_draw_mode(&self, mode: DrawMode) {
        self.push(move |ctx| ctx.config.draw_mode = mode);
    }

    pub fn toggle_grid(&self) {
        self.push(|ctx| ctx.config.show_grid = !ctx.config.show_grid);
    }

    pub fn toggle_fix_origin(&self) {
        self.push(|ctx| {
            let fix_origin = !ctx.config.fix_origin;
            ctx.set_fix_origin(fix_origin);
        });
    }

    pub fn step_forward(&self) {
        self.push(|ctx| ctx.step(true));
    }

    pub fn step_backward(&self) {
        self.push(|ctx| ctx.step(false));
    }

    pub fn rest_pose(&self) {
        self.push(|ctx| ctx.rest_pose());
    }

    /// `name` is matched against full joint names first, then file labels.
    pub fn toggle_joint_mesh(&self, name: impl Into<String>) {
        let name = name.into();
        self.push(move |ctx| {
            if let Some(animation) = ctx.animation.as_mut() {
                if let Some(index) = animation.find_joint_by_name(&name).map(|j| j.index) {
                    animation.toggle_joint_mesh(index);
                }
            }
        });
    }

    pub fn set_joint_color(&self, name: impl Into<String>, color: Color) {
        let name = name.into();
        self.push(move |ctx| {
            if let Some(animation) = ctx.animation.as_mut() {
                if let Some(index) = animation.find_joint_by_name(&name).map(|j| j.index) {
                    animation.set_joint_color(index, color);
                }
            }
        });
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////
