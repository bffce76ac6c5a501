use crate::joint::{evaluate_channels, Joint};
use crate::node::SceneGraph;
use crate::types::{Color, Index, Matrix, Position};
use crate::utils::__interpolate_channels;
use cgmath::SquareMatrix;

/// Outcome of one playback tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackStep {
    /// Not started (`frame == -1`) or nothing loaded.
    Idle,
    /// Playback is paused by the viewer; the clip was not touched.
    Paused,
    /// Moved on to this frame.
    Advanced(usize),
    /// Posed between the current frame and the next one.
    Interpolated(f64),
    /// Still within the current frame, pose unchanged.
    Held,
}

/// A loaded motion clip driving one skeleton.
#[derive(Debug, Clone)]
pub struct Animation {
    joints: Vec<Joint>,
    roots: Vec<Index>,
    graph: SceneGraph,
    motion: Vec<Vec<f64>>,
    frame_time: f64,
    /// `-1` until playback starts, then a wrapped index into `motion`.
    frame: isize,
    fix_origin: bool,
    thickness: f64,
}

impl Animation {
    pub(crate) fn new(
        joints: Vec<Joint>,
        roots: Vec<Index>,
        graph: SceneGraph,
        motion: Vec<Vec<f64>>,
        frame_time: f64,
        thickness: f64,
    ) -> Self {
        let mut animation = Animation {
            joints,
            roots,
            graph,
            motion,
            frame_time,
            frame: -1,
            fix_origin: false,
            thickness,
        };
        animation.propagate();
        animation
    }

    pub fn joints(&self) -> &[Joint] {
        &self.joints
    }

    pub fn joint(&self, index: Index) -> Option<&Joint> {
        self.joints.get(index)
    }

    /// Matches either the full `"<parent>-<joint>"` name or the label from the file.
    pub fn find_joint_by_name(&self, name: &str) -> Option<&Joint> {
        self.joints
            .iter()
            .find(|j| j.name == name)
            .or_else(|| self.joints.iter().find(|j| j.label == name))
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn graph(&self) -> &SceneGraph {
        &self.graph
    }

    pub fn motion(&self) -> &[Vec<f64>] {
        &self.motion
    }

    pub fn frame_count(&self) -> usize {
        self.motion.len()
    }

    /// Seconds per frame.
    pub fn frame_time(&self) -> f64 {
        self.frame_time
    }

    pub fn fps(&self) -> f64 {
        1.0 / self.frame_time
    }

    pub fn duration(&self) -> f64 {
        self.frame_time * self.frame_count() as f64
    }

    pub fn frame(&self) -> isize {
        self.frame
    }

    pub fn is_playing(&self) -> bool {
        self.frame >= 0
    }

    /// Cross-section of the bone meshes, a third of the average bone length.
    pub fn thickness(&self) -> f64 {
        self.thickness
    }

    pub fn fix_origin(&self) -> bool {
        self.fix_origin
    }

    /// Toggle suppression of positional channels, re-posing the current frame.
    pub fn set_fix_origin(&mut self, fix_origin: bool) {
        self.fix_origin = fix_origin;
        if self.frame >= 0 {
            self.set_frame(self.frame);
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////

    /// Idle -> playing. Does nothing once started.
    pub fn start(&mut self) {
        if self.frame < 0 && self.frame_count() > 0 {
            self.set_frame(0);
        }
    }

    pub fn set_frame(&mut self, frame: isize) {
        self.set_frame_interpolated(frame, 0.0);
    }

    /// Pose the skeleton `factor` of the way from `frame` to the frame after it. `frame`
    /// wraps around the clip and becomes the current frame.
    pub fn set_frame_interpolated(&mut self, frame: isize, factor: f64) {
        let frame_count = self.frame_count();
        if frame_count == 0 {
            return;
        }
        let current = frame.rem_euclid(frame_count as isize) as usize;
        let next = (current + 1) % frame_count;
        self.frame = current as isize;

        for joint in self.joints.iter_mut().filter(|j| j.has_motion()) {
            let range = joint.motion_range.clone();
            let a = &self.motion[current][range.clone()];
            joint.channel_transform = if factor == 0.0 {
                evaluate_channels(&joint.channels, a, self.fix_origin)
            } else {
                let b = &self.motion[next][range];
                let values = __interpolate_channels(&joint.channels, a, b, factor);
                evaluate_channels(&joint.channels, &values, self.fix_origin)
            };
        }

        self.__apply_joint_transforms();
    }

    /// Jump to `frame`, wrapped. An idle clip is started first.
    pub fn seek(&mut self, frame: isize) {
        if self.frame < 0 {
            self.start();
        }
        if self.frame >= 0 {
            self.set_frame(frame);
        }
    }

    pub fn advance(&mut self) {
        if self.frame < 0 {
            self.start();
        } else {
            self.set_frame(self.frame + 1);
        }
    }

    /// An idle clip starts at frame 0 rather than wrapping to the last frame.
    pub fn step_back(&mut self) {
        if self.frame < 0 {
            self.start();
        } else {
            self.set_frame(self.frame - 1);
        }
    }

    /// Back to the idle, unanimated pose.
    pub fn rest_pose(&mut self) {
        self.frame = -1;
        for joint in self.joints.iter_mut() {
            joint.channel_transform = Matrix::identity();
        }
        self.__apply_joint_transforms();
    }

    /// One playback tick. `elapsed` is the time since the last frame change; once it
    /// reaches the frame time the clip moves to the next frame, otherwise it optionally
    /// blends towards it with a factor in `[0, 1)`.
    pub fn update(&mut self, elapsed: f64, interpolate: bool) -> PlaybackStep {
        if self.frame < 0 || self.frame_count() == 0 {
            return PlaybackStep::Idle;
        }
        if elapsed >= self.frame_time {
            self.set_frame(self.frame + 1);
            log::debug!("frame {}", self.frame);
            PlaybackStep::Advanced(self.frame as usize)
        } else if interpolate {
            let factor = elapsed / self.frame_time;
            self.set_frame_interpolated(self.frame, factor);
            PlaybackStep::Interpolated(factor)
        } else {
            PlaybackStep::Held
        }
    }

    /// Bone nodes take their parent's channel transform; roots stay at identity.
    fn __apply_joint_transforms(&mut self) {
        for joint in &self.joints {
            let transform = match joint.parent {
                Some(parent) => self.joints[parent].channel_transform,
                None => Matrix::identity(),
            };
            self.graph.set_joint(joint.node, transform);
        }
        self.propagate();
    }

    /// Root-to-leaf recomputation of every global transform.
    pub fn propagate(&mut self) {
        for &root in &self.roots {
            self.graph.compute_global(self.joints[root].node);
        }
    }

    ///////////////////////////////////////////////////////////////////////////////////////////////

    pub fn world_positions(&self) -> Vec<Position> {
        self.joints
            .iter()
            .map(|joint| joint.world_position(&self.graph))
            .collect()
    }

    /// Joint paths for line-strip drawing: each chain runs until a leaf, and every
    /// branch after the first child starts a new chain at the branching joint.
    pub fn kinematic_chains(&self) -> Vec<Vec<Index>> {
        let mut chains: Vec<Vec<Index>> = Vec::new();
        let mut pending: Vec<Vec<Index>> =
            self.roots.iter().rev().map(|&root| vec![root]).collect();

        while let Some(mut chain) = pending.pop() {
            while let Some(&last) = chain.last() {
                let children = &self.joints[last].children;
                let Some((&first, rest)) = children.split_first() else {
                    break;
                };
                for &child in rest.iter().rev() {
                    pending.push(vec![last, child]);
                }
                chain.push(first);
            }
            chains.push(chain);
        }
        chains
    }

    pub fn set_joint_color(&mut self, index: Index, color: Color) -> bool {
        match self.joints.get_mut(index).and_then(|j| j.mesh.as_mut()) {
            Some(mesh) => {
                mesh.color = color;
                true
            }
            None => false,
        }
    }

    pub fn set_all_colors(&mut self, color: Color) {
        for mesh in self.joints.iter_mut().filter_map(|j| j.mesh.as_mut()) {
            mesh.color = color;
        }
    }

    /// Flip mesh visibility, returning the new state. Joints without a mesh stay hidden.
    pub fn toggle_joint_mesh(&mut self, index: Index) -> bool {
        match self.joints.get_mut(index).and_then(|j| j.mesh.as_mut()) {
            Some(mesh) => {
                mesh.enabled = !mesh.enabled;
                mesh.enabled
            }
            None => false,
        }
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////
