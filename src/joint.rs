use crate::node::{NodeId, SceneGraph};
use crate::types::{Channel, Color, Index, Matrix, Position};
use cgmath::{Matrix4, Point3, SquareMatrix, Transform};
use std::ops::Range;

/// Per-bone visual state. The geometry itself belongs to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct BoneMesh {
    pub color: Color,
    pub enabled: bool,
}

/// A skeleton joint, backed by a node in the animation's `SceneGraph`.
///
/// The node carries the kinematics in the bone's frame: its `link` is a translation by
/// the parent joint's offset and its `joint` slot receives the parent's channel transform
/// each frame, so the node's origin sits on the parent's pivot and its mesh spans the
/// bone from the parent to this joint.
#[derive(Debug, Clone)]
pub struct Joint {
    /// `"<parent label>-<label>"`, or the bare label for roots.
    pub name: String,
    /// Name as written in the file; end sites are tagged `End Site<n>`.
    pub label: String,
    pub index: Index,
    pub parent: Option<Index>,
    pub children: Vec<Index>,
    pub node: NodeId,
    pub offset: Position,
    /// Declaration order is evaluation order.
    pub channels: Vec<Channel>,
    /// Columns of a frame record holding this joint's channels.
    pub motion_range: Range<usize>,
    /// Local transform from this joint's current channel values.
    pub channel_transform: Matrix,
    pub mesh: Option<BoneMesh>,
}

impl Joint {
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn is_end_site(&self) -> bool {
        self.channels.is_empty() && self.children.is_empty()
    }

    pub fn has_motion(&self) -> bool {
        !self.channels.is_empty()
    }

    pub fn mesh_enabled(&self) -> bool {
        self.mesh.as_ref().map_or(false, |mesh| mesh.enabled)
    }

    /// World frame at this joint's pivot, channels applied. Needs up to date globals.
    pub fn world_transform(&self, graph: &SceneGraph) -> Matrix {
        graph.global(self.node) * Matrix4::from_translation(self.offset) * self.channel_transform
    }

    pub fn world_position(&self, graph: &SceneGraph) -> Position {
        let p = self.world_transform(graph).transform_point(Point3::new(0.0, 0.0, 0.0));
        Position::new(p.x, p.y, p.z)
    }
}

/// Compose one elementary transform per channel, in declaration order.
/// With `fix_origin` positional channels are skipped.
pub fn evaluate_channels(channels: &[Channel], values: &[f64], fix_origin: bool) -> Matrix {
    debug_assert_eq!(channels.len(), values.len());
    channels
        .iter()
        .zip(values)
        .filter(|(channel, _)| !(fix_origin && channel.is_position()))
        .fold(Matrix::identity(), |acc, (channel, &value)| {
            acc * channel.transform(value)
        })
}

/////////////////////////////////////////////////////////////////////////////////////////////////
