//! Loading and playback of `.bvh` motion capture clips.
//!
//! A clip is parsed into a skeleton of [`Joint`]s backed by a [`SceneGraph`] of
//! transform nodes, plus one motion record per frame. [`Animation`] poses the skeleton
//! at a frame (or between two), and [`ViewerContext`] drives it from a clock and a
//! cross-thread command queue.

pub mod animation;
pub mod clock;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod joint;
pub mod node;
pub mod orientation;
pub mod parse;
pub mod types;
pub mod utils;
#[cfg(feature = "visualize")]
pub mod visualize;

pub use animation::{Animation, PlaybackStep};
pub use config::{DrawMode, ViewerConfig};
pub use context::{BoneDraw, ViewerContext, ViewerHandle};
pub use error::{BvhError, MalformedFileError};
pub use joint::Joint;
pub use node::{NodeId, SceneGraph, TransformNode};
pub use parse::{load_bvh_from_file, load_bvh_from_string};
