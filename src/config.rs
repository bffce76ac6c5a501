use crate::types::{Color, DEFAULT_BONE_COLOR};
use bitflags::bitflags;

bitflags! {
    /// What the renderer draws for each enabled bone.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DrawMode: u8 {
        const MESH = 1 << 0;
        const WIREFRAME = 1 << 1;
        const SHADELESS = 1 << 2;
    }
}

impl Default for DrawMode {
    fn default() -> Self {
        DrawMode::MESH
    }
}

/// Viewer settings. Mutated only on the render side, through the command queue.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub interpolate: bool,
    /// Ignore positional channels, pinning roots in place.
    pub fix_origin: bool,
    pub paused: bool,
    pub draw_mode: DrawMode,
    pub show_grid: bool,
    /// World units per file unit, for display only.
    pub scale: f64,
    pub bone_color: Color,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            interpolate: false,
            fix_origin: false,
            paused: false,
            draw_mode: DrawMode::default(),
            show_grid: true,
            scale: 1.0,
            bone_color: DEFAULT_BONE_COLOR,
        }
    }
}
