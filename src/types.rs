use cgmath::{Deg, Matrix4, Vector3};
use std::fmt;

/////////////////////////////////////////////////////////////////////////////////////////////////

pub type Index = usize;
pub type Position = Vector3<f64>;
pub type Matrix = Matrix4<f64>;

/// RGB color in `[0, 1]`.
pub type Color = [f32; 3];

pub const DEFAULT_BONE_COLOR: Color = [0.7, 0.7, 1.0];

/////////////////////////////////////////////////////////////////////////////////////////////////

/// One animated degree of freedom of a joint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    XPosition,
    YPosition,
    ZPosition,
    XRotation,
    YRotation,
    ZRotation,
}

type ElementaryTransform = fn(f64) -> Matrix;

fn x_position(v: f64) -> Matrix {
    Matrix4::from_translation(Vector3::new(v, 0.0, 0.0))
}
fn y_position(v: f64) -> Matrix {
    Matrix4::from_translation(Vector3::new(0.0, v, 0.0))
}
fn z_position(v: f64) -> Matrix {
    Matrix4::from_translation(Vector3::new(0.0, 0.0, v))
}
fn x_rotation(degrees: f64) -> Matrix {
    Matrix4::from_angle_x(Deg(degrees))
}
fn y_rotation(degrees: f64) -> Matrix {
    Matrix4::from_angle_y(Deg(degrees))
}
fn z_rotation(degrees: f64) -> Matrix {
    Matrix4::from_angle_z(Deg(degrees))
}

/// Indexed by `Channel::index`.
const ELEMENTARY_TRANSFORMS: [ElementaryTransform; 6] = [
    x_position, y_position, z_position, x_rotation, y_rotation, z_rotation,
];

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::XPosition,
        Channel::YPosition,
        Channel::ZPosition,
        Channel::XRotation,
        Channel::YRotation,
        Channel::ZRotation,
    ];

    /// Resolve a channel token such as `Xrotation`. Matching is case-insensitive.
    pub fn from_name(name: &str) -> Option<Channel> {
        let upper = name.to_uppercase();
        Channel::ALL.into_iter().find(|c| c.name() == upper)
    }

    pub fn name(self) -> &'static str {
        match self {
            Channel::XPosition => "XPOSITION",
            Channel::YPosition => "YPOSITION",
            Channel::ZPosition => "ZPOSITION",
            Channel::XRotation => "XROTATION",
            Channel::YRotation => "YROTATION",
            Channel::ZRotation => "ZROTATION",
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_rotation(self) -> bool {
        matches!(
            self,
            Channel::XRotation | Channel::YRotation | Channel::ZRotation
        )
    }

    #[inline]
    pub fn is_position(self) -> bool {
        !self.is_rotation()
    }

    /// Elementary transform for a single channel value. Rotations are in degrees.
    #[inline]
    pub fn transform(self, value: f64) -> Matrix {
        ELEMENTARY_TRANSFORMS[self.index()](value)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::{Point3, Transform};

    #[test]
    fn channel_names_are_case_insensitive() {
        assert_eq!(Channel::from_name("Xposition"), Some(Channel::XPosition));
        assert_eq!(Channel::from_name("zROTATION"), Some(Channel::ZRotation));
        assert_eq!(Channel::from_name("Wrotation"), None);
    }

    #[test]
    fn lookup_table_matches_channel_kind() {
        let p = Channel::YPosition.transform(3.0).transform_point(Point3::new(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(p, Point3::new(0.0, 3.0, 0.0), epsilon = 1e-12);

        // +90 degrees about Z takes X onto Y
        let p = Channel::ZRotation.transform(90.0).transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(p, Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
