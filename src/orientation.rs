use crate::types::{Matrix, Position};
use cgmath::{InnerSpace, Matrix4, Rad, SquareMatrix, Zero};

const EPSILON: f64 = 1e-6;

/// Bone meshes are authored pointing along this axis.
pub fn canonical_up() -> Position {
    Position::unit_y()
}

/// 180 degrees about X, used when the offset points straight down.
pub fn flip_transform() -> Matrix {
    Matrix4::from_nonuniform_scale(1.0, -1.0, -1.0)
}

/// Rotation that takes `canonical_up()` onto the direction of `offset`.
pub fn bone_orientation(offset: Position) -> Matrix {
    if offset == Position::zero() {
        return Matrix::identity();
    }

    let up = canonical_up();
    let dir = offset.normalize();
    let dot = up.dot(dir);

    if (dot - 1.0).abs() < EPSILON {
        return Matrix::identity();
    }
    // cross(up, dir) vanishes here, so the general axis is undefined
    if (dot + 1.0).abs() < EPSILON {
        return flip_transform();
    }

    let axis = up.cross(dir).normalize();
    Matrix4::from_axis_angle(axis, Rad(dot.acos()))
}

/// Shape transform for a bone mesh of unit height: orient along `offset`, stretch to
/// its length and set the cross-section to `thickness`.
pub fn bone_shape(offset: Position, thickness: f64) -> Matrix {
    bone_orientation(offset)
        * Matrix4::from_nonuniform_scale(thickness, offset.magnitude(), thickness)
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use cgmath::Transform;

    #[test]
    fn parallel_offset_is_identity() {
        assert_eq!(bone_orientation(Position::new(0.0, 5.0, 0.0)), Matrix::identity());
    }

    #[test]
    fn zero_offset_is_identity() {
        assert_eq!(bone_orientation(Position::zero()), Matrix::identity());
    }

    #[test]
    fn antiparallel_offset_flips() {
        let m = bone_orientation(Position::new(0.0, -5.0, 0.0));
        assert_eq!(m, flip_transform());
        let v = m.transform_vector(canonical_up());
        assert_abs_diff_eq!(v, Position::new(0.0, -1.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn general_offset_maps_up_onto_direction() {
        for offset in [
            Position::new(5.0, 0.0, 0.0),
            Position::new(-1.0, 2.0, 3.0),
            Position::new(0.3, -4.0, 0.1),
        ] {
            let v = bone_orientation(offset).transform_vector(canonical_up()).normalize();
            assert_abs_diff_eq!(v, offset.normalize(), epsilon = 1e-9);
        }
    }

    #[test]
    fn shape_stretches_to_offset_length() {
        let offset = Position::new(3.0, 0.0, 4.0);
        let tip = bone_shape(offset, 0.2).transform_vector(canonical_up());
        assert_abs_diff_eq!(tip, offset, epsilon = 1e-9);
    }
}
