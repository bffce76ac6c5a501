use crate::types::{Channel, Matrix, Position};
use cgmath::{Point3, Transform};

/// Wrap an angle difference in degrees into `[-180, 180)`.
pub fn normalize_angle(theta: f64) -> f64 {
    let wrapped = (theta + 180.0).rem_euclid(360.0) - 180.0;
    // rem_euclid may round up to exactly 360
    if wrapped >= 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Blend two channel slices by `factor`. Rotational channels travel the short way
/// around the circle, positional ones linearly.
pub(crate) fn __interpolate_channels(
    channels: &[Channel],
    current: &[f64],
    next: &[f64],
    factor: f64,
) -> Vec<f64> {
    debug_assert!(channels.len() == current.len() && current.len() == next.len());
    channels
        .iter()
        .zip(current.iter().zip(next))
        .map(|(channel, (&a, &b))| {
            let diff = if channel.is_rotation() {
                normalize_angle(b - a)
            } else {
                b - a
            };
            a + factor * diff
        })
        .collect()
}

/// Image of the origin under `m`.
pub fn origin_of(m: &Matrix) -> Position {
    point_of(m, Position::new(0.0, 0.0, 0.0))
}

pub fn point_of(m: &Matrix, p: Position) -> Position {
    let p = m.transform_point(Point3::new(p.x, p.y, p.z));
    Position::new(p.x, p.y, p.z)
}

/////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_angle_range() {
        assert_eq!(normalize_angle(0.0), 0.0);
        assert_eq!(normalize_angle(180.0), -180.0);
        assert_eq!(normalize_angle(-180.0), -180.0);
        assert_eq!(normalize_angle(-340.0), 20.0);
        assert_eq!(normalize_angle(340.0), -20.0);
        assert_eq!(normalize_angle(725.0), 5.0);
    }

    #[test]
    fn normalize_angle_never_returns_180() {
        for theta in [-180.000_000_000_000_03, 180.0, 540.0, -540.0, f64::EPSILON - 180.0] {
            let wrapped = normalize_angle(theta);
            assert!((-180.0..180.0).contains(&wrapped), "{} -> {}", theta, wrapped);
        }
    }

    #[test]
    fn interpolation_takes_short_way_round() {
        let channels = [Channel::YRotation];
        // 170 -> -170 goes through 180, not back through 0
        let halfway = __interpolate_channels(&channels, &[170.0], &[-170.0], 0.5);
        assert_eq!(halfway, vec![180.0]);
        let quarter = __interpolate_channels(&channels, &[170.0], &[-170.0], 0.25);
        assert_eq!(quarter, vec![175.0]);
    }

    #[test]
    fn interpolation_endpoints() {
        let channels = [Channel::XPosition, Channel::ZRotation];
        let current = [10.0, 179.0];
        let next = [20.0, -179.0];
        assert_eq!(__interpolate_channels(&channels, &current, &next, 0.0), current.to_vec());

        let almost = __interpolate_channels(&channels, &current, &next, 0.999_999);
        assert!((almost[0] - 20.0).abs() < 1e-4);
        // approaches 181, which is -179 on the circle
        assert!((normalize_angle(almost[1]) - -179.0).abs() < 1e-4);
    }

    #[test]
    fn positions_are_not_wrapped() {
        let halfway = __interpolate_channels(&[Channel::XPosition], &[170.0], &[-170.0], 0.5);
        assert_eq!(halfway, vec![0.0]);
    }
}
