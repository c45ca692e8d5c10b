//! Non-homogeneous rigid transform construction

use crate::core::types::{Mat3, Vec3};

/// Build the eye-to-world transform for a camera at `eye` looking at the
/// world origin.
///
/// Right-handed camera frame: -Z is the viewing direction, world +Z is the
/// up reference (+Y when the eye lies on the Z axis). Camera-space points map
/// to world space as `R * p + t`, with `t = eye`.
pub fn eye_to_world_transform(eye: Vec3) -> (Mat3, Vec3) {
    let z = eye.normalize();
    let up = if z.cross(Vec3::Z).length_squared() < 1e-8 {
        Vec3::Y
    } else {
        Vec3::Z
    };
    let x = up.cross(z).normalize();
    let y = z.cross(x);
    (Mat3::from_cols(x, y, z), eye)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_is_orthonormal() {
        let (r, _) = eye_to_world_transform(Vec3::new(1.0, 2.0, 0.5));
        let should_be_identity = r * r.transpose();
        assert!(should_be_identity.abs_diff_eq(Mat3::IDENTITY, 1e-5));
        assert!((r.determinant() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_view_axis_hits_origin() {
        let eye = Vec3::new(1.5, -0.3, 0.8);
        let n = eye.length();
        let (r, t) = eye_to_world_transform(eye);
        // A camera-space point at distance n along -Z lands on the origin.
        let world = r * Vec3::new(0.0, 0.0, -n) + t;
        assert!(world.length() < 1e-5);
    }

    #[test]
    fn test_degenerate_eye_on_z_axis() {
        let (r, _) = eye_to_world_transform(Vec3::new(0.0, 0.0, 2.0));
        assert!((r.determinant() - 1.0).abs() < 1e-5);
        assert!(r.is_finite());
    }
}
