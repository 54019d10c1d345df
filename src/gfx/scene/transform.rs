//! Object and group transforms

use cgmath::{Matrix, Matrix3, Matrix4, Rad, SquareMatrix, Vector3};

/// Translation, XYZ Euler rotation (radians) and scale
///
/// The world matrix is `T * Rx * Ry * Rz * S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vector3<f32>,
    pub rotation: Vector3<f32>,
    pub scale: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    pub fn from_translation(x: f32, y: f32, z: f32) -> Self {
        Self {
            translation: Vector3::new(x, y, z),
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, x: f32, y: f32, z: f32) -> Self {
        self.rotation = Vector3::new(x, y, z);
        self
    }

    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vector3::new(scale, scale, scale);
        self
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.translation)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }
}

/// Inverse-transpose of the upper 3x3, padded to a 4x4 for uniform layout
pub fn normal_matrix(model: &Matrix4<f32>) -> Matrix4<f32> {
    let upper = Matrix3::from_cols(model.x.truncate(), model.y.truncate(), model.z.truncate());
    let normal = upper
        .invert()
        .map(|inv| inv.transpose())
        .unwrap_or_else(Matrix3::identity);
    Matrix4::from(normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cgmath::{InnerSpace, Point3, Transform as _};
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn identity_by_default() {
        assert_eq!(Transform::default().matrix(), Matrix4::identity());
    }

    #[test]
    fn scale_applies_before_translation() {
        let t = Transform::from_translation(0.8, 0.2, 2.2).with_uniform_scale(0.5);
        let p = t.matrix().transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(p.x, 1.3);
        assert_relative_eq!(p.y, 0.2);
        assert_relative_eq!(p.z, 2.2);
    }

    #[test]
    fn floor_rotation_turns_plane_normal_up() {
        let floor = Transform::default().with_rotation(-FRAC_PI_2, 0.0, 0.0);
        let n = floor.matrix().transform_vector(Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(n.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(n.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn euler_order_is_xyz() {
        // With intrinsic XYZ order, Z rotates first in object space
        let t = Transform::default().with_rotation(FRAC_PI_2, FRAC_PI_2, 0.0);
        let m = t.matrix();
        let expected =
            Matrix4::from_angle_x(Rad(FRAC_PI_2)) * Matrix4::from_angle_y(Rad(FRAC_PI_2));
        for col in 0..4 {
            for row in 0..4 {
                assert_relative_eq!(m[col][row], expected[col][row], epsilon = 1e-6);
            }
        }

        let v = m.transform_vector(Vector3::unit_z());
        // Ry sends +Z to +X, Rx leaves X alone
        assert_relative_eq!(v.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn normal_matrix_corrects_non_uniform_scale() {
        let t = Transform {
            scale: Vector3::new(2.0, 1.0, 1.0),
            ..Default::default()
        };
        let n = normal_matrix(&t.matrix()).transform_vector(Vector3::new(1.0, 1.0, 0.0));
        // Normals shrink along stretched axes
        assert!(n.x < n.y);
        assert!(n.normalize().y > 0.8);
    }
}
