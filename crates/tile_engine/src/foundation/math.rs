//! Math utilities and types
//!
//! nalgebra aliases plus the position/rotation/scale [`Transform`] used by
//! level data, pool slots and animation offsets.

use serde::{Deserialize, Serialize};

pub use nalgebra::{
    Vector3, Vector4,
    Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f32>>;

/// Transform representing position, rotation, and scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Position in 3D space
    pub position: Vec3,
    
    /// Rotation quaternion
    pub rotation: Quat,
    
    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }
    
    /// Create a transform with only position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
    
    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            position,
            rotation,
            ..Default::default()
        }
    }

    /// Create a transform with position and a rotation around the Y axis
    ///
    /// Level tiles are laid out on a grid and almost always turn around the
    /// vertical axis, so this is the common constructor for placements.
    pub fn from_position_yaw(position: Vec3, yaw_radians: f32) -> Self {
        Self::from_position_rotation(
            position,
            Quat::from_axis_angle(&Vec3::y_axis(), yaw_radians),
        )
    }
    
    /// Convert to a transformation matrix
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.position)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
    
    /// Apply this transform to a point
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.position + self.rotation * self.scale.component_mul(&point)
    }
    
    /// Apply this transform to a direction vector (no translation)
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * self.scale.component_mul(&vector)
    }
    
    /// Combine this transform with another (`self` is the parent)
    pub fn combine(&self, other: &Transform) -> Transform {
        Transform {
            position: self.position + self.rotation * (self.scale.component_mul(&other.position)),
            rotation: self.rotation * other.rotation,
            scale: self.scale.component_mul(&other.scale),
        }
    }

    /// Interpolate between two transforms
    ///
    /// Position and scale are interpolated linearly, rotation spherically.
    pub fn interpolate(&self, other: &Transform, t: f32) -> Transform {
        let t = t.clamp(0.0, 1.0);
        Transform {
            position: self.position.lerp(&other.position, t),
            rotation: self.rotation.slerp(&other.rotation, t),
            scale: self.scale.lerp(&other.scale, t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_point_matches_matrix() {
        let transform = Transform {
            position: Vec3::new(4.0, 0.0, -2.0),
            rotation: Quat::from_axis_angle(&Vec3::y_axis(), FRAC_PI_2),
            scale: Vec3::new(2.0, 2.0, 2.0),
        };
        let point = Vec3::new(1.0, 0.5, 0.0);

        let direct = transform.transform_point(point);
        let via_matrix = transform.to_matrix().transform_point(&Point3::from(point));

        assert_relative_eq!(direct, via_matrix.coords, epsilon = 1e-5);
    }

    #[test]
    fn test_combine_applies_parent_after_child() {
        let parent = Transform::from_position_yaw(Vec3::new(10.0, 0.0, 0.0), FRAC_PI_2);
        let child = Transform::from_position(Vec3::new(1.0, 0.0, 0.0));

        let world = parent.combine(&child);

        // +X rotated a quarter turn around +Y lands on -Z
        assert_relative_eq!(world.position, Vec3::new(10.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn test_interpolate_endpoints() {
        let a = Transform::from_position(Vec3::zeros());
        let b = Transform::from_position_yaw(Vec3::new(0.0, 2.0, 0.0), FRAC_PI_2);

        assert_relative_eq!(a.interpolate(&b, 0.0).position, a.position);
        assert_relative_eq!(a.interpolate(&b, 1.0).position, b.position);
        assert_relative_eq!(a.interpolate(&b, 0.5).position, Vec3::new(0.0, 1.0, 0.0));
    }
}
