//! World-space lights attached to model instances

use crate::content::LightDesc;
use crate::foundation::math::{Transform, Vec3};

/// Light attached to a placed instance, in world space
///
/// Each kind carries only the fields it needs; code that cares about the
/// difference matches on the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    /// Point light that radiates in all directions from a position
    Point {
        /// World position
        position: Vec3,
        /// RGB color values (0.0 to 1.0 range)
        color: Vec3,
        /// Intensity multiplier
        intensity: f32,
        /// Maximum range
        range: f32,
        /// Whether the light is currently enabled
        enabled: bool,
    },
    /// Spot light that creates a cone of light from a position
    Spot {
        /// World position
        position: Vec3,
        /// World-space cone axis (normalized)
        direction: Vec3,
        /// RGB color values (0.0 to 1.0 range)
        color: Vec3,
        /// Intensity multiplier
        intensity: f32,
        /// Maximum range
        range: f32,
        /// Inner cone angle in radians
        inner_cone: f32,
        /// Outer cone angle in radians
        outer_cone: f32,
        /// Whether the light is currently enabled
        enabled: bool,
    },
}

impl Light {
    /// Place an asset-space light declaration with an instance transform
    pub fn from_desc(desc: &LightDesc, transform: &Transform) -> Self {
        match desc {
            LightDesc::Point { offset, color, intensity, range } => Light::Point {
                position: transform.transform_point(*offset),
                color: *color,
                intensity: *intensity,
                range: *range,
                enabled: true,
            },
            LightDesc::Spot { offset, direction, color, intensity, range, inner_cone, outer_cone } => {
                let world_direction = transform.transform_vector(*direction);
                Light::Spot {
                    position: transform.transform_point(*offset),
                    direction: world_direction.try_normalize(f32::EPSILON).unwrap_or(world_direction),
                    color: *color,
                    intensity: *intensity,
                    range: *range,
                    inner_cone: *inner_cone,
                    outer_cone: *outer_cone,
                    enabled: true,
                }
            }
        }
    }

    /// World position of the light
    pub fn position(&self) -> Vec3 {
        match self {
            Light::Point { position, .. } | Light::Spot { position, .. } => *position,
        }
    }

    /// Whether the light is switched on
    pub fn is_enabled(&self) -> bool {
        match self {
            Light::Point { enabled, .. } | Light::Spot { enabled, .. } => *enabled,
        }
    }

    /// Switch the light on or off
    pub fn set_enabled(&mut self, value: bool) {
        match self {
            Light::Point { enabled, .. } | Light::Spot { enabled, .. } => *enabled = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

    fn ceiling_spot() -> LightDesc {
        LightDesc::Spot {
            offset: Vec3::new(0.0, 3.0, 0.0),
            direction: Vec3::new(1.0, 0.0, 0.0),
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
            range: 10.0,
            inner_cone: 0.2,
            outer_cone: FRAC_PI_4,
        }
    }

    #[test]
    fn test_spot_direction_follows_instance_rotation() {
        let light = Light::from_desc(&ceiling_spot(), &Transform::from_position_yaw(Vec3::zeros(), FRAC_PI_2));

        match light {
            Light::Spot { direction, position, .. } => {
                assert_relative_eq!(direction, Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
                assert_relative_eq!(position, Vec3::new(0.0, 3.0, 0.0), epsilon = 1e-5);
            }
            Light::Point { .. } => panic!("spot declaration produced a point light"),
        }
    }

    #[test]
    fn test_point_light_is_placed_and_switchable() {
        let desc = LightDesc::Point {
            offset: Vec3::new(0.0, 0.6, 0.0),
            color: Vec3::new(1.0, 0.5, 0.2),
            intensity: 2.0,
            range: 4.0,
        };
        let mut light = Light::from_desc(&desc, &Transform::from_position(Vec3::new(3.0, 1.0, -2.0)));
        assert_relative_eq!(light.position(), Vec3::new(3.0, 1.6, -2.0));
        assert!(light.is_enabled());

        light.set_enabled(false);
        assert!(!light.is_enabled());
    }
}
