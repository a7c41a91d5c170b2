//! Pool slots
//!
//! A [`ModelInstance`] is one slot of an [`InstancePool`]. Slots are
//! allocated once per level load and never added or removed afterwards;
//! the pool is dropped as a whole when the level is unloaded.

use super::light::Light;
use crate::content::{AssetGeometry, PathfindingUsage};
use crate::foundation::math::Transform;
use crate::spatial::AABB;
use std::sync::Arc;

/// One placed copy of an asset
#[derive(Debug, Clone)]
pub struct ModelInstance {
    transform: Transform,
    rest_transform: Transform,
    bounds: AABB,
    visible: bool,
    lights: Vec<Light>,
    pathfinding: PathfindingUsage,
}

impl ModelInstance {
    fn unplaced() -> Self {
        Self {
            transform: Transform::identity(),
            rest_transform: Transform::identity(),
            bounds: AABB::empty(),
            visible: true,
            lights: Vec::new(),
            pathfinding: PathfindingUsage::default(),
        }
    }

    /// Current world transform
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Transform assigned at load, before any animation
    pub fn rest_transform(&self) -> &Transform {
        &self.rest_transform
    }

    /// World-space bounding box for the current transform
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Whether the instance passed the last culling pass
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Set the culling result; attached lights follow the instance
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        for light in &mut self.lights {
            light.set_enabled(visible);
        }
    }

    /// World-space lights attached to the instance
    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    /// How the instance takes part in navigation
    pub fn pathfinding(&self) -> PathfindingUsage {
        self.pathfinding
    }

    pub(super) fn set_pathfinding(&mut self, usage: PathfindingUsage) {
        self.pathfinding = usage;
    }

    fn place(&mut self, geometry: &AssetGeometry, transform: Transform) {
        self.transform = transform;
        self.bounds = geometry.bounds.transformed(&transform);
        self.lights = geometry
            .lights
            .iter()
            .map(|desc| Light::from_desc(desc, &transform))
            .collect();
        if !self.visible {
            for light in &mut self.lights {
                light.set_enabled(false);
            }
        }
    }
}

/// Fixed-size pool of instances sharing one asset's geometry
#[derive(Debug, Clone)]
pub struct InstancePool {
    asset: String,
    geometry: Arc<AssetGeometry>,
    instances: Vec<ModelInstance>,
}

impl InstancePool {
    /// Allocate `capacity` unplaced slots for `asset`
    pub fn new(asset: impl Into<String>, geometry: Arc<AssetGeometry>, capacity: usize) -> Self {
        Self {
            asset: asset.into(),
            geometry,
            instances: vec![ModelInstance::unplaced(); capacity],
        }
    }

    /// Asset name the pool was created for
    pub fn asset(&self) -> &str {
        &self.asset
    }

    /// Shared geometry of every slot
    pub fn geometry(&self) -> &AssetGeometry {
        &self.geometry
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// True for a pool without slots
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Assign rest transforms to the slots, in slot order
    ///
    /// The pool never grows or shrinks: surplus transforms are ignored and
    /// missing ones leave the remaining slots untouched.
    pub fn set_transforms(&mut self, transforms: &[Transform]) {
        if transforms.len() != self.instances.len() {
            log::warn!(
                "Pool '{}' has {} slots but received {} transforms",
                self.asset,
                self.instances.len(),
                transforms.len()
            );
        }
        for (instance, transform) in self.instances.iter_mut().zip(transforms) {
            instance.rest_transform = *transform;
            instance.place(&self.geometry, *transform);
        }
    }

    /// Move one slot, keeping its rest transform
    pub fn set_instance_transform(&mut self, slot: usize, transform: Transform) -> bool {
        match self.instances.get_mut(slot) {
            Some(instance) => {
                instance.place(&self.geometry, transform);
                true
            }
            None => false,
        }
    }

    /// Slot by index
    pub fn get(&self, slot: usize) -> Option<&ModelInstance> {
        self.instances.get(slot)
    }

    /// Mutable slot by index
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut ModelInstance> {
        self.instances.get_mut(slot)
    }

    /// Iterate over the slots in index order
    pub fn iter(&self) -> impl Iterator<Item = &ModelInstance> {
        self.instances.iter()
    }

    /// Iterate mutably over the slots in index order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ModelInstance> {
        self.instances.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::LightDesc;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    fn lamp_geometry() -> Arc<AssetGeometry> {
        Arc::new(AssetGeometry {
            name: "lamp".to_string(),
            bounds: AABB::new(Vec3::new(-0.5, 0.0, -0.5), Vec3::new(0.5, 2.0, 0.5)),
            lights: vec![LightDesc::Point {
                offset: Vec3::new(0.0, 2.0, 0.0),
                color: Vec3::new(1.0, 0.9, 0.7),
                intensity: 1.0,
                range: 5.0,
            }],
        })
    }

    #[test]
    fn test_set_transforms_places_bounds_and_lights() {
        let mut pool = InstancePool::new("lamp", lamp_geometry(), 2);
        pool.set_transforms(&[
            Transform::from_position(Vec3::new(0.0, 0.0, 0.0)),
            Transform::from_position(Vec3::new(10.0, 0.0, 0.0)),
        ]);

        let second = pool.get(1).unwrap();
        assert_relative_eq!(second.bounds().min, Vec3::new(9.5, 0.0, -0.5));
        assert_relative_eq!(second.lights()[0].position(), Vec3::new(10.0, 2.0, 0.0));
    }

    #[test]
    fn test_pool_never_resizes() {
        let mut pool = InstancePool::new("lamp", lamp_geometry(), 2);
        pool.set_transforms(&[Transform::identity(); 3]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn test_hiding_an_instance_switches_its_lights_off() {
        let mut pool = InstancePool::new("lamp", lamp_geometry(), 1);
        pool.set_transforms(&[Transform::identity()]);

        let instance = pool.get_mut(0).unwrap();
        instance.set_visible(false);
        assert!(!instance.lights()[0].is_enabled());
    }

    #[test]
    fn test_moving_a_slot_keeps_rest_transform() {
        let mut pool = InstancePool::new("lamp", lamp_geometry(), 1);
        pool.set_transforms(&[Transform::identity()]);

        assert!(pool.set_instance_transform(0, Transform::from_position(Vec3::new(0.0, 1.0, 0.0))));
        assert!(!pool.set_instance_transform(5, Transform::identity()));

        let instance = pool.get(0).unwrap();
        assert_relative_eq!(instance.rest_transform().position, Vec3::zeros());
        assert_relative_eq!(instance.bounds().max.y, 3.0);
    }
}
