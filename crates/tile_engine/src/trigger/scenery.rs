//! Interactive level objects

use crate::content::{AnimationPlan, ObjectFlags, ObjectReference, ObjectTarget, PathfindingUsage, Trigger};
use crate::foundation::math::{Transform, Vec3};
use crate::pool::{InstancePools, SlotRef};

/// Particle emitter attached to a scenery item
#[derive(Debug, Clone, PartialEq)]
pub struct ParticleEmitter {
    /// Effect name
    pub name: String,
    /// World position
    pub position: Vec3,
    /// Emit only while the item is in this state
    pub active_state: Option<String>,
    /// Whether the emitter is currently running
    pub active: bool,
}

impl ParticleEmitter {
    fn refresh(&mut self, state: &str) {
        self.active = self.active_state.as_deref().map_or(true, |wanted| wanted == state);
    }
}

/// Level object paired with its pool slot and current state
#[derive(Debug, Clone)]
pub struct SceneryItem {
    id: String,
    object_index: usize,
    flags: ObjectFlags,
    slot: Option<SlotRef>,
    current_state: String,
    triggers: Vec<Trigger>,
    animations: Vec<AnimationPlan>,
    emitters: Vec<ParticleEmitter>,
    dynamic_obstacle: bool,
}

impl SceneryItem {
    /// Pair an object with its resolved slot
    ///
    /// `slot` is `None` when the object's content was missing; the item
    /// still takes part in trigger cascades, it just has nothing to show.
    pub fn new(id: String, object_index: usize, object: &ObjectReference, slot: Option<SlotRef>, pools: &InstancePools) -> Self {
        let instance = slot.and_then(|slot| pools.instance(slot));
        let placement = instance.map_or_else(
            || match &object.target {
                ObjectTarget::Asset { transform, .. } => *transform,
                ObjectTarget::SubPlacement { .. } => Transform::identity(),
            },
            |instance| *instance.rest_transform(),
        );
        let dynamic_obstacle = instance.is_some_and(|instance| instance.pathfinding() == PathfindingUsage::DynamicObstacle);

        let mut emitters: Vec<ParticleEmitter> = object
            .emitters
            .iter()
            .map(|desc| ParticleEmitter {
                name: desc.name.clone(),
                position: placement.transform_point(desc.offset),
                active_state: desc.active_state.clone(),
                active: false,
            })
            .collect();
        for emitter in &mut emitters {
            emitter.refresh(&object.initial_state);
        }

        Self {
            id,
            object_index,
            flags: object.flags,
            slot,
            current_state: object.initial_state.clone(),
            triggers: object.triggers.clone(),
            animations: object.animations.clone(),
            emitters,
            dynamic_obstacle,
        }
    }

    /// Unique id within the level
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Index of the originating object in the level's object list
    pub fn object_index(&self) -> usize {
        self.object_index
    }

    /// Object type flags
    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    /// Pool slot, if the content resolved
    pub fn slot(&self) -> Option<SlotRef> {
        self.slot
    }

    /// Current state string
    pub fn current_state(&self) -> &str {
        &self.current_state
    }

    /// Declared triggers, in priority order
    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    /// Animation plan by name
    pub fn animation(&self, name: &str) -> Option<&AnimationPlan> {
        self.animations.iter().find(|plan| plan.name == name)
    }

    /// Attached particle emitters
    pub fn emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    /// Whether the item keeps a runtime obstacle in the navigation engine
    pub fn owns_dynamic_obstacle(&self) -> bool {
        self.dynamic_obstacle
    }

    /// Index of the trigger an action named `name` should run
    ///
    /// Prefers the first trigger with that name that can fire from the
    /// current state, so toggles can declare one trigger per direction.
    pub fn find_trigger(&self, name: &str) -> Option<usize> {
        let mut first_named = None;
        for (index, trigger) in self.triggers.iter().enumerate() {
            if trigger.name != name {
                continue;
            }
            if trigger.state_from == self.current_state {
                return Some(index);
            }
            first_named.get_or_insert(index);
        }
        first_named
    }

    /// Index of the first trigger that can fire from the current state
    pub fn first_applicable_trigger(&self) -> Option<usize> {
        self.triggers
            .iter()
            .position(|trigger| trigger.state_from == self.current_state)
    }

    pub(super) fn set_state(&mut self, state: &str) {
        self.current_state = state.to_string();
        for emitter in &mut self.emitters {
            emitter.refresh(state);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{AssetGeometry, AssetLibrary, EmitterDesc, Level, StaticContent};
    use crate::pool::PlacementKey;
    use crate::spatial::AABB;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn trigger(name: &str, from: &str, to: &str) -> Trigger {
        Trigger {
            name: name.to_string(),
            state_from: from.to_string(),
            state_to: to.to_string(),
            animation: None,
            actions: Vec::new(),
        }
    }

    fn brazier(triggers: Vec<Trigger>) -> ObjectReference {
        ObjectReference {
            id: Some("brazier".to_string()),
            target: ObjectTarget::Asset {
                name: "brazier".to_string(),
                transform: Transform::from_position_yaw(Vec3::new(5.0, 0.0, 0.0), FRAC_PI_2),
            },
            flags: ObjectFlags::LIGHT,
            initial_state: "cold".to_string(),
            animations: Vec::new(),
            triggers,
            emitters: vec![
                EmitterDesc {
                    name: "flames".to_string(),
                    offset: Vec3::new(1.0, 0.5, 0.0),
                    active_state: Some("lit".to_string()),
                },
                EmitterDesc { name: "dust".to_string(), offset: Vec3::zeros(), active_state: None },
            ],
            nav_link: None,
        }
    }

    fn item(object: &ObjectReference) -> SceneryItem {
        let level = Level { name: String::new(), map: Vec::new(), objects: vec![object.clone()] };
        let content = StaticContent::from_geometry([AssetGeometry {
            name: "brazier".to_string(),
            bounds: AABB::new(Vec3::zeros(), Vec3::repeat(1.0)),
            lights: Vec::new(),
        }]);
        let pools = InstancePools::build(&level, &AssetLibrary::new(), &content).unwrap();
        let slot = pools.slot(PlacementKey::Object(0));
        SceneryItem::new("brazier".to_string(), 0, object, slot, &pools)
    }

    #[test]
    fn test_emitters_are_placed_in_world_space() {
        let item = item(&brazier(Vec::new()));

        // A quarter turn around +Y maps local +X onto world -Z
        assert_relative_eq!(item.emitters()[0].position, Vec3::new(5.0, 0.5, -1.0), epsilon = 1e-5);
        assert_relative_eq!(item.emitters()[1].position, Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_emitters_follow_active_state() {
        let mut item = item(&brazier(Vec::new()));
        assert!(!item.emitters()[0].active);
        assert!(item.emitters()[1].active, "emitters without a state always run");

        item.set_state("lit");
        assert!(item.emitters()[0].active);

        item.set_state("cold");
        assert!(!item.emitters()[0].active);
        assert!(item.emitters()[1].active);
    }

    #[test]
    fn test_find_trigger_prefers_one_that_fits_current_state() {
        let mut item = item(&brazier(vec![
            trigger("toggle", "lit", "cold"),
            trigger("toggle", "cold", "lit"),
            trigger("kick", "lit", "cold"),
        ]));

        assert_eq!(item.find_trigger("toggle"), Some(1));
        item.set_state("lit");
        assert_eq!(item.find_trigger("toggle"), Some(0));

        // Nothing fits: fall back to the first trigger with that name
        item.set_state("cold");
        assert_eq!(item.find_trigger("kick"), Some(2));
        assert_eq!(item.find_trigger("missing"), None);
    }

    #[test]
    fn test_missing_instance_falls_back_to_authored_transform() {
        let object = brazier(Vec::new());
        let item = SceneryItem::new("brazier".to_string(), 0, &object, None, &InstancePools::default());

        assert_eq!(item.slot(), None);
        assert!(!item.owns_dynamic_obstacle());
        assert_relative_eq!(item.emitters()[0].position, Vec3::new(5.0, 0.5, -1.0), epsilon = 1e-5);
    }
}
