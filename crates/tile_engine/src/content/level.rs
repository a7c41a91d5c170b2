//! Level description
//!
//! A level is a list of complex-asset placements (the "map") plus a flat
//! list of interactive or decorative objects. Objects either place an asset
//! of their own or adopt a sub-placement that the map already expands.

use crate::foundation::math::{Transform, Vec3};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Object type flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ObjectFlags: u32 {
        /// Door that opens and closes
        const DOOR = 1 << 0;
        /// Level exit
        const EXIT = 1 << 1;
        /// Light fixture
        const LIGHT = 1 << 2;
        /// Switch or lever the player can use
        const TRIGGER = 1 << 3;
        /// Furniture
        const FURNITURE = 1 << 4;
        /// Pure decoration
        const DECORATION = 1 << 5;
        /// Container that can be opened
        const CONTAINER = 1 << 6;
    }
}

/// One complex-asset placement in the level map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPlacement {
    /// Name of the placed asset
    pub asset: String,
    /// World transform of the placement
    #[serde(default)]
    pub transform: Transform,
}

/// What an object reference points at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectTarget {
    /// Place an asset directly; adds one instance to that asset's pool
    Asset {
        /// Asset name
        name: String,
        /// World transform
        #[serde(default)]
        transform: Transform,
    },
    /// Adopt a sub-placement already expanded from the map
    SubPlacement {
        /// Index into [`Level::map`]
        placement: usize,
        /// Reference id inside the placed asset
        reference: String,
    },
}

/// Keyframe of an animation plan
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    /// Time in seconds from the start of the plan
    pub time: f32,
    /// Offset applied on top of the instance's rest transform
    #[serde(default)]
    pub offset: Transform,
}

/// Named animation played on an object's instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationPlan {
    /// Plan name referenced by triggers
    pub name: String,
    /// Keyframes sorted by time
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
}

impl AnimationPlan {
    /// Time of the last keyframe
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |frame| frame.time)
    }

    /// Offset at `time`, holding the first/last pose outside the range
    pub fn sample(&self, time: f32) -> Transform {
        let Some(first) = self.keyframes.first() else {
            return Transform::identity();
        };
        if time <= first.time {
            return first.offset;
        }
        for pair in self.keyframes.windows(2) {
            let (from, to) = (&pair[0], &pair[1]);
            if time <= to.time {
                let span = to.time - from.time;
                let t = if span > 0.0 { (time - from.time) / span } else { 1.0 };
                return from.offset.interpolate(&to.offset, t);
            }
        }
        self.keyframes.last().map_or(first.offset, |frame| frame.offset)
    }
}

/// Action fired on another object when a trigger runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerAction {
    /// Id of the target object
    pub item_id: String,
    /// Name of the trigger to execute on the target
    pub action_name: String,
}

/// State-transition rule bound to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    /// Trigger name, used as the action name by other objects
    pub name: String,
    /// State the object must be in for the trigger to fire
    pub state_from: String,
    /// State the object moves to
    pub state_to: String,
    /// Animation plan played on the object's instance
    #[serde(default)]
    pub animation: Option<String>,
    /// Triggers cascaded to other objects
    #[serde(default)]
    pub actions: Vec<TriggerAction>,
}

/// Particle emitter attached to an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmitterDesc {
    /// Effect name
    pub name: String,
    /// Offset from the object origin
    #[serde(default)]
    pub offset: Vec3,
    /// Emit only while the object is in this state
    #[serde(default)]
    pub active_state: Option<String>,
}

/// Off-mesh navigation link declared in object space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    /// Link start
    pub start: Vec3,
    /// Link end
    pub end: Vec3,
    /// Agent radius the link accepts
    pub radius: f32,
    /// Whether agents may traverse end to start as well
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    /// Area type handed to the navigation engine
    #[serde(default)]
    pub area_type: u8,
    /// Action mask handed to the navigation engine
    #[serde(default)]
    pub action_mask: u32,
}

fn default_true() -> bool {
    true
}

/// Object placed in the level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectReference {
    /// Unique id; assigned at load when absent
    #[serde(default)]
    pub id: Option<String>,
    /// What the object is instanced from
    pub target: ObjectTarget,
    /// Type flags
    #[serde(default)]
    pub flags: ObjectFlags,
    /// State the object starts in
    #[serde(default)]
    pub initial_state: String,
    /// Animation plans available to triggers
    #[serde(default)]
    pub animations: Vec<AnimationPlan>,
    /// Triggers, in priority order
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    /// Particle emitters
    #[serde(default)]
    pub emitters: Vec<EmitterDesc>,
    /// Navigation link registered at load
    #[serde(default)]
    pub nav_link: Option<NavLink>,
}

/// Complete level description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Complex-asset placements
    #[serde(default)]
    pub map: Vec<MapPlacement>,
    /// Objects
    #[serde(default)]
    pub objects: Vec<ObjectReference>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slide_plan() -> AnimationPlan {
        AnimationPlan {
            name: "slide".to_string(),
            keyframes: vec![
                Keyframe { time: 0.0, offset: Transform::identity() },
                Keyframe { time: 2.0, offset: Transform::from_position(Vec3::new(0.0, 3.0, 0.0)) },
            ],
        }
    }

    #[test]
    fn test_plan_sampling_holds_end_pose() {
        let plan = slide_plan();
        assert_relative_eq!(plan.duration(), 2.0);
        assert_relative_eq!(plan.sample(1.0).position, Vec3::new(0.0, 1.5, 0.0), epsilon = 1e-5);
        assert_relative_eq!(plan.sample(10.0).position, Vec3::new(0.0, 3.0, 0.0));
        assert_relative_eq!(plan.sample(-1.0).position, Vec3::zeros());
    }

    #[test]
    fn test_level_parses_from_ron() {
        let source = r#"(
            name: "vault",
            map: [(asset: "room")],
            objects: [
                (
                    id: Some("door_a"),
                    target: SubPlacement(placement: 0, reference: "door"),
                    flags: "DOOR",
                    initial_state: "closed",
                    triggers: [(name: "use", state_from: "closed", state_to: "open", animation: Some("slide"))],
                ),
            ],
        )"#;

        let level: Level = ron::from_str(source).unwrap();
        assert_eq!(level.map.len(), 1);
        assert_eq!(level.objects[0].flags, ObjectFlags::DOOR);
        assert_eq!(level.objects[0].triggers[0].animation.as_deref(), Some("slide"));
        assert!(level.objects[0].triggers[0].actions.is_empty());
    }
}
