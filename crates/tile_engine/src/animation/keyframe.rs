//! Keyframe playback over pool slots

use super::Animator;
use crate::content::AnimationPlan;
use crate::pool::{InstancePools, SlotRef};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct ActiveAnimation {
    plan: AnimationPlan,
    elapsed: f32,
}

/// Plays [`AnimationPlan`]s by writing `rest * offset` into pool slots
///
/// A plan stays "playing" until the update that writes its final pose, so
/// anything polled after that update sees the end pose in the pool.
#[derive(Debug, Default)]
pub struct KeyframeAnimator {
    active: HashMap<SlotRef, ActiveAnimation>,
}

impl KeyframeAnimator {
    /// Create an idle animator
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance every playing plan by `delta_time` seconds
    pub fn update(&mut self, delta_time: f32, pools: &mut InstancePools) {
        let mut finished = Vec::new();

        for (slot, animation) in &mut self.active {
            animation.elapsed += delta_time;
            let Some(rest) = pools.instance(*slot).map(|instance| *instance.rest_transform()) else {
                finished.push(*slot);
                continue;
            };
            let pose = rest.combine(&animation.plan.sample(animation.elapsed));
            pools.set_instance_transform(*slot, pose);

            if animation.elapsed >= animation.plan.duration() {
                finished.push(*slot);
            }
        }

        for slot in finished {
            if let Some(animation) = self.active.remove(&slot) {
                log::trace!("Animation '{}' finished on {:?}", animation.plan.name, slot);
            }
        }
    }

    /// Number of instances currently animating
    pub fn playing_count(&self) -> usize {
        self.active.len()
    }

    /// Drop every animation without touching the pools
    pub fn clear(&mut self) {
        self.active.clear();
    }
}

impl Animator for KeyframeAnimator {
    fn start(&mut self, slot: SlotRef, plan: &AnimationPlan) {
        self.active.insert(slot, ActiveAnimation { plan: plan.clone(), elapsed: 0.0 });
    }

    fn is_playing(&self, slot: SlotRef) -> bool {
        self.active.contains_key(&slot)
    }
}
