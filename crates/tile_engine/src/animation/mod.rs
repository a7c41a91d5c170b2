//! Instance animation
//!
//! The trigger engine only needs two things from the animation subsystem:
//! start a plan on an instance, and ask whether it is still playing.
//! [`Animator`] is that seam. [`KeyframeAnimator`] is the built-in player,
//! keyed by pool slot rather than by instance identity.

mod keyframe;

pub use keyframe::KeyframeAnimator;

use crate::content::AnimationPlan;
use crate::pool::SlotRef;

/// Animation subsystem as seen by the trigger engine
pub trait Animator {
    /// Start (or restart) `plan` on the instance at `slot`
    fn start(&mut self, slot: SlotRef, plan: &AnimationPlan);

    /// Whether the instance at `slot` is still animating
    fn is_playing(&self, slot: SlotRef) -> bool;
}
