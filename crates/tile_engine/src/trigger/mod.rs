//! Trigger engine
//!
//! Every interactive object is a [`SceneryItem`] with a free-form state
//! string and a list of [`Trigger`](crate::content::Trigger)s. Executing a
//! trigger moves the item to a new state, starts its animation and cascades
//! to the triggers named in its action list. Each top-level invocation is
//! tracked by a [`TriggerCallback`] that completes once none of the items
//! it touched is still animating.
//!
//! ```text
//! invoke(item, trigger) ──► Started event
//!        │
//!        ├─ execute_trigger (state guard, animation, cascade)
//!        ▼
//! poll() every frame ──► Completed event once animations stop
//! ```

mod engine;
mod scenery;

pub use engine::{TriggerCallback, TriggerCompletion, TriggerEngine, TriggerEvent};
pub use scenery::{ParticleEmitter, SceneryItem};

use thiserror::Error;

/// Errors raised by a top-level trigger invocation
///
/// Cascaded actions never fail; unknown targets inside a cascade are
/// logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriggerError {
    /// No level is loaded and ready for interaction
    #[error("No level is ready")]
    NotReady,

    /// No item with this id exists in the level
    #[error("Unknown item '{0}'")]
    UnknownItem(String),

    /// The item has no trigger with this name
    #[error("Item '{item}' has no trigger named '{trigger}'")]
    UnknownTrigger {
        /// Item id
        item: String,
        /// Trigger name
        trigger: String,
    },
}
