//! Specialized collection types

pub use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Key of a registered trigger callback awaiting completion
    pub struct CallbackKey;

    /// Key of an obstacle registered with a navigation engine
    pub struct ObstacleKey;

    /// Key of an off-mesh connection registered with a navigation engine
    pub struct ConnectionKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<K, T> = SlotMap<K, T>;
