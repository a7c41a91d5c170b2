//! Instanced geometry pools
//!
//! One fixed-size pool per asset name. The builder counts every placement
//! that references an asset, allocates exactly that many slots, and then
//! writes transforms into the slots in the same order it counted them, so
//! a [`PlacementKey`] always resolves to the same [`SlotRef`].
//!
//! ```text
//! Level (map + objects)
//!        ↓  enumerate_placements (single ordering)
//! PoolPlan (counts per asset name)
//!        ↓  content resolution
//! InstancePools (fixed slots, stable indices)
//! ```

mod builder;
mod instance;
mod light;

pub use builder::{enumerate_placements, InstancePools, Placement, PlacementKey, PoolPlan, SlotRef};
pub use instance::{InstancePool, ModelInstance};
pub use light::Light;
