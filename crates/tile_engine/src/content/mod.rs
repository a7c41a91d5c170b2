//! Level and asset description data
//!
//! These structures are produced by an external deserializer (RON in the
//! demo app) and consumed as-is by the pool builder, the portal graph and
//! the trigger engine. Nothing in here knows about pools or slots.

mod asset;
mod error;
mod ids;
mod level;
mod resolver;

pub use asset::{Asset, AssetLibrary, AssetReference, LightDesc, PathfindingUsage, PortalConnection, PortalKind};
pub use error::LevelError;
pub use ids::IdAllocator;
pub use level::{
    AnimationPlan, EmitterDesc, Keyframe, Level, MapPlacement, NavLink, ObjectFlags, ObjectReference,
    ObjectTarget, Trigger, TriggerAction,
};
pub use resolver::{AssetGeometry, ContentResolver, StaticContent};
