//! # Tile Engine
//!
//! Level runtime for tile-based 3D levels assembled from reusable assets.
//!
//! ## Features
//!
//! - **Instance Pools**: One fixed-size instanced pool per asset, stable slot indices
//! - **Portal Culling**: Placement graph joined through matching portals, frustum-pruned walks
//! - **Trigger Engine**: State-guarded triggers that cascade across objects
//! - **Obstacle Sync**: Navigation obstacles follow the final pose of animated doors
//! - **Cooperative Loading**: Levels load in steps and fully replace the previous level
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tile_engine::prelude::*;
//!
//! fn main() -> Result<(), RuntimeError> {
//!     let level: Level = Level::default();
//!     let library = Arc::new(AssetLibrary::new());
//!     let content = Box::new(StaticContent::new());
//!
//!     let mut runtime = LevelRuntime::new(EngineConfig::default(), content, DeferredNavMesh::new());
//!     runtime.load_blocking(level, library)?;
//!
//!     let camera = Vec3::new(2.0, 1.5, 2.0);
//!     let frustum = Frustum::from_matrix(&Mat4::identity());
//!     runtime.update(1.0 / 60.0, camera, &frustum);
//!     for event in runtime.drain_events() {
//!         println!("{:?}", event);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod foundation;
pub mod config;
pub mod spatial;
pub mod content;
pub mod pool;
pub mod visibility;
pub mod animation;
pub mod trigger;
pub mod navigation;
pub mod level;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        animation::{Animator, KeyframeAnimator},
        config::{Config, EngineConfig},
        content::{AssetLibrary, ContentResolver, Level, StaticContent},
        foundation::math::{Mat4, Transform, Vec3},
        level::{LevelRuntime, LoadReport, RuntimeError, RuntimeEvent},
        navigation::{DeferredNavMesh, NavigationEngine},
        spatial::{Frustum, AABB},
        trigger::{TriggerEvent, TriggerError},
    };
}
