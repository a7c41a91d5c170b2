//! Content resolution
//!
//! The content resolver maps asset names to loaded geometry. Loading meshes
//! and textures is somebody else's job; the level runtime only needs the
//! local bounding box and the lights each mesh carries.

use super::asset::LightDesc;
use crate::spatial::AABB;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Loaded geometry for one asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetGeometry {
    /// Asset name this geometry was loaded for
    pub name: String,
    /// Bounding box in asset space
    pub bounds: AABB,
    /// Lights attached to the mesh, in asset space
    #[serde(default)]
    pub lights: Vec<LightDesc>,
}

/// Maps asset names to loaded geometry
pub trait ContentResolver {
    /// Geometry for `asset_name`, or `None` when the content is missing
    fn resolve(&self, asset_name: &str) -> Option<Arc<AssetGeometry>>;
}

/// In-memory content table
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    geometry: HashMap<String, Arc<AssetGeometry>>,
}

impl StaticContent {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from a geometry list
    pub fn from_geometry(geometry: impl IntoIterator<Item = AssetGeometry>) -> Self {
        let mut content = Self::new();
        for item in geometry {
            content.insert(item);
        }
        content
    }

    /// Add or replace geometry
    pub fn insert(&mut self, geometry: AssetGeometry) {
        self.geometry.insert(geometry.name.clone(), Arc::new(geometry));
    }
}

impl ContentResolver for StaticContent {
    fn resolve(&self, asset_name: &str) -> Option<Arc<AssetGeometry>> {
        self.geometry.get(asset_name).cloned()
    }
}
