//! Asset templates
//!
//! An asset is a named geometry module. Composite assets ("complex assets")
//! list sub-placements that are instanced individually but share the outer
//! placement transform, and declare the portals through which neighbouring
//! placements can be seen.

use crate::foundation::math::{Transform, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a portal is an open doorway or a sealed joint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PortalKind {
    /// Open passage; matches another open port facing the opposite way
    #[default]
    Open,
    /// Closed joint; matches only a port at exactly the same position
    Closed,
}

/// Portal connection point declared in asset space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortalConnection {
    /// Position of the portal in asset space
    pub position: Vec3,
    /// Outward-facing direction of the portal in asset space
    pub direction: Vec3,
    /// Open or closed
    #[serde(default)]
    pub kind: PortalKind,
}

impl PortalConnection {
    /// Portal transformed into world space by a placement transform
    pub fn to_world(&self, transform: &Transform) -> PortalConnection {
        let direction = transform.transform_vector(self.direction);
        PortalConnection {
            position: transform.transform_point(self.position),
            direction: direction.try_normalize(f32::EPSILON).unwrap_or(direction),
            kind: self.kind,
        }
    }
}

/// How a sub-placement takes part in navigation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PathfindingUsage {
    /// Baked into the walkable mesh
    #[default]
    Walkable,
    /// Ignored by the navmesh entirely
    Ignore,
    /// Baked as a permanent obstacle
    StaticObstacle,
    /// Registered at runtime as an obstacle that follows the object's state
    DynamicObstacle,
}

/// Light declared on an asset, in asset space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LightDesc {
    /// Omnidirectional light
    Point {
        /// Offset from the asset origin
        offset: Vec3,
        /// RGB color (0.0 to 1.0 range)
        color: Vec3,
        /// Intensity multiplier
        intensity: f32,
        /// Maximum range
        range: f32,
    },
    /// Cone light
    Spot {
        /// Offset from the asset origin
        offset: Vec3,
        /// Cone axis
        direction: Vec3,
        /// RGB color (0.0 to 1.0 range)
        color: Vec3,
        /// Intensity multiplier
        intensity: f32,
        /// Maximum range
        range: f32,
        /// Inner cone angle in radians
        inner_cone: f32,
        /// Outer cone angle in radians
        outer_cone: f32,
    },
}

/// Sub-placement inside a complex asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReference {
    /// Reference id, unique within the owning asset
    #[serde(default)]
    pub id: Option<String>,
    /// Name of the referenced (leaf) asset
    pub asset: String,
    /// Transform relative to the owning asset
    #[serde(default)]
    pub transform: Transform,
    /// Navigation participation
    #[serde(default)]
    pub pathfinding: PathfindingUsage,
}

/// Named geometry template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique asset name
    pub name: String,
    /// Sub-placements; empty for a plain asset
    #[serde(default)]
    pub references: Vec<AssetReference>,
    /// Portal connections in asset space
    #[serde(default)]
    pub connections: Vec<PortalConnection>,
    /// Navigation participation when placed directly as an object
    #[serde(default)]
    pub pathfinding: PathfindingUsage,
}

impl Asset {
    /// Whether placing this asset expands into several instances
    pub fn is_complex(&self) -> bool {
        !self.references.is_empty()
    }

    /// Index of the sub-placement with the given reference id
    pub fn reference_index(&self, reference_id: &str) -> Option<usize> {
        self.references
            .iter()
            .position(|reference| reference.id.as_deref() == Some(reference_id))
    }
}

/// All asset templates known to a level load, keyed by name
#[derive(Debug, Clone, Default)]
pub struct AssetLibrary {
    assets: HashMap<String, Asset>,
}

impl AssetLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from a list of assets; later duplicates win
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> Self {
        let mut library = Self::new();
        for asset in assets {
            library.insert(asset);
        }
        library
    }

    /// Add or replace an asset
    pub fn insert(&mut self, asset: Asset) {
        if self.assets.contains_key(&asset.name) {
            log::warn!("Asset '{}' declared twice, keeping the last declaration", asset.name);
        }
        self.assets.insert(asset.name.clone(), asset);
    }

    /// Look up an asset by name
    pub fn get(&self, name: &str) -> Option<&Asset> {
        self.assets.get(name)
    }

    /// Number of assets
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// True when no asset is registered
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}
