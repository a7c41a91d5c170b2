//! Pool counting and placement
//!
//! Both passes walk the output of [`enumerate_placements`], which is the
//! only place that defines placement order. Counting and slot assignment
//! therefore cannot disagree about which slot a placement lands in.

use super::instance::{InstancePool, ModelInstance};
use crate::content::{
    AssetGeometry, AssetLibrary, ContentResolver, Level, LevelError, ObjectReference, ObjectTarget,
    PathfindingUsage,
};
use crate::foundation::math::Transform;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Where a placement came from in the level description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PlacementKey {
    /// Sub-placement `reference` of map entry `placement`
    ///
    /// Plain (non-complex) map assets expand to reference 0.
    Map {
        /// Index into the level map
        placement: usize,
        /// Index into the placed asset's references
        reference: usize,
    },
    /// Direct placement by the object at this index of the object list
    Object(usize),
}

/// Stable address of one pool slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotRef {
    /// Pool index
    pub pool: usize,
    /// Slot index within the pool
    pub slot: usize,
}

/// One instance the level asks for
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Origin in the level description
    pub key: PlacementKey,
    /// Asset (pool) name
    pub asset: String,
    /// World transform
    pub transform: Transform,
    /// Navigation participation
    pub pathfinding: PathfindingUsage,
}

/// Every placement of a level, map expansions first, then direct objects
///
/// Fails when a map entry names an asset the library does not know.
pub fn enumerate_placements(level: &Level, library: &AssetLibrary) -> Result<Vec<Placement>, LevelError> {
    let mut placements = Vec::new();

    for (index, entry) in level.map.iter().enumerate() {
        let asset = library.get(&entry.asset).ok_or_else(|| LevelError::UnknownAsset {
            placement: index,
            asset: entry.asset.clone(),
        })?;

        if asset.is_complex() {
            for (reference_index, reference) in asset.references.iter().enumerate() {
                placements.push(Placement {
                    key: PlacementKey::Map { placement: index, reference: reference_index },
                    asset: reference.asset.clone(),
                    transform: entry.transform.combine(&reference.transform),
                    pathfinding: reference.pathfinding,
                });
            }
        } else {
            placements.push(Placement {
                key: PlacementKey::Map { placement: index, reference: 0 },
                asset: asset.name.clone(),
                transform: entry.transform,
                pathfinding: asset.pathfinding,
            });
        }
    }

    for (index, object) in level.objects.iter().enumerate() {
        if let ObjectTarget::Asset { name, transform } = &object.target {
            let pathfinding = library.get(name).map(|asset| asset.pathfinding).unwrap_or_default();
            placements.push(Placement {
                key: PlacementKey::Object(index),
                asset: name.clone(),
                transform: *transform,
                pathfinding,
            });
        }
    }

    Ok(placements)
}

/// Counting pass result: how many slots each asset needs
#[derive(Debug, Clone)]
pub struct PoolPlan {
    placements: Vec<Placement>,
    counts: BTreeMap<String, usize>,
    map_len: usize,
}

impl PoolPlan {
    /// Enumerate and count the placements of a level
    pub fn new(level: &Level, library: &AssetLibrary) -> Result<Self, LevelError> {
        let placements = enumerate_placements(level, library)?;
        let mut counts = BTreeMap::new();
        for placement in &placements {
            *counts.entry(placement.asset.clone()).or_insert(0) += 1;
        }
        Ok(Self { placements, counts, map_len: level.map.len() })
    }

    /// Required slot count per asset name
    pub fn counts(&self) -> &BTreeMap<String, usize> {
        &self.counts
    }

    /// Distinct asset names, in pool order
    pub fn asset_names(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Placements in counting order
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Allocate pools and assign every placement a slot
    ///
    /// Assets missing from `resolved` get no pool; their placements stay
    /// unresolved for this load.
    pub fn allocate(self, resolved: &HashMap<String, Arc<AssetGeometry>>) -> InstancePools {
        let mut pools = Vec::new();
        let mut pool_by_name = HashMap::new();
        let mut skipped = Vec::new();

        for (name, count) in &self.counts {
            match resolved.get(name) {
                Some(geometry) => {
                    pool_by_name.insert(name.clone(), pools.len());
                    pools.push(InstancePool::new(name.clone(), Arc::clone(geometry), *count));
                }
                None => {
                    log::debug!("No content for asset '{}', skipping pool of {} instances", name, count);
                    skipped.push(name.clone());
                }
            }
        }

        let mut transforms: Vec<Vec<Transform>> = pools.iter().map(|pool| Vec::with_capacity(pool.len())).collect();
        let mut usages: Vec<Vec<PathfindingUsage>> = pools.iter().map(|pool| Vec::with_capacity(pool.len())).collect();
        let mut slots = HashMap::new();
        let mut map_slots = vec![Vec::new(); self.map_len];

        for placement in &self.placements {
            let Some(&pool) = pool_by_name.get(&placement.asset) else {
                continue;
            };
            let slot_ref = SlotRef { pool, slot: transforms[pool].len() };
            transforms[pool].push(placement.transform);
            usages[pool].push(placement.pathfinding);
            slots.insert(placement.key, slot_ref);
            if let PlacementKey::Map { placement: map_index, .. } = placement.key {
                map_slots[map_index].push(slot_ref);
            }
        }

        for ((pool, pool_transforms), pool_usages) in pools.iter_mut().zip(&transforms).zip(&usages) {
            pool.set_transforms(pool_transforms);
            for (instance, usage) in pool.iter_mut().zip(pool_usages) {
                instance.set_pathfinding(*usage);
            }
        }

        log::info!(
            "Allocated {} pools ({} instances), skipped {} unresolved assets",
            pools.len(),
            slots.len(),
            skipped.len()
        );

        InstancePools { pools, pool_by_name, slots, map_slots, skipped }
    }
}

/// All pools of a loaded level plus the placement → slot table
#[derive(Debug, Clone, Default)]
pub struct InstancePools {
    pools: Vec<InstancePool>,
    pool_by_name: HashMap<String, usize>,
    slots: HashMap<PlacementKey, SlotRef>,
    map_slots: Vec<Vec<SlotRef>>,
    skipped: Vec<String>,
}

impl InstancePools {
    /// Count, resolve and allocate in one go
    pub fn build(level: &Level, library: &AssetLibrary, content: &dyn ContentResolver) -> Result<Self, LevelError> {
        let plan = PoolPlan::new(level, library)?;
        let resolved = plan
            .asset_names()
            .filter_map(|name| content.resolve(name).map(|geometry| (name.to_string(), geometry)))
            .collect();
        Ok(plan.allocate(&resolved))
    }

    /// Slot assigned to a placement, if its pool exists
    pub fn slot(&self, key: PlacementKey) -> Option<SlotRef> {
        self.slots.get(&key).copied()
    }

    /// Slot an object renders through
    ///
    /// `Ok(None)` means the object is valid but its content was missing.
    /// Sub-placement targets are validated against the map and the library.
    pub fn resolve_object(
        &self,
        level: &Level,
        library: &AssetLibrary,
        object_index: usize,
        object: &ObjectReference,
        object_id: &str,
    ) -> Result<Option<SlotRef>, LevelError> {
        match &object.target {
            ObjectTarget::Asset { .. } => Ok(self.slot(PlacementKey::Object(object_index))),
            ObjectTarget::SubPlacement { placement, reference } => {
                let entry = level.map.get(*placement).ok_or(LevelError::CorruptMapReference {
                    placement: *placement,
                    map_len: level.map.len(),
                })?;
                let asset = library.get(&entry.asset).ok_or_else(|| LevelError::UnknownAsset {
                    placement: *placement,
                    asset: entry.asset.clone(),
                })?;
                let reference_index = asset.reference_index(reference).ok_or_else(|| LevelError::InvalidSubPlacement {
                    object: object_id.to_string(),
                    placement: *placement,
                    reference: reference.clone(),
                })?;
                Ok(self.slot(PlacementKey::Map { placement: *placement, reference: reference_index }))
            }
        }
    }

    /// Slots expanded from one map entry
    pub fn map_slots(&self, placement: usize) -> &[SlotRef] {
        self.map_slots.get(placement).map_or(&[], Vec::as_slice)
    }

    /// Number of map entries the pools were built for
    pub fn map_len(&self) -> usize {
        self.map_slots.len()
    }

    /// Instance at a slot
    pub fn instance(&self, slot: SlotRef) -> Option<&ModelInstance> {
        self.pools.get(slot.pool).and_then(|pool| pool.get(slot.slot))
    }

    /// Mutable instance at a slot
    pub fn instance_mut(&mut self, slot: SlotRef) -> Option<&mut ModelInstance> {
        self.pools.get_mut(slot.pool).and_then(|pool| pool.get_mut(slot.slot))
    }

    /// Move an instance, recomputing its bounds and lights
    pub fn set_instance_transform(&mut self, slot: SlotRef, transform: Transform) -> bool {
        self.pools
            .get_mut(slot.pool)
            .is_some_and(|pool| pool.set_instance_transform(slot.slot, transform))
    }

    /// Pool for an asset name
    pub fn pool(&self, asset: &str) -> Option<&InstancePool> {
        self.pool_by_name.get(asset).map(|&index| &self.pools[index])
    }

    /// All pools
    pub fn pools(&self) -> &[InstancePool] {
        &self.pools
    }

    /// Every slot address, pool by pool
    pub fn all_slots(&self) -> impl Iterator<Item = SlotRef> + '_ {
        self.pools
            .iter()
            .enumerate()
            .flat_map(|(pool, instances)| (0..instances.len()).map(move |slot| SlotRef { pool, slot }))
    }

    /// Total number of slots across all pools
    pub fn instance_count(&self) -> usize {
        self.pools.iter().map(InstancePool::len).sum()
    }

    /// Asset names whose content could not be resolved
    pub fn skipped_assets(&self) -> &[String] {
        &self.skipped
    }
}
