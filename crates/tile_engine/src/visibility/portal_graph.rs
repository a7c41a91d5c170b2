//! Portal graph build and query

use crate::content::{AssetLibrary, Level, LevelError, PortalConnection, PortalKind};
use crate::foundation::math::Vec3;
use crate::pool::{InstancePools, SlotRef};
use crate::spatial::{Frustum, AABB};
use std::collections::HashSet;

/// One complex-asset placement in the portal graph
#[derive(Debug, Clone)]
pub struct AssetMapItem {
    placement: usize,
    bounds: AABB,
    instances: Vec<SlotRef>,
    portals: Vec<PortalConnection>,
    edges: Vec<usize>,
}

impl AssetMapItem {
    /// Index of the map entry this item was built from
    pub fn placement(&self) -> usize {
        self.placement
    }

    /// Merged bounds of every owned instance
    pub fn bounds(&self) -> &AABB {
        &self.bounds
    }

    /// Pool slots owned by this placement
    pub fn instances(&self) -> &[SlotRef] {
        &self.instances
    }

    /// World-space portals
    pub fn portals(&self) -> &[PortalConnection] {
        &self.portals
    }

    /// Indices of connected items
    pub fn edges(&self) -> &[usize] {
        &self.edges
    }
}

/// Whether two world-space portals join their placements
///
/// Two open portals join when they face exactly opposite ways, wherever
/// they are. Any pairing involving a closed portal joins only when the two
/// positions coincide. `epsilon` absorbs float noise from the transforms.
pub fn ports_match(a: &PortalConnection, b: &PortalConnection, epsilon: f32) -> bool {
    match (a.kind, b.kind) {
        (PortalKind::Open, PortalKind::Open) => (a.direction.dot(&b.direction) + 1.0).abs() <= epsilon,
        _ => (a.position - b.position).magnitude() <= epsilon,
    }
}

/// Result of a visibility query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSet {
    items: Vec<usize>,
    bounds: Vec<AABB>,
}

impl VisibleSet {
    /// Nothing is visible; the renderer culls everything
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Visible item indices in traversal order
    pub fn items(&self) -> &[usize] {
        &self.items
    }

    /// Bounds of the visible items, parallel to [`VisibleSet::items`]
    pub fn bounds(&self) -> &[AABB] {
        &self.bounds
    }

    /// Whether `item` was reached
    pub fn contains(&self, item: usize) -> bool {
        self.items.contains(&item)
    }

    fn push(&mut self, item: usize, bounds: AABB) {
        self.items.push(item);
        self.bounds.push(bounds);
    }
}

/// Graph of placements joined through portals
#[derive(Debug, Clone, Default)]
pub struct PortalGraph {
    items: Vec<AssetMapItem>,
    owned: HashSet<SlotRef>,
}

impl PortalGraph {
    /// Build items from the populated pools, then connect them
    pub fn build(
        level: &Level,
        library: &AssetLibrary,
        pools: &InstancePools,
        epsilon: f32,
    ) -> Result<Self, LevelError> {
        if pools.map_len() != level.map.len() {
            return Err(LevelError::CorruptMapReference {
                placement: pools.map_len().min(level.map.len()),
                map_len: level.map.len(),
            });
        }

        let mut items = Vec::with_capacity(level.map.len());
        let mut owned = HashSet::new();

        for (index, entry) in level.map.iter().enumerate() {
            let asset = library.get(&entry.asset).ok_or_else(|| LevelError::UnknownAsset {
                placement: index,
                asset: entry.asset.clone(),
            })?;

            let instances = pools.map_slots(index).to_vec();
            let bounds = instances
                .iter()
                .filter_map(|slot| pools.instance(*slot))
                .fold(AABB::empty(), |merged, instance| merged.merge(instance.bounds()));
            owned.extend(instances.iter().copied());

            items.push(AssetMapItem {
                placement: index,
                bounds,
                instances,
                portals: asset.connections.iter().map(|portal| portal.to_world(&entry.transform)).collect(),
                edges: Vec::new(),
            });
        }

        let mut graph = Self { items, owned };
        let edge_count = graph.connect(epsilon);
        log::info!("Portal graph built: {} placements, {} connections", graph.items.len(), edge_count);
        Ok(graph)
    }

    fn connect(&mut self, epsilon: f32) -> usize {
        let mut edge_count = 0;
        for a in 0..self.items.len() {
            for b in (a + 1)..self.items.len() {
                let (first, second) = (&self.items[a], &self.items[b]);
                if first.bounds.is_empty() || second.bounds.is_empty() || !first.bounds.intersects(&second.bounds) {
                    continue;
                }
                let connected = first
                    .portals
                    .iter()
                    .any(|pa| second.portals.iter().any(|pb| ports_match(pa, pb, epsilon)));
                if connected {
                    self.items[a].edges.push(b);
                    self.items[b].edges.push(a);
                    edge_count += 1;
                }
            }
        }
        edge_count
    }

    /// All items, indexed like the level map
    pub fn items(&self) -> &[AssetMapItem] {
        &self.items
    }

    /// Item by index
    pub fn item(&self, index: usize) -> Option<&AssetMapItem> {
        self.items.get(index)
    }

    /// Item whose bounds contain `point`
    pub fn locate(&self, point: Vec3) -> Option<usize> {
        self.items.iter().position(|item| item.bounds.contains_point(point))
    }

    /// Items visible from `camera_position` through `frustum`
    ///
    /// An empty result means the camera is outside every placement and the
    /// caller must cull everything.
    pub fn visible_set(&self, camera_position: Vec3, frustum: &Frustum) -> VisibleSet {
        let mut visible = VisibleSet::default();
        let Some(start) = self.locate(camera_position) else {
            return visible;
        };

        let mut visited = HashSet::new();
        visited.insert(start);
        visible.push(start, self.items[start].bounds);
        self.walk(start, frustum, &mut visited, &mut visible);
        visible
    }

    fn walk(&self, from: usize, frustum: &Frustum, visited: &mut HashSet<usize>, visible: &mut VisibleSet) {
        for &neighbour in &self.items[from].edges {
            if !visited.insert(neighbour) {
                continue;
            }
            let bounds = self.items[neighbour].bounds;
            if !frustum.intersects_aabb(&bounds) {
                continue;
            }
            visible.push(neighbour, bounds);
            self.walk(neighbour, frustum, visited, visible);
        }
    }

    /// Write a query result into the instance visibility flags
    ///
    /// Instances owned by a placement follow their placement. Loose
    /// instances (direct object placements) are frustum-tested when
    /// `cull_loose` is set. An empty set hides everything.
    pub fn apply_visibility(&self, visible: &VisibleSet, frustum: &Frustum, pools: &mut InstancePools, cull_loose: bool) {
        let mut shown = HashSet::new();
        for &item in visible.items() {
            shown.extend(self.items[item].instances.iter().copied());
        }

        let slots: Vec<SlotRef> = pools.all_slots().collect();
        for slot in slots {
            let Some(instance) = pools.instance_mut(slot) else {
                continue;
            };
            let is_visible = if visible.is_empty() {
                false
            } else if self.owned.contains(&slot) {
                shown.contains(&slot)
            } else if cull_loose {
                frustum.intersects_aabb(instance.bounds())
            } else {
                true
            };
            instance.set_visible(is_visible);
        }
    }
}
