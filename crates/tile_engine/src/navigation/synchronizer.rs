//! Keeps navigation obstacles in step with trigger outcomes

use super::{ConnectionHandle, GraphUpdated, NavigationEngine, ObstacleHandle, ObstacleShape, OffMeshConnection};
use crate::config::NavigationConfig;
use crate::content::{Level, ObjectTarget};
use crate::foundation::math::Transform;
use crate::pool::InstancePools;
use crate::trigger::{SceneryItem, TriggerCompletion, TriggerEngine};
use crossbeam_channel::{unbounded, Receiver};
use std::collections::BTreeMap;

/// Owns the obstacle and connection registrations of one level
///
/// Obstacles are only ever recomputed from a [`TriggerCompletion`], i.e.
/// after every animation of the cascade has written its final pose.
#[derive(Debug)]
pub struct ObstacleSynchronizer {
    config: NavigationConfig,
    obstacles: BTreeMap<usize, ObstacleHandle>,
    connections: Vec<ConnectionHandle>,
    updates: Receiver<GraphUpdated>,
    last_update: Option<GraphUpdated>,
}

impl ObstacleSynchronizer {
    /// Subscribe to `nav`'s graph updates
    ///
    /// Each level gets its own synchronizer; dropping it drops the
    /// receiving end, so notifications for a replaced level go nowhere.
    pub fn new(config: NavigationConfig, nav: &mut dyn NavigationEngine) -> Self {
        let (sender, updates) = unbounded();
        nav.subscribe_graph_updates(sender);
        Self {
            config,
            obstacles: BTreeMap::new(),
            connections: Vec::new(),
            updates,
            last_update: None,
        }
    }

    /// Whether `item` should block navigation in its current state
    pub fn is_blocking(&self, item: &SceneryItem) -> bool {
        item.owns_dynamic_obstacle() && self.config.is_blocking(item.current_state())
    }

    /// Obstacle for `item` from its current instance bounds
    pub fn shape_for(&self, item: &SceneryItem, pools: &InstancePools) -> Option<ObstacleShape> {
        let instance = item.slot().and_then(|slot| pools.instance(slot))?;
        if instance.bounds().is_empty() {
            return None;
        }
        Some(ObstacleShape::from_bounds(instance.bounds(), self.config.obstacle_padding))
    }

    /// Register obstacles for items that start in a blocking state
    pub fn register_initial(&mut self, triggers: &TriggerEngine, pools: &InstancePools, nav: &mut dyn NavigationEngine) {
        for (index, item) in triggers.items().iter().enumerate() {
            if self.is_blocking(item) {
                self.register(index, item, pools, nav);
            }
        }
        log::info!("Registered {} initial obstacles", self.obstacles.len());
    }

    /// Declare every object's off-mesh link in world space
    pub fn register_connections(
        &mut self,
        level: &Level,
        triggers: &TriggerEngine,
        pools: &InstancePools,
        nav: &mut dyn NavigationEngine,
    ) {
        for item in triggers.items() {
            let Some(object) = level.objects.get(item.object_index()) else {
                continue;
            };
            let Some(link) = &object.nav_link else {
                continue;
            };
            let transform = match item.slot().and_then(|slot| pools.instance(slot)) {
                Some(instance) => *instance.rest_transform(),
                None => match &object.target {
                    ObjectTarget::Asset { transform, .. } => *transform,
                    ObjectTarget::SubPlacement { .. } => Transform::identity(),
                },
            };
            let connection = OffMeshConnection {
                start: transform.transform_point(link.start),
                end: transform.transform_point(link.end),
                radius: link.radius,
                bidirectional: link.bidirectional,
                area_type: link.area_type,
                action_mask: link.action_mask,
            };
            self.connections.push(nav.add_connection(&connection));
            log::debug!("Registered nav link for '{}'", item.id());
        }
    }

    /// Refresh obstacles of every item a completed cascade touched
    pub fn on_completion(
        &mut self,
        completion: &TriggerCompletion,
        triggers: &TriggerEngine,
        pools: &InstancePools,
        nav: &mut dyn NavigationEngine,
    ) {
        for &index in &completion.affected {
            let Some(item) = triggers.item(index) else {
                continue;
            };
            if !item.owns_dynamic_obstacle() {
                continue;
            }
            if let Some(handle) = self.obstacles.remove(&index) {
                nav.remove_obstacle(handle);
                log::debug!("Removed obstacle of '{}'", item.id());
            }
            if self.config.is_blocking(item.current_state()) {
                self.register(index, item, pools, nav);
            }
        }
    }

    fn register(&mut self, index: usize, item: &SceneryItem, pools: &InstancePools, nav: &mut dyn NavigationEngine) {
        match self.shape_for(item, pools) {
            Some(shape) => {
                self.obstacles.insert(index, nav.add_obstacle(&shape));
                log::debug!("Added obstacle for '{}' in state '{}'", item.id(), item.current_state());
            }
            None => log::warn!("Item '{}' blocks navigation but has no geometry", item.id()),
        }
    }

    /// Whether the item at `index` currently has an obstacle registered
    pub fn has_obstacle(&self, index: usize) -> bool {
        self.obstacles.contains_key(&index)
    }

    /// Number of registered obstacles
    pub fn obstacle_count(&self) -> usize {
        self.obstacles.len()
    }

    /// Number of registered connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Drain graph-updated notifications without blocking
    pub fn poll_graph_updates(&mut self) -> Vec<GraphUpdated> {
        let updates: Vec<GraphUpdated> = self.updates.try_iter().collect();
        if let Some(last) = updates.last() {
            self.last_update = Some(*last);
        }
        updates
    }

    /// Most recent graph update seen
    pub fn last_update(&self) -> Option<GraphUpdated> {
        self.last_update
    }

    /// Deregister everything this level added
    pub fn teardown(&mut self, nav: &mut dyn NavigationEngine) {
        let obstacles = std::mem::take(&mut self.obstacles);
        let connections = std::mem::take(&mut self.connections);
        if !obstacles.is_empty() || !connections.is_empty() {
            log::info!(
                "Deregistering {} obstacles and {} connections",
                obstacles.len(),
                connections.len()
            );
        }
        for handle in obstacles.into_values() {
            nav.remove_obstacle(handle);
        }
        for handle in connections {
            nav.remove_connection(handle);
        }
    }
}
