//! Reference navigation engine with deferred rebuilds

use super::{ConnectionHandle, GraphUpdated, NavigationEngine, ObstacleHandle, ObstacleShape, OffMeshConnection};
use crate::foundation::collections::HandleMap;
use crossbeam_channel::Sender;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NavRequest {
    AddObstacle(ObstacleHandle),
    RemoveObstacle(ObstacleHandle),
    AddConnection(ConnectionHandle),
    RemoveConnection(ConnectionHandle),
}

#[derive(Debug, Clone)]
struct Registered<T> {
    value: T,
    applied: bool,
}

/// Navigation engine that queues requests until [`DeferredNavMesh::process`]
///
/// Stands in for a tiled navmesh whose tile cache rebuilds on its own
/// schedule: handles are handed out immediately, the graph only changes
/// when `process` runs, and every rebuild is broadcast to subscribers.
#[derive(Debug, Default)]
pub struct DeferredNavMesh {
    obstacles: HandleMap<ObstacleHandle, Registered<ObstacleShape>>,
    connections: HandleMap<ConnectionHandle, Registered<OffMeshConnection>>,
    pending: Vec<NavRequest>,
    subscribers: Vec<Sender<GraphUpdated>>,
    generation: u64,
}

impl DeferredNavMesh {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests waiting for the next rebuild
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Number of completed rebuilds
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Obstacles the current graph accounts for
    pub fn active_obstacles(&self) -> impl Iterator<Item = &ObstacleShape> {
        self.obstacles.values().filter(|entry| entry.applied).map(|entry| &entry.value)
    }

    /// Connections the current graph accounts for
    pub fn active_connections(&self) -> impl Iterator<Item = &OffMeshConnection> {
        self.connections.values().filter(|entry| entry.applied).map(|entry| &entry.value)
    }

    /// Apply every queued request and notify subscribers
    ///
    /// Returns `None` when nothing was queued, in which case no
    /// notification is sent.
    pub fn process(&mut self) -> Option<GraphUpdated> {
        if self.pending.is_empty() {
            return None;
        }

        for request in std::mem::take(&mut self.pending) {
            match request {
                NavRequest::AddObstacle(handle) => {
                    if let Some(entry) = self.obstacles.get_mut(handle) {
                        entry.applied = true;
                    }
                }
                NavRequest::RemoveObstacle(handle) => {
                    self.obstacles.remove(handle);
                }
                NavRequest::AddConnection(handle) => {
                    if let Some(entry) = self.connections.get_mut(handle) {
                        entry.applied = true;
                    }
                }
                NavRequest::RemoveConnection(handle) => {
                    self.connections.remove(handle);
                }
            }
        }

        self.generation += 1;
        let update = GraphUpdated {
            generation: self.generation,
            obstacles: self.active_obstacles().count(),
            connections: self.active_connections().count(),
        };
        log::debug!(
            "Navigation graph rebuilt (generation {}, {} obstacles, {} connections)",
            update.generation,
            update.obstacles,
            update.connections
        );

        // Subscribers whose receiver is gone are dropped
        self.subscribers.retain(|sender| sender.send(update).is_ok());
        Some(update)
    }
}

impl NavigationEngine for DeferredNavMesh {
    fn add_obstacle(&mut self, shape: &ObstacleShape) -> ObstacleHandle {
        let handle = self.obstacles.insert(Registered { value: *shape, applied: false });
        self.pending.push(NavRequest::AddObstacle(handle));
        handle
    }

    fn remove_obstacle(&mut self, handle: ObstacleHandle) {
        if self.obstacles.contains_key(handle) {
            self.pending.push(NavRequest::RemoveObstacle(handle));
        } else {
            log::warn!("Removing unknown obstacle {:?}", handle);
        }
    }

    fn add_connection(&mut self, connection: &OffMeshConnection) -> ConnectionHandle {
        let handle = self.connections.insert(Registered { value: *connection, applied: false });
        self.pending.push(NavRequest::AddConnection(handle));
        handle
    }

    fn remove_connection(&mut self, handle: ConnectionHandle) {
        if self.connections.contains_key(handle) {
            self.pending.push(NavRequest::RemoveConnection(handle));
        } else {
            log::warn!("Removing unknown connection {:?}", handle);
        }
    }

    fn subscribe_graph_updates(&mut self, sender: Sender<GraphUpdated>) {
        self.subscribers.push(sender);
    }
}
