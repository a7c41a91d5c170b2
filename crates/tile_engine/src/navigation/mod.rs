//! Navigation engine interface and obstacle synchronization
//!
//! The pathfinding engine itself lives outside this crate. The runtime only
//! tells it where temporary obstacles and off-mesh links are; the engine
//! rebuilds its graph whenever it likes and announces that through a
//! [`GraphUpdated`] message on a channel the caller subscribed.
//!
//! ```text
//! TriggerCompletion ──► ObstacleSynchronizer ──► NavigationEngine
//!                                ▲                     │
//!                                └──── GraphUpdated ◄──┘ (channel)
//! ```

mod deferred;
mod synchronizer;

pub use deferred::DeferredNavMesh;
pub use synchronizer::ObstacleSynchronizer;

use crate::foundation::collections::{ConnectionKey, ObstacleKey};
use crate::foundation::math::Vec3;
use crate::spatial::AABB;
use crossbeam_channel::Sender;

/// Handle of a registered obstacle
pub type ObstacleHandle = ObstacleKey;

/// Handle of a registered off-mesh connection
pub type ConnectionHandle = ConnectionKey;

/// Axis-aligned box obstacle in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObstacleShape {
    /// Box centre
    pub center: Vec3,
    /// Half extents
    pub half_extents: Vec3,
}

impl ObstacleShape {
    /// Obstacle covering `bounds`, grown by `padding` on every side
    pub fn from_bounds(bounds: &AABB, padding: f32) -> Self {
        let padded = bounds.expanded(padding);
        Self {
            center: padded.center(),
            half_extents: padded.extents(),
        }
    }

    /// Box form of the obstacle
    pub fn bounds(&self) -> AABB {
        AABB::from_center_extents(self.center, self.half_extents)
    }
}

/// Off-mesh link between two world positions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffMeshConnection {
    /// Start position
    pub start: Vec3,
    /// End position
    pub end: Vec3,
    /// Agent radius the link accepts
    pub radius: f32,
    /// Traversable end to start as well
    pub bidirectional: bool,
    /// Area type
    pub area_type: u8,
    /// Action mask
    pub action_mask: u32,
}

/// Sent after the engine has rebuilt its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphUpdated {
    /// Monotonic rebuild counter
    pub generation: u64,
    /// Obstacles active after the rebuild
    pub obstacles: usize,
    /// Connections active after the rebuild
    pub connections: usize,
}

/// Pathfinding engine as seen by the level runtime
///
/// Requests may be applied later; handles are valid as soon as they are
/// returned and may be removed before the engine ever applied them.
pub trait NavigationEngine {
    /// Register a temporary obstacle
    fn add_obstacle(&mut self, shape: &ObstacleShape) -> ObstacleHandle;

    /// Drop a temporary obstacle
    fn remove_obstacle(&mut self, handle: ObstacleHandle);

    /// Declare an off-mesh connection
    fn add_connection(&mut self, connection: &OffMeshConnection) -> ConnectionHandle;

    /// Drop an off-mesh connection
    fn remove_connection(&mut self, handle: ConnectionHandle);

    /// Deliver a [`GraphUpdated`] to `sender` after every rebuild
    fn subscribe_graph_updates(&mut self, sender: Sender<GraphUpdated>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_shape_padding_grows_box() {
        let bounds = AABB::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 2.0, 0.2));
        let shape = ObstacleShape::from_bounds(&bounds, 0.5);

        assert_relative_eq!(shape.center, Vec3::new(1.0, 1.0, 0.1));
        assert_relative_eq!(shape.half_extents, Vec3::new(1.5, 1.5, 0.6));
        assert_relative_eq!(shape.bounds().min, Vec3::new(-0.5, -0.5, -0.5));
    }
}
