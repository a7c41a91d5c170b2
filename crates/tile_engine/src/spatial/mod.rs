//! Spatial primitives
//!
//! Bounding volumes and view frusta shared by the instance pools, the
//! portal graph and the obstacle synchronizer.

mod bounds;

pub use bounds::{AABB, Frustum, Plane};
