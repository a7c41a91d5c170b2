//! Portal-based visibility
//!
//! Each complex-asset placement becomes an [`AssetMapItem`] whose bounds
//! enclose every instance it expands into. Placements whose bounds touch
//! and whose portals line up are joined by an edge. At runtime the camera's
//! containing placement is the root of a frustum-pruned depth-first walk
//! over those edges; whatever the walk reaches is the visible set.

mod portal_graph;

pub use portal_graph::{ports_match, AssetMapItem, PortalGraph, VisibleSet};
