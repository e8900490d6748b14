//! Spatial partitioning data structures
//!
//! Provides the sparse octree index and the query interface used to run
//! radius and nearest-neighbor searches over 3D points.

mod config;
mod grid;
mod octree;
mod region;
mod search;
mod spatial_query;

#[cfg(test)]
mod tests;

pub use config::{OctreeConfig, MAX_SUPPORTED_DEPTH};
pub use grid::{IntersectingRoots, RegionGrid};
pub use octree::{NodeMut, NodeRef, Octree, RegionInfo};
pub use region::{BoundedRegion, RegionTree};
pub use search::{SearchHit, SearchResults};
pub use spatial_query::{LinearScan, SpatialQuery};
