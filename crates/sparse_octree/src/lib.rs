//! # Sparse Octree
//!
//! A spatial index for static or slowly moving 3D points, answering radius
//! and k-nearest-neighbor queries.
//!
//! ## Features
//!
//! - **Unbounded world**: a sparse grid of root regions, allocated only where
//!   points exist
//! - **Fixed-depth octrees**: each root subdivides to a configured depth, with
//!   empty branches pruned as soon as they empty out
//! - **Stable handles**: generational node handles with O(1) removal and
//!   relocation
//! - **Configurable**: parameters load from TOML or RON files
//!
//! ## Quick Start
//!
//! ```rust
//! use sparse_octree::prelude::*;
//!
//! fn main() -> Result<(), OctreeError> {
//!     let mut octree = Octree::new();
//!     octree.create_node(Vec3::new(0.0, 0.0, 0.0), "oak")?;
//!     octree.create_node(Vec3::new(1.0, 0.0, 0.0), "pine")?;
//!     octree.create_node(Vec3::new(10.0, 0.0, 0.0), "birch")?;
//!
//!     let nearest = octree.k_nearest_neighbors_search(Vec3::zeros(), 2, 100.0)?;
//!     let (trees, squared_distances) = nearest.into_parts();
//!     assert_eq!(trees, vec![&"oak", &"pine"]);
//!     assert_eq!(squared_distances, vec![0.0, 1.0]);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod config;
pub mod error;
pub mod foundation;
pub mod spatial;

pub use error::{OctreeError, Result};
pub use foundation::collections::NodeHandle;
pub use spatial::{Octree, OctreeConfig};

/// Common imports for index users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        error::{OctreeError, Result},
        foundation::{collections::NodeHandle, math::Vec3},
        spatial::{
            LinearScan, NodeMut, NodeRef, Octree, OctreeConfig, SearchHit, SearchResults,
            SpatialQuery,
        },
    };
}
