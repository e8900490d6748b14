//! Arena handles and collection aliases
//!
//! Regions and stored nodes live in slot maps so that parent/child links and
//! the node-to-leaf back-reference are plain keys instead of pointers.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Key of a region inside the octree's region arena
    pub struct RegionKey;

    /// Stable handle to a node stored in an [`Octree`](crate::spatial::Octree)
    ///
    /// Handles are generational: once the node is destroyed (or the index is
    /// cleared) the handle stops resolving instead of aliasing a newer node.
    pub struct NodeHandle;
}

/// Arena of regions addressed by [`RegionKey`]
pub type RegionArena<R> = SlotMap<RegionKey, R>;

/// Arena of stored nodes addressed by [`NodeHandle`]
pub type NodeArena<N> = SlotMap<NodeHandle, N>;

/// Signed integer coordinate of a root cell in the sparse world grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
    /// Cell index along X
    pub x: i64,
    /// Cell index along Y
    pub y: i64,
    /// Cell index along Z
    pub z: i64,
}

impl GridCoord {
    /// Create a grid coordinate from its three cell indices
    pub const fn new(x: i64, y: i64, z: i64) -> Self {
        Self { x, y, z }
    }
}

impl From<(i64, i64, i64)> for GridCoord {
    fn from((x, y, z): (i64, i64, i64)) -> Self {
        Self::new(x, y, z)
    }
}
