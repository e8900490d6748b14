//! Error types for the octree index
//!
//! Every mutation validates its input before touching the tree, so an `Err`
//! always leaves the index exactly as it was before the call.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors reported by the octree index
#[derive(Error, Debug)]
pub enum OctreeError {
    /// A position had a non-finite coordinate, or lies outside the range the
    /// world grid can address
    #[error("Invalid position: ({x}, {y}, {z})")]
    InvalidPosition {
        /// X coordinate as given
        x: f32,
        /// Y coordinate as given
        y: f32,
        /// Z coordinate as given
        z: f32,
    },

    /// The node handle was destroyed or cleared
    #[error("Invalid node handle: the node was destroyed or the octree was cleared")]
    InvalidHandle,

    /// A search argument was out of range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Octree parameters were rejected
    #[error("Invalid octree configuration: {0}")]
    InvalidConfig(String),

    /// Loading or saving configuration failed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used throughout the crate
pub type Result<T, E = OctreeError> = std::result::Result<T, E>;
