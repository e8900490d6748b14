//! Octree parameters

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{OctreeError, Result};

/// Deepest subdivision level accepted by [`OctreeConfig::validate`]
pub const MAX_SUPPORTED_DEPTH: u32 = 16;

/// Configuration for octree behavior
///
/// These values are fixed for the lifetime of an [`Octree`](super::Octree).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Edge length of a root (depth 0) region; the world grid cell size
    pub root_size: f32,

    /// Depth of the leaf regions; leaves never subdivide further
    pub max_depth: u32,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            root_size: 512.0,
            max_depth: 4,
        }
    }
}

impl Config for OctreeConfig {}

impl OctreeConfig {
    /// Set the root region edge length
    #[must_use]
    pub fn with_root_size(mut self, root_size: f32) -> Self {
        self.root_size = root_size;
        self
    }

    /// Set the leaf depth
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Edge length of a leaf region
    pub fn leaf_size(&self) -> f32 {
        self.root_size / (1_u32 << self.max_depth.min(MAX_SUPPORTED_DEPTH)) as f32
    }

    /// Check that the parameters describe a usable tree
    pub fn validate(&self) -> Result<()> {
        if !self.root_size.is_finite() || self.root_size <= 0.0 {
            return Err(OctreeError::InvalidConfig(format!(
                "root_size must be finite and positive, got {}",
                self.root_size
            )));
        }
        if self.max_depth > MAX_SUPPORTED_DEPTH {
            return Err(OctreeError::InvalidConfig(format!(
                "max_depth must be at most {MAX_SUPPORTED_DEPTH}, got {}",
                self.max_depth
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sparse_octree_{}_{name}", std::process::id()))
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = OctreeConfig::default();
        assert!(config.validate().is_ok());
        assert_relative_eq!(config.leaf_size(), 32.0);
    }

    #[test]
    fn test_rejects_bad_parameters() {
        for root_size in [0.0, -1.0, f32::NAN, f32::INFINITY] {
            let config = OctreeConfig::default().with_root_size(root_size);
            assert!(matches!(config.validate(), Err(OctreeError::InvalidConfig(_))));
        }
        let config = OctreeConfig::default().with_max_depth(MAX_SUPPORTED_DEPTH + 1);
        assert!(matches!(config.validate(), Err(OctreeError::InvalidConfig(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let path = temp_path("octree.toml");
        let config = OctreeConfig::default().with_root_size(64.0).with_max_depth(6);
        config.save_to_file(&path).unwrap();
        let loaded = OctreeConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_partial_file_uses_defaults() {
        let path = temp_path("octree.ron");
        std::fs::write(&path, "(max_depth: 2)").unwrap();
        let loaded = OctreeConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded.max_depth, 2);
        assert_relative_eq!(loaded.root_size, 512.0);
    }
}
