//! Abstract spatial query interface
//!
//! Lets callers swap the octree for another scheme without changing the code
//! that issues queries. [`LinearScan`] is the trivial implementation: it
//! tests every stored point, which makes it the reference the octree's
//! results are checked against.

use crate::error::{OctreeError, Result};
use crate::foundation::collections::{NodeArena, NodeHandle};
use crate::foundation::math::{is_finite, Vec3};
use crate::spatial::Octree;

/// Abstract interface for point indexes answering proximity queries
///
/// Query results pair each payload with its squared distance to the query
/// position. Sphere results are unordered; nearest results are ascending.
pub trait SpatialQuery<T> {
    /// Insert a payload at a position
    fn insert(&mut self, position: Vec3, object: T) -> Result<NodeHandle>;

    /// Remove a payload and hand it back
    fn remove(&mut self, handle: NodeHandle) -> Result<T>;

    /// Move a stored payload
    fn update(&mut self, handle: NodeHandle, position: Vec3) -> Result<()>;

    /// Payloads within a sphere
    fn query_sphere(&self, center: Vec3, radius: f32) -> Result<Vec<(&T, f32)>>;

    /// Up to `k` payloads closest to `center` within `radius`
    fn query_nearest(&self, center: Vec3, k: usize, radius: f32) -> Result<Vec<(&T, f32)>>;

    /// Remove everything
    fn clear(&mut self);

    /// Number of stored payloads
    fn entity_count(&self) -> usize;
}

impl<T> SpatialQuery<T> for Octree<T> {
    fn insert(&mut self, position: Vec3, object: T) -> Result<NodeHandle> {
        self.create_node(position, object)
    }

    fn remove(&mut self, handle: NodeHandle) -> Result<T> {
        self.destroy(handle)
    }

    fn update(&mut self, handle: NodeHandle, position: Vec3) -> Result<()> {
        self.set_position(handle, position)
    }

    fn query_sphere(&self, center: Vec3, radius: f32) -> Result<Vec<(&T, f32)>> {
        Ok(self
            .radius_search(center, radius)?
            .into_iter()
            .map(|hit| (hit.object, hit.squared_distance))
            .collect())
    }

    fn query_nearest(&self, center: Vec3, k: usize, radius: f32) -> Result<Vec<(&T, f32)>> {
        Ok(self
            .k_nearest_neighbors_search(center, k, radius)?
            .into_iter()
            .map(|hit| (hit.object, hit.squared_distance))
            .collect())
    }

    fn clear(&mut self) {
        self.clear_all_nodes();
    }

    fn entity_count(&self) -> usize {
        self.len()
    }
}

/// Brute-force index that tests every stored point on each query
#[derive(Debug, Clone)]
pub struct LinearScan<T> {
    entries: NodeArena<(Vec3, T)>,
}

impl<T> Default for LinearScan<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LinearScan<T> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            entries: NodeArena::with_key(),
        }
    }

    fn check_position(position: &Vec3) -> Result<()> {
        if is_finite(position) {
            Ok(())
        } else {
            Err(OctreeError::InvalidPosition {
                x: position.x,
                y: position.y,
                z: position.z,
            })
        }
    }

    fn within(&self, center: Vec3, radius: f32) -> Result<Vec<(&T, f32)>> {
        Self::check_position(&center)?;
        if radius.is_nan() || radius < 0.0 {
            return Err(OctreeError::InvalidArgument(format!(
                "radius must be non-negative, got {radius}"
            )));
        }

        let radius_squared = radius * radius;
        Ok(self
            .entries
            .values()
            .map(|(position, object)| (object, (position - center).magnitude_squared()))
            .filter(|&(_, squared_distance)| squared_distance <= radius_squared)
            .collect())
    }
}

impl<T> SpatialQuery<T> for LinearScan<T> {
    fn insert(&mut self, position: Vec3, object: T) -> Result<NodeHandle> {
        Self::check_position(&position)?;
        Ok(self.entries.insert((position, object)))
    }

    fn remove(&mut self, handle: NodeHandle) -> Result<T> {
        self.entries
            .remove(handle)
            .map(|(_, object)| object)
            .ok_or(OctreeError::InvalidHandle)
    }

    fn update(&mut self, handle: NodeHandle, position: Vec3) -> Result<()> {
        Self::check_position(&position)?;
        let entry = self.entries.get_mut(handle).ok_or(OctreeError::InvalidHandle)?;
        entry.0 = position;
        Ok(())
    }

    fn query_sphere(&self, center: Vec3, radius: f32) -> Result<Vec<(&T, f32)>> {
        self.within(center, radius)
    }

    fn query_nearest(&self, center: Vec3, k: usize, radius: f32) -> Result<Vec<(&T, f32)>> {
        if k < 1 {
            return Err(OctreeError::InvalidArgument(format!("k must be at least 1, got {k}")));
        }
        let mut found = self.within(center, radius)?;
        found.sort_by(|a, b| a.1.total_cmp(&b.1));
        found.truncate(k);
        Ok(found)
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn entity_count(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise<Q: SpatialQuery<u32>>(mut index: Q) {
        let a = index.insert(Vec3::new(0.0, 0.0, 0.0), 1).unwrap();
        index.insert(Vec3::new(3.0, 0.0, 0.0), 2).unwrap();
        index.insert(Vec3::new(0.0, 4.0, 0.0), 3).unwrap();
        assert_eq!(index.entity_count(), 3);

        let nearest = index.query_nearest(Vec3::zeros(), 2, 10.0).unwrap();
        assert_eq!(nearest, vec![(&1, 0.0), (&2, 9.0)]);

        index.update(a, Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let mut sphere: Vec<u32> = index
            .query_sphere(Vec3::new(0.0, 4.5, 0.0), 1.0)
            .unwrap()
            .into_iter()
            .map(|(object, _)| *object)
            .collect();
        sphere.sort_unstable();
        assert_eq!(sphere, vec![1, 3]);

        assert_eq!(index.remove(a).unwrap(), 1);
        assert!(matches!(index.remove(a), Err(OctreeError::InvalidHandle)));
        assert!(matches!(
            index.query_nearest(Vec3::zeros(), 0, 1.0),
            Err(OctreeError::InvalidArgument(_))
        ));

        index.clear();
        assert_eq!(index.entity_count(), 0);
    }

    #[test]
    fn test_octree_through_trait() {
        exercise(Octree::new());
    }

    #[test]
    fn test_linear_scan_through_trait() {
        exercise(LinearScan::new());
    }

    #[test]
    fn test_trait_object_usage() {
        let mut index: Box<dyn SpatialQuery<&str>> = Box::new(Octree::new());
        index.insert(Vec3::new(1.0, 1.0, 1.0), "tree").unwrap();
        let found = index.query_sphere(Vec3::zeros(), 2.0).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(*found[0].0, "tree");
    }
}
