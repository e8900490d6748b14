//! Radius and k-nearest-neighbor searches
//!
//! Both searches enumerate the roots intersecting the query sphere, descend
//! each root with cube/sphere pruning, and run the exact squared-distance
//! test on every node of the leaves they reach.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::octree::{NodeRef, Octree};
use crate::error::{OctreeError, Result};
use crate::foundation::collections::NodeHandle;
use crate::foundation::math::{is_finite, search_reach, Vec3};

/// One node found by a search
#[derive(Debug)]
pub struct SearchHit<'a, T> {
    /// Handle of the node
    pub handle: NodeHandle,
    /// Payload of the node
    pub object: &'a T,
    /// Position of the node
    pub position: Vec3,
    /// Squared distance from the query position
    pub squared_distance: f32,
}

impl<T> Clone for SearchHit<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SearchHit<'_, T> {}

/// Nodes found by a search, with their squared distances
///
/// Radius search results are in traversal order, which is unspecified.
/// K-nearest results are sorted by ascending squared distance.
#[derive(Debug)]
pub struct SearchResults<'a, T> {
    hits: Vec<SearchHit<'a, T>>,
}

impl<T> Clone for SearchResults<'_, T> {
    fn clone(&self) -> Self {
        Self {
            hits: self.hits.clone(),
        }
    }
}

impl<'a, T> SearchResults<'a, T> {
    /// Number of hits
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Check if nothing was found
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Hits as a slice
    pub fn hits(&self) -> &[SearchHit<'a, T>] {
        &self.hits
    }

    /// Iterate the hits
    pub fn iter(&self) -> std::slice::Iter<'_, SearchHit<'a, T>> {
        self.hits.iter()
    }

    /// Payloads of the hits, in result order
    pub fn objects(&self) -> Vec<&'a T> {
        self.hits.iter().map(|hit| hit.object).collect()
    }

    /// Squared distances of the hits, in result order
    pub fn squared_distances(&self) -> Vec<f32> {
        self.hits.iter().map(|hit| hit.squared_distance).collect()
    }

    /// Handles of the hits, in result order
    pub fn handles(&self) -> Vec<NodeHandle> {
        self.hits.iter().map(|hit| hit.handle).collect()
    }

    /// Split into parallel payload and squared distance lists
    pub fn into_parts(self) -> (Vec<&'a T>, Vec<f32>) {
        self.hits
            .into_iter()
            .map(|hit| (hit.object, hit.squared_distance))
            .unzip()
    }

    /// Take the hits out
    pub fn into_hits(self) -> Vec<SearchHit<'a, T>> {
        self.hits
    }
}

impl<'a, T> IntoIterator for SearchResults<'a, T> {
    type Item = SearchHit<'a, T>;
    type IntoIter = std::vec::IntoIter<SearchHit<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}

impl<'s, 'a, T> IntoIterator for &'s SearchResults<'a, T> {
    type Item = &'s SearchHit<'a, T>;
    type IntoIter = std::slice::Iter<'s, SearchHit<'a, T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

/// Candidate kept in the bounded k-nearest heap
///
/// Ordered by squared distance, then by visit order so that ties keep the
/// order in which the traversal met them.
struct Candidate {
    squared_distance: f32,
    sequence: usize,
    handle: NodeHandle,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.squared_distance
            .total_cmp(&other.squared_distance)
            .then(self.sequence.cmp(&other.sequence))
    }
}

fn check_query(position: &Vec3, radius: f32) -> Result<()> {
    if !is_finite(position) {
        return Err(OctreeError::InvalidPosition {
            x: position.x,
            y: position.y,
            z: position.z,
        });
    }
    if radius.is_nan() || radius < 0.0 {
        return Err(OctreeError::InvalidArgument(format!(
            "radius must be non-negative, got {radius}"
        )));
    }
    Ok(())
}

impl<T> Octree<T> {
    /// Call `visit` for every node within `radius` of `position`
    ///
    /// Regions are pruned against [`search_reach`], so the exact `f32` test
    /// below sees every node it could accept.
    fn visit_within<F>(&self, position: &Vec3, radius: f32, mut visit: F)
    where
        F: FnMut(NodeHandle, f32),
    {
        let radius_squared = radius * radius;
        let reach = search_reach(radius);
        for root in self.grid.enumerate_intersecting(position, reach) {
            self.regions.query(root, position, reach, &mut |handle| {
                let squared_distance = (self.nodes[handle].position - position).magnitude_squared();
                if squared_distance <= radius_squared {
                    visit(handle, squared_distance);
                }
            });
        }
    }

    fn hit(&self, handle: NodeHandle, squared_distance: f32) -> SearchHit<'_, T> {
        let node = &self.nodes[handle];
        SearchHit {
            handle,
            object: &node.object,
            position: node.position,
            squared_distance,
        }
    }

    /// Find every node within `radius` of `position`
    ///
    /// The result order is unspecified. A radius of zero finds only nodes at
    /// exactly `position`; an infinite radius finds every node.
    pub fn radius_search(&self, position: Vec3, radius: f32) -> Result<SearchResults<'_, T>> {
        check_query(&position, radius)?;

        let mut hits = Vec::new();
        self.visit_within(&position, radius, |handle, squared_distance| {
            hits.push(self.hit(handle, squared_distance));
        });
        Ok(SearchResults { hits })
    }

    /// Find the `k` nodes closest to `position` within `radius`
    ///
    /// Results are sorted by ascending squared distance; nodes at equal
    /// distance keep no particular order. Fewer than `k` hits are returned
    /// when fewer nodes lie within the radius.
    pub fn k_nearest_neighbors_search(
        &self,
        position: Vec3,
        k: usize,
        radius: f32,
    ) -> Result<SearchResults<'_, T>> {
        if k < 1 {
            return Err(OctreeError::InvalidArgument(format!("k must be at least 1, got {k}")));
        }
        check_query(&position, radius)?;

        let mut heap = BinaryHeap::new();
        let mut sequence = 0;
        self.visit_within(&position, radius, |handle, squared_distance| {
            let candidate = Candidate {
                squared_distance,
                sequence,
                handle,
            };
            sequence += 1;

            if heap.len() < k {
                heap.push(candidate);
            } else if heap.peek().is_some_and(|farthest| candidate < *farthest) {
                heap.pop();
                heap.push(candidate);
            }
        });

        let hits = heap
            .into_sorted_vec()
            .into_iter()
            .map(|candidate| self.hit(candidate.handle, candidate.squared_distance))
            .collect();
        Ok(SearchResults { hits })
    }
}

impl<'a, T> NodeRef<'a, T> {
    /// Find every node within `radius` of this node, this node included
    pub fn radius_search(&self, radius: f32) -> Result<SearchResults<'a, T>> {
        self.octree.radius_search(self.position(), radius)
    }

    /// Find the `k` nodes closest to this node within `radius`, this node included
    pub fn k_nearest_neighbors_search(&self, k: usize, radius: f32) -> Result<SearchResults<'a, T>> {
        self.octree.k_nearest_neighbors_search(self.position(), k, radius)
    }
}
