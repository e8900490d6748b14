//! Octree spatial index over static or slowly moving 3D points
//!
//! The world is an unbounded grid of root regions (see [`RegionGrid`]), each
//! subdivided to a fixed depth. Every stored node sits in exactly one leaf
//! and remembers that leaf, so removal and relocation never search the tree.

use super::config::OctreeConfig;
use super::grid::RegionGrid;
use super::region::RegionTree;
use crate::error::{OctreeError, Result};
use crate::foundation::collections::{GridCoord, NodeArena, NodeHandle, RegionKey};
use crate::foundation::logging::{debug, trace};
use crate::foundation::math::{is_finite, Cube, Vec3};

/// A payload stored in the octree together with its position
#[derive(Debug, Clone)]
pub(crate) struct StoredNode<T> {
    pub(crate) position: Vec3,
    pub(crate) object: T,
    /// Leaf region currently holding this node
    pub(crate) leaf: RegionKey,
}

/// Read-only description of one region, for diagnostics and validation
#[derive(Debug, Clone, Copy)]
pub struct RegionInfo<'a> {
    /// Cube covered by the region
    pub cube: Cube,
    /// Depth in the tree (0 = root)
    pub depth: u32,
    /// Grid cell of the region's root
    pub cell: GridCoord,
    /// Whether the region sits at the leaf depth
    pub is_leaf: bool,
    /// Number of child regions present
    pub child_count: usize,
    /// Nodes stored directly in the region
    pub nodes: &'a [NodeHandle],
}

/// Octree spatial partitioning structure
///
/// Owns every region and every stored payload. Nodes are addressed through
/// [`NodeHandle`]s, which stop resolving once the node is destroyed or the
/// tree is cleared.
#[derive(Debug, Clone)]
pub struct Octree<T> {
    config: OctreeConfig,
    pub(crate) grid: RegionGrid,
    pub(crate) regions: RegionTree,
    pub(crate) nodes: NodeArena<StoredNode<T>>,
}

impl<T> Default for Octree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Octree<T> {
    /// Create an empty octree with the default configuration
    pub fn new() -> Self {
        Self::build(OctreeConfig::default())
    }

    /// Create an empty octree with the given configuration
    pub fn with_config(config: OctreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: OctreeConfig) -> Self {
        Self {
            config,
            grid: RegionGrid::new(config.root_size),
            regions: RegionTree::new(config.max_depth),
            nodes: NodeArena::with_key(),
        }
    }

    /// Configuration the tree was built with
    pub const fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of regions currently allocated, roots included
    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Number of occupied root cells
    pub fn root_count(&self) -> usize {
        self.grid.len()
    }

    /// Check if a handle still refers to a live node
    pub fn contains(&self, handle: NodeHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Validate a position and return the grid cell it belongs to
    fn cell_for(&self, position: &Vec3) -> Result<GridCoord> {
        if !is_finite(position) {
            return Err(invalid_position(position));
        }
        self.grid.cell_of(position).ok_or_else(|| invalid_position(position))
    }

    /// Root region of a cell, created on first use
    fn root_for(&mut self, cell: GridCoord) -> RegionKey {
        if let Some(root) = self.grid.get(cell) {
            return root;
        }
        let root = self.regions.create_root(self.grid.cell_cube(cell), cell);
        self.grid.insert(cell, root);
        debug!("Octree: created root region for cell {cell:?} ({} roots)", self.grid.len());
        root
    }

    /// Take a node out of its leaf, pruning regions left empty
    fn unlink(&mut self, handle: NodeHandle, leaf: RegionKey) {
        if let Some(cell) = self.regions.remove(leaf, handle) {
            self.grid.remove(cell);
            debug!("Octree: pruned root region for cell {cell:?} ({} roots)", self.grid.len());
        }
    }

    /// Create a new node at the given position
    ///
    /// Fails with [`OctreeError::InvalidPosition`] before touching the tree if
    /// the position has a non-finite coordinate.
    pub fn create_node(&mut self, position: Vec3, object: T) -> Result<NodeHandle> {
        let cell = self.cell_for(&position)?;
        let root = self.root_for(cell);

        let handle = self.nodes.insert(StoredNode {
            position,
            object,
            leaf: root,
        });
        let leaf = self.regions.insert(root, handle, &position);
        self.nodes[handle].leaf = leaf;

        trace!("Octree: created node {handle:?} at {:?}", position.as_slice());
        Ok(handle)
    }

    /// Payload of a node
    pub fn get_object(&self, handle: NodeHandle) -> Result<&T> {
        self.stored(handle).map(|node| &node.object)
    }

    /// Mutable payload of a node
    pub fn get_object_mut(&mut self, handle: NodeHandle) -> Result<&mut T> {
        self.nodes
            .get_mut(handle)
            .map(|node| &mut node.object)
            .ok_or(OctreeError::InvalidHandle)
    }

    /// Position of a node
    pub fn get_position(&self, handle: NodeHandle) -> Result<Vec3> {
        self.stored(handle).map(|node| node.position)
    }

    pub(crate) fn stored(&self, handle: NodeHandle) -> Result<&StoredNode<T>> {
        self.nodes.get(handle).ok_or(OctreeError::InvalidHandle)
    }

    /// Move a node
    ///
    /// Stays in place when the new position still routes to the node's
    /// current leaf; otherwise the node is unlinked (pruning emptied regions)
    /// and reinserted within this call, so no query ever observes it in two
    /// leaves or in none.
    pub fn set_position(&mut self, handle: NodeHandle, position: Vec3) -> Result<()> {
        let cell = self.cell_for(&position)?;
        let leaf = self.stored(handle)?.leaf;

        let stays = self
            .regions
            .get(leaf)
            .is_some_and(|region| region.cell == cell && self.regions.routes_to(leaf, &position));
        if stays {
            self.nodes[handle].position = position;
            return Ok(());
        }

        self.unlink(handle, leaf);
        let root = self.root_for(cell);
        let new_leaf = self.regions.insert(root, handle, &position);

        let node = &mut self.nodes[handle];
        node.position = position;
        node.leaf = new_leaf;
        trace!("Octree: relocated node {handle:?} to {:?}", position.as_slice());
        Ok(())
    }

    /// Remove a node and hand its payload back
    ///
    /// The handle is invalid afterwards; any further use fails with
    /// [`OctreeError::InvalidHandle`].
    pub fn destroy(&mut self, handle: NodeHandle) -> Result<T> {
        self.take(handle).ok_or(OctreeError::InvalidHandle)
    }

    /// Remove a node from the arena and its leaf
    fn take(&mut self, handle: NodeHandle) -> Option<T> {
        let node = self.nodes.remove(handle)?;
        self.unlink(handle, node.leaf);
        trace!("Octree: destroyed node {handle:?}");
        Some(node.object)
    }

    /// Remove every node and region
    ///
    /// All outstanding handles become invalid.
    pub fn clear_all_nodes(&mut self) {
        debug!(
            "Octree: clearing {} nodes in {} regions",
            self.nodes.len(),
            self.regions.len()
        );
        self.grid.clear();
        self.regions.clear();
        self.nodes.clear();
    }

    /// Handles of every live node
    ///
    /// Collected by walking each root's subtree. The order follows grid and
    /// octant iteration, not insertion, and is unspecified.
    pub fn get_all_nodes(&self) -> Vec<NodeHandle> {
        let mut handles = Vec::with_capacity(self.nodes.len());
        for (_, root) in self.grid.roots() {
            self.regions.collect_nodes(root, &mut handles);
        }
        handles
    }

    /// Iterate every live node as `(handle, payload, position)`, order unspecified
    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &T, Vec3)> + '_ {
        self.nodes
            .iter()
            .map(|(handle, node)| (handle, &node.object, node.position))
    }

    /// Iterate every allocated region, order unspecified
    pub fn regions(&self) -> impl Iterator<Item = RegionInfo<'_>> + '_ {
        let max_depth = self.regions.max_depth();
        self.regions.iter().map(move |(_, region)| RegionInfo {
            cube: region.cube,
            depth: region.depth,
            cell: region.cell,
            is_leaf: region.depth == max_depth,
            child_count: region.child_count(),
            nodes: &region.nodes,
        })
    }

    /// Borrow a node for reading and node-centred searches
    pub fn node(&self, handle: NodeHandle) -> Result<NodeRef<'_, T>> {
        self.stored(handle)?;
        Ok(NodeRef { octree: self, handle })
    }

    /// Borrow a node for modification
    pub fn node_mut(&mut self, handle: NodeHandle) -> Result<NodeMut<'_, T>> {
        self.stored(handle)?;
        Ok(NodeMut { octree: self, handle })
    }
}

impl<T: PartialEq> Octree<T> {
    /// First node whose payload equals `object`, by linear scan
    pub fn find_first_node(&self, object: &T) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.object == *object)
            .map(|(handle, _)| handle)
    }
}

fn invalid_position(position: &Vec3) -> OctreeError {
    OctreeError::InvalidPosition {
        x: position.x,
        y: position.y,
        z: position.z,
    }
}

/// Shared view of a live node
#[derive(Debug)]
pub struct NodeRef<'a, T> {
    pub(crate) octree: &'a Octree<T>,
    pub(crate) handle: NodeHandle,
}

impl<T> Clone for NodeRef<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for NodeRef<'_, T> {}

impl<'a, T> NodeRef<'a, T> {
    /// Handle of the viewed node
    pub const fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Payload of the node
    pub fn object(&self) -> &'a T {
        &self.octree.nodes[self.handle].object
    }

    /// Position of the node
    pub fn position(&self) -> Vec3 {
        self.octree.nodes[self.handle].position
    }
}

/// Exclusive view of a live node
#[derive(Debug)]
pub struct NodeMut<'a, T> {
    octree: &'a mut Octree<T>,
    handle: NodeHandle,
}

impl<T> NodeMut<'_, T> {
    /// Handle of the viewed node
    pub const fn handle(&self) -> NodeHandle {
        self.handle
    }

    /// Payload of the node
    pub fn object(&self) -> &T {
        &self.octree.nodes[self.handle].object
    }

    /// Mutable payload of the node
    pub fn object_mut(&mut self) -> &mut T {
        &mut self.octree.nodes[self.handle].object
    }

    /// Position of the node
    pub fn position(&self) -> Vec3 {
        self.octree.nodes[self.handle].position
    }

    /// Move the node, see [`Octree::set_position`]
    pub fn set_position(&mut self, position: Vec3) -> Result<()> {
        self.octree.set_position(self.handle, position)
    }

    /// Remove the node and return its payload, see [`Octree::destroy`]
    pub fn destroy(self) -> Result<T> {
        self.octree.destroy(self.handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_octree() -> Octree<&'static str> {
        Octree::with_config(OctreeConfig::default().with_root_size(16.0).with_max_depth(3)).unwrap()
    }

    #[test]
    fn test_create_node_basic() {
        let mut octree = small_octree();
        let handle = octree.create_node(Vec3::new(1.0, 2.0, 3.0), "a").unwrap();

        assert_eq!(octree.len(), 1);
        assert_eq!(*octree.get_object(handle).unwrap(), "a");
        assert_eq!(octree.get_position(handle).unwrap(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(octree.root_count(), 1);
        assert_eq!(octree.region_count(), 4);
    }

    #[test]
    fn test_with_config_rejects_invalid_parameters() {
        let result = Octree::<()>::with_config(OctreeConfig::default().with_root_size(-4.0));
        assert!(matches!(result, Err(OctreeError::InvalidConfig(_))));
    }

    #[test]
    fn test_invalid_position_leaves_tree_untouched() {
        let mut octree = small_octree();
        let handle = octree.create_node(Vec3::zeros(), "a").unwrap();

        let created = octree.create_node(Vec3::new(f32::NAN, 0.0, 0.0), "b");
        assert!(matches!(created, Err(OctreeError::InvalidPosition { .. })));

        let moved = octree.set_position(handle, Vec3::new(0.0, f32::INFINITY, 0.0));
        assert!(matches!(moved, Err(OctreeError::InvalidPosition { .. })));

        assert_eq!(octree.len(), 1);
        assert_eq!(octree.region_count(), 4);
        assert_eq!(octree.get_position(handle).unwrap(), Vec3::zeros());
    }

    #[test]
    fn test_set_position_within_leaf_is_in_place() {
        let mut octree = small_octree();
        let handle = octree.create_node(Vec3::new(0.5, 0.5, 0.5), "a").unwrap();
        let leaf = octree.stored(handle).unwrap().leaf;

        octree.set_position(handle, Vec3::new(1.5, 1.0, 0.0)).unwrap();

        assert_eq!(octree.stored(handle).unwrap().leaf, leaf);
        assert_eq!(octree.get_position(handle).unwrap(), Vec3::new(1.5, 1.0, 0.0));
        assert_eq!(octree.region_count(), 4);
    }

    #[test]
    fn test_set_position_across_roots_prunes_old_root() {
        let mut octree = small_octree();
        let handle = octree.create_node(Vec3::new(1.0, 1.0, 1.0), "a").unwrap();

        octree.set_position(handle, Vec3::new(-40.0, 100.0, 7.0)).unwrap();

        assert_eq!(octree.root_count(), 1);
        assert_eq!(octree.region_count(), 4);
        let leaf = octree.stored(handle).unwrap().leaf;
        let region = octree.regions.get(leaf).unwrap();
        assert_eq!(region.cell, GridCoord::new(-3, 6, 0));
        assert!(region.cube.contains_point(&Vec3::new(-40.0, 100.0, 7.0)));
    }

    #[test]
    fn test_destroy_returns_payload_and_invalidates_handle() {
        let mut octree = small_octree();
        let handle = octree.create_node(Vec3::zeros(), "a").unwrap();

        assert_eq!(octree.destroy(handle).unwrap(), "a");
        assert!(octree.is_empty());
        assert_eq!(octree.region_count(), 0);
        assert_eq!(octree.root_count(), 0);

        assert!(matches!(octree.destroy(handle), Err(OctreeError::InvalidHandle)));
        assert!(matches!(octree.get_object(handle), Err(OctreeError::InvalidHandle)));
        assert!(matches!(octree.get_position(handle), Err(OctreeError::InvalidHandle)));
        assert!(matches!(octree.set_position(handle, Vec3::zeros()), Err(OctreeError::InvalidHandle)));
        assert!(matches!(octree.node(handle), Err(OctreeError::InvalidHandle)));
        assert!(!octree.contains(handle));
    }

    #[test]
    fn test_destroyed_handle_does_not_alias_new_node() {
        let mut octree = small_octree();
        let old = octree.create_node(Vec3::zeros(), "old").unwrap();
        octree.destroy(old).unwrap();
        let new = octree.create_node(Vec3::zeros(), "new").unwrap();

        assert!(matches!(octree.get_object(old), Err(OctreeError::InvalidHandle)));
        assert_eq!(*octree.get_object(new).unwrap(), "new");
    }

    #[test]
    fn test_clear_all_nodes() {
        let mut octree = small_octree();
        let handles: Vec<_> = (0..20)
            .map(|i| octree.create_node(Vec3::new(i as f32 * 5.0, 0.0, -(i as f32)), "x").unwrap())
            .collect();

        octree.clear_all_nodes();

        assert!(octree.is_empty());
        assert!(octree.get_all_nodes().is_empty());
        assert_eq!(octree.region_count(), 0);
        assert_eq!(octree.root_count(), 0);
        for handle in handles {
            assert!(matches!(octree.get_object(handle), Err(OctreeError::InvalidHandle)));
        }

        let handle = octree.create_node(Vec3::zeros(), "again").unwrap();
        assert_eq!(octree.get_all_nodes(), vec![handle]);
    }

    #[test]
    fn test_get_all_nodes_and_iter_agree() {
        let mut octree = small_octree();
        for i in 0..10 {
            octree.create_node(Vec3::new(i as f32 * 3.0, i as f32, 0.0), "x").unwrap();
        }
        let mut all = octree.get_all_nodes();
        let mut iterated: Vec<_> = octree.iter().map(|(handle, _, _)| handle).collect();
        all.sort();
        iterated.sort();
        assert_eq!(all, iterated);
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_find_first_node() {
        let mut octree = small_octree();
        octree.create_node(Vec3::zeros(), "a").unwrap();
        let b = octree.create_node(Vec3::new(50.0, 0.0, 0.0), "b").unwrap();

        assert_eq!(octree.find_first_node(&"b"), Some(b));
        assert_eq!(octree.find_first_node(&"c"), None);
    }

    #[test]
    fn test_node_views() {
        let mut octree: Octree<Vec<u32>> = Octree::new();
        let handle = octree.create_node(Vec3::new(1.0, 1.0, 1.0), vec![1]).unwrap();

        {
            let mut node = octree.node_mut(handle).unwrap();
            node.object_mut().push(2);
            node.set_position(Vec3::new(900.0, 0.0, 0.0)).unwrap();
            assert_eq!(node.position(), Vec3::new(900.0, 0.0, 0.0));
        }

        let node = octree.node(handle).unwrap();
        assert_eq!(node.handle(), handle);
        assert_eq!(node.object(), &vec![1, 2]);

        let payload = octree.node_mut(handle).unwrap().destroy().unwrap();
        assert_eq!(payload, vec![1, 2]);
        assert!(octree.is_empty());
        assert_eq!(octree.region_count(), 0);
        assert!(matches!(octree.node_mut(handle), Err(OctreeError::InvalidHandle)));
    }

    #[test]
    fn test_get_object_mut() {
        let mut octree: Octree<u32> = Octree::new();
        let handle = octree.create_node(Vec3::zeros(), 1).unwrap();
        *octree.get_object_mut(handle).unwrap() += 41;
        assert_eq!(*octree.get_object(handle).unwrap(), 42);
    }
}
