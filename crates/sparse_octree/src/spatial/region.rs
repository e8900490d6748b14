//! Bounded regions: the cube-shaped nodes of each root's subtree
//!
//! Regions live in a slot map arena. Internal regions own up to eight child
//! keys (one per octant), leaves sit at exactly `max_depth` and own an
//! unordered list of stored node handles. Children are created lazily on the
//! first insertion into their octant and pruned as soon as their subtree
//! becomes empty.

use crate::foundation::collections::{GridCoord, NodeHandle, RegionArena, RegionKey};
use crate::foundation::math::{Cube, Vec3};

/// Single region in the octree hierarchy
#[derive(Debug, Clone)]
pub struct BoundedRegion {
    /// World-space cube covered by this region
    pub cube: Cube,

    /// Depth in the tree (0 = root)
    pub depth: u32,

    /// Grid cell of the root this region descends from
    pub cell: GridCoord,

    /// Parent region and the octant this region occupies in it; `None` for roots
    pub parent: Option<(RegionKey, usize)>,

    /// Child regions by octant, only ever populated below `max_depth`
    pub children: [Option<RegionKey>; 8],

    /// Nodes stored directly in this region, only ever populated at `max_depth`
    pub nodes: Vec<NodeHandle>,
}

impl BoundedRegion {
    fn new(cube: Cube, depth: u32, cell: GridCoord, parent: Option<(RegionKey, usize)>) -> Self {
        Self {
            cube,
            depth,
            cell,
            parent,
            children: [None; 8],
            nodes: Vec::new(),
        }
    }

    /// Number of child regions currently present
    pub fn child_count(&self) -> usize {
        self.children.iter().flatten().count()
    }

    /// Check if nothing is stored in or below this region
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.children.iter().all(Option::is_none)
    }
}

/// Arena holding every region of an octree
#[derive(Debug, Clone)]
pub struct RegionTree {
    arena: RegionArena<BoundedRegion>,
    max_depth: u32,
}

impl RegionTree {
    /// Create an empty tree whose leaves sit at `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            arena: RegionArena::with_key(),
            max_depth,
        }
    }

    /// Depth of the leaf regions
    pub const fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Look up a region
    pub fn get(&self, key: RegionKey) -> Option<&BoundedRegion> {
        self.arena.get(key)
    }

    /// Iterate every region in the arena (order unspecified)
    pub fn iter(&self) -> impl Iterator<Item = (RegionKey, &BoundedRegion)> {
        self.arena.iter()
    }

    /// Total number of regions, roots included
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Check if the tree holds no regions
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Drop every region
    pub fn clear(&mut self) {
        self.arena.clear();
    }

    /// Create a depth-0 region for a grid cell
    pub fn create_root(&mut self, cube: Cube, cell: GridCoord) -> RegionKey {
        self.arena.insert(BoundedRegion::new(cube, 0, cell, None))
    }

    /// Insert a node below `root`, creating missing regions on the way down
    ///
    /// The position must lie inside the root's cube. Returns the leaf the
    /// node was appended to.
    pub fn insert(&mut self, root: RegionKey, handle: NodeHandle, position: &Vec3) -> RegionKey {
        let leaf = self.descend_or_create(root, position);
        self.arena[leaf].nodes.push(handle);
        leaf
    }

    fn descend_or_create(&mut self, root: RegionKey, position: &Vec3) -> RegionKey {
        let mut current = root;
        loop {
            let region = &self.arena[current];
            if region.depth >= self.max_depth {
                return current;
            }

            let octant = region.cube.octant_index(position);
            current = match region.children[octant] {
                Some(child) => child,
                None => {
                    let child = BoundedRegion::new(
                        region.cube.octant(octant),
                        region.depth + 1,
                        region.cell,
                        Some((current, octant)),
                    );
                    let child_key = self.arena.insert(child);
                    self.arena[current].children[octant] = Some(child_key);
                    child_key
                }
            };
        }
    }

    /// Remove a node from `leaf` and prune the chain of regions left empty
    ///
    /// Returns the grid cell of the root when the root itself was pruned, so
    /// the caller can drop it from the grid.
    pub fn remove(&mut self, leaf: RegionKey, handle: NodeHandle) -> Option<GridCoord> {
        let region = self.arena.get_mut(leaf)?;
        if let Some(index) = region.nodes.iter().position(|&h| h == handle) {
            region.nodes.swap_remove(index);
        }

        let mut current = leaf;
        loop {
            let region = &self.arena[current];
            if !region.is_empty() {
                return None;
            }

            let parent = region.parent;
            let cell = region.cell;
            self.arena.remove(current);

            match parent {
                Some((parent_key, octant)) => {
                    self.arena[parent_key].children[octant] = None;
                    current = parent_key;
                }
                None => return Some(cell),
            }
        }
    }

    /// Check if a fresh insertion of `position` below this leaf's root would
    /// land in `leaf` again
    pub fn routes_to(&self, leaf: RegionKey, position: &Vec3) -> bool {
        let mut current = leaf;
        while let Some((parent, octant)) = self.arena[current].parent {
            if self.arena[parent].cube.octant_index(position) != octant {
                return false;
            }
            current = parent;
        }
        true
    }

    /// Visit every node stored in a leaf whose cube comes within `reach` of
    /// `center`
    ///
    /// Subtrees whose cube lies entirely farther away are skipped. The
    /// visitor receives every node of a reached leaf and is expected to do
    /// the exact distance test itself.
    pub fn query<F>(&self, key: RegionKey, center: &Vec3, reach: f64, visitor: &mut F)
    where
        F: FnMut(NodeHandle),
    {
        let region = &self.arena[key];
        if !region.cube.intersects_sphere(center, reach) {
            return;
        }

        for &handle in &region.nodes {
            visitor(handle);
        }
        for &child in region.children.iter().flatten() {
            self.query(child, center, reach, visitor);
        }
    }

    /// Collect every node stored in the subtree of `key`
    pub fn collect_nodes(&self, key: RegionKey, out: &mut Vec<NodeHandle>) {
        let region = &self.arena[key];
        out.extend_from_slice(&region.nodes);
        for &child in region.children.iter().flatten() {
            self.collect_nodes(child, out);
        }
    }
}
