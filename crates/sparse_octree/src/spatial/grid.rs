//! Sparse world grid of root regions
//!
//! Space is cut into cubes of `root_size` on an unbounded integer lattice.
//! Only cells that currently hold nodes have an entry, so memory follows the
//! occupied volume rather than the world extent.

use std::collections::hash_map;
use std::collections::HashMap;

use crate::foundation::collections::{GridCoord, RegionKey};
use crate::foundation::math::{Cube, DVec3, Vec3};

/// Largest cell index magnitude the grid addresses; below this neighbouring
/// cell bounds stay distinct in `f64`.
const MAX_CELL_INDEX: f64 = 1_125_899_906_842_624.0; // 2^50

/// Mapping from grid cell to root region
#[derive(Debug, Clone)]
pub struct RegionGrid {
    root_size: f64,
    cells: HashMap<GridCoord, RegionKey>,
}

impl RegionGrid {
    /// Create an empty grid with the given cell edge length
    pub fn new(root_size: f32) -> Self {
        Self {
            root_size: f64::from(root_size),
            cells: HashMap::new(),
        }
    }

    /// Lower bound of cell `index` along one axis
    fn cell_min(&self, index: f64) -> f64 {
        index * self.root_size
    }

    /// Index of the cell whose half-open span `[cell_min(i), cell_min(i + 1))`
    /// holds `value`
    ///
    /// The floor estimate is corrected against the very bounds `cell_cube`
    /// reports, which keeps the mapping monotone in `value`.
    fn cell_index(&self, value: f64) -> Option<f64> {
        let mut index = (value / self.root_size).floor();
        if !index.is_finite() || index.abs() > MAX_CELL_INDEX {
            return None;
        }
        while self.cell_min(index) > value {
            index -= 1.0;
        }
        while self.cell_min(index + 1.0) <= value {
            index += 1.0;
        }
        Some(index)
    }

    /// Cell containing `position`, or `None` when the position is not finite
    /// or too far out for the grid to address
    pub fn cell_of(&self, position: &Vec3) -> Option<GridCoord> {
        let index = |value: f32| self.cell_index(f64::from(value)).map(|cell| cell as i64);
        Some(GridCoord::new(index(position.x)?, index(position.y)?, index(position.z)?))
    }

    /// World-space cube of a cell
    ///
    /// Contains every position [`RegionGrid::cell_of`] maps to the cell.
    pub fn cell_cube(&self, cell: GridCoord) -> Cube {
        let lo = |index: i64| self.cell_min(index as f64);
        let hi = |index: i64| self.cell_min(index as f64 + 1.0);
        Cube::new(
            DVec3::new(lo(cell.x), lo(cell.y), lo(cell.z)),
            DVec3::new(hi(cell.x), hi(cell.y), hi(cell.z)),
        )
    }

    /// Root region of a cell, if the cell is occupied
    pub fn get(&self, cell: GridCoord) -> Option<RegionKey> {
        self.cells.get(&cell).copied()
    }

    /// Register the root region of a cell
    pub fn insert(&mut self, cell: GridCoord, root: RegionKey) {
        self.cells.insert(cell, root);
    }

    /// Forget the root region of a cell
    pub fn remove(&mut self, cell: GridCoord) -> Option<RegionKey> {
        self.cells.remove(&cell)
    }

    /// Number of occupied cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell is occupied
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drop every cell
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Iterate occupied cells and their roots (order unspecified)
    pub fn roots(&self) -> impl Iterator<Item = (GridCoord, RegionKey)> + '_ {
        self.cells.iter().map(|(&cell, &root)| (cell, root))
    }

    /// Lazily enumerate roots whose cube comes within `reach` of `center`
    ///
    /// Walks the cell range covering the sphere's bounding box when that
    /// range is no larger than the number of occupied cells, and walks the
    /// occupied cells otherwise. Either way empty cells cost a single lookup
    /// at most and are never materialized.
    pub fn enumerate_intersecting(&self, center: &Vec3, reach: f64) -> IntersectingRoots<'_> {
        let scan = self
            .cell_range(center, reach)
            .map_or_else(|| Scan::Occupied(self.cells.iter()), |(lo, hi)| Scan::Range {
                lo,
                hi,
                next: Some(lo),
            });

        IntersectingRoots {
            grid: self,
            center: *center,
            reach,
            scan,
        }
    }

    /// Inclusive cell range covering `[center - reach, center + reach]`,
    /// or `None` when walking the occupied cells is cheaper
    fn cell_range(&self, center: &Vec3, reach: f64) -> Option<(GridCoord, GridCoord)> {
        let bounds = |value: f32| {
            let lo = self.cell_index(f64::from(value) - reach)?;
            let hi = self.cell_index(f64::from(value) + reach)?;
            Some((lo, hi))
        };
        let (x0, x1) = bounds(center.x)?;
        let (y0, y1) = bounds(center.y)?;
        let (z0, z1) = bounds(center.z)?;

        let volume = (x1 - x0 + 1.0) * (y1 - y0 + 1.0) * (z1 - z0 + 1.0);
        if volume > self.cells.len() as f64 {
            return None;
        }

        Some((
            GridCoord::new(x0 as i64, y0 as i64, z0 as i64),
            GridCoord::new(x1 as i64, y1 as i64, z1 as i64),
        ))
    }
}

enum Scan<'a> {
    Range {
        lo: GridCoord,
        hi: GridCoord,
        next: Option<GridCoord>,
    },
    Occupied(hash_map::Iter<'a, GridCoord, RegionKey>),
}

/// Iterator over the roots intersecting a query sphere
///
/// Returned by [`RegionGrid::enumerate_intersecting`].
pub struct IntersectingRoots<'a> {
    grid: &'a RegionGrid,
    center: Vec3,
    reach: f64,
    scan: Scan<'a>,
}

impl Iterator for IntersectingRoots<'_> {
    type Item = RegionKey;

    fn next(&mut self) -> Option<RegionKey> {
        loop {
            let (cell, root) = match &mut self.scan {
                Scan::Range { lo, hi, next } => {
                    let cell = (*next)?;
                    *next = step_cell(cell, *lo, *hi);
                    match self.grid.get(cell) {
                        Some(root) => (cell, root),
                        None => continue,
                    }
                }
                Scan::Occupied(cells) => {
                    let (&cell, &root) = cells.next()?;
                    (cell, root)
                }
            };

            if self.grid.cell_cube(cell).intersects_sphere(&self.center, self.reach) {
                return Some(root);
            }
        }
    }
}

/// Next cell of an inclusive range in x-major order, `None` past the end
fn step_cell(cell: GridCoord, lo: GridCoord, hi: GridCoord) -> Option<GridCoord> {
    if cell.x < hi.x {
        return Some(GridCoord::new(cell.x + 1, cell.y, cell.z));
    }
    if cell.y < hi.y {
        return Some(GridCoord::new(lo.x, cell.y + 1, cell.z));
    }
    if cell.z < hi.z {
        return Some(GridCoord::new(lo.x, lo.y, cell.z + 1));
    }
    None
}
