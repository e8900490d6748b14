//! Math utilities and types
//!
//! Provides the vector type used for positions and the axis-aligned cube
//! geometry every region is built from.

pub use nalgebra::Vector3;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// Returns true if every component of `v` is finite (no NaN or infinity)
pub fn is_finite(v: &Vec3) -> bool {
    v.x.is_finite() && v.y.is_finite() && v.z.is_finite()
}

/// Double precision vector used for region bounds
pub type DVec3 = Vector3<f64>;

/// Widening of a search radius relative to its length
const REACH_RELATIVE_SLACK: f64 = 1.0e-5;

/// Widening covering `f32` squared distances that underflow
const REACH_ABSOLUTE_SLACK: f64 = 1.0e-18;

/// Upper bound on the distance of any point that the `f32` test
/// `squared_distance <= radius * radius` accepts
///
/// Rounding lets that test accept points marginally outside `radius`, so
/// region pruning works against this widened bound instead.
pub fn search_reach(radius: f32) -> f64 {
    if (radius * radius).is_infinite() {
        return f64::INFINITY;
    }
    f64::from(radius).mul_add(1.0 + REACH_RELATIVE_SLACK, REACH_ABSOLUTE_SLACK)
}

/// Axis-aligned cube stored as its corner bounds in `f64`
///
/// The cube is closed: points lying exactly on a face are inside it.
/// Octants split the cube at its computed center, so the children of a cube
/// tile it exactly and a point always lies inside the octant it routes to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cube {
    /// Minimum corner
    pub min: DVec3,
    /// Maximum corner
    pub max: DVec3,
}

impl Cube {
    /// Create a cube from its corners
    pub const fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    /// Center of the cube
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Half of the edge length along x
    pub fn half_size(&self) -> f64 {
        (self.max.x - self.min.x) * 0.5
    }

    /// Point of the cube closest to `point`
    fn closest_point(&self, point: &DVec3) -> DVec3 {
        point.sup(&self.min).inf(&self.max)
    }

    /// Check if this cube contains a point (closed interval on every axis)
    pub fn contains_point(&self, point: &Vec3) -> bool {
        let point = point.cast::<f64>();
        self.closest_point(&point) == point
    }

    /// Squared distance from `point` to the nearest point of the cube
    ///
    /// Zero when the point is inside the cube.
    pub fn distance_squared_to_point(&self, point: &Vec3) -> f64 {
        let point = point.cast::<f64>();
        (self.closest_point(&point) - point).magnitude_squared()
    }

    /// Check if the cube comes within `reach` of `center`
    pub fn intersects_sphere(&self, center: &Vec3, reach: f64) -> bool {
        self.distance_squared_to_point(center) <= reach * reach
    }

    /// Get the octant index (0-7) a position falls into
    ///
    /// An offset of exactly zero along an axis selects the upper half, so
    /// every position maps to exactly one octant.
    pub fn octant_index(&self, position: &Vec3) -> usize {
        let center = self.center();
        let x_bit = usize::from(f64::from(position.x) >= center.x);
        let y_bit = usize::from(f64::from(position.y) >= center.y);
        let z_bit = usize::from(f64::from(position.z) >= center.z);

        // Octant layout:
        // 0: -X, -Y, -Z    4: -X, -Y, +Z
        // 1: +X, -Y, -Z    5: +X, -Y, +Z
        // 2: -X, +Y, -Z    6: -X, +Y, +Z
        // 3: +X, +Y, -Z    7: +X, +Y, +Z
        (z_bit << 2) | (y_bit << 1) | x_bit
    }

    /// Cube of the given octant, bounded by this cube's faces and center
    pub fn octant(&self, octant: usize) -> Self {
        let center = self.center();
        let mut min = self.min;
        let mut max = self.max;
        for axis in 0..3 {
            if octant & (1 << axis) != 0 {
                min[axis] = center[axis];
            } else {
                max[axis] = center[axis];
            }
        }
        Self::new(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cube(min: f64, max: f64) -> Cube {
        Cube::new(DVec3::repeat(min), DVec3::repeat(max))
    }

    #[test]
    fn test_finite_check() {
        assert!(is_finite(&Vec3::new(1.0, -2.0, 3.0)));
        assert!(!is_finite(&Vec3::new(f32::NAN, 0.0, 0.0)));
        assert!(!is_finite(&Vec3::new(0.0, f32::INFINITY, 0.0)));
        assert!(!is_finite(&Vec3::new(0.0, 0.0, f32::NEG_INFINITY)));
    }

    #[test]
    fn test_cube_contains_faces() {
        let cube = cube(-1.0, 1.0);
        assert!(cube.contains_point(&Vec3::new(1.0, -1.0, 0.0)));
        assert!(!cube.contains_point(&Vec3::new(1.001, 0.0, 0.0)));
        assert!(!cube.contains_point(&Vec3::new(0.0, 0.0, -1.001)));
    }

    #[test]
    fn test_distance_squared_to_point() {
        let cube = cube(-1.0, 1.0);
        assert_relative_eq!(cube.distance_squared_to_point(&Vec3::new(0.5, 0.5, 0.5)), 0.0);
        assert_relative_eq!(cube.distance_squared_to_point(&Vec3::new(3.0, 0.0, 0.0)), 4.0);
        assert_relative_eq!(cube.distance_squared_to_point(&Vec3::new(2.0, 2.0, 0.0)), 2.0);
        assert!(cube.intersects_sphere(&Vec3::new(3.0, 0.0, 0.0), 2.0));
        assert!(!cube.intersects_sphere(&Vec3::new(3.0, 0.0, 0.0), 1.9));
    }

    #[test]
    fn test_search_reach_covers_rounding() {
        assert!(search_reach(0.0) > 0.0);
        assert!(search_reach(10.0) > 10.0);
        assert!(search_reach(10.0) < 10.001);
        assert_eq!(search_reach(f32::INFINITY), f64::INFINITY);
        // Squaring overflows f32, so the f32 test accepts every finite distance
        assert_eq!(search_reach(1.0e20), f64::INFINITY);
    }

    #[test]
    fn test_octant_boundary_goes_to_upper_half() {
        let cube = cube(-1.0, 1.0);
        assert_eq!(cube.octant_index(&Vec3::zeros()), 7);
        assert_eq!(cube.octant_index(&Vec3::new(-0.1, 0.0, -0.1)), 2);
        assert_eq!(cube.octant_index(&Vec3::new(0.5, -0.5, 0.5)), 5);
    }

    #[test]
    fn test_octants_partition_parent() {
        let cube = cube(0.0, 16.0);
        for octant in 0..8 {
            let child = cube.octant(octant);
            assert_relative_eq!(child.half_size(), 4.0);
            let center = child.center();
            let center = Vec3::new(center.x as f32, center.y as f32, center.z as f32);
            assert_eq!(cube.octant_index(&center), octant);
            assert!(child.min.iter().zip(cube.min.iter()).all(|(c, p)| c >= p));
            assert!(child.max.iter().zip(cube.max.iter()).all(|(c, p)| c <= p));
        }
    }

    #[test]
    fn test_routed_octant_contains_point_at_large_magnitude() {
        // Cell 8388609 of a 512 grid: f32 spacing here is 512, wider than any leaf
        let origin = 4_294_967_808.0;
        let mut region = cube(origin, origin + 512.0);
        let point = Vec3::repeat(4_294_967_808.0);
        for _ in 0..4 {
            region = region.octant(region.octant_index(&point));
            assert!(region.contains_point(&point));
            assert_eq!(region.distance_squared_to_point(&point), 0.0);
        }
    }

    #[test]
    fn test_routed_octant_contains_point_with_uneven_size() {
        let region = cube(0.3 * 7.0, 0.3 * 8.0);
        for step in 0..=16 {
            let value = (0.3 * 7.0 + f64::from(step) * 0.3 / 16.0) as f32;
            let point = Vec3::repeat(value);
            if !region.contains_point(&point) {
                continue;
            }
            let mut current = region;
            for _ in 0..4 {
                current = current.octant(current.octant_index(&point));
                assert!(current.contains_point(&point), "lost {value} below {current:?}");
            }
        }
    }
}
