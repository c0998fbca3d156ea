//! The Voronoi spatial partition: cell geometry, grid construction, point
//! location and ray traversal.

pub mod cell;
pub mod face;
pub mod grid;
pub mod point_locations;

pub use cell::VoronoiCell;
pub use face::VoronoiFace;
pub use grid::VoronoiGrid;

use crate::geometry::CoordinateVector;

/// Any neighbour id at or above this value denotes a wall, not a real
/// neighbour cell.
pub const VORONOI_MAX_INDEX: usize = usize::MAX - 8;

pub const WALL_LEFT: usize = VORONOI_MAX_INDEX;
pub const WALL_RIGHT: usize = VORONOI_MAX_INDEX + 1;
pub const WALL_FRONT: usize = VORONOI_MAX_INDEX + 2;
pub const WALL_BACK: usize = VORONOI_MAX_INDEX + 3;
pub const WALL_BOTTOM: usize = VORONOI_MAX_INDEX + 4;
pub const WALL_TOP: usize = VORONOI_MAX_INDEX + 5;

pub const WALL_SENTINELS: [usize; 6] =
    [WALL_LEFT, WALL_RIGHT, WALL_FRONT, WALL_BACK, WALL_BOTTOM, WALL_TOP];

pub fn is_wall(neighbour_id: usize) -> bool {
    neighbour_id >= VORONOI_MAX_INDEX
}

/// The outward unit normal of a wall sentinel.
pub fn wall_normal(sentinel: usize) -> CoordinateVector {
    match sentinel {
        WALL_LEFT => CoordinateVector::new(-1.0, 0.0, 0.0),
        WALL_RIGHT => CoordinateVector::new(1.0, 0.0, 0.0),
        WALL_FRONT => CoordinateVector::new(0.0, -1.0, 0.0),
        WALL_BACK => CoordinateVector::new(0.0, 1.0, 0.0),
        WALL_BOTTOM => CoordinateVector::new(0.0, 0.0, -1.0),
        WALL_TOP => CoordinateVector::new(0.0, 0.0, 1.0),
        _ => unreachable!("{sentinel} is not a wall sentinel"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_sentinels_are_all_at_or_above_the_threshold() {
        for s in WALL_SENTINELS {
            assert!(is_wall(s));
        }
        assert!(!is_wall(0));
        assert!(!is_wall(VORONOI_MAX_INDEX - 1));
    }
}
