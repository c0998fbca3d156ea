//! The collection of Voronoi cells over a (possibly periodic) box domain:
//! parallel construction, point location and ray traversal.

use std::sync::Mutex;

use log::{debug, info};

use crate::error::{CoreError, Result};
use crate::geometry::{Box3, CoordinateVector};
use crate::jobs::JobMarket;
use crate::voronoi::cell::VoronoiCell;
use crate::voronoi::face::VoronoiFace;
use crate::voronoi::point_locations::PointLocations;
use crate::voronoi::{is_wall, wall_normal, VORONOI_MAX_INDEX};

pub struct VoronoiGrid {
    domain: Box3,
    periodic: [bool; 3],
    eps: f64,
    generator_positions: Vec<CoordinateVector>,
    cells: Vec<VoronoiCell>,
    point_locations: Option<PointLocations>,
    extended_positions: Vec<CoordinateVector>,
    extended_ids: Vec<usize>,
}

/// Outcome of the ray traversal primitive: either the id of the next cell
/// (or wall sentinel) along the ray, or a retry request when the packet
/// started marginally outside its cell.
pub enum NextFace {
    Found { distance: f64, neighbour_id: usize },
    Retry,
}

impl VoronoiGrid {
    pub fn new(domain: Box3, periodic: [bool; 3], eps: f64) -> Self {
        Self {
            domain,
            periodic,
            eps,
            generator_positions: Vec::new(),
            cells: Vec::new(),
            point_locations: None,
            extended_positions: Vec::new(),
            extended_ids: Vec::new(),
        }
    }

    pub fn domain(&self) -> Box3 {
        self.domain
    }

    pub fn len(&self) -> usize {
        self.generator_positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generator_positions.is_empty()
    }

    pub fn generator_position(&self, i: usize) -> CoordinateVector {
        self.generator_positions[i]
    }

    /// Appends a generator, returning its cell id.
    pub fn add_cell(&mut self, position: CoordinateVector) -> Result<usize> {
        if self.generator_positions.len() + 1 >= VORONOI_MAX_INDEX {
            return Err(CoreError::GeometryFailure(
                "too many generators: would collide with wall sentinel ids".to_string(),
            ));
        }
        let id = self.generator_positions.len();
        self.generator_positions.push(position);
        Ok(id)
    }

    /// Builds the point-location index and constructs every cell in
    /// parallel, `worksize` worker threads pulling batches of (at most)
    /// 100 cells at a time.
    pub fn compute_grid(&mut self, worksize: usize) -> Result<()> {
        let n = self.generator_positions.len();
        if n == 0 {
            self.cells = Vec::new();
            return Ok(());
        }
        info!("building voronoi grid: {n} generators, {worksize} workers");

        self.build_extended_positions();
        let location_domain = self.extended_domain();
        self.point_locations = Some(PointLocations::new(&self.extended_positions, &location_domain));

        let domain = self.domain;
        let eps = self.eps;
        let generator_positions = &self.generator_positions;
        let point_locations = self.point_locations.as_ref().expect("just built above");
        let extended_positions = &self.extended_positions;
        let extended_ids = &self.extended_ids;

        let results: Mutex<Vec<(usize, VoronoiCell)>> = Mutex::new(Vec::with_capacity(n));

        JobMarket::run(n, worksize.max(1), 100, |batch| {
            let mut local = Vec::with_capacity(batch.len());
            for i in batch {
                let mut cell = VoronoiCell::new(i, generator_positions[i], &domain);
                build_cell(&mut cell, i, generator_positions, point_locations, extended_positions, extended_ids, eps);
                local.push((i, cell));
            }
            results.lock().unwrap().extend(local);
        });

        let mut slots: Vec<Option<VoronoiCell>> = (0..n).map(|_| None).collect();
        for (i, cell) in results.into_inner().unwrap() {
            slots[i] = Some(cell);
        }
        self.cells = slots
            .into_iter()
            .enumerate()
            .map(|(i, c)| c.unwrap_or_else(|| panic!("job market dropped cell {i}")))
            .collect();

        debug!("voronoi grid constructed, finalizing cells");
        Ok(())
    }

    /// Invokes `finalize` on every cell and checks the volume-sum
    /// invariant.
    pub fn finalize(&mut self) -> Result<()> {
        for cell in &mut self.cells {
            cell.finalize(self.eps)?;
        }
        let total: f64 = self.cells.iter().map(|c| c.volume()).sum();
        let expected = self.domain.volume();
        let relative_error = ((total - expected) / expected).abs();
        if relative_error > 1e-12 {
            return Err(CoreError::GeometryFailure(format!(
                "voronoi finalize: cell volumes sum to {total}, expected {expected} \
                 (relative error {relative_error:e})"
            )));
        }
        info!("voronoi grid finalized: {} cells, volume error {relative_error:e}", self.cells.len());
        Ok(())
    }

    pub fn cell(&self, i: usize) -> &VoronoiCell {
        &self.cells[i]
    }

    pub fn cells(&self) -> &[VoronoiCell] {
        &self.cells
    }

    /// The id of the cell whose generator is nearest to `point`.
    pub fn get_index(&self, point: CoordinateVector) -> usize {
        let locations = self.point_locations.as_ref().expect("compute_grid must run first");
        let k = locations.nearest(&self.extended_positions, point);
        self.extended_ids[k]
    }

    pub fn get_faces(&self, i: usize) -> &[VoronoiFace] {
        self.cells[i].faces()
    }

    pub fn get_wall_normal(&self, sentinel: usize) -> CoordinateVector {
        wall_normal(sentinel)
    }

    /// The ray traversal primitive: given the ray `(p, d)` known to start
    /// inside cell `i`, finds the next face crossed.
    pub fn next_face(&self, i: usize, p: CoordinateVector, d: CoordinateVector) -> NextFace {
        let mut best: Option<(f64, usize)> = None;
        for face in self.cells[i].faces() {
            let n = face.neighbour_offset;
            let nk = n.dot(&d);
            if nk > 0.0 {
                let s = (n.dot(&(face.midpoint - p))).abs() / nk;
                if best.map_or(true, |(bs, _)| s < bs) {
                    best = Some((s, face.neighbour_id));
                }
            }
        }
        match best {
            Some((distance, neighbour_id)) => NextFace::Found { distance, neighbour_id },
            None => NextFace::Retry,
        }
    }

    fn build_extended_positions(&mut self) {
        let sides = self.domain.sides;
        let shifts_for_axis = |periodic: bool, side: f64| -> Vec<f64> {
            if periodic {
                vec![-side, 0.0, side]
            } else {
                vec![0.0]
            }
        };
        let dx = shifts_for_axis(self.periodic[0], sides.x());
        let dy = shifts_for_axis(self.periodic[1], sides.y());
        let dz = shifts_for_axis(self.periodic[2], sides.z());

        let n = self.generator_positions.len();
        let mut positions = Vec::with_capacity(n * dx.len() * dy.len() * dz.len());
        let mut ids = Vec::with_capacity(positions.capacity());
        for (i, g) in self.generator_positions.iter().enumerate() {
            for &sx in &dx {
                for &sy in &dy {
                    for &sz in &dz {
                        positions.push(*g + CoordinateVector::new(sx, sy, sz));
                        ids.push(i);
                    }
                }
            }
        }
        self.extended_positions = positions;
        self.extended_ids = ids;
    }

    /// A box enclosing every periodic image, used only to size the
    /// point-location buckets; real cell geometry is always clipped
    /// against the original (non-doubled) `domain`.
    fn extended_domain(&self) -> Box3 {
        let widen = |periodic: bool, side: f64| if periodic { 3.0 * side } else { side };
        let anchor_shift = |periodic: bool, side: f64| if periodic { -side } else { 0.0 };
        let sides = CoordinateVector::new(
            widen(self.periodic[0], self.domain.sides.x()),
            widen(self.periodic[1], self.domain.sides.y()),
            widen(self.periodic[2], self.domain.sides.z()),
        );
        let anchor = self.domain.anchor
            + CoordinateVector::new(
                anchor_shift(self.periodic[0], self.domain.sides.x()),
                anchor_shift(self.periodic[1], self.domain.sides.y()),
                anchor_shift(self.periodic[2], self.domain.sides.z()),
            );
        Box3::new(anchor, sides)
    }
}

fn build_cell(
    cell: &mut VoronoiCell,
    i: usize,
    generator_positions: &[CoordinateVector],
    point_locations: &PointLocations,
    extended_positions: &[CoordinateVector],
    extended_ids: &[usize],
    eps: f64,
) {
    let g_i = generator_positions[i];
    let min_bucket_extent = point_locations.min_bucket_extent();

    for (radius, shell) in point_locations.shells(g_i).enumerate() {
        for k in shell {
            let j = extended_ids[k];
            if j == i {
                continue;
            }
            let offset = extended_positions[k] - g_i;
            cell.intersect(offset, j, eps);
        }

        let processed_radius = radius as f64 * min_bucket_extent;
        if processed_radius * processed_radius > 4.0 * cell.max_radius_squared() {
            break;
        }
    }
    debug_assert!(!is_wall(i), "a real cell id collided with a wall sentinel");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_get_index_returns_the_generators_own_cell() {
        let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0));
        let mut grid = VoronoiGrid::new(domain, [false; 3], 1e-12);
        let positions = [
            CoordinateVector::new(0.2, 0.2, 0.2),
            CoordinateVector::new(0.8, 0.2, 0.2),
            CoordinateVector::new(0.5, 0.7, 0.3),
            CoordinateVector::new(0.3, 0.6, 0.8),
        ];
        for p in positions {
            grid.add_cell(p).unwrap();
        }
        grid.compute_grid(2).unwrap();
        for (i, p) in positions.iter().enumerate() {
            assert_eq!(grid.get_index(*p), i);
        }
    }

    #[test]
    fn cell_volumes_sum_to_the_box_volume() {
        let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0));
        let mut grid = VoronoiGrid::new(domain, [false; 3], 1e-12);
        let mut x = 0.137_f64;
        for _ in 0..64 {
            x = (x * 97.0 + 0.013) % 1.0;
            let mut y = (x * 53.0 + 0.027) % 1.0;
            y = y.abs();
            let mut z = (x * 71.0 + 0.091) % 1.0;
            z = z.abs();
            grid.add_cell(CoordinateVector::new(x, y, z)).unwrap();
        }
        grid.compute_grid(3).unwrap();
        grid.finalize().unwrap();
        let total: f64 = grid.cells().iter().map(|c| c.volume()).sum();
        assert!((total - domain.volume()).abs() / domain.volume() < 1e-9);
    }

    #[test]
    fn a_single_cell_grid_exits_through_the_box_wall() {
        let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0));
        let mut grid = VoronoiGrid::new(domain, [false; 3], 1e-12);
        grid.add_cell(CoordinateVector::splat(0.5)).unwrap();
        grid.compute_grid(1).unwrap();
        grid.finalize().unwrap();

        let p = CoordinateVector::splat(0.5);
        let d = CoordinateVector::new(1.0, 0.0, 0.0);
        match grid.next_face(0, p, d) {
            NextFace::Found { distance, neighbour_id } => {
                assert!(is_wall(neighbour_id));
                assert!((distance - 0.5).abs() < 1e-9);
            }
            NextFace::Retry => panic!("expected a crossing, got a retry request"),
        }
    }
}
