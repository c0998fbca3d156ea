//! A bucketed uniform grid over generator positions, supporting the
//! expanding-radius-shell neighbour queries that `VoronoiGrid` needs both
//! to construct cells and to answer `get_index`.

use crate::geometry::{Box3, CoordinateVector};

pub struct PointLocations {
    anchor: CoordinateVector,
    bucket_size: CoordinateVector,
    dims: [usize; 3],
    buckets: Vec<Vec<usize>>,
}

impl PointLocations {
    /// Builds an index over `positions`, sizing buckets so each holds
    /// roughly 10 generators on average.
    pub fn new(positions: &[CoordinateVector], domain: &Box3) -> Self {
        let target_buckets = (positions.len() as f64 / 10.0).max(1.0);
        let linear = target_buckets.cbrt().ceil().max(1.0) as usize;
        let dims = [linear, linear, linear];
        let bucket_size = CoordinateVector::new(
            domain.sides.x() / dims[0] as f64,
            domain.sides.y() / dims[1] as f64,
            domain.sides.z() / dims[2] as f64,
        );

        let mut locations = Self {
            anchor: domain.anchor,
            bucket_size,
            dims,
            buckets: vec![Vec::new(); dims[0] * dims[1] * dims[2]],
        };
        for (i, p) in positions.iter().enumerate() {
            let idx = locations.flat_index(locations.bucket_coords(*p));
            locations.buckets[idx].push(i);
        }
        locations
    }

    fn bucket_coords(&self, p: CoordinateVector) -> (i64, i64, i64) {
        let rel = p - self.anchor;
        let clamp = |v: f64, dim: usize| {
            (v.floor() as i64).clamp(0, dim as i64 - 1)
        };
        (
            clamp(rel.x() / self.bucket_size.x(), self.dims[0]),
            clamp(rel.y() / self.bucket_size.y(), self.dims[1]),
            clamp(rel.z() / self.bucket_size.z(), self.dims[2]),
        )
    }

    fn flat_index(&self, (bx, by, bz): (i64, i64, i64)) -> usize {
        bx as usize + by as usize * self.dims[0] + bz as usize * self.dims[0] * self.dims[1]
    }

    /// The smallest bucket extent along any axis; a conservative distance
    /// unit for shell-based termination criteria.
    pub fn min_bucket_extent(&self) -> f64 {
        self.bucket_size.x().min(self.bucket_size.y()).min(self.bucket_size.z())
    }

    /// Iterates shells of bucket indices (Chebyshev rings) around `p`'s
    /// bucket, from radius 0 outward, until the grid edge is exceeded.
    pub fn shells(&self, p: CoordinateVector) -> Shells<'_> {
        Shells {
            locations: self,
            center: self.bucket_coords(p),
            radius: 0,
            max_radius: (self.dims[0].max(self.dims[1]).max(self.dims[2])) as i64,
        }
    }

    /// Index of the generator nearest to `query`, breaking ties by the
    /// lowest index.
    pub fn nearest(&self, positions: &[CoordinateVector], query: CoordinateVector) -> usize {
        let mut best: Option<(usize, f64)> = None;
        let mut extra_shells_after_match = 0;
        for shell in self.shells(query) {
            for idx in shell {
                let d2 = (positions[idx] - query).norm2();
                if best.map_or(true, |(_, bd2)| d2 < bd2) {
                    best = Some((idx, d2));
                }
            }
            if best.is_some() {
                extra_shells_after_match += 1;
                if extra_shells_after_match > 1 {
                    break;
                }
            }
        }
        best.map_or(0, |(idx, _)| idx)
    }
}

pub struct Shells<'a> {
    locations: &'a PointLocations,
    center: (i64, i64, i64),
    radius: i64,
    max_radius: i64,
}

impl Iterator for Shells<'_> {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.radius > self.max_radius {
            return None;
        }
        let r = self.radius;
        let (cx, cy, cz) = self.center;
        let mut out = Vec::new();
        for dx in -r..=r {
            for dy in -r..=r {
                for dz in -r..=r {
                    if dx.abs() != r && dy.abs() != r && dz.abs() != r {
                        continue;
                    }
                    let (x, y, z) = (cx + dx, cy + dy, cz + dz);
                    if x < 0 || y < 0 || z < 0 {
                        continue;
                    }
                    let (x, y, z) = (x as usize, y as usize, z as usize);
                    if x >= self.locations.dims[0]
                        || y >= self.locations.dims[1]
                        || z >= self.locations.dims[2]
                    {
                        continue;
                    }
                    let idx = x + y * self.locations.dims[0] + z * self.locations.dims[0] * self.locations.dims[1];
                    out.extend_from_slice(&self.locations.buckets[idx]);
                }
            }
        }
        self.radius += 1;
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_finds_the_closest_of_a_handful_of_points() {
        let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0));
        let positions = vec![
            CoordinateVector::new(0.1, 0.1, 0.1),
            CoordinateVector::new(0.9, 0.9, 0.9),
            CoordinateVector::new(0.5, 0.5, 0.5),
        ];
        let locations = PointLocations::new(&positions, &domain);
        let nearest = locations.nearest(&positions, CoordinateVector::new(0.85, 0.85, 0.85));
        assert_eq!(nearest, 1);
    }

    #[test]
    fn every_generator_is_its_own_nearest_neighbour() {
        let domain = Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0));
        let positions: Vec<_> = (0..50)
            .map(|i| CoordinateVector::new((i as f64 * 0.123) % 1.0, (i as f64 * 0.456) % 1.0, (i as f64 * 0.789) % 1.0))
            .collect();
        let locations = PointLocations::new(&positions, &domain);
        for (i, p) in positions.iter().enumerate() {
            assert_eq!(locations.nearest(&positions, *p), i);
        }
    }
}
