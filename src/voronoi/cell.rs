//! A single Voronoi polyhedron, built by successively clipping a box by
//! the perpendicular bisector planes of nearby generators.

use crate::error::{CoreError, Result};
use crate::geometry::{Box3, CoordinateVector};
use crate::voronoi::face::VoronoiFace;
use crate::voronoi::{wall_normal, WALL_SENTINELS};

/// A convex polygon, vertices in cyclic order as seen from outside the
/// cell (i.e. in the direction the face's outward normal points).
struct RawFace {
    vertices: Vec<CoordinateVector>,
    neighbour_id: usize,
    neighbour_offset: CoordinateVector,
}

pub struct VoronoiCell {
    index: usize,
    generator: CoordinateVector,
    raw_faces: Vec<RawFace>,
    faces: Vec<VoronoiFace>,
    volume: f64,
    centroid: CoordinateVector,
    finalized: bool,
}

impl VoronoiCell {
    /// A new cell, initialised as the bounding box polyhedron.
    pub fn new(index: usize, generator: CoordinateVector, domain: &Box3) -> Self {
        Self {
            index,
            generator,
            raw_faces: box_faces(domain),
            faces: Vec::new(),
            volume: 0.0,
            centroid: generator,
            finalized: false,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generator(&self) -> CoordinateVector {
        self.generator
    }

    /// Squared distance from the generator to the farthest current vertex.
    /// Valid before *and* after `finalize` is unnecessary: callers only
    /// need this during construction, while the vertex representation is
    /// still live.
    pub fn max_radius_squared(&self) -> f64 {
        self.raw_faces
            .iter()
            .flat_map(|f| f.vertices.iter())
            .map(|v| (*v - self.generator).norm2())
            .fold(0.0, f64::max)
    }

    /// Clips the polyhedron by the perpendicular bisector of `generator`
    /// and `generator + offset`, tagging the new face with `neighbour_id`.
    pub fn intersect(&mut self, offset: CoordinateVector, neighbour_id: usize, eps: f64) {
        debug_assert!(
            offset.norm2() > 0.0,
            "VoronoiCell::intersect called with a degenerate offset"
        );
        let threshold = 0.5 * offset.norm2();
        let generator = self.generator;
        let signed_distance = |p: CoordinateVector| offset.dot(&(p - generator)) - threshold;

        let mut cap_edges: Vec<(CoordinateVector, CoordinateVector)> = Vec::new();
        let mut kept = Vec::with_capacity(self.raw_faces.len() + 1);

        for face in self.raw_faces.drain(..) {
            let n = face.vertices.len();
            let mut new_vertices = Vec::with_capacity(n + 1);
            let mut pending_crossing: Option<CoordinateVector> = None;

            for k in 0..n {
                let cur = face.vertices[k];
                let next = face.vertices[(k + 1) % n];
                let d_cur = signed_distance(cur);
                let d_next = signed_distance(next);
                let cur_inside = d_cur <= eps;
                let next_inside = d_next <= eps;

                if cur_inside {
                    new_vertices.push(cur);
                }
                if cur_inside != next_inside {
                    let t = d_cur / (d_cur - d_next);
                    let crossing = cur + (next - cur) * t;
                    new_vertices.push(crossing);
                    match pending_crossing.take() {
                        None => pending_crossing = Some(crossing),
                        Some(start) => cap_edges.push((start, crossing)),
                    }
                }
            }

            if new_vertices.len() >= 3 {
                kept.push(RawFace {
                    vertices: new_vertices,
                    neighbour_id: face.neighbour_id,
                    neighbour_offset: face.neighbour_offset,
                });
            }
        }

        self.raw_faces = kept;

        if let Some(cap_vertices) = chain_cap_edges(&cap_edges, eps) {
            if cap_vertices.len() >= 3 {
                let oriented = orient_towards(cap_vertices, offset);
                self.raw_faces.push(RawFace {
                    vertices: oriented,
                    neighbour_id,
                    neighbour_offset: offset,
                });
            }
        }
    }

    /// Computes volume, centroid, and the finalized face list by
    /// tetrahedral decomposition from the generator. Discards the
    /// vertex/edge representation.
    pub fn finalize(&mut self, eps: f64) -> Result<()> {
        let mut faces = Vec::with_capacity(self.raw_faces.len());
        let mut total_volume = 0.0;
        let mut centroid_accum = CoordinateVector::ZERO;

        for raw in &self.raw_faces {
            if raw.vertices.len() < 3 {
                continue;
            }
            let v0 = raw.vertices[0];
            let mut face_area = 0.0;
            let mut face_midpoint_accum = CoordinateVector::ZERO;

            for k in 1..raw.vertices.len() - 1 {
                let v1 = raw.vertices[k];
                let v2 = raw.vertices[k + 1];

                let tri_area = 0.5 * (v1 - v0).cross(&(v2 - v0)).norm();
                if tri_area > 0.0 {
                    let tri_centroid = (v0 + v1 + v2) * (1.0 / 3.0);
                    face_area += tri_area;
                    face_midpoint_accum += tri_centroid * tri_area;
                }

                let a = v0 - self.generator;
                let b = v1 - self.generator;
                let c = v2 - self.generator;
                let tetra_volume = (1.0 / 6.0) * a.dot(&b.cross(&c)).abs();
                let tetra_centroid = (self.generator + v0 + v1 + v2) * 0.25;
                total_volume += tetra_volume;
                centroid_accum += tetra_centroid * tetra_volume;
            }

            if face_area > eps {
                faces.push(VoronoiFace {
                    surface_area: face_area,
                    midpoint: face_midpoint_accum / face_area,
                    neighbour_id: raw.neighbour_id,
                    neighbour_offset: raw.neighbour_offset,
                });
            }
        }

        if total_volume <= 0.0 {
            return Err(CoreError::GeometryFailure(format!(
                "cell {} finalized with non-positive volume {total_volume}",
                self.index
            )));
        }

        self.volume = total_volume;
        self.centroid = centroid_accum / total_volume;
        self.faces = faces;
        self.raw_faces = Vec::new();
        self.finalized = true;
        Ok(())
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn centroid(&self) -> CoordinateVector {
        self.centroid
    }

    pub fn faces(&self) -> &[VoronoiFace] {
        &self.faces
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }
}

fn box_faces(domain: &Box3) -> Vec<RawFace> {
    let a = domain.anchor;
    let t = domain.anchor + domain.sides;

    let c000 = CoordinateVector::new(a.x(), a.y(), a.z());
    let c100 = CoordinateVector::new(t.x(), a.y(), a.z());
    let c010 = CoordinateVector::new(a.x(), t.y(), a.z());
    let c001 = CoordinateVector::new(a.x(), a.y(), t.z());
    let c110 = CoordinateVector::new(t.x(), t.y(), a.z());
    let c101 = CoordinateVector::new(t.x(), a.y(), t.z());
    let c011 = CoordinateVector::new(a.x(), t.y(), t.z());
    let c111 = CoordinateVector::new(t.x(), t.y(), t.z());

    let [left, right, front, back, bottom, top] = WALL_SENTINELS;

    vec![
        RawFace { vertices: vec![c000, c001, c011, c010], neighbour_id: left, neighbour_offset: wall_normal(left) },
        RawFace { vertices: vec![c100, c110, c111, c101], neighbour_id: right, neighbour_offset: wall_normal(right) },
        RawFace { vertices: vec![c000, c100, c101, c001], neighbour_id: front, neighbour_offset: wall_normal(front) },
        RawFace { vertices: vec![c010, c011, c111, c110], neighbour_id: back, neighbour_offset: wall_normal(back) },
        RawFace { vertices: vec![c000, c010, c110, c100], neighbour_id: bottom, neighbour_offset: wall_normal(bottom) },
        RawFace { vertices: vec![c001, c101, c111, c011], neighbour_id: top, neighbour_offset: wall_normal(top) },
    ]
}

/// Chains directed cap edges (each contributed by one clipped face) into a
/// single cyclic polygon. Returns `None` if the edges don't form exactly
/// one closed loop.
fn chain_cap_edges(
    edges: &[(CoordinateVector, CoordinateVector)],
    eps: f64,
) -> Option<Vec<CoordinateVector>> {
    if edges.len() < 3 {
        return None;
    }
    let mut remaining = edges.to_vec();
    let (start0, end0) = remaining.remove(0);
    let mut polygon = vec![start0];
    let mut current_end = end0;

    while !remaining.is_empty() {
        let pos = remaining
            .iter()
            .position(|(s, _)| (*s - current_end).norm2() <= eps * eps + 1e-24)?;
        let (_, e) = remaining.remove(pos);
        polygon.push(current_end);
        current_end = e;
    }
    Some(polygon)
}

/// Computes the Newell-method normal of a planar polygon and reverses its
/// winding if that normal doesn't point the same way as `towards`.
fn orient_towards(mut vertices: Vec<CoordinateVector>, towards: CoordinateVector) -> Vec<CoordinateVector> {
    let n = vertices.len();
    let mut normal = CoordinateVector::ZERO;
    for i in 0..n {
        let cur = vertices[i];
        let next = vertices[(i + 1) % n];
        let nx = normal.x() + (cur.y() - next.y()) * (cur.z() + next.z());
        let ny = normal.y() + (cur.z() - next.z()) * (cur.x() + next.x());
        let nz = normal.z() + (cur.x() - next.x()) * (cur.y() + next.y());
        normal = CoordinateVector::new(nx, ny, nz);
    }
    if normal.dot(&towards) < 0.0 {
        vertices.reverse();
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Box3 {
        Box3::new(CoordinateVector::ZERO, CoordinateVector::splat(1.0))
    }

    #[test]
    fn an_unclipped_cell_finalizes_to_the_full_box_volume() {
        let mut cell = VoronoiCell::new(0, CoordinateVector::splat(0.5), &unit_box());
        cell.finalize(1e-12).unwrap();
        assert!((cell.volume() - 1.0).abs() < 1e-9);
        assert_eq!(cell.faces().len(), 6);
    }

    #[test]
    fn bisecting_two_generators_halves_the_box() {
        let domain = unit_box();
        let mut cell_a = VoronoiCell::new(0, CoordinateVector::new(0.25, 0.5, 0.5), &domain);
        let offset = CoordinateVector::new(0.5, 0.0, 0.0);
        cell_a.intersect(offset, 1, 1e-12);
        cell_a.finalize(1e-12).unwrap();
        assert!((cell_a.volume() - 0.5).abs() < 1e-9);

        let mut cell_b = VoronoiCell::new(1, CoordinateVector::new(0.75, 0.5, 0.5), &domain);
        cell_b.intersect(-offset, 0, 1e-12);
        cell_b.finalize(1e-12).unwrap();
        assert!((cell_b.volume() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn centroid_of_an_unclipped_cube_is_its_center() {
        let mut cell = VoronoiCell::new(0, CoordinateVector::splat(0.5), &unit_box());
        cell.finalize(1e-12).unwrap();
        let c = cell.centroid();
        assert!((c.x() - 0.5).abs() < 1e-9);
        assert!((c.y() - 0.5).abs() < 1e-9);
        assert!((c.z() - 0.5).abs() < 1e-9);
    }
}
