//! An octree over SPH particle positions, each node carrying the maximum
//! smoothing length of its subtree so `get_ngbs` can prune branches whose
//! kernel support cannot possibly reach the query point.

use crate::geometry::CoordinateVector;

const MAX_LEAF_PARTICLES: usize = 16;
const MAX_DEPTH: u32 = 24;

#[derive(Debug, Clone, Copy)]
struct Cube {
    center: CoordinateVector,
    half_size: f64,
}

impl Cube {
    fn distance_to(&self, p: CoordinateVector) -> f64 {
        let lo = self.center - CoordinateVector::splat(self.half_size);
        let hi = self.center + CoordinateVector::splat(self.half_size);
        let d = |lo: f64, hi: f64, v: f64| (lo - v).max(0.0).max(v - hi);
        let dx = d(lo.x(), hi.x(), p.x());
        let dy = d(lo.y(), hi.y(), p.y());
        let dz = d(lo.z(), hi.z(), p.z());
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    fn could_reach(&self, p: CoordinateVector, max_h: f64) -> bool {
        self.distance_to(p) <= 2.0 * max_h
    }
}

enum Node {
    Leaf { indices: Vec<usize>, bounds: Cube, max_h: f64 },
    Internal { bounds: Cube, max_h: f64, children: Vec<Node> },
}

impl Node {
    fn collect_ngbs(
        &self,
        p: CoordinateVector,
        positions: &[CoordinateVector],
        smoothing_lengths: &[f64],
        out: &mut Vec<usize>,
    ) {
        match self {
            Node::Leaf { indices, bounds, max_h } => {
                if !bounds.could_reach(p, *max_h) {
                    return;
                }
                for &i in indices {
                    let r = (positions[i] - p).norm();
                    if r < 2.0 * smoothing_lengths[i] {
                        out.push(i);
                    }
                }
            }
            Node::Internal { bounds, max_h, children } => {
                if !bounds.could_reach(p, *max_h) {
                    return;
                }
                for child in children {
                    child.collect_ngbs(p, positions, smoothing_lengths, out);
                }
            }
        }
    }
}

pub struct Octree {
    root: Node,
}

impl Octree {
    pub fn build(positions: &[CoordinateVector], smoothing_lengths: &[f64]) -> Self {
        let bounds = bounding_cube(positions);
        let indices: Vec<usize> = (0..positions.len()).collect();
        let root = build_node(&indices, positions, smoothing_lengths, bounds, 0);
        Self { root }
    }

    /// Every particle index whose kernel support (`2h`) overlaps `p`.
    pub fn get_ngbs(
        &self,
        p: CoordinateVector,
        positions: &[CoordinateVector],
        smoothing_lengths: &[f64],
    ) -> Vec<usize> {
        let mut out = Vec::new();
        self.root.collect_ngbs(p, positions, smoothing_lengths, &mut out);
        out
    }
}

fn bounding_cube(positions: &[CoordinateVector]) -> Cube {
    if positions.is_empty() {
        return Cube { center: CoordinateVector::ZERO, half_size: 1.0 };
    }
    let mut lo = positions[0];
    let mut hi = positions[0];
    for p in positions {
        lo = lo.min(p);
        hi = hi.max(p);
    }
    let center = (lo + hi) * 0.5;
    let extent = (hi - lo).norm().max(1e-12);
    Cube { center, half_size: 0.5 * extent }
}

fn octant_of(p: CoordinateVector, center: CoordinateVector) -> usize {
    (usize::from(p.x() >= center.x()))
        | (usize::from(p.y() >= center.y()) << 1)
        | (usize::from(p.z() >= center.z()) << 2)
}

fn child_center(center: CoordinateVector, half: f64, octant: usize) -> CoordinateVector {
    let sign = |bit: usize| if octant & bit != 0 { 1.0 } else { -1.0 };
    center
        + CoordinateVector::new(sign(1) * half * 0.5, sign(2) * half * 0.5, sign(4) * half * 0.5)
}

fn build_node(
    indices: &[usize],
    positions: &[CoordinateVector],
    smoothing_lengths: &[f64],
    bounds: Cube,
    depth: u32,
) -> Node {
    let max_h = indices.iter().map(|&i| smoothing_lengths[i]).fold(0.0, f64::max);

    if indices.len() <= MAX_LEAF_PARTICLES || depth >= MAX_DEPTH {
        return Node::Leaf { indices: indices.to_vec(), bounds, max_h };
    }

    let mut buckets: [Vec<usize>; 8] = Default::default();
    for &i in indices {
        buckets[octant_of(positions[i], bounds.center)].push(i);
    }
    if buckets.iter().any(|b| b.len() == indices.len()) {
        return Node::Leaf { indices: indices.to_vec(), bounds, max_h };
    }

    let half = bounds.half_size * 0.5;
    let children = (0..8)
        .map(|octant| {
            let child_bounds = Cube { center: child_center(bounds.center, bounds.half_size, octant), half_size: half };
            build_node(&buckets[octant], positions, smoothing_lengths, child_bounds, depth + 1)
        })
        .collect();

    Node::Internal { bounds, max_h, children }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_a_nearby_particle_and_excludes_a_far_one() {
        let positions = vec![CoordinateVector::new(0.0, 0.0, 0.0), CoordinateVector::new(100.0, 100.0, 100.0)];
        let h = vec![1.0, 1.0];
        let tree = Octree::build(&positions, &h);
        let ngbs = tree.get_ngbs(CoordinateVector::new(0.5, 0.0, 0.0), &positions, &h);
        assert_eq!(ngbs, vec![0]);
    }

    #[test]
    fn handles_many_coincident_points_without_infinite_recursion() {
        let positions = vec![CoordinateVector::ZERO; 200];
        let h = vec![1.0; 200];
        let tree = Octree::build(&positions, &h);
        let ngbs = tree.get_ngbs(CoordinateVector::ZERO, &positions, &h);
        assert_eq!(ngbs.len(), 200);
    }
}
