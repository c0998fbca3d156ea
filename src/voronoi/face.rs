use crate::geometry::CoordinateVector;

/// A finalized face of a [`super::VoronoiCell`]: one bounding plane, with
/// the id of the cell (or wall sentinel, see [`super::is_wall`]) on its
/// other side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoronoiFace {
    pub surface_area: f64,
    pub midpoint: CoordinateVector,
    pub neighbour_id: usize,
    /// The outward offset used to clip this face: `g_neighbour - g_self`
    /// for a real neighbour (which, under periodicity, may be the offset
    /// to a periodic image rather than the raw generator difference), or
    /// the wall's unit outward normal. Cached so the ray traversal
    /// primitive doesn't need to re-derive it from generator positions.
    pub neighbour_offset: CoordinateVector,
}
