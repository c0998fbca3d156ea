//! The core's error kinds, all fatal: nothing in this crate retries a
//! geometry or solver failure, since their presence indicates a physical or
//! numerical modelling error that must be diagnosed, not papered over.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("input violation: {0}")]
    InputViolation(String),

    #[error("geometry failure: {0}")]
    GeometryFailure(String),

    #[error(
        "ray traversal failed to find the next face after {retries} retries \
         (cell {cell_index}, direction {direction:?})"
    )]
    TraversalFailure {
        retries: u32,
        cell_index: usize,
        direction: crate::geometry::CoordinateVector,
    },

    #[error(
        "ionization solver did not converge after {iterations} iterations \
         (T={temperature}, J_H={j_h}, J_He={j_he}, n_tot={n_tot})"
    )]
    SolverDivergence {
        iterations: u32,
        temperature: f64,
        j_h: f64,
        j_he: f64,
        n_tot: f64,
    },

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
