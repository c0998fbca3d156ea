//! A Monte Carlo photoionization engine: propagates photon packets through
//! a Voronoi-tessellated density field and iteratively solves the
//! per-cell ionization balance of hydrogen, helium and five coolants.

pub mod abundances;
pub mod cli;
pub mod config;
pub mod density;
pub mod driver;
pub mod error;
pub mod geometry;
pub mod ion;
pub mod ionization;
pub mod jobs;
pub mod photon;
pub mod random;
pub mod rates;
pub mod transport;
pub mod voronoi;

pub use error::{CoreError, Result};
