//! Photon transport: the ray traversal hot path, per-cell mean-intensity
//! accumulation, and the parallel shoot loop built on the job market.

pub mod job_market;
pub mod source;

pub use job_market::{PhotonShootJob, PhotonShootJobMarket};
pub use source::{MonochromaticPointSource, PhotonSource};

use std::sync::Mutex;
use std::thread;

use crate::abundances::Abundances;
use crate::error::{CoreError, Result};
use crate::ion::{PhotonType, ALL_IONS, IonName, NUMBER_OF_IONNAMES, NUMBER_OF_PHOTONTYPES};
use crate::photon::Photon;
use crate::random::RandomGenerator;
use crate::voronoi::grid::{NextFace, VoronoiGrid};
use crate::voronoi::is_wall;

/// A lock-per-cell set of mean-intensity accumulators, reset at the start
/// of every transport pass. Contention is low: the set of packets that can
/// be touching a given cell at once is small relative to worker count.
pub struct CellAccumulators {
    cells: Vec<Mutex<[f64; NUMBER_OF_IONNAMES]>>,
}

impl CellAccumulators {
    pub fn new(num_cells: usize) -> Self {
        Self { cells: (0..num_cells).map(|_| Mutex::new([0.0; NUMBER_OF_IONNAMES])).collect() }
    }

    fn add(&self, cell: usize, contribution: &[f64; NUMBER_OF_IONNAMES]) {
        let mut slot = self.cells[cell].lock().unwrap();
        for i in 0..NUMBER_OF_IONNAMES {
            slot[i] += contribution[i];
        }
    }

    pub fn into_totals(self) -> Vec<[f64; NUMBER_OF_IONNAMES]> {
        self.cells.into_iter().map(|m| m.into_inner().unwrap()).collect()
    }
}

/// Read-only references a packet needs to traverse the grid and deposit
/// into the mean-intensity accumulators.
pub struct TransportContext<'a> {
    pub grid: &'a VoronoiGrid,
    pub accumulators: &'a CellAccumulators,
    pub number_density: &'a [f64],
    pub ionic_fractions: &'a [[f64; NUMBER_OF_IONNAMES]],
    pub abundances: &'a Abundances,
    pub eps: f64,
}

/// Where a packet's journey ended.
pub enum Interaction {
    Absorbed(usize),
    Exited,
}

/// Total absorption cross section per unit path length for the gas state
/// in `cell`, per the hydrogen-plus-abundance-weighted-helium opacity.
fn total_cross_section(photon: &Photon, fractions: &[f64; NUMBER_OF_IONNAMES], abundances: &Abundances) -> f64 {
    let x_h = fractions[IonName::HN.index()];
    let x_he = fractions[IonName::HeN.index()];
    x_h * photon.cross_section(IonName::HN) + abundances.get(crate::ion::Element::He) * x_he * photon.cross_section_he_corr()
}

fn deposit(accumulators: &CellAccumulators, cell: usize, photon: &Photon, s: f64, volume: f64) {
    let mut contribution = [0.0; NUMBER_OF_IONNAMES];
    for ion in ALL_IONS {
        contribution[ion.index()] = photon.weight() * s * photon.cross_section(ion) / volume;
    }
    accumulators.add(cell, &contribution);
}

/// Traces `photon` from its current position until its optical depth
/// budget `tau_target` is spent (absorption) or it leaves the domain
/// through a wall (`Interaction::Exited`).
pub fn interact(ctx: &TransportContext, photon: &mut Photon, tau_target: f64) -> Result<Interaction> {
    photon.set_position(photon.position() + photon.direction() * ctx.eps);
    let mut current = ctx.grid.get_index(photon.position());
    if is_wall(current) {
        return Ok(Interaction::Exited);
    }

    let mut tau_remaining = tau_target;
    let mut retries = 0u32;

    loop {
        match ctx.grid.next_face(current, photon.position(), photon.direction()) {
            NextFace::Retry => {
                retries += 1;
                if retries > 100 {
                    return Err(CoreError::TraversalFailure {
                        retries,
                        cell_index: current,
                        direction: photon.direction(),
                    });
                }
                photon.set_position(photon.position() + photon.direction() * ctx.eps);
                current = ctx.grid.get_index(photon.position());
                if is_wall(current) {
                    return Ok(Interaction::Exited);
                }
                continue;
            }
            NextFace::Found { distance, neighbour_id } => {
                retries = 0;
                let n_tot = ctx.number_density[current];
                let sigma = total_cross_section(photon, &ctx.ionic_fractions[current], ctx.abundances);
                let tau_segment = distance * n_tot * sigma;

                if tau_segment >= tau_remaining && tau_segment > 0.0 {
                    let s = distance * (tau_remaining / tau_segment);
                    deposit(ctx.accumulators, current, photon, s, ctx.grid.cell(current).volume());
                    photon.set_position(photon.position() + photon.direction() * s);
                    return Ok(Interaction::Absorbed(current));
                }

                deposit(ctx.accumulators, current, photon, distance, ctx.grid.cell(current).volume());
                photon.set_position(photon.position() + photon.direction() * distance);
                tau_remaining -= tau_segment;

                if is_wall(neighbour_id) {
                    return Ok(Interaction::Exited);
                }
                current = neighbour_id;
            }
        }
    }
}

/// Per-worker totals accumulated across a transport pass, merged across
/// workers at the end of [`run_iteration`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TransportTotals {
    pub total_weight: f64,
    pub weight_by_type: [f64; NUMBER_OF_PHOTONTYPES],
}

impl TransportTotals {
    fn merge(&mut self, other: &TransportTotals) {
        self.total_weight += other.total_weight;
        for i in 0..NUMBER_OF_PHOTONTYPES {
            self.weight_by_type[i] += other.weight_by_type[i];
        }
    }
}

/// Draws an optical-depth budget `tau = -ln(U)`, `U` uniform on `(0, 1]`.
fn sample_tau_target(rng: &mut RandomGenerator) -> f64 {
    let u = rng.uniform().max(f64::MIN_POSITIVE);
    -u.ln()
}

fn shoot_one(ctx: &TransportContext, source: &dyn PhotonSource, rng: &mut RandomGenerator) -> Result<TransportTotals> {
    let (position, direction, frequency) = source.sample(rng);
    let mut photon = Photon::new(position, direction, frequency);
    for ion in ALL_IONS {
        photon.set_cross_section(ion, source.cross_section(ion, frequency));
    }
    photon.set_cross_section_he_corr(source.cross_section(IonName::HeN, frequency));

    let mut totals = TransportTotals::default();
    totals.total_weight = photon.weight();

    let tau_target = sample_tau_target(rng);
    match interact(ctx, &mut photon, tau_target)? {
        Interaction::Absorbed(_) => {
            photon.set_photon_type(PhotonType::Absorbed);
            totals.weight_by_type[PhotonType::Absorbed as usize] += photon.weight();
        }
        Interaction::Exited => {
            totals.weight_by_type[PhotonType::Primary as usize] += photon.weight();
        }
    }
    Ok(totals)
}

/// Shoots `total_photons` packets across `worksize` worker threads, each
/// with its own [`RandomGenerator`] seeded `base_seed + worker_id` so the
/// whole pass is bit-reproducible for a fixed seed and worker count.
/// Returns the merged per-cell mean-intensity totals and photon-weight
/// summary.
pub fn run_iteration(
    ctx: &TransportContext,
    source: &dyn PhotonSource,
    worksize: usize,
    base_seed: i32,
    job_size_hint: u64,
    total_photons: u64,
) -> Result<(Vec<[f64; NUMBER_OF_IONNAMES]>, TransportTotals)> {
    let worksize = worksize.max(1);
    let market = PhotonShootJobMarket::new(total_photons, worksize, job_size_hint);
    let totals = Mutex::new(TransportTotals::default());
    let first_error: Mutex<Option<CoreError>> = Mutex::new(None);

    thread::scope(|scope| {
        for worker_id in 0..worksize {
            let market = &market;
            let totals = &totals;
            let first_error = &first_error;
            scope.spawn(move || {
                let mut rng = RandomGenerator::new(base_seed.wrapping_add(worker_id as i32));
                let mut local = TransportTotals::default();
                while let Some(job) = market.get_job(worker_id) {
                    for _ in 0..job.num_photons {
                        match shoot_one(ctx, source, &mut rng) {
                            Ok(t) => local.merge(&t),
                            Err(e) => {
                                let mut slot = first_error.lock().unwrap();
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                return;
                            }
                        }
                    }
                }
                totals.lock().unwrap().merge(&local);
            });
        }
    });

    if let Some(e) = first_error.into_inner().unwrap() {
        return Err(e);
    }

    Ok((ctx.accumulators_snapshot(), totals.into_inner().unwrap()))
}

impl<'a> TransportContext<'a> {
    fn accumulators_snapshot(&self) -> Vec<[f64; NUMBER_OF_IONNAMES]> {
        self.accumulators.cells.iter().map(|m| *m.lock().unwrap()).collect()
    }
}
