//! Work-stealing distribution of photon batches across worker threads.

use std::sync::Mutex;

/// A shared, mutex-guarded remaining-photon counter. `get_job` hands out
/// shrinking batches: large early on, small near the end, to reduce tail
/// latency as workers drain the last few packets.
pub struct PhotonShootJobMarket {
    remaining: Mutex<u64>,
    worksize: u64,
    job_size_hint: u64,
}

/// One worker's instructions for a batch: shoot `num_photons` packets
/// using the worker's own pre-seeded generator.
#[derive(Debug, Clone, Copy)]
pub struct PhotonShootJob {
    pub worker_id: usize,
    pub num_photons: u64,
}

impl PhotonShootJobMarket {
    pub fn new(total_photons: u64, worksize: usize, job_size_hint: u64) -> Self {
        Self {
            remaining: Mutex::new(total_photons),
            worksize: (worksize.max(1)) as u64,
            job_size_hint: job_size_hint.max(1),
        }
    }

    pub fn get_job(&self, worker_id: usize) -> Option<PhotonShootJob> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return None;
        }
        let batch = (*remaining / (10 * self.worksize)).max(self.job_size_hint).min(*remaining);
        *remaining -= batch;
        Some(PhotonShootJob { worker_id, num_photons: batch })
    }
}
