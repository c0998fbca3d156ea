//! A minimal work-stealing job market: one mutex-guarded remaining-count
//! shared by a fixed pool of worker threads, handing out shrinking batches
//! as the work drains. `PhotonShootJobMarket` (in
//! [`crate::transport::job_market`]) wraps the same batch formula with
//! per-worker random-generator state; `VoronoiGrid::compute_grid` and the
//! per-cell ionization solve use this bare version directly since they need
//! no worker-local state beyond the batch range itself.

use std::ops::Range;
use std::sync::Mutex;

pub struct JobMarket {
    remaining: Mutex<usize>,
    total: usize,
    worksize: usize,
    job_size_hint: usize,
}

impl JobMarket {
    pub fn new(total: usize, worksize: usize, job_size_hint: usize) -> Self {
        Self {
            remaining: Mutex::new(total),
            total,
            worksize: worksize.max(1),
            job_size_hint: job_size_hint.max(1),
        }
    }

    /// Claims the next batch as a `start..end` range into `0..total`, or
    /// `None` once every unit of work has been claimed.
    pub fn next_batch(&self) -> Option<Range<usize>> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return None;
        }
        let batch = (*remaining / (10 * self.worksize))
            .max(self.job_size_hint)
            .min(*remaining);
        let start = self.total - *remaining;
        *remaining -= batch;
        Some(start..start + batch)
    }

    /// Runs `work` over `0..total` using `worksize` scoped worker threads,
    /// each pulling batches of `job_size_hint` (or larger, early on) until
    /// the market is drained.
    pub fn run<F>(total: usize, worksize: usize, job_size_hint: usize, work: F)
    where
        F: Fn(Range<usize>) + Sync,
    {
        if total == 0 {
            return;
        }
        let market = Self::new(total, worksize, job_size_hint);
        std::thread::scope(|scope| {
            for _ in 0..worksize {
                scope.spawn(|| {
                    while let Some(batch) = market.next_batch() {
                        work(batch);
                    }
                });
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn batches_cover_the_whole_range_exactly_once() {
        let seen = (0..1000).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
        JobMarket::run(1000, 4, 7, |batch| {
            for i in batch {
                seen[i].fetch_add(1, Ordering::Relaxed);
            }
        });
        assert!(seen.iter().all(|c| c.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn batches_shrink_towards_the_job_size_hint() {
        let market = JobMarket::new(1000, 1, 10);
        let first = market.next_batch().unwrap();
        assert_eq!(first, 0..100);
        let mut last_len = first.len();
        while let Some(batch) = market.next_batch() {
            assert!(batch.len() <= last_len.max(10));
            last_len = batch.len();
        }
    }
}
