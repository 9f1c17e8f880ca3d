use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::result_set::ResultSet;
use crate::sampler::VolumeSampler;
use crate::scanner::{TileJob, TileOutcome, run_job};

/// Fixed-size worker pool draining an unbounded tile-job queue.
///
/// Dropping the pool stops intake: queued jobs are abandoned and workers
/// exit after their current job.
pub struct ScanPool {
    job_tx: Sender<TileJob>,
    res_rx: Receiver<TileOutcome>,
    _pool: Arc<ThreadPool>,
    shutdown: Arc<AtomicBool>,
    queued: Arc<AtomicUsize>,
    inflight: Arc<AtomicUsize>,
    workers: usize,
}

impl ScanPool {
    pub fn new(
        workers: usize,
        sampler: Arc<dyn VolumeSampler>,
        results: Arc<ResultSet>,
    ) -> Result<Self, ThreadPoolBuildError> {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<TileJob>();
        let (res_tx, res_rx) = unbounded::<TileOutcome>();
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("lumen-scan-{i}"))
                .build()?,
        );
        let shutdown = Arc::new(AtomicBool::new(false));
        let queued = Arc::new(AtomicUsize::new(0));
        let inflight = Arc::new(AtomicUsize::new(0));

        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let sampler = sampler.clone();
            let results = results.clone();
            let shutdown = shutdown.clone();
            let queued = queued.clone();
            let inflight = inflight.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    // Count in-flight before leaving the queue so that
                    // `is_idle` never sees a job in neither bucket.
                    inflight.fetch_add(1, Ordering::AcqRel);
                    queued.fetch_sub(1, Ordering::AcqRel);
                    if shutdown.load(Ordering::Acquire) {
                        inflight.fetch_sub(1, Ordering::AcqRel);
                        break;
                    }
                    let outcome = run_job(&job, sampler.as_ref(), results.as_ref());
                    let _ = tx.send(outcome);
                    inflight.fetch_sub(1, Ordering::AcqRel);
                }
            });
        }

        Ok(Self {
            job_tx,
            res_rx,
            _pool: pool,
            shutdown,
            queued,
            inflight,
            workers,
        })
    }

    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Queue a job without waiting for it. Returns `false` if the pool no
    /// longer accepts work.
    pub fn submit(&self, job: TileJob) -> bool {
        if self.shutdown.load(Ordering::Acquire) {
            return false;
        }
        self.queued.fetch_add(1, Ordering::AcqRel);
        if self.job_tx.send(job).is_err() {
            self.queued.fetch_sub(1, Ordering::AcqRel);
            return false;
        }
        true
    }

    pub fn drain_outcomes(&self) -> Vec<TileOutcome> {
        self.res_rx.try_iter().collect()
    }

    /// (queued, in flight)
    pub fn queue_depths(&self) -> (usize, usize) {
        (
            self.queued.load(Ordering::Acquire),
            self.inflight.load(Ordering::Acquire),
        )
    }

    pub fn is_idle(&self) -> bool {
        // Queue first: a job is counted in flight before it leaves the queue.
        self.queued.load(Ordering::Acquire) == 0 && self.inflight.load(Ordering::Acquire) == 0
    }

    /// Block until every submitted job has finished or `timeout` elapses.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.is_idle() {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }
}

impl Drop for ScanPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}
