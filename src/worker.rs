use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};

use crate::algorithms::{SortAlgorithm, SortOutcome};
use crate::permutation::PermutationStore;

#[derive(Debug, Default)]
struct StatusInner {
    finished: AtomicBool,
    elapsed_ms: AtomicU64,
}

/// Write-once completion flag shared between the worker and the render loop.
#[derive(Clone, Debug, Default)]
pub struct SortStatus {
    inner: Arc<StatusInner>,
}

impl SortStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.inner.finished.load(Ordering::SeqCst)
    }

    /// Sort time, available once the flag is set.
    pub fn elapsed(&self) -> Option<Duration> {
        self.is_finished()
            .then(|| Duration::from_millis(self.inner.elapsed_ms.load(Ordering::SeqCst)))
    }

    pub(crate) fn finish(&self, elapsed: Duration) {
        self.inner
            .elapsed_ms
            .store(elapsed.as_millis() as u64, Ordering::SeqCst);
        self.inner.finished.store(true, Ordering::SeqCst);
    }
}

/// What the worker thread hands back when it ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortReport {
    pub algorithm: &'static str,
    pub outcome: SortOutcome,
    pub elapsed: Duration,
}

/// Background thread running one sort over the whole permutation.
pub struct SortWorker {
    handle: JoinHandle<SortReport>,
}

impl SortWorker {
    pub fn spawn(
        permutation: Arc<PermutationStore>,
        mut algorithm: Box<dyn SortAlgorithm>,
        status: SortStatus,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("sort".into())
            .spawn(move || {
                let name = algorithm.name();
                log::info!("Sorting {} slots with {}...", permutation.len(), name);
                let started = Instant::now();
                let outcome = algorithm.sort(&permutation, 0..permutation.len());
                let elapsed = started.elapsed();

                match outcome {
                    SortOutcome::Sorted => {
                        debug_assert!(permutation.is_identity());
                        status.finish(elapsed);
                        log::info!("Sorting finished in: {}ms", elapsed.as_millis());
                    }
                    SortOutcome::GaveUp { attempts } => {
                        log::warn!(
                            "{} gave up after {} shuffles ({}ms); image will not complete",
                            name,
                            attempts,
                            elapsed.as_millis()
                        );
                    }
                }

                SortReport {
                    algorithm: name,
                    outcome,
                    elapsed,
                }
            })
            .context("failed to spawn sort thread")?;
        Ok(Self { handle })
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the sort returns.
    pub fn join(self) -> Result<SortReport> {
        self.handle
            .join()
            .map_err(|_| anyhow!("sort thread panicked"))
    }

    /// Lets a still-running sort carry on unobserved. The thread keeps its own
    /// handle on the permutation, so the array outlives it.
    pub fn detach(self) {
        drop(self.handle);
    }

    /// Joins a finished worker, detaches a running one.
    pub fn shutdown(self) {
        if self.is_finished() {
            match self.join() {
                Ok(report) => log::debug!("sort worker joined: {:?}", report),
                Err(err) => log::error!("{err:#}"),
            }
        } else {
            log::warn!("sort worker still running at shutdown; detaching it");
            self.detach();
        }
    }
}
