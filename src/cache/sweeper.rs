//! Periodic stale-entry sweep on a background thread.

use crate::cache::result_cache::ResultCache;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, warn};

/// A store that sheds stale entries on request.
pub trait Sweep: Send + Sync {
    /// Remove stale entries, returning how many went.
    fn sweep(&self) -> usize;
}

impl Sweep for ResultCache {
    fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }
}

/// Sweeps its targets every `interval` until stopped or dropped.
pub struct BackgroundSweeper {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    sweeps: Arc<AtomicU64>,
}

impl BackgroundSweeper {
    pub fn start<S: Sweep + 'static>(target: Arc<S>, interval: Duration) -> Self {
        let target: Arc<dyn Sweep> = target;
        Self::start_all(vec![target], interval)
    }

    /// One thread sweeping every target in turn.
    pub fn start_all(targets: Vec<Arc<dyn Sweep>>, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let sweeps = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&sweeps);

        let handle = thread::Builder::new()
            .name("scoremap-sweeper".to_string())
            .spawn(move || loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let removed: usize = targets.iter().map(|target| target.sweep()).sum();
                        counter.fetch_add(1, Ordering::Relaxed);
                        debug!(removed, "Background sweep finished");
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            });

        let handle = match handle {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Could not start background sweeper");
                None
            }
        };

        Self {
            stop_tx: Some(stop_tx),
            handle,
            sweeps,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Number of sweeps completed so far.
    pub fn sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::Relaxed)
    }

    /// Signal the thread and wait for it to exit.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for BackgroundSweeper {
    fn drop(&mut self) {
        self.stop();
    }
}
