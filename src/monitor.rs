/// Background watcher for the tracked Proton Mail subprocess.
///
/// A single long-lived thread polls the shared handle slot at a fixed
/// interval and notices when the launched process exits on its own (closed
/// from inside the app, crashed, killed externally). On observed exit the
/// handle is reaped and the slot cleared, so a later close cannot act on a
/// dead handle.
///
/// Shutdown is cooperative: the run-flag is checked between sleeps, so
/// stopping blocks for at most one polling interval.
use crate::process::TrackedChild;
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{info, warn};

/// Watches the tracked subprocess until told to stop.
pub struct SubprocessMonitor {
    subprocess: TrackedChild,
    interval: Duration,
}

/// Handle to a running watcher thread. Dropping it stops the thread.
pub struct MonitorHandle {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl SubprocessMonitor {
    pub fn new(subprocess: TrackedChild, interval: Duration) -> Self {
        SubprocessMonitor {
            subprocess,
            interval,
        }
    }

    /// Spawn the watcher thread.
    pub fn start(self) -> Result<MonitorHandle> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let thread = thread::Builder::new()
            .name("proton-mail-watcher".into())
            .spawn(move || self.run(&flag))
            .context("Failed to spawn watcher thread")?;

        Ok(MonitorHandle {
            running,
            thread: Some(thread),
        })
    }

    fn run(&self, running: &AtomicBool) {
        while running.load(Ordering::SeqCst) {
            self.poll_once();
            thread::sleep(self.interval);
        }
    }

    /// One watcher cycle: reap the tracked child if it has exited.
    fn poll_once(&self) {
        let mut slot = self.subprocess.lock();
        if let Some(child) = slot.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    info!(pid = child.id(), %status, "Proton Mail exited on its own");
                    *slot = None;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "failed to poll Proton Mail subprocess"),
            }
        }
    }
}

impl MonitorHandle {
    /// Stop the watcher loop and wait for the thread to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("watcher thread panicked");
            }
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
