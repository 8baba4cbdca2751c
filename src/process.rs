/// Process inspection and lifecycle control for the managed Proton Mail
/// instance.
///
/// Running-state is never stored: it is derived on demand by scanning the OS
/// process table for a name starting with [`PROCESS_NAME_PREFIX`]. The prefix
/// match tolerates the 15-character truncation some kernels apply to process
/// names ("Proton Mail Beta" reports as "Proton Mail Bet").
///
/// [`ProcessController`] owns the single tracked [`Child`] handle inside a
/// mutex-guarded slot that it shares with the background watcher
/// ([`crate::monitor::SubprocessMonitor`]). The decision to terminate is made
/// from a live process-table lookup rather than from the held handle, so an
/// instance started outside the tray is closed by the toggle as well.
use crate::error::{LaunchError, SignalError};
use parking_lot::Mutex;
use std::path::Path;
use std::process::{Child, Command};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use sysinfo::{Pid, Signal, System};
use tracing::{debug, error, info, warn};

/// Process name to look for, truncated to the 15-character limit of the
/// kernel's comm field.
pub const PROCESS_NAME_PREFIX: &str = "Proton Mail Bet";

/// Termination timing knobs, injected so tests never wait real seconds.
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// How long a gracefully terminated process gets before the force kill.
    pub grace_period: Duration,
    /// Liveness polling step while waiting out the grace period.
    pub term_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Timing {
            grace_period: Duration::from_secs(5),
            term_poll: Duration::from_millis(200),
        }
    }
}

/// Shared slot holding the one subprocess handle the tray may need to stop.
pub type TrackedChild = Arc<Mutex<Option<Child>>>;

/// The OS process table, as far as this application needs it.
///
/// A trait seam so the controller can be exercised against a mock table in
/// tests without spawning or signalling real processes.
pub trait ProcessTable {
    /// Pid of the first process whose name starts with `prefix`, if any.
    /// Enumeration order is OS-defined; with several matches any one of them
    /// may be returned.
    fn find_by_prefix(&mut self, prefix: &str) -> Option<u32>;

    /// Whether `pid` still exists in the process table.
    fn is_alive(&mut self, pid: u32) -> bool;

    /// Ask `pid` to exit gracefully (SIGTERM).
    fn terminate(&mut self, pid: u32) -> Result<(), SignalError>;

    /// Force `pid` to exit (SIGKILL).
    fn kill(&mut self, pid: u32) -> Result<(), SignalError>;
}

/// First prefix match over `(pid, name)` pairs.
///
/// Processes that vanish or deny access mid-scan are simply absent from the
/// enumeration; a partial scan is never an error.
pub fn first_prefix_match<'a, I>(processes: I, prefix: &str) -> Option<u32>
where
    I: IntoIterator<Item = (u32, &'a str)>,
{
    processes
        .into_iter()
        .find(|(_, name)| name.starts_with(prefix))
        .map(|(pid, _)| pid)
}

/// [`ProcessTable`] backed by the live OS process table via sysinfo.
pub struct SystemProcessTable {
    system: System,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        SystemProcessTable {
            system: System::new(),
        }
    }

    fn signal(&mut self, pid: u32, signal: Signal) -> Result<(), SignalError> {
        let sys_pid = Pid::from_u32(pid);
        if !self.system.refresh_process(sys_pid) {
            return Err(SignalError::NoSuchProcess(pid));
        }

        let delivered = match self.system.process(sys_pid) {
            // kill_with returns None when the signal is unsupported on this
            // platform; fall back to the unconditional kill.
            Some(process) => process.kill_with(signal).unwrap_or_else(|| process.kill()),
            None => return Err(SignalError::NoSuchProcess(pid)),
        };

        if delivered {
            Ok(())
        } else if self.system.refresh_process(sys_pid) {
            Err(SignalError::AccessDenied(pid))
        } else {
            Err(SignalError::NoSuchProcess(pid))
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn find_by_prefix(&mut self, prefix: &str) -> Option<u32> {
        self.system.refresh_processes();
        first_prefix_match(
            self.system
                .processes()
                .iter()
                .map(|(pid, process)| (pid.as_u32(), process.name())),
            prefix,
        )
    }

    fn is_alive(&mut self, pid: u32) -> bool {
        self.system.refresh_process(Pid::from_u32(pid))
    }

    fn terminate(&mut self, pid: u32) -> Result<(), SignalError> {
        self.signal(pid, Signal::Term)
    }

    fn kill(&mut self, pid: u32) -> Result<(), SignalError> {
        self.signal(pid, Signal::Kill)
    }
}

/// Lifecycle controller for the managed Proton Mail instance.
pub struct ProcessController<T: ProcessTable> {
    table: T,
    timing: Timing,
    tracked: TrackedChild,
}

impl<T: ProcessTable> ProcessController<T> {
    pub fn new(table: T, timing: Timing) -> Self {
        ProcessController {
            table,
            timing,
            tracked: Arc::new(Mutex::new(None)),
        }
    }

    /// Handle to the tracked-subprocess slot, for the watcher thread.
    pub fn tracked_slot(&self) -> TrackedChild {
        Arc::clone(&self.tracked)
    }

    /// Pid of a running Proton Mail instance, from a live process-table scan.
    pub fn running_pid(&mut self) -> Option<u32> {
        self.table.find_by_prefix(PROCESS_NAME_PREFIX)
    }

    /// Start Proton Mail at `path` with no arguments and track its handle.
    ///
    /// Refuses to overwrite the handle of a still-running previous launch;
    /// an already-exited child in the slot is reaped and replaced.
    pub fn launch(&mut self, path: &Path) -> Result<u32, LaunchError> {
        let mut slot = self.tracked.lock();
        if let Some(child) = slot.as_mut() {
            match child.try_wait() {
                Ok(None) => {
                    return Err(LaunchError::AlreadyTracked { pid: child.id() });
                }
                Ok(Some(status)) => {
                    debug!(pid = child.id(), %status, "reaped previously tracked subprocess");
                }
                Err(e) => {
                    warn!(pid = child.id(), error = %e, "could not poll previously tracked subprocess");
                }
            }
            *slot = None;
        }

        let child = Command::new(path)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                path: path.to_path_buf(),
                source,
            })?;
        let pid = child.id();
        *slot = Some(child);
        Ok(pid)
    }

    /// Close a running Proton Mail instance: graceful terminate, wait out the
    /// grace period, then force kill. A no-op when it is not running.
    ///
    /// Signal delivery failures are logged and swallowed; nothing here can
    /// take the tray down.
    pub fn close(&mut self) {
        let Some(pid) = self.table.find_by_prefix(PROCESS_NAME_PREFIX) else {
            info!("Proton Mail is not running");
            return;
        };

        info!(pid, "terminating Proton Mail");
        match self.table.terminate(pid) {
            Ok(()) => {}
            Err(SignalError::NoSuchProcess(pid)) => {
                warn!(pid, "process disappeared before it could be terminated");
                self.reap_tracked();
                return;
            }
            Err(SignalError::AccessDenied(pid)) => {
                error!(pid, "access denied while terminating process");
                return;
            }
        }

        let deadline = Instant::now() + self.timing.grace_period;
        while Instant::now() < deadline {
            if !self.table.is_alive(pid) {
                info!(pid, "Proton Mail closed successfully");
                self.reap_tracked();
                return;
            }
            thread::sleep(self.timing.term_poll);
        }

        warn!(pid, "Proton Mail did not terminate in time, force killing");
        match self.table.kill(pid) {
            Ok(()) => info!(pid, "Proton Mail force killed"),
            Err(SignalError::NoSuchProcess(pid)) => {
                warn!(pid, "process exited before the kill was delivered")
            }
            Err(SignalError::AccessDenied(pid)) => {
                error!(pid, "access denied while killing process")
            }
        }
        self.reap_tracked();
    }

    /// Drop the tracked handle if its process has exited, reaping it.
    /// Leaves a still-running child (e.g. one that ignored our lookup-based
    /// termination of a different instance) in place.
    fn reap_tracked(&self) {
        let mut slot = self.tracked.lock();
        if let Some(child) = slot.as_mut() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    debug!(pid = child.id(), %status, "reaped tracked subprocess");
                    *slot = None;
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "failed to poll tracked subprocess"),
            }
        }
    }
}

impl ProcessController<SystemProcessTable> {
    /// Controller over the real OS process table with default timing.
    pub fn with_system_table() -> Self {
        ProcessController::new(SystemProcessTable::new(), Timing::default())
    }
}
