/// Error taxonomy for the process-lifecycle core.
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to start the target application.
///
/// Surfaced to the caller and logged; never retried. The tray itself stays
/// alive regardless.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("failed to spawn {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// A previously launched instance is still alive; refuse to overwrite its
    /// handle instead of leaking it.
    #[error("a launched instance is still running (pid {pid})")]
    AlreadyTracked { pid: u32 },
}

/// Failure to deliver a termination signal to a pid.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("process {0} does not exist")]
    NoSuchProcess(u32),
    #[error("access denied while signalling process {0}")]
    AccessDenied(u32),
}
