//! Procfs adapter error types.

use std::path::PathBuf;
use std::process::ExitStatus;

use iotg_domain::error::GatewayError;

/// Errors specific to the procfs hardware adapter.
#[derive(Debug, thiserror::Error)]
pub enum ProcfsError {
    /// A status or battery file could not be read.
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A status file could not be written directly.
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The value read does not start with an integer.
    #[error("expected an integer from {origin}, got {raw:?}")]
    NotAnInteger { origin: String, raw: String },

    /// A helper process could not be started.
    #[error("failed to run {}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A helper process exited unsuccessfully.
    #[error("{} exited with {status}", .program.display())]
    Helper { program: PathBuf, status: ExitStatus },
}

impl ProcfsError {
    /// Convert into a [`GatewayError::Hardware`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> GatewayError {
        GatewayError::hardware(self)
    }
}

impl From<ProcfsError> for GatewayError {
    fn from(err: ProcfsError) -> Self {
        err.into_domain()
    }
}
