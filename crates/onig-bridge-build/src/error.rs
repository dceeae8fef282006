//! Error types for native artifact builds

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cargo executable not found: {0}")]
    CargoNotFound(#[from] which::Error),

    #[error("Failed to spawn cargo for {target}: {source}")]
    Spawn {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cargo build for {target} failed with {status}")]
    CargoFailed { target: String, status: ExitStatus },

    #[error("Built artifact not found at {}", .path.display())]
    MissingArtifact { path: PathBuf },

    #[error("Host platform cannot be built: {0}")]
    Platform(#[from] onig_bridge::BridgeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BuildError>;
