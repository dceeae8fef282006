//! Error types for matching and library loading

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the engine facade and the loader
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Pattern rejected by the engine, with its diagnostic text
    #[error("Failed to compile pattern: {0}")]
    Compile(String),

    /// Host OS or architecture is not one of the supported identifiers
    #[error("Unsupported platform: os={os}, arch={arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// No packaged artifact for the resolved platform
    #[error("Native library not found in resources: {resource}")]
    LibraryNotFound { resource: String },

    /// Opening the artifact, resolving its exports or checking its ABI failed
    #[error("Failed to load native library {}: {reason}", .path.display())]
    LoadFailure { path: PathBuf, reason: String },

    /// Search start lies past the end of the text (bytes or code units)
    #[error("Offset {offset} is out of bounds for text of length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },

    /// Interned text and pattern belong to different engines
    #[error("Interned text was created by a different engine than the pattern")]
    EngineMismatch,

    /// Failure reported by the native library
    #[error("Native engine error: {0}")]
    Native(String),

    /// Extracting the artifact failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BridgeError {
    pub(crate) fn load_failure(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        BridgeError::LoadFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether loading from an explicit path is still worth trying
    pub fn allows_path_fallback(&self) -> bool {
        matches!(
            self,
            BridgeError::UnsupportedPlatform { .. } | BridgeError::LibraryNotFound { .. }
        )
    }
}

/// Result type for onig-bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_classification() {
        let unsupported = BridgeError::UnsupportedPlatform {
            os: "haiku".into(),
            arch: "x86_64".into(),
        };
        let missing = BridgeError::LibraryNotFound {
            resource: "native/linux-x86_64/libonig_bridge_native.so".into(),
        };
        let failed = BridgeError::load_failure("/tmp/lib.so", "bad ELF header");

        assert!(unsupported.allows_path_fallback());
        assert!(missing.allows_path_fallback());
        assert!(!failed.allows_path_fallback());
        assert!(!BridgeError::Compile("x".into()).allows_path_fallback());
    }

    #[test]
    fn test_messages() {
        let err = BridgeError::load_failure("/tmp/lib.so", "bad ELF header");
        assert_eq!(
            err.to_string(),
            "Failed to load native library /tmp/lib.so: bad ELF header"
        );
    }
}
