//! Packaged native artifacts
//!
//! Artifacts are addressed by resource paths of the form
//! `native/<os>-<arch>/<library file>` (see
//! [`Platform::resource_path`](crate::Platform::resource_path)).

use std::borrow::Cow;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

// Generated by build.rs: `static EMBEDDED: &[(&str, &[u8])]`
include!(concat!(env!("OUT_DIR"), "/embedded_native.rs"));

/// A source of packaged artifacts
pub trait ResourceBundle: Send + Sync + fmt::Debug {
    /// Bytes of the resource at `path`, `None` if it is not packaged.
    ///
    /// I/O failures other than absence are errors.
    fn read(&self, path: &str) -> io::Result<Option<Cow<'static, [u8]>>>;
}

/// Artifacts embedded into the binary at build time
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedResources;

impl EmbeddedResources {
    /// Resource paths available in this build
    pub fn paths() -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(path, _)| *path)
    }
}

impl ResourceBundle for EmbeddedResources {
    fn read(&self, path: &str) -> io::Result<Option<Cow<'static, [u8]>>> {
        Ok(EMBEDDED
            .iter()
            .find(|(candidate, _)| *candidate == path)
            .map(|(_, bytes)| Cow::Borrowed(*bytes)))
    }
}

/// Artifacts laid out on disk under a root directory
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceBundle for DirectoryResources {
    fn read(&self, path: &str) -> io::Result<Option<Cow<'static, [u8]>>> {
        let file = path
            .split('/')
            .filter(|part| !part.is_empty())
            .fold(self.root.clone(), |dir, part| dir.join(part));
        debug!(path = %file.display(), "Reading packaged resource");
        match fs::read(&file) {
            Ok(bytes) => Ok(Some(Cow::Owned(bytes))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_lookup() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("native").join("linux-x86_64");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("libonig_bridge_native.so"), b"\x7fELF").unwrap();

        let resources = DirectoryResources::new(root.path());
        let bytes = resources
            .read("native/linux-x86_64/libonig_bridge_native.so")
            .unwrap()
            .unwrap();
        assert_eq!(bytes.as_ref(), b"\x7fELF");
    }

    #[test]
    fn test_directory_missing_resource() {
        let root = tempfile::tempdir().unwrap();
        let resources = DirectoryResources::new(root.path());
        assert!(resources
            .read("native/macos-aarch64/libonig_bridge_native.dylib")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_embedded_unknown_path() {
        assert!(EmbeddedResources
            .read("native/none-none/missing.so")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_embedded_paths_are_well_formed() {
        for path in EmbeddedResources::paths() {
            assert!(path.starts_with("native/"));
            assert_eq!(path.split('/').count(), 3);
        }
    }
}
