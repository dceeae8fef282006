//! One-time loading of the native artifact
//!
//! All entry points funnel into a single process-wide [`LoadGate`]: whichever
//! source is used first wins, and the native load never runs again once the
//! gate reports [`LoadState::Loaded`].
//!
//! # Example
//!
//! ```rust,no_run
//! use onig_bridge::{LibraryLoader, LoaderConfig, SearchOptions};
//!
//! # fn main() -> onig_bridge::Result<()> {
//! let engine = LibraryLoader::new(LoaderConfig::from_env()).ensure_loaded()?;
//! let pattern = engine.compile(b"[0-9]+")?;
//! let found = engine.search(&pattern, "12:00pm", 0, SearchOptions::default())?;
//! engine.release(pattern);
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{const_mutex, Mutex};
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::cleanup;
use crate::config::LoaderConfig;
use crate::engine::NativeEngine;
use crate::error::{BridgeError, Result};
use crate::resources::{EmbeddedResources, ResourceBundle};

/// Process-wide progress of the native load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    NotLoaded,
    Loading,
    Loaded,
}

impl LoadState {
    const fn to_u8(self) -> u8 {
        match self {
            LoadState::NotLoaded => 0,
            LoadState::Loading => 1,
            LoadState::Loaded => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            1 => LoadState::Loading,
            2 => LoadState::Loaded,
            _ => LoadState::NotLoaded,
        }
    }
}

/// Runs an initializer at most once successfully, under mutual exclusion.
///
/// Concurrent callers block while one of them loads and then observe the
/// loaded value. A failed attempt leaves the gate `NotLoaded` so a later call
/// may try another source; nothing is retried automatically.
#[derive(Debug)]
pub struct LoadGate<T> {
    lock: Mutex<()>,
    state: AtomicU8,
    value: OnceLock<T>,
}

impl<T> LoadGate<T> {
    pub const fn new() -> Self {
        Self {
            lock: const_mutex(()),
            state: AtomicU8::new(LoadState::NotLoaded.to_u8()),
            value: OnceLock::new(),
        }
    }

    pub fn state(&self) -> LoadState {
        LoadState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// The loaded value, if any
    pub fn get(&self) -> Option<&T> {
        self.value.get()
    }

    /// Return the loaded value, running `load` first if nothing is loaded yet
    pub fn get_or_load<F>(&self, load: F) -> Result<&T>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let _guard = self.lock.lock();
        if let Some(value) = self.value.get() {
            return Ok(value);
        }

        let mut attempt = Attempt::start(&self.state);
        let loaded = load()?;
        let value = self.value.get_or_init(|| loaded);
        attempt.outcome = LoadState::Loaded;
        Ok(value)
    }
}

impl<T> Default for LoadGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

// Publishes the attempt's outcome on drop, so an error or a panic in the
// initializer leaves the gate `NotLoaded`.
struct Attempt<'a> {
    state: &'a AtomicU8,
    outcome: LoadState,
}

impl<'a> Attempt<'a> {
    fn start(state: &'a AtomicU8) -> Self {
        state.store(LoadState::Loading.to_u8(), Ordering::Release);
        Self {
            state,
            outcome: LoadState::NotLoaded,
        }
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        self.state.store(self.outcome.to_u8(), Ordering::Release);
    }
}

static NATIVE: LoadGate<NativeEngine> = LoadGate::new();

/// State of the process-wide native library
pub fn load_state() -> LoadState {
    NATIVE.state()
}

/// Load from packaged resources using [`LoaderConfig::from_env`]
pub fn ensure_loaded_from_packaged_resources() -> Result<&'static NativeEngine> {
    LibraryLoader::new(LoaderConfig::from_env()).ensure_loaded_from_packaged_resources()
}

/// Load the artifact at `path`, unless a library is already loaded
pub fn ensure_loaded_from_explicit_path(path: impl AsRef<Path>) -> Result<&'static NativeEngine> {
    LibraryLoader::new(LoaderConfig::from_env()).ensure_loaded_from_explicit_path(path)
}

/// Use the statically linked library, unless a library is already loaded
#[cfg(feature = "linked")]
pub fn ensure_loaded_linked() -> Result<&'static NativeEngine> {
    LibraryLoader::new(LoaderConfig::new()).ensure_loaded_linked()
}

/// Locates the native artifact and loads it through the process-wide gate
#[derive(Debug, Clone)]
pub struct LibraryLoader {
    config: LoaderConfig,
    resources: Arc<dyn ResourceBundle>,
    gate: &'static LoadGate<NativeEngine>,
}

impl LibraryLoader {
    /// Loader over the artifacts embedded in this build
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            resources: Arc::new(EmbeddedResources),
            gate: &NATIVE,
        }
    }

    /// Look artifacts up in `resources` instead of the embedded ones
    pub fn with_resources(mut self, resources: impl ResourceBundle + 'static) -> Self {
        self.resources = Arc::new(resources);
        self
    }

    #[cfg(test)]
    fn with_gate(mut self, gate: &'static LoadGate<NativeEngine>) -> Self {
        self.gate = gate;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn state(&self) -> LoadState {
        self.gate.state()
    }

    /// Load from the configured explicit path if any, else from resources
    pub fn ensure_loaded(&self) -> Result<&'static NativeEngine> {
        match &self.config.library_path {
            Some(path) => self.ensure_loaded_from_explicit_path(path),
            None => self.ensure_loaded_from_packaged_resources(),
        }
    }

    /// Resolve the platform, extract its packaged artifact and load it.
    ///
    /// # Errors
    /// - [`BridgeError::UnsupportedPlatform`] if the host cannot be classified
    /// - [`BridgeError::LibraryNotFound`] if nothing is packaged for it
    /// - [`BridgeError::LoadFailure`] if the extracted artifact does not load
    pub fn ensure_loaded_from_packaged_resources(&self) -> Result<&'static NativeEngine> {
        self.gate.get_or_load(|| {
            let extracted = self.extract()?;
            match NativeEngine::open(&extracted.library) {
                Ok(engine) => {
                    info!(path = %extracted.library.display(), "Loaded native library from packaged resources");
                    cleanup::remove_at_exit(extracted.dir);
                    Ok(engine)
                }
                Err(err) => {
                    warn!(error = %err, "Failed to load extracted native library");
                    Err(err)
                }
            }
        })
    }

    /// Load the artifact at `path`, bypassing platform resolution.
    ///
    /// A no-op returning the existing engine if any source already loaded.
    pub fn ensure_loaded_from_explicit_path(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<&'static NativeEngine> {
        let path = path.as_ref();
        self.gate.get_or_load(|| {
            let engine = NativeEngine::open(path).map_err(|err| {
                warn!(path = %path.display(), error = %err, "Failed to load native library");
                err
            })?;
            info!(path = %path.display(), "Loaded native library from explicit path");
            Ok(engine)
        })
    }

    /// Install the statically linked engine as the process-wide library.
    ///
    /// Like the other entry points this is a no-op returning the existing
    /// engine once any source has loaded.
    #[cfg(feature = "linked")]
    pub fn ensure_loaded_linked(&self) -> Result<&'static NativeEngine> {
        self.gate.get_or_load(|| {
            info!("Using statically linked native library");
            Ok(NativeEngine::linked())
        })
    }

    fn extract(&self) -> Result<ExtractedLibrary> {
        let platform = self.config.resolve_platform()?;
        let resource = platform.resource_path(&self.config.library_name);
        let bytes = self
            .resources
            .read(&resource)?
            .ok_or_else(|| BridgeError::LibraryNotFound {
                resource: resource.clone(),
            })?;

        let mut builder = tempfile::Builder::new();
        builder.prefix("onig-bridge");
        let dir = match &self.config.temp_dir {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };

        let library = dir
            .path()
            .join(platform.library_file_name(&self.config.library_name));
        let mut file = fs::File::create(&library)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
        debug!(
            platform = %platform,
            resource = %resource,
            path = %library.display(),
            bytes = bytes.len(),
            "Extracted native library"
        );

        Ok(ExtractedLibrary { dir, library })
    }
}

// Dropping `dir` before it is handed to cleanup deletes the extracted copy.
struct ExtractedLibrary {
    dir: TempDir,
    library: PathBuf,
}
