//! Loader configuration

use std::env;
use std::path::PathBuf;

use onig_bridge_sys::LIBRARY_NAME;
use tracing::warn;

use crate::platform::Platform;

/// Environment variable overriding the resolved platform (`"<os>-<arch>"`)
pub const PLATFORM_ENV: &str = "ONIG_BRIDGE_PLATFORM";
/// Environment variable naming an artifact to load instead of packaged ones
pub const LIBRARY_PATH_ENV: &str = "ONIG_BRIDGE_LIBRARY_PATH";
/// Environment variable choosing where artifacts are extracted
pub const TEMP_DIR_ENV: &str = "ONIG_BRIDGE_TEMP_DIR";

/// Configuration for locating and loading the native library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Platform to load artifacts for (None = detect host)
    pub platform: Option<Platform>,
    /// Explicit artifact path (None = use packaged resources)
    pub library_path: Option<PathBuf>,
    /// Parent directory for extraction (None = system temp dir)
    pub temp_dir: Option<PathBuf>,
    /// Library name before platform prefix/extension rules
    pub library_name: String,
}

impl LoaderConfig {
    /// Create default configuration
    pub fn new() -> Self {
        Self {
            platform: None,
            library_path: None,
            temp_dir: None,
            library_name: LIBRARY_NAME.to_string(),
        }
    }

    /// Default configuration with environment overrides applied.
    ///
    /// An unparsable platform override is ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::new();

        if let Some(value) = non_empty_var(PLATFORM_ENV) {
            match value.parse::<Platform>() {
                Ok(platform) => config.platform = Some(platform),
                Err(err) => warn!(env = PLATFORM_ENV, value = %value, error = %err, "Ignoring platform override"),
            }
        }
        if let Some(path) = non_empty_var(LIBRARY_PATH_ENV) {
            config.library_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = non_empty_var(TEMP_DIR_ENV) {
            config.temp_dir = Some(PathBuf::from(dir));
        }

        config
    }

    /// Force a platform instead of detecting the host
    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Load this artifact instead of packaged resources
    pub fn library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    /// Extract artifacts under this directory
    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Set the library name
    pub fn library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = name.into();
        self
    }

    /// Platform override, or the host platform
    pub fn resolve_platform(&self) -> crate::Result<Platform> {
        match self.platform {
            Some(platform) => Ok(platform),
            None => Platform::current(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
