//! Which platforms to build

use std::env;
use std::fmt;

use clap::ValueEnum;
use onig_bridge::Platform;

use crate::error::Result;

/// Environment variable selecting the build mode
pub const MODE_ENV: &str = "NATIVE_BUILD_MODE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BuildMode {
    /// Build nothing
    Skip,
    /// Build every supported platform
    All,
    /// Build the host platform only
    #[default]
    Host,
}

impl BuildMode {
    /// `skip` and `all` are recognized; anything else means host
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => BuildMode::Skip,
            "all" => BuildMode::All,
            _ => BuildMode::Host,
        }
    }

    /// Mode from [`MODE_ENV`], host if unset
    pub fn from_env() -> Self {
        env::var(MODE_ENV)
            .map(|value| Self::parse(&value))
            .unwrap_or_default()
    }

    /// Platforms to build; `host` is only consulted in host mode
    ///
    /// # Errors
    /// [`BuildError::Platform`](crate::BuildError::Platform) if host mode
    /// cannot classify the host.
    pub fn platforms<F>(&self, host: F) -> Result<Vec<Platform>>
    where
        F: FnOnce() -> onig_bridge::Result<Platform>,
    {
        Ok(match self {
            BuildMode::Skip => Vec::new(),
            BuildMode::All => Platform::ALL.to_vec(),
            BuildMode::Host => vec![host()?],
        })
    }
}

impl fmt::Display for BuildMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildMode::Skip => "skip",
            BuildMode::All => "all",
            BuildMode::Host => "host",
        };
        f.write_str(name)
    }
}
