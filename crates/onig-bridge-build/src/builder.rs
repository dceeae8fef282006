//! Cross-compilation of the native crate and artifact staging

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use onig_bridge::Platform;
use onig_bridge_sys::LIBRARY_NAME;
use tracing::{debug, info};

use crate::error::{BuildError, Result};

/// Package compiled for each platform
pub const NATIVE_PACKAGE: &str = "onig-bridge-native";

/// Directory under the target dir that cargo uses for `profile`
pub fn profile_dir(profile: &str) -> &str {
    match profile {
        "dev" | "test" => "debug",
        "bench" => "release",
        other => other,
    }
}

/// Builds the native crate per platform and stages artifacts as
/// `<out_dir>/<os>-<arch>/<library file>`
#[derive(Debug, Clone)]
pub struct NativeBuilder {
    workspace: PathBuf,
    target_dir: PathBuf,
    out_dir: PathBuf,
    profile: String,
    package: String,
    library_name: String,
    cargo: Option<PathBuf>,
}

impl NativeBuilder {
    /// Builder for the workspace rooted at `workspace`.
    ///
    /// Defaults: `release` profile, `$CARGO_TARGET_DIR` or `<workspace>/target`,
    /// artifacts staged into `<workspace>/crates/onig-bridge/native`.
    pub fn new(workspace: impl Into<PathBuf>) -> Self {
        let workspace = workspace.into();
        let target_dir = env::var_os("CARGO_TARGET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| workspace.join("target"));
        let out_dir = workspace.join("crates").join("onig-bridge").join("native");

        Self {
            workspace,
            target_dir,
            out_dir,
            profile: "release".to_string(),
            package: NATIVE_PACKAGE.to_string(),
            library_name: LIBRARY_NAME.to_string(),
            cargo: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = profile.into();
        self
    }

    pub fn out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }

    pub fn target_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.target_dir = dir.into();
        self
    }

    /// Use this cargo instead of searching for one
    pub fn cargo(mut self, cargo: impl Into<PathBuf>) -> Self {
        self.cargo = Some(cargo.into());
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    /// Where cargo leaves the library for `platform`
    pub fn built_artifact(&self, platform: Platform) -> PathBuf {
        self.target_dir
            .join(platform.target_triple())
            .join(profile_dir(&self.profile))
            .join(platform.library_file_name(&self.library_name))
    }

    /// Where the library for `platform` is staged for embedding
    pub fn staged_artifact(&self, platform: Platform) -> PathBuf {
        self.out_dir
            .join(platform.to_string())
            .join(platform.library_file_name(&self.library_name))
    }

    /// The cargo invocation building `platform`
    pub fn command(&self, cargo: &Path, platform: Platform) -> Command {
        let mut command = Command::new(cargo);
        command
            .current_dir(&self.workspace)
            .env("CARGO_TARGET_DIR", &self.target_dir)
            .arg("build")
            .arg(format!("--package={}", self.package))
            .arg(format!("--profile={}", self.profile))
            .arg(format!("--target={}", platform.target_triple()))
            .arg("--color=always");
        command
    }

    /// Build and stage one platform, returning the staged path
    pub fn build(&self, platform: Platform) -> Result<PathBuf> {
        let cargo = self.resolve_cargo()?;
        let target = platform.target_triple();
        info!(platform = %platform, target = %target, profile = %self.profile, "Building native library");

        let status = self
            .command(&cargo, platform)
            .status()
            .map_err(|source| BuildError::Spawn {
                target: target.clone(),
                source,
            })?;
        if !status.success() {
            return Err(BuildError::CargoFailed { target, status });
        }

        self.stage(platform)
    }

    /// Build and stage each platform in order, stopping at the first failure
    pub fn build_all(&self, platforms: &[Platform]) -> Result<Vec<PathBuf>> {
        platforms.iter().map(|platform| self.build(*platform)).collect()
    }

    /// Copy an already built artifact into the staging directory
    pub fn stage(&self, platform: Platform) -> Result<PathBuf> {
        let source = self.built_artifact(platform);
        if !source.is_file() {
            return Err(BuildError::MissingArtifact { path: source });
        }

        let destination = self.staged_artifact(platform);
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)?;
        }
        let bytes = fs::copy(&source, &destination)?;
        debug!(
            from = %source.display(),
            to = %destination.display(),
            bytes,
            "Staged native library"
        );
        Ok(destination)
    }

    fn resolve_cargo(&self) -> Result<PathBuf> {
        if let Some(cargo) = &self.cargo {
            return Ok(cargo.clone());
        }
        // Set when running under cargo, e.g. `cargo run -p onig-bridge-build`
        if let Some(cargo) = env::var_os("CARGO") {
            return Ok(PathBuf::from(cargo));
        }
        Ok(which::which("cargo")?)
    }
}
