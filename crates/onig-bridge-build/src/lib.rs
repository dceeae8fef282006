//! # onig-bridge-build
//!
//! Builds `onig-bridge-native` for one or more platforms and stages the
//! artifacts where `onig-bridge` embeds them (`native/<os>-<arch>/<file>`).
//!
//! The set of platforms comes from [`BuildMode`]: `NATIVE_BUILD_MODE=skip`
//! builds nothing, `all` builds every supported platform, anything else builds
//! the host only.

pub mod builder;
pub mod error;
pub mod mode;

pub use builder::{profile_dir, NativeBuilder, NATIVE_PACKAGE};
pub use error::{BuildError, Result};
pub use mode::{BuildMode, MODE_ENV};
