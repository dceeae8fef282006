//! # onig-bridge
//!
//! **Purpose**: Oniguruma regular expression matching for hosts that index text
//! in UTF-16 code units
//!
//! The engine itself lives in a native artifact (`onig-bridge-native`) that is
//! loaded once per process, either from the artifacts packaged with this crate
//! or from an explicit path.
//!
//! ## Features
//!
//! - **Platform Resolution**: Map host OS/arch names onto a packaged artifact
//! - **One-time Loading**: Extract and load the artifact under a process-wide gate
//! - **Handles**: Compile patterns and intern texts in native memory
//! - **Anchor Control**: Disable `\G` or `\A` per search
//! - **Offset Translation**: UTF-16 code units in, UTF-16 code units out
//! - **Scoped Wrappers**: Release native resources on drop
//! - **Static Linking** (`linked` feature): Install the native crate itself as
//!   the loaded library, still through the same gate
//!
//! ## Usage
//!
//! ```rust,no_run
//! use onig_bridge::{ensure_loaded_from_packaged_resources, Regex, SearchOptions, Utf16String};
//!
//! # fn main() -> onig_bridge::Result<()> {
//! let engine = ensure_loaded_from_packaged_resources()?;
//!
//! let regex = Regex::new(engine, "мир")?;
//! let text = Utf16String::from("привет, мир; привет, мир!");
//!
//! // Offsets are in UTF-16 code units
//! let found = regex.search(&text, 9, SearchOptions::default())?;
//! assert_eq!(found.and_then(|m| m.whole().and_then(|c| c.range())), Some(21..24));
//! # Ok(())
//! # }
//! ```

pub mod capture;
mod cleanup;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod offsets;
pub mod platform;
pub mod resources;

pub use capture::{Capture, MatchResult};
pub use config::LoaderConfig;
pub use engine::{NativeEngine, PatternHandle, SearchOptions, TextHandle};
pub use error::{BridgeError, Result};
pub use loader::{
    ensure_loaded_from_explicit_path, ensure_loaded_from_packaged_resources, load_state,
    LibraryLoader, LoadGate, LoadState,
};
#[cfg(feature = "linked")]
pub use loader::ensure_loaded_linked;
pub use matcher::{InternedText, Regex};
pub use offsets::Utf16String;
pub use platform::{Arch, Os, Platform};
pub use resources::{DirectoryResources, EmbeddedResources, ResourceBundle};
