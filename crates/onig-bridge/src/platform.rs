//! Platform identification for packaged native artifacts
//!
//! Pure value types: nothing here touches the filesystem or the process.

use std::fmt;
use std::str::FromStr;

use crate::error::{BridgeError, Result};

/// Supported operating systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    MacOs,
    Windows,
}

impl Os {
    /// Canonical lowercase name used in identifiers
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Linux => "linux",
            Os::MacOs => "macos",
            Os::Windows => "windows",
        }
    }

    /// Classify a free-form OS name
    pub fn classify(name: &str) -> Option<Self> {
        let name = name.to_lowercase();
        // "darwin" contains "win", so macOS is checked first
        if name.contains("mac") || name.contains("darwin") {
            Some(Os::MacOs)
        } else if name.contains("win") {
            Some(Os::Windows)
        } else if name.contains("linux")
            || name.contains("nux")
            || name.contains("nix")
            || name.contains("aix")
        {
            Some(Os::Linux)
        } else {
            None
        }
    }
}

/// Supported CPU architectures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
}

impl Arch {
    /// Canonical name used in identifiers and target triples
    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// Classify a free-form architecture name.
    ///
    /// 32-bit x86 and ARM are deliberately not recognized.
    pub fn classify(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "x86_64" | "amd64" | "x64" | "x86-64" => Some(Arch::X86_64),
            "aarch64" | "arm64" => Some(Arch::Aarch64),
            _ => None,
        }
    }
}

/// An `(os, arch)` pair with canonical form `"<os>-<arch>"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: Os,
    pub arch: Arch,
}

impl Platform {
    /// Every platform an artifact can be built for
    pub const ALL: [Platform; 6] = [
        Platform::new(Os::MacOs, Arch::Aarch64),
        Platform::new(Os::MacOs, Arch::X86_64),
        Platform::new(Os::Windows, Arch::Aarch64),
        Platform::new(Os::Windows, Arch::X86_64),
        Platform::new(Os::Linux, Arch::Aarch64),
        Platform::new(Os::Linux, Arch::X86_64),
    ];

    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Resolve an OS name and architecture string
    ///
    /// # Examples
    /// ```
    /// use onig_bridge::Platform;
    ///
    /// let platform = Platform::resolve("Mac OS X", "arm64").unwrap();
    /// assert_eq!(platform.to_string(), "macos-aarch64");
    /// ```
    pub fn resolve(os_name: &str, arch_name: &str) -> Result<Self> {
        match (Os::classify(os_name), Arch::classify(arch_name)) {
            (Some(os), Some(arch)) => Ok(Self::new(os, arch)),
            _ => Err(BridgeError::UnsupportedPlatform {
                os: os_name.to_string(),
                arch: arch_name.to_string(),
            }),
        }
    }

    /// Platform of the running process
    pub fn current() -> Result<Self> {
        Self::resolve(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// File name of a shared library following this OS's conventions
    pub fn library_file_name(&self, name: &str) -> String {
        match self.os {
            Os::Linux => format!("lib{name}.so"),
            Os::MacOs => format!("lib{name}.dylib"),
            Os::Windows => format!("{name}.dll"),
        }
    }

    /// Resource path of a library packaged for this platform
    pub fn resource_path(&self, name: &str) -> String {
        format!("native/{}/{}", self, self.library_file_name(name))
    }

    /// Rust target triple producing artifacts for this platform
    pub fn target_triple(&self) -> String {
        let os_part = match self.os {
            Os::Windows => "pc-windows-msvc",
            Os::MacOs => "apple-darwin",
            Os::Linux => "unknown-linux-gnu",
        };
        format!("{}-{}", self.arch.as_str(), os_part)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.as_str(), self.arch.as_str())
    }
}

impl FromStr for Platform {
    type Err = BridgeError;

    /// Parse the canonical `"<os>-<arch>"` form
    fn from_str(s: &str) -> Result<Self> {
        let unsupported = || BridgeError::UnsupportedPlatform {
            os: s.to_string(),
            arch: String::new(),
        };
        let (os, arch) = s.trim().split_once('-').ok_or_else(unsupported)?;
        let os = match os {
            "linux" => Os::Linux,
            "macos" => Os::MacOs,
            "windows" => Os::Windows,
            _ => return Err(unsupported()),
        };
        let arch = Arch::classify(arch).ok_or_else(unsupported)?;
        Ok(Platform::new(os, arch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darwin_is_never_windows() {
        for name in ["Darwin", "darwin20.6.0", "Darwin Kernel Version 23.1.0"] {
            assert_eq!(Os::classify(name), Some(Os::MacOs), "{name}");
        }
        assert_eq!(
            Platform::resolve("darwin", "arm64").unwrap().to_string(),
            "macos-aarch64"
        );
    }

    #[test]
    fn test_resolve_os_names() {
        assert_eq!(Os::classify("Windows 11"), Some(Os::Windows));
        assert_eq!(Os::classify("windows"), Some(Os::Windows));
        assert_eq!(Os::classify("Mac OS X"), Some(Os::MacOs));
        assert_eq!(Os::classify("macos"), Some(Os::MacOs));
        assert_eq!(Os::classify("Darwin"), Some(Os::MacOs));
        assert_eq!(Os::classify("Linux"), Some(Os::Linux));
        assert_eq!(Os::classify("AIX"), Some(Os::Linux));
        assert_eq!(Os::classify("haiku"), None);
    }

    #[test]
    fn test_resolve_arch_names() {
        assert_eq!(Arch::classify("amd64"), Some(Arch::X86_64));
        assert_eq!(Arch::classify("X86_64"), Some(Arch::X86_64));
        assert_eq!(Arch::classify("arm64"), Some(Arch::Aarch64));
        assert_eq!(Arch::classify("aarch64"), Some(Arch::Aarch64));
        assert_eq!(Arch::classify("x86"), None);
        assert_eq!(Arch::classify("i386"), None);
        assert_eq!(Arch::classify("arm"), None);
    }

    #[test]
    fn test_resolve_rejects_unknown() {
        let err = Platform::resolve("plan9", "x86_64").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedPlatform { .. }));

        let err = Platform::resolve("linux", "riscv64").unwrap_err();
        assert!(matches!(err, BridgeError::UnsupportedPlatform { ref arch, .. } if arch == "riscv64"));
    }

    #[test]
    fn test_canonical_string() {
        let platform = Platform::resolve("linux", "amd64").unwrap();
        assert_eq!(platform.to_string(), "linux-x86_64");
        assert_eq!("linux-x86_64".parse::<Platform>().unwrap(), platform);
    }

    #[test]
    fn test_all_round_trips_through_string() {
        for platform in Platform::ALL {
            assert_eq!(platform.to_string().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("linux".parse::<Platform>().is_err());
        assert!("beos-x86_64".parse::<Platform>().is_err());
        assert!("linux-sparc".parse::<Platform>().is_err());
    }

    #[test]
    fn test_library_file_names() {
        let name = "onig_bridge_native";
        assert_eq!(
            Platform::new(Os::Linux, Arch::X86_64).library_file_name(name),
            "libonig_bridge_native.so"
        );
        assert_eq!(
            Platform::new(Os::MacOs, Arch::Aarch64).library_file_name(name),
            "libonig_bridge_native.dylib"
        );
        assert_eq!(
            Platform::new(Os::Windows, Arch::X86_64).library_file_name(name),
            "onig_bridge_native.dll"
        );
    }

    #[test]
    fn test_resource_path() {
        assert_eq!(
            Platform::new(Os::MacOs, Arch::X86_64).resource_path("onig_bridge_native"),
            "native/macos-x86_64/libonig_bridge_native.dylib"
        );
    }

    #[test]
    fn test_target_triples() {
        assert_eq!(
            Platform::new(Os::Linux, Arch::Aarch64).target_triple(),
            "aarch64-unknown-linux-gnu"
        );
        assert_eq!(
            Platform::new(Os::MacOs, Arch::X86_64).target_triple(),
            "x86_64-apple-darwin"
        );
        assert_eq!(
            Platform::new(Os::Windows, Arch::Aarch64).target_triple(),
            "aarch64-pc-windows-msvc"
        );
    }

    #[test]
    fn test_current_platform_matches_build_target() {
        if let Ok(platform) = Platform::current() {
            assert!(Platform::ALL.contains(&platform));
        }
    }
}
