//! Integration tests for locating and loading the native library
//!
//! None of these tests load a real artifact, so the process-wide gate stays
//! `NotLoaded` throughout and every failure leaves the fallback path open.

use std::env;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use onig_bridge::config::{LIBRARY_PATH_ENV, PLATFORM_ENV, TEMP_DIR_ENV};
use onig_bridge::{
    load_state, Arch, BridgeError, DirectoryResources, LibraryLoader, LoadGate, LoadState,
    LoaderConfig, Os, Platform,
};
use serial_test::serial;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(PLATFORM_ENV);
    env::remove_var(LIBRARY_PATH_ENV);
    env::remove_var(TEMP_DIR_ENV);
}

/// Lay out `native/<platform>/<file>` under a fresh directory
fn packaged(platform: Platform, contents: &[u8]) -> TempDir {
    let root = tempfile::tempdir().unwrap();
    let resource = platform.resource_path("onig_bridge_native");
    let path = resource
        .split('/')
        .fold(root.path().to_path_buf(), |dir, part| dir.join(part));
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, contents).unwrap();
    root
}

fn entries(dir: &Path) -> usize {
    fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn test_gate_loads_once_for_many_threads() {
    const THREADS: usize = 32;
    let gate: Arc<LoadGate<String>> = Arc::new(LoadGate::new());
    let loads = Arc::new(AtomicUsize::new(0));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let gate = Arc::clone(&gate);
            let loads = Arc::clone(&loads);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                gate.get_or_load(|| {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok("engine".to_string())
                })
                .map(|value| value.clone())
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().unwrap(), "engine");
    }
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(gate.state(), LoadState::Loaded);
}

#[test]
#[serial]
fn test_unpackaged_platform_is_library_not_found() {
    clear_env();
    let empty = tempfile::tempdir().unwrap();
    let loader = LibraryLoader::new(
        LoaderConfig::new().platform(Platform::new(Os::Windows, Arch::Aarch64)),
    )
    .with_resources(DirectoryResources::new(empty.path()));

    let err = loader.ensure_loaded().unwrap_err();
    assert!(matches!(err, BridgeError::LibraryNotFound { .. }));
    assert!(err.allows_path_fallback());
    assert_eq!(load_state(), LoadState::NotLoaded);
}

#[test]
#[serial]
fn test_corrupt_artifact_is_load_failure() {
    clear_env();
    let platform = Platform::current().unwrap_or(Platform::new(Os::Linux, Arch::X86_64));
    let resources = packaged(platform, b"\0\0\0\0 definitely not a library");
    let extract = tempfile::tempdir().unwrap();

    let loader = LibraryLoader::new(
        LoaderConfig::new()
            .platform(platform)
            .temp_dir(extract.path()),
    )
    .with_resources(DirectoryResources::new(resources.path()));

    let err = loader.ensure_loaded().unwrap_err();
    assert!(matches!(err, BridgeError::LoadFailure { .. }), "{err:?}");
    assert!(!err.allows_path_fallback());
    assert_eq!(load_state(), LoadState::NotLoaded);
    assert_eq!(entries(extract.path()), 0);
}

#[test]
#[serial]
fn test_environment_drives_loader_config() {
    clear_env();
    let extract = tempfile::tempdir().unwrap();
    env::set_var(PLATFORM_ENV, "linux-aarch64");
    env::set_var(TEMP_DIR_ENV, extract.path());

    let config = LoaderConfig::from_env();
    assert_eq!(config.platform, Some(Platform::new(Os::Linux, Arch::Aarch64)));
    assert_eq!(config.temp_dir.as_deref(), Some(extract.path()));
    assert_eq!(
        config.resolve_platform().unwrap().resource_path(&config.library_name),
        "native/linux-aarch64/libonig_bridge_native.so"
    );
    clear_env();
}

#[test]
#[serial]
fn test_explicit_path_from_environment_is_tried_first() {
    clear_env();
    env::set_var(LIBRARY_PATH_ENV, "/nonexistent/libonig_bridge_native.so");

    let err = LibraryLoader::new(LoaderConfig::from_env())
        .ensure_loaded()
        .unwrap_err();
    assert!(matches!(err, BridgeError::LoadFailure { .. }));
    assert_eq!(load_state(), LoadState::NotLoaded);
    clear_env();
}

#[test]
#[serial]
fn test_explicit_path_free_function() {
    clear_env();
    let err = onig_bridge::ensure_loaded_from_explicit_path("/nonexistent/onig_bridge_native.dll")
        .unwrap_err();
    match err {
        BridgeError::LoadFailure { path, .. } => {
            assert_eq!(path, Path::new("/nonexistent/onig_bridge_native.dll"))
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
