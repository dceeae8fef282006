//! Loading the real native artifact through the process-wide gate
//!
//! The host artifact is built by the build tool into a scratch target
//! directory. This binary never installs the statically linked engine, so the
//! gate starts `NotLoaded` and every engine below is resolved with libloading.
//!
//! Everything runs in one test because the gate is loaded at most once per
//! process.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

use onig_bridge::{
    ensure_loaded_from_explicit_path, load_state, Capture, DirectoryResources, LibraryLoader,
    LoadState, LoaderConfig, NativeEngine, Platform, Regex, SearchOptions, Utf16String,
};
use onig_bridge_build::NativeBuilder;

const THREADS: usize = 8;

/// Build the host artifact and stage it as `<root>/native/<os>-<arch>/<file>`
fn stage_host_library(root: &Path, platform: Platform) -> PathBuf {
    NativeBuilder::new(env!("CARGO_MANIFEST_DIR"))
        .target_dir(Path::new(env!("CARGO_TARGET_TMPDIR")).join("native-build"))
        .out_dir(root.join("native"))
        .profile("dev")
        .build(platform)
        .expect("native library builds for the host")
}

#[test]
fn test_built_library_loads_once_across_threads_and_entry_points() {
    let platform = Platform::current().expect("host platform is supported");
    let staged = tempfile::tempdir().unwrap();
    let extract = tempfile::tempdir().unwrap();
    let library = stage_host_library(staged.path(), platform);
    assert_eq!(load_state(), LoadState::NotLoaded);

    // Half the threads race the explicit path, half the packaged resources
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let barrier = Arc::clone(&barrier);
            let library = library.clone();
            let loader = LibraryLoader::new(
                LoaderConfig::new()
                    .platform(platform)
                    .temp_dir(extract.path()),
            )
            .with_resources(DirectoryResources::new(staged.path()));
            thread::spawn(move || -> &'static NativeEngine {
                barrier.wait();
                let engine = if i % 2 == 0 {
                    ensure_loaded_from_explicit_path(&library)
                } else {
                    loader.ensure_loaded_from_packaged_resources()
                };
                engine.unwrap()
            })
        })
        .collect();

    let engines: Vec<&'static NativeEngine> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    let engine = engines[0];
    assert!(engines.iter().all(|other| std::ptr::eq(engine, *other)));
    assert_eq!(load_state(), LoadState::Loaded);
    assert_eq!(format!("{engine:?}"), "NativeEngine { dynamic: true }");

    // At most the winning packaged load extracted anything
    assert!(fs::read_dir(extract.path()).unwrap().count() <= 1);

    // Nothing is packaged here, so this would fail if it actually loaded
    let empty = tempfile::tempdir().unwrap();
    let later = LibraryLoader::new(LoaderConfig::new().platform(platform))
        .with_resources(DirectoryResources::new(empty.path()))
        .ensure_loaded_from_packaged_resources()
        .unwrap();
    assert!(std::ptr::eq(engine, later));
    let later = ensure_loaded_from_explicit_path("/nonexistent/libonig_bridge_native.so").unwrap();
    assert!(std::ptr::eq(engine, later));

    // Searches go through the dynamically resolved exports
    let regex = Regex::new(engine, r"(мир) ([0-9]+)").unwrap();
    let text = Utf16String::from("\u{1F6A7} привет, мир 123!");
    let found = regex
        .search(&text, 0, SearchOptions::default())
        .unwrap()
        .expect("match");
    assert_eq!(
        found.captures(),
        &[Capture::new(11, 18), Capture::new(11, 14), Capture::new(15, 18)]
    );
    assert!(matches!(
        Regex::new(engine, "(unclosed"),
        Err(onig_bridge::BridgeError::Compile(_))
    ));
}
