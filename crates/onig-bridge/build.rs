use std::env;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

fn main() {
    generate_embedded_native();
}

/// Embed every `native/<os>-<arch>/<file>` artifact placed by onig-bridge-build.
///
/// The directory defaults to `native/` next to this crate's manifest and can be
/// redirected with `ONIG_BRIDGE_NATIVE_DIR`. A missing directory produces an
/// empty table.
fn generate_embedded_native() {
    println!("cargo:rerun-if-env-changed=ONIG_BRIDGE_NATIVE_DIR");

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    let dest_path = PathBuf::from(&out_dir).join("embedded_native.rs");

    let native_dir = env::var_os("ONIG_BRIDGE_NATIVE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set");
            PathBuf::from(manifest_dir).join("native")
        });
    println!("cargo:rerun-if-changed={}", native_dir.display());

    let artifacts = collect_artifacts(&native_dir);
    if !artifacts.is_empty() {
        println!(
            "cargo:warning=Embedding {} native artifact(s) from {}",
            artifacts.len(),
            native_dir.display()
        );
    }

    let mut file = BufWriter::new(fs::File::create(&dest_path).expect("Failed to create embedded_native.rs"));
    writeln!(&mut file, "// Generated at build time from {}", native_dir.display()).unwrap();
    writeln!(&mut file, "static EMBEDDED: &[(&str, &[u8])] = &[").unwrap();
    for (resource, path) in &artifacts {
        println!("cargo:rerun-if-changed={}", path.display());
        writeln!(
            &mut file,
            "    ({:?}, include_bytes!({:?})),",
            resource,
            path.display().to_string()
        )
        .unwrap();
    }
    writeln!(&mut file, "];").unwrap();
}

fn collect_artifacts(native_dir: &Path) -> Vec<(String, PathBuf)> {
    let Ok(platforms) = fs::read_dir(native_dir) else {
        return Vec::new();
    };

    let mut artifacts = Vec::new();
    for platform in platforms.flatten() {
        if !platform.path().is_dir() {
            continue;
        }
        let platform_name = platform.file_name().to_string_lossy().into_owned();
        let Ok(files) = fs::read_dir(platform.path()) else {
            continue;
        };
        for file in files.flatten() {
            let path = file.path();
            if path.is_file() {
                let file_name = file.file_name().to_string_lossy().into_owned();
                let absolute = path.canonicalize().unwrap_or(path);
                artifacts.push((format!("native/{platform_name}/{file_name}"), absolute));
            }
        }
    }
    artifacts.sort();
    artifacts
}
