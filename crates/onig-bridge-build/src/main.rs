use std::path::PathBuf;

use clap::Parser;
use onig_bridge::Platform;
use onig_bridge_build::{BuildMode, NativeBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "onig-bridge-build")]
#[command(about = "Build and stage onig-bridge native libraries")]
struct Cli {
    /// Platforms to build (defaults to NATIVE_BUILD_MODE, then host)
    #[arg(short, long, value_enum)]
    mode: Option<BuildMode>,

    /// Cargo profile
    #[arg(short, long, default_value = "release")]
    profile: String,

    /// Workspace root
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Staging directory (defaults to crates/onig-bridge/native)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Cargo target directory
    #[arg(long)]
    target_dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mode = cli.mode.unwrap_or_else(BuildMode::from_env);

    let mut builder = NativeBuilder::new(&cli.workspace).profile(&cli.profile);
    if let Some(out) = cli.out {
        builder = builder.out_dir(out);
    }
    if let Some(target_dir) = cli.target_dir {
        builder = builder.target_dir(target_dir);
    }

    let platforms = mode.platforms(Platform::current)?;
    if platforms.is_empty() {
        info!(%mode, "Native build skipped");
        return Ok(());
    }

    let staged = builder.build_all(&platforms)?;
    for path in &staged {
        println!("{}", path.display());
    }
    info!(%mode, count = staged.len(), "Native libraries staged");

    Ok(())
}
