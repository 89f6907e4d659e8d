use std::path::PathBuf;

use clap::Parser;

use driftwall::builder::build_playlist;

/// Build a 24-hour cyclic wallpaper schedule from a directory of images.
#[derive(Parser, Debug)]
#[command(name = "driftwall-build", version)]
struct Cli {
    /// Directory containing at least 2 images (.png/.jpg/.jpeg).
    dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let out = build_playlist(&cli.dir)?;
    eprintln!("wrote {}", out.display());
    Ok(())
}
