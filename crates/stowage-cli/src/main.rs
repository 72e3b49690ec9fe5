//! stowage command runner.
//!
//! Executes a script of filesystem commands, one per line, against a fresh
//! in-memory tree. The tree lives only as long as the process.
//!
//! Usage:
//!   # Script from a file
//!   stowage setup.stow
//!
//!   # Script from stdin, Windows path flavour from a config file
//!   echo 'mkdir -p /a/b' | stowage --config windows.ron
//!
//! Set `RUST_LOG=stowage_vfs=debug` to trace every structural operation.

mod script;

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use stowage_vfs::{FileSystemConfig, InMemoryFileSystem};

use crate::script::Runner;

/// Run filesystem scripts against an in-memory tree.
#[derive(Parser, Debug)]
#[command(name = "stowage")]
#[command(about = "Run filesystem scripts against an in-memory tree")]
struct Args {
    /// RON configuration file (default: $XDG_CONFIG_HOME/stowage/config.ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Script to execute (default: stdin)
    script: Option<PathBuf>,
}

/// Default config location, if a config dir is known.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("stowage").join("config.ron"))
}

/// An explicit config must load; the default one is optional.
fn load_config(explicit: Option<&Path>) -> Result<FileSystemConfig> {
    if let Some(path) = explicit {
        return FileSystemConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()));
    }
    match default_config_path() {
        Some(path) if path.exists() => FileSystemConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        _ => Ok(FileSystemConfig::default()),
    }
}

fn read_script(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading script {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("reading script from stdin")?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let script = read_script(args.script.as_deref())?;

    let fs = InMemoryFileSystem::with_config(&config).into_shared();
    tracing::info!(flavor = ?config.flavor, id = %fs.id(), "filesystem ready");

    let stdout = std::io::stdout();
    let mut runner = Runner::new(fs, stdout.lock());
    runner.run(&script).await?;
    runner.into_inner().flush()?;
    Ok(())
}
