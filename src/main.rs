// Copyright © 2026 Lukas Bower
// SPDX-License-Identifier: Apache-2.0
// Purpose: CLI entry point for the cohvol volume shell.
// Author: Lukas Bower
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! CLI entry point for the cohvol volume shell.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cohvol::{Shell, Volume, VolumeConfig};
use env_logger::Env;
use log::LevelFilter;

/// cohvol command-line arguments.
#[derive(Debug, Parser)]
#[command(author = "Lukas Bower", version, about = "Partitioned volume shell", long_about = None)]
struct Cli {
    /// TOML config describing the volume files and size.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backing store file (overrides config and environment).
    #[arg(long, value_name = "FILE")]
    disk: Option<PathBuf>,

    /// Metadata record file (overrides config and environment).
    #[arg(long, value_name = "FILE")]
    metadata: Option<PathBuf>,

    /// Credential record file (overrides config and environment).
    #[arg(long, value_name = "FILE")]
    credentials: Option<PathBuf>,

    /// Volume size in bytes used when the backing file is created.
    #[arg(long)]
    size: Option<u64>,

    /// Execute commands from a script file instead of standard input.
    #[arg(long, value_name = "FILE")]
    script: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let mut builder =
        env_logger::Builder::from_env(Env::default().default_filter_or(default_level.as_str()));
    builder.format_timestamp_millis();
    let _ = builder.try_init();
}

fn resolve_config(cli: &Cli) -> Result<VolumeConfig> {
    let mut config = match &cli.config {
        Some(path) => VolumeConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => VolumeConfig::default(),
    };
    config
        .apply_env()
        .context("failed to apply environment overrides")?;
    if let Some(size) = cli.size {
        config.volume_size = size;
    }
    if let Some(path) = &cli.disk {
        config.disk_path = path.clone();
    }
    if let Some(path) = &cli.metadata {
        config.metadata_path = path.clone();
    }
    if let Some(path) = &cli.credentials {
        config.credentials_path = path.clone();
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = resolve_config(&cli)?;
    let volume = Volume::open(&config)
        .with_context(|| format!("failed to open volume {}", config.disk_path.display()))?;

    let stdout = io::stdout();
    let writer = stdout.lock();
    let volume = match &cli.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            let mut shell = Shell::new(volume, BufReader::new(file), writer).with_prompts(false);
            shell.run()?;
            shell.into_parts().0
        }
        None => {
            let stdin = io::stdin();
            let mut shell = Shell::new(volume, stdin.lock(), writer);
            shell.run()?;
            shell.into_parts().0
        }
    };
    volume.close().context("failed to close volume")?;
    Ok(())
}
