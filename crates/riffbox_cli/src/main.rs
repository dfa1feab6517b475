// SPDX-License-Identifier: MIT OR Apache-2.0
//! `riffbox` - command line front end for Function trees and playlists.
//!
//! Subcommands:
//! - `validate`: two-pass validation of a Function file
//! - `outline`: the flat, depth-annotated list of a Function
//! - `project`: drop projection for a simulated drag
//! - `expand`: loop expansion of a flat action list
//! - `compile`: lowering of a Function into playback steps
//! - `init`: write the active settings to a RON file
//!
//! Settings come from `--config`, else `riffbox.ron` in the working directory.

mod commands;
mod settings;

use clap::{Parser, Subcommand};
use commands::CliError;
use settings::{Settings, DEFAULT_LOG_FILTER};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "riffbox", version, about = "Validate, inspect and compile Riffbox Functions")]
struct Cli {
    /// Settings file (RON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate a Function file
    Validate {
        /// Function JSON file
        path: PathBuf,
    },
    /// Print the flat list of a Function
    Outline {
        /// Function JSON file
        path: PathBuf,
        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },
    /// Project dragging one entry over another
    Project {
        /// Function JSON file
        path: PathBuf,
        /// Dragged entry ID
        #[arg(long)]
        active: String,
        /// Hovered entry ID
        #[arg(long)]
        over: String,
        /// Horizontal pointer offset in pixels
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        offset: f32,
        /// Apply the drop and print the resulting tree
        #[arg(long)]
        apply: bool,
    },
    /// Expand a flat action list into playback steps
    Expand {
        /// Action list JSON file
        path: PathBuf,
    },
    /// Compile a Function into playback steps
    Compile {
        /// Function JSON file
        path: PathBuf,
        /// Print the lowered action list instead
        #[arg(long)]
        actions: bool,
    },
    /// Write the active settings to a RON file
    Init {
        /// Target file, defaults to riffbox.ron
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let settings = Settings::locate(cli.config.as_deref());

    let default_filter = settings
        .as_ref()
        .map_or(DEFAULT_LOG_FILTER, |s| s.log_filter.as_str());
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(default_filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("riffbox v{}", env!("CARGO_PKG_VERSION"));

    let result = settings
        .map_err(CliError::from)
        .and_then(|settings| run(cli.command, &settings));
    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

fn run(command: Command, settings: &Settings) -> Result<(), CliError> {
    match command {
        Command::Validate { path } => commands::validate(&path, settings),
        Command::Outline { path, json } => commands::outline(&path, json, settings),
        Command::Project {
            path,
            active,
            over,
            offset,
            apply,
        } => commands::project(&path, &active, &over, offset, apply, settings),
        Command::Expand { path } => commands::expand(&path, settings),
        Command::Compile { path, actions } => commands::compile(&path, actions, settings),
        Command::Init { path, force } => commands::init(path.as_deref(), force, settings),
    }
}
