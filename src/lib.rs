//! attendsync library root.
//! Exposes the CLI parser, the high-level run() function, and internal modules.

pub mod cli;
pub mod config;
pub mod context;
pub mod core;
pub mod db;
pub mod device;
pub mod directory;
pub mod errors;
pub mod models;
pub mod notify;
pub mod sheet;
pub mod ui;
pub mod utils;

use clap::Parser;
use cli::parser::{Cli, Commands};
use config::Config;
use errors::AppResult;
use std::path::Path;

/// Central command dispatcher
pub fn dispatch(cli: &Cli, config_path: &Path) -> AppResult<()> {
    // `init` writes the config, so it must not require one.
    if let Commands::Init { .. } = cli.command {
        utils::logging::init_console();
        return cli::commands::init::handle(&cli.command, config_path);
    }

    let cfg = Config::load(config_path)?;

    // `run` installs its own file-backed subscriber.
    if !matches!(cli.command, Commands::Run { .. }) {
        utils::logging::init_console();
    }

    match &cli.command {
        Commands::Run { .. } => cli::commands::run::handle(&cli.command, cfg),
        Commands::Once { .. } => cli::commands::once::handle(&cli.command, cfg),
        Commands::Status => cli::commands::status::handle(&cfg),
        Commands::Db { .. } => cli::commands::db::handle(&cli.command, &cfg),
        Commands::Init { .. } => Ok(()),
    }
}

/// Entry point used by main.rs
pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::config_file);
    dispatch(&cli, &config_path)
}
