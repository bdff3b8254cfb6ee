use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface definition for attendsync
#[derive(Parser)]
#[command(
    name = "attendsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Poll biometric attendance devices and fan punches out to a spreadsheet, SQLite and guardian SMS",
    long_about = None
)]
pub struct Cli {
    /// Use this configuration file instead of ~/.attendsync/attendsync.conf
    #[arg(global = true, long = "config")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default configuration file and initialize the database
    Init {
        #[arg(long = "force", help = "Overwrite an existing configuration file")]
        force: bool,
    },

    /// Poll every configured device until interrupted (Ctrl-C)
    Run {
        #[arg(long = "device", help = "Only poll the device with this name")]
        device: Option<String>,
    },

    /// Run a single poll cycle for one device and print a summary
    Once {
        #[arg(long = "device", help = "Name of the device to poll")]
        device: String,
    },

    /// Show the last synced timestamp of every configured device
    Status,

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },
}
