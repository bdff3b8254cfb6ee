use crate::cli::parser::Commands;
use crate::config::Config;
use crate::db::SqliteStore;
use crate::db::log::write_entry;
use crate::errors::AppResult;
use crate::ui::messages::{field, info, success, warning};
use std::fs;
use std::path::Path;

/// Handle the `init` command
///
/// This initializes:
///  - the configuration file (unless present and `--force` is not given)
///  - the attendance database and all pending migrations
///  - the spreadsheet and log folders
pub fn handle(cmd: &Commands, config_path: &Path) -> AppResult<()> {
    let Commands::Init { force } = cmd else {
        return Ok(());
    };

    let cfg = if config_path.exists() && !force {
        warning(format!(
            "Config file {} already exists, keeping it (use --force to overwrite).",
            config_path.display()
        ));
        Config::load(config_path)?
    } else {
        let cfg = Config::default();
        cfg.save(config_path)?;
        success(format!("Config file: {}", config_path.display()));
        cfg
    };

    info("Initializing attendsync…");

    let store = SqliteStore::open(&cfg.database_path(), cfg.busy_timeout())?;
    fs::create_dir_all(cfg.sheet_dir_path())?;
    fs::create_dir_all(cfg.log_dir_path())?;

    field("Database", store.path().display());
    field("Sheets", cfg.sheet_dir_path().display());
    field("Logs", cfg.log_dir_path().display());

    // Internal log is informational only.
    let pool = store.connect()?;
    if let Err(e) = write_entry(
        &pool.conn,
        "init",
        &config_path.to_string_lossy(),
        "Configuration and database initialized",
    ) {
        warning(format!("Failed to write internal log: {}", e));
    }

    success("attendsync initialization completed!");
    Ok(())
}
