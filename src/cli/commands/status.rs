use crate::config::Config;
use crate::core::ports::RecordStore;
use crate::db::SqliteStore;
use crate::errors::AppResult;
use crate::models::record::storage_timestamp;
use crate::ui::messages::{info, warning};
use crate::utils::colors::{GREY, RESET, color_for_optional_field};

/// Handle the `status` command: print each device's persisted watermark.
pub fn handle(cfg: &Config) -> AppResult<()> {
    if cfg.devices.is_empty() {
        warning("No devices configured.");
        return Ok(());
    }

    let store = SqliteStore::open(&cfg.database_path(), cfg.busy_timeout())?;
    info(format!("Database: {}", store.path().display()));

    let width = cfg
        .devices
        .iter()
        .map(|d| d.name.chars().count())
        .max()
        .unwrap_or(0);

    for dev in &cfg.devices {
        let last = store.load_watermark(&dev.name)?.map(|ts| storage_timestamp(&ts));
        let color = color_for_optional_field(last.as_deref());
        let shown = last.unwrap_or_else(|| "never synced".to_string());
        println!(
            "  {:<width$}  {}:{:<5}  {}{}{}",
            dev.name,
            dev.ip,
            dev.port,
            color,
            shown,
            RESET,
            width = width
        );
    }
    println!("{GREY}  (timestamps are device local time){RESET}");
    Ok(())
}
