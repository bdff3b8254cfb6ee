use crate::cli::parser::Commands;
use crate::config::{Config, DeviceConfig};
use crate::context::AppContext;
use crate::core::shutdown::Shutdown;
use crate::errors::{AppError, AppResult};
use crate::utils::instance_lock::InstanceLock;
use crate::utils::logging;
use crate::utils::path::safe_file_stem;
use std::thread;

/// Handle the `run` command: one polling thread per device until Ctrl-C or
/// SIGTERM.
pub fn handle(cmd: &Commands, cfg: Config) -> AppResult<()> {
    let Commands::Run { device } = cmd else {
        return Ok(());
    };

    let devices: Vec<DeviceConfig> = match device {
        Some(name) => vec![cfg.device(name)?.clone()],
        None => cfg.devices.clone(),
    };
    if devices.is_empty() {
        return Err(AppError::Config("no devices configured".into()));
    }

    let scope = device
        .as_deref()
        .map(safe_file_stem)
        .unwrap_or_else(|| "all".to_string());

    let _log_guard = logging::init_with_file(&cfg.log_dir_path(), &format!("attendance_{scope}"))?;
    let _instances = InstanceLock::acquire_devices(&cfg.run_dir_path(), &devices)?;

    let shutdown = Shutdown::new();
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            tracing::info!("shutdown signal received, stopping gracefully");
            shutdown.request();
        })
        .map_err(|e| AppError::Other(format!("cannot install signal handler: {e}")))?;
    }

    let ctx = AppContext::from_config(cfg)?;

    // Every watermark is loaded before any loop starts; a failure aborts startup.
    let mut drivers = Vec::with_capacity(devices.len());
    for dev in &devices {
        drivers.push(ctx.driver(dev, shutdown.clone())?);
    }

    let mut handles = Vec::with_capacity(drivers.len());
    for driver in drivers {
        let name = driver.device().name.clone();
        let handle = thread::Builder::new()
            .name(format!("poll-{}", driver.device().safe_name()))
            .spawn(move || driver.run())?;
        handles.push((name, handle));
    }

    for (name, handle) in handles {
        if handle.join().is_err() {
            tracing::error!(device = %name, "polling thread panicked");
        }
    }

    tracing::info!("all polling loops stopped");
    Ok(())
}
