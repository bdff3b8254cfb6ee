use crate::cli::parser::Commands;
use crate::config::Config;
use crate::context::AppContext;
use crate::core::batch::SinkOutcome;
use crate::core::shutdown::Shutdown;
use crate::errors::AppResult;
use crate::ui::messages::{field, info, success, warning};
use crate::utils::instance_lock::InstanceLock;

fn describe(outcome: &SinkOutcome) -> String {
    match outcome {
        SinkOutcome::Written(n) => format!("{n} written"),
        SinkOutcome::Skipped => "skipped".to_string(),
        SinkOutcome::Failed(e) => format!("failed ({e})"),
    }
}

/// Handle the `once` command: a single poll cycle for one device.
pub fn handle(cmd: &Commands, cfg: Config) -> AppResult<()> {
    let Commands::Once { device } = cmd else {
        return Ok(());
    };

    let dev = cfg.device(device)?.clone();
    let _instance =
        InstanceLock::acquire_devices(&cfg.run_dir_path(), std::slice::from_ref(&dev))?;
    let ctx = AppContext::from_config(cfg)?;
    let mut driver = ctx.driver(&dev, Shutdown::new())?;

    info(format!("Polling '{}'…", dev.name));
    let report = driver.poll_once()?;

    field("Fetched", report.fetched);
    field("New", report.pending);
    field("Batches", report.batches.len());
    field("Records", report.records_written());

    for (i, b) in report.batches.iter().enumerate() {
        let line = format!(
            "sheet {}, store {}, sms {} sent / {} failed, {} unresolved, {} unknown",
            describe(&b.sheet),
            describe(&b.store),
            b.sent,
            b.failed_sends,
            b.output.unresolved,
            b.output.unknown_action
        );
        if b.sheet.is_failed() || b.store.is_failed() {
            warning(format!("Batch {}: {}", i + 1, line));
        } else {
            field(&format!("Batch {}", i + 1), line);
        }
    }

    success(format!(
        "Watermark for '{}': {}",
        dev.name, driver.watermark().last_timestamp
    ));
    Ok(())
}
