//! Application context: the adapters shared by every device loop.

use crate::config::{Config, DeviceConfig};
use crate::core::batch::{BatchProcessor, Sinks};
use crate::core::ports::{AuditLog, Notifier, RecordStore, SheetSink};
use crate::core::shutdown::Shutdown;
use crate::core::sync::{SyncDriver, SyncSettings};
use crate::db::SqliteStore;
use crate::device::{AttlogConnector, DeviceConnector};
use crate::directory::{DirectorySource, SqliteDirectory};
use crate::errors::AppResult;
use crate::notify::SmsClient;
use crate::sheet::SheetLog;
use crate::utils::lock::NamedLocks;
use crate::utils::path::expand_tilde;
use std::sync::Arc;
use std::time::Duration;

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub directory: Arc<dyn DirectorySource>,
    pub connector: Arc<dyn DeviceConnector>,
    pub sinks: Sinks,
}

impl AppContext {
    /// Open the store (running migrations) and build the production adapters.
    pub fn from_config(config: Config) -> AppResult<Self> {
        let store = Arc::new(SqliteStore::open(
            &config.database_path(),
            config.busy_timeout(),
        )?);

        let directory: Arc<dyn DirectorySource> = Arc::new(SqliteDirectory::new(
            expand_tilde(&config.directory.path),
            Duration::from_millis(config.directory.busy_timeout_ms),
        ));

        let audit: Arc<dyn AuditLog> = store.clone();
        let notifier: Arc<dyn Notifier> = Arc::new(SmsClient::new(&config.sms, audit)?);
        let sheet: Arc<dyn SheetSink> =
            Arc::new(SheetLog::new(config.sheet_dir_path(), NamedLocks::new()));
        let record_store: Arc<dyn RecordStore> = store.clone();

        Ok(Self {
            config,
            store,
            directory,
            connector: Arc::new(AttlogConnector::new()),
            sinks: Sinks {
                sheet,
                store: record_store,
                notifier,
            },
        })
    }

    pub fn processor(&self) -> BatchProcessor {
        BatchProcessor::new(
            self.directory.clone(),
            self.sinks.clone(),
            self.config.sms.template.clone(),
            Duration::from_millis(self.config.sms.send_delay_ms),
        )
    }

    /// Build the sync driver for `device`, loading its watermark.
    pub fn driver(&self, device: &DeviceConfig, shutdown: Shutdown) -> AppResult<SyncDriver> {
        SyncDriver::start(
            device.clone(),
            SyncSettings::from_config(&self.config),
            self.connector.clone(),
            self.processor(),
            self.sinks.store.clone(),
            shutdown,
        )
    }
}
