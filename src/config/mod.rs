use crate::errors::{AppError, AppResult};
use crate::utils::path::expand_tilde;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One biometric device polled by its own sync loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceConfig {
    pub name: String,
    pub ip: String,
    #[serde(default = "default_device_port")]
    pub port: u16,
    /// ATTLOG export written by the device (or its push service).
    #[serde(default)]
    pub attlog: Option<String>,
}

impl DeviceConfig {
    /// Device name usable inside file names ("Device A" → "Device_A").
    pub fn safe_name(&self) -> String {
        crate::utils::path::safe_file_stem(&self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DirectoryConfig {
    /// SQLite copy of the device software's user table.
    pub path: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SmsConfig {
    #[serde(default = "default_sms_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub auth_token: String,
    #[serde(default = "default_sms_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
    #[serde(default = "default_template")]
    pub template: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            base_url: default_sms_base_url(),
            account_id: String::new(),
            auth_token: String::new(),
            timeout_secs: default_sms_timeout(),
            send_delay_ms: default_send_delay_ms(),
            template: default_template(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    pub database: String,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    pub directory: DirectoryConfig,
    pub sheet_dir: String,
    pub log_dir: String,
    pub run_dir: String,
    #[serde(default)]
    pub sms: SmsConfig,
}

fn default_device_port() -> u16 {
    4370
}
fn default_poll_interval() -> u64 {
    3
}
fn default_batch_size() -> usize {
    10
}
fn default_connect_timeout() -> u64 {
    20
}
fn default_busy_timeout_ms() -> u64 {
    5000
}
fn default_sms_base_url() -> String {
    "https://apis.sematime.com".to_string()
}
fn default_sms_timeout() -> u64 {
    15
}
fn default_send_delay_ms() -> u64 {
    200
}
fn default_template() -> String {
    "Dear Parent/Guardian, your daughter, {name} ADM NO: {id}, {action} on {time}.".to_string()
}

impl Default for Config {
    fn default() -> Self {
        let dir = Self::config_dir();
        let dir_str = |p: &str| dir.join(p).to_string_lossy().to_string();
        Self {
            devices: vec![DeviceConfig {
                name: "Device A".to_string(),
                ip: "192.168.100.200".to_string(),
                port: default_device_port(),
                attlog: Some(dir_str("attlog/Device_A.dat")),
            }],
            poll_interval_secs: default_poll_interval(),
            batch_size: default_batch_size(),
            connect_timeout_secs: default_connect_timeout(),
            database: Self::database_file().to_string_lossy().to_string(),
            busy_timeout_ms: default_busy_timeout_ms(),
            directory: DirectoryConfig {
                path: dir_str("directory.sqlite"),
                busy_timeout_ms: default_busy_timeout_ms(),
            },
            sheet_dir: dir_str("sheets"),
            log_dir: dir_str("logs"),
            run_dir: dir.to_string_lossy().to_string(),
            sms: SmsConfig::default(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("attendsync")
        } else {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".attendsync")
        }
    }

    /// Return the full path of the default config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("attendsync.conf")
    }

    /// Return the full path of the default attendance database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("attendance.sqlite")
    }

    /// Load configuration from `path`, or return defaults if the file is absent.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let cfg: Config = serde_yaml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Write this configuration as YAML, creating parent folders.
    pub fn save(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.batch_size == 0 {
            return Err(AppError::Config("batch_size must be at least 1".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "poll_interval_secs must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for device in &self.devices {
            if device.name.trim().is_empty() {
                return Err(AppError::Config("device name cannot be empty".into()));
            }
            if !seen.insert(device.name.as_str()) {
                return Err(AppError::Config(format!(
                    "duplicate device name '{}'",
                    device.name
                )));
            }
        }
        Ok(())
    }

    pub fn device(&self, name: &str) -> AppResult<&DeviceConfig> {
        self.devices
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| AppError::Config(format!("no device named '{name}' is configured")))
    }

    pub fn database_path(&self) -> PathBuf {
        expand_tilde(&self.database)
    }

    pub fn sheet_dir_path(&self) -> PathBuf {
        expand_tilde(&self.sheet_dir)
    }

    pub fn log_dir_path(&self) -> PathBuf {
        expand_tilde(&self.log_dir)
    }

    pub fn run_dir_path(&self) -> PathBuf {
        expand_tilde(&self.run_dir)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}
