#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use attendsync::config::DeviceConfig;
use attendsync::core::batch::{BatchProcessor, Sinks};
use attendsync::core::ports::{
    AuditLog, DeliveryAttempt, DeliveryStatus, Notifier, RecordStore, SheetSink,
};
use attendsync::device::{DeviceConnector, DeviceSession};
use attendsync::directory::{DirectorySnapshot, DirectorySource};
use attendsync::errors::{AppError, AppResult};
use attendsync::models::{AttendanceRecord, NotificationMessage, RawEvent, UserDetail, Watermark};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub fn attsync() -> Command {
    cargo_bin_cmd!("attendsync")
}

/// Parse `YYYY-MM-DD HH:MM:SS`.
pub fn ts(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

pub fn ev(user_id: &str, at: &str, code: i32) -> RawEvent {
    RawEvent::new(user_id, ts(at), code)
}

pub fn device(name: &str) -> DeviceConfig {
    DeviceConfig {
        name: name.to_string(),
        ip: "127.0.0.1".to_string(),
        port: 4370,
        attlog: None,
    }
}

// ---------------------------
// Directory
// ---------------------------

/// In-memory directory. `batch` answers the batched query, `fallback_only`
/// is only visible to the one-by-one lookup (like keys stored with padding).
#[derive(Default)]
pub struct FakeDirectory {
    pub batch: HashMap<String, UserDetail>,
    pub fallback_only: HashMap<String, UserDetail>,
    pub fail_snapshot: bool,
    pub fail_batch: bool,
    pub fail_one: Vec<String>,
    pub batch_calls: Arc<AtomicUsize>,
    pub fallback_calls: Arc<Mutex<Vec<String>>>,
}

impl FakeDirectory {
    pub fn with_users(users: &[(&str, Option<&str>, Option<&str>)]) -> Self {
        let mut dir = Self::default();
        for (id, name, phone) in users {
            dir.batch.insert(
                id.to_string(),
                UserDetail::new(*id, name.map(str::to_string), phone.map(str::to_string)),
            );
        }
        dir
    }
}

struct FakeSnapshot {
    batch: HashMap<String, UserDetail>,
    fallback_only: HashMap<String, UserDetail>,
    fail_batch: bool,
    fail_one: Vec<String>,
    batch_calls: Arc<AtomicUsize>,
    fallback_calls: Arc<Mutex<Vec<String>>>,
}

impl DirectorySnapshot for FakeSnapshot {
    fn lookup_batch(&self, ids: &[String]) -> AppResult<HashMap<String, UserDetail>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_batch {
            return Err(AppError::Directory("batch query failed".into()));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.batch.get(id).map(|d| (id.clone(), d.clone())))
            .collect())
    }

    fn lookup_one(&self, id: &str) -> AppResult<Option<UserDetail>> {
        self.fallback_calls.lock().unwrap().push(id.to_string());
        if self.fail_one.iter().any(|f| f == id) {
            return Err(AppError::Directory(format!("lookup of {id} failed")));
        }
        Ok(self.fallback_only.get(id).cloned())
    }
}

impl DirectorySource for FakeDirectory {
    fn open_snapshot(&self) -> AppResult<Box<dyn DirectorySnapshot>> {
        if self.fail_snapshot {
            return Err(AppError::Directory("snapshot failed".into()));
        }
        Ok(Box::new(FakeSnapshot {
            batch: self.batch.clone(),
            fallback_only: self.fallback_only.clone(),
            fail_batch: self.fail_batch,
            fail_one: self.fail_one.clone(),
            batch_calls: self.batch_calls.clone(),
            fallback_calls: self.fallback_calls.clone(),
        }))
    }
}

// ---------------------------
// Sinks
// ---------------------------

#[derive(Default)]
pub struct FakeSheet {
    pub rows: Mutex<Vec<AttendanceRecord>>,
    pub fail: AtomicBool,
}

impl SheetSink for FakeSheet {
    fn append_rows(&self, _device_name: &str, records: &[AttendanceRecord]) -> AppResult<usize> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Other("spreadsheet is locked".into()));
        }
        self.rows.lock().unwrap().extend_from_slice(records);
        Ok(records.len())
    }
}

#[derive(Default)]
pub struct FakeStore {
    pub records: Mutex<Vec<AttendanceRecord>>,
    pub watermarks: Mutex<HashMap<String, NaiveDateTime>>,
    pub saves: Mutex<Vec<NaiveDateTime>>,
    pub fail_load: AtomicBool,
    pub fail_insert: AtomicBool,
    pub fail_save: AtomicBool,
}

impl FakeStore {
    pub fn with_watermark(device_name: &str, at: NaiveDateTime) -> Self {
        let store = Self::default();
        store
            .watermarks
            .lock()
            .unwrap()
            .insert(device_name.to_string(), at);
        store
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl RecordStore for FakeStore {
    fn load_watermark(&self, device_name: &str) -> AppResult<Option<NaiveDateTime>> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(AppError::Other("database is locked".into()));
        }
        Ok(self.watermarks.lock().unwrap().get(device_name).copied())
    }

    fn insert_records(&self, records: &[AttendanceRecord]) -> AppResult<usize> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(AppError::Other("database is locked".into()));
        }
        self.records.lock().unwrap().extend_from_slice(records);
        Ok(records.len())
    }

    fn save_watermark(&self, watermark: &Watermark) -> AppResult<()> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(AppError::Other("database is locked".into()));
        }
        self.saves.lock().unwrap().push(watermark.last_timestamp);
        let mut map = self.watermarks.lock().unwrap();
        let entry = map
            .entry(watermark.device_name.clone())
            .or_insert(watermark.last_timestamp);
        if watermark.last_timestamp > *entry {
            *entry = watermark.last_timestamp;
        }
        Ok(())
    }
}

/// Delivers to everyone except the numbers listed in `failing`, which get a
/// transport failure. Every attempt is recorded in `attempts`.
#[derive(Default)]
pub struct FakeNotifier {
    pub sent: Mutex<Vec<NotificationMessage>>,
    pub failing: Mutex<Vec<String>>,
    pub attempts: Mutex<Vec<(String, Instant)>>,
}

impl FakeNotifier {
    pub fn recipients(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|m| m.recipient_phone.clone())
            .collect()
    }
}

impl Notifier for FakeNotifier {
    fn send(&self, message: &NotificationMessage) -> DeliveryStatus {
        if message.recipient_phone.trim().is_empty() {
            return DeliveryStatus::InvalidRecipient;
        }
        self.attempts
            .lock()
            .unwrap()
            .push((message.recipient_phone.clone(), Instant::now()));
        if self.failing.lock().unwrap().contains(&message.recipient_phone) {
            return DeliveryStatus::Failed("connection reset".into());
        }
        self.sent.lock().unwrap().push(message.clone());
        DeliveryStatus::Delivered(200)
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub attempts: Mutex<Vec<DeliveryAttempt>>,
}

impl AuditLog for RecordingAudit {
    fn record_delivery(&self, attempt: &DeliveryAttempt) -> AppResult<()> {
        self.attempts.lock().unwrap().push(attempt.clone());
        Ok(())
    }
}

/// Fakes wired together the way the application wires the real adapters.
pub struct Harness {
    pub directory: Arc<FakeDirectory>,
    pub sheet: Arc<FakeSheet>,
    pub store: Arc<FakeStore>,
    pub notifier: Arc<FakeNotifier>,
}

pub const TEMPLATE: &str = "{name} ({id}) {action} at {time}";

impl Harness {
    pub fn new(directory: FakeDirectory, store: FakeStore) -> Self {
        Self {
            directory: Arc::new(directory),
            sheet: Arc::new(FakeSheet::default()),
            store: Arc::new(store),
            notifier: Arc::new(FakeNotifier::default()),
        }
    }

    pub fn processor(&self) -> BatchProcessor {
        self.processor_with_delay(Duration::ZERO)
    }

    pub fn processor_with_delay(&self, send_delay: Duration) -> BatchProcessor {
        let sinks = Sinks {
            sheet: self.sheet.clone(),
            store: self.store.clone(),
            notifier: self.notifier.clone(),
        };
        BatchProcessor::new(self.directory.clone(), sinks, TEMPLATE, send_delay)
    }
}

// ---------------------------
// Device
// ---------------------------

/// Connector serving a fixed event list and counting session lifecycle calls.
#[derive(Default, Clone)]
pub struct FakeConnector {
    pub events: Arc<Mutex<Vec<RawEvent>>>,
    pub fail_connect: Arc<AtomicBool>,
    pub fail_fetch: Arc<AtomicBool>,
    pub connects: Arc<AtomicUsize>,
    pub resumes: Arc<AtomicUsize>,
    pub disconnects: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn with_events(events: Vec<RawEvent>) -> Self {
        let connector = Self::default();
        *connector.events.lock().unwrap() = events;
        connector
    }
}

struct FakeSession {
    connector: FakeConnector,
}

impl DeviceSession for FakeSession {
    fn pause_capture(&mut self) -> AppResult<()> {
        Ok(())
    }

    fn resume_capture(&mut self) -> AppResult<()> {
        self.connector.resumes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fetch_events(&mut self) -> AppResult<Vec<RawEvent>> {
        if self.connector.fail_fetch.load(Ordering::SeqCst) {
            return Err(AppError::Device("read timed out".into()));
        }
        Ok(self.connector.events.lock().unwrap().clone())
    }

    fn disconnect(&mut self) -> AppResult<()> {
        self.connector.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl DeviceConnector for FakeConnector {
    fn connect(
        &self,
        device: &DeviceConfig,
        _timeout: Duration,
    ) -> AppResult<Box<dyn DeviceSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(AppError::Device(format!("{} unreachable", device.name)));
        }
        Ok(Box::new(FakeSession {
            connector: self.clone(),
        }))
    }
}

// ---------------------------
// Files
// ---------------------------

/// Create a vendor-style `USERINFO` table holding `rows` of (SSN, Name, OPHONE).
pub fn write_directory_db(path: &Path, rows: &[(&str, Option<&str>, Option<&str>)]) {
    let conn = rusqlite::Connection::open(path).expect("open directory db");
    conn.execute_batch(
        "CREATE TABLE USERINFO (
            USERID INTEGER PRIMARY KEY AUTOINCREMENT,
            SSN    TEXT,
            Name   TEXT,
            OPHONE TEXT
        );",
    )
    .expect("create USERINFO");
    for (ssn, name, phone) in rows {
        conn.execute(
            "INSERT INTO USERINFO (SSN, Name, OPHONE) VALUES (?1, ?2, ?3)",
            rusqlite::params![ssn, name, phone],
        )
        .expect("insert user");
    }
}

/// Write an ATTLOG export: `PIN \t timestamp \t verified \t status \t workcode`.
pub fn write_attlog(path: &Path, lines: &[(&str, &str, i32)]) {
    let mut body = String::new();
    for (pin, at, code) in lines {
        body.push_str(&format!("{pin}\t{at}\t1\t{code}\t0\n"));
    }
    fs::write(path, body).expect("write attlog");
}

/// Write a config whose every path lives under `root`.
pub fn write_config(root: &Path, attlog: &Path, directory: &Path, sms_base_url: &str) -> PathBuf {
    let cfg_path = root.join("attendsync.conf");
    let yaml = format!(
        r#"devices:
  - name: Device A
    ip: 127.0.0.1
    port: 4370
    attlog: {attlog}
poll_interval_secs: 1
batch_size: 2
connect_timeout_secs: 5
database: {db}
busy_timeout_ms: 2000
directory:
  path: {dir}
sheet_dir: {sheets}
log_dir: {logs}
run_dir: {run}
sms:
  base_url: {sms}
  account_id: acct
  auth_token: token
  timeout_secs: 2
  send_delay_ms: 0
"#,
        attlog = attlog.display(),
        db = root.join("attendance.sqlite").display(),
        dir = directory.display(),
        sheets = root.join("sheets").display(),
        logs = root.join("logs").display(),
        run = root.join("run").display(),
        sms = sms_base_url,
    );
    fs::write(&cfg_path, yaml).expect("write config");
    cfg_path
}
