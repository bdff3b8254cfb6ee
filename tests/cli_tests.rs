use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::fs;

mod common;
use common::{attsync, write_attlog, write_config, write_directory_db};

/// Config, attlog and directory under one temp root.
fn setup() -> (tempfile::TempDir, std::path::PathBuf) {
    let tmp = tempfile::tempdir().unwrap();
    let attlog = tmp.path().join("Device_A.dat");
    let directory = tmp.path().join("att2000.sqlite");

    write_attlog(
        &attlog,
        &[
            ("1001", "2024-05-06 07:58:12", 0),
            ("1002", "2024-05-06 08:01:00", 0),
            ("1001", "2024-05-06 16:03:00", 1),
            ("9999", "2024-05-06 16:04:00", 0),
        ],
    );
    write_directory_db(
        &directory,
        &[
            ("1001", Some("Amina Yusuf"), None),
            ("1002", Some("Brenda Otieno"), None),
        ],
    );
    let cfg = write_config(tmp.path(), &attlog, &directory, "http://127.0.0.1:9");
    (tmp, cfg)
}

#[test]
fn test_init_writes_config_and_database() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = tmp.path().join("attendsync.conf");

    attsync()
        .env("HOME", tmp.path())
        .args(["--config", cfg.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(contains("initialization completed"));

    assert!(cfg.exists());
    assert!(tmp.path().join(".attendsync").join("attendance.sqlite").exists());

    attsync()
        .env("HOME", tmp.path())
        .args(["--config", cfg.to_str().unwrap(), "init"])
        .assert()
        .success()
        .stdout(contains("already exists"));
}

#[test]
fn test_status_before_any_sync() {
    let (_tmp, cfg) = setup();

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(contains("Device A").and(contains("never synced")));
}

#[test]
fn test_once_syncs_device_and_advances_watermark() {
    let (tmp, cfg) = setup();

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "once", "--device", "Device A"])
        .assert()
        .success()
        .stdout(contains("Records").and(contains("2024-05-06 16:04:00")));

    let conn = rusqlite::Connection::open(tmp.path().join("attendance.sqlite")).unwrap();
    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM attendance_logs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(stored, 3);

    let ledger =
        fs::read_to_string(tmp.path().join("sheets").join("attendance_log_Device_A.csv")).unwrap();
    assert_eq!(ledger.lines().count(), 4);
    assert!(
        tmp.path()
            .join("sheets")
            .join("attendance_log_Device_A.xlsx")
            .exists()
    );

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(contains("2024-05-06 16:04:00"));

    // Nothing new on the second pass.
    attsync()
        .args(["--config", cfg.to_str().unwrap(), "once", "--device", "Device A"])
        .assert()
        .success();
    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM attendance_logs", [], |r| r.get(0))
        .unwrap();
    assert_eq!(stored, 3);
}

#[test]
fn test_once_with_unknown_device_fails() {
    let (_tmp, cfg) = setup();

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "once", "--device", "Gate 9"])
        .assert()
        .failure()
        .stderr(contains("no device named 'Gate 9'"));
}

#[test]
fn test_db_info_and_check() {
    let (_tmp, cfg) = setup();

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "db", "--info", "--check"])
        .assert()
        .success()
        .stdout(contains("Attendance records").and(contains("Integrity check passed")));
}

/// Pretend another process is polling Device A.
fn hold_device_lock(tmp: &tempfile::TempDir) -> std::path::PathBuf {
    let run_dir = tmp.path().join("run");
    fs::create_dir_all(&run_dir).unwrap();
    let pid_file = run_dir.join("attendsync_Device_A.pid");
    fs::write(&pid_file, "4242").unwrap();
    pid_file
}

#[test]
fn test_run_refuses_a_device_already_being_polled() {
    let (tmp, cfg) = setup();
    let pid_file = hold_device_lock(&tmp);

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "run"])
        .assert()
        .failure()
        .stderr(contains("already running"));

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "run", "--device", "Device A"])
        .assert()
        .failure()
        .stderr(contains("already running"));

    // The lock of the other process is left alone.
    assert_eq!(fs::read_to_string(&pid_file).unwrap(), "4242");
}

#[test]
fn test_once_refuses_a_device_already_being_polled() {
    let (tmp, cfg) = setup();
    hold_device_lock(&tmp);

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "once", "--device", "Device A"])
        .assert()
        .failure()
        .stderr(contains("already running"));

    let conn = rusqlite::Connection::open(tmp.path().join("attendance.sqlite")).unwrap();
    let stored: i64 = conn
        .query_row("SELECT COUNT(*) FROM attendance_logs", [], |r| r.get(0))
        .unwrap_or(0);
    assert_eq!(stored, 0);
}

#[test]
fn test_once_releases_its_device_lock() {
    let (tmp, cfg) = setup();

    attsync()
        .args(["--config", cfg.to_str().unwrap(), "once", "--device", "Device A"])
        .assert()
        .success();

    assert!(!tmp.path().join("run").join("attendsync_Device_A.pid").exists());
}

#[test]
fn test_status_logs_schema_setup() {
    let (_tmp, cfg) = setup();

    attsync()
        .env("RUST_LOG", "info")
        .args(["--config", cfg.to_str().unwrap(), "status"])
        .assert()
        .success()
        .stdout(contains("migration applied"));
}

#[cfg(unix)]
#[test]
fn test_sigterm_stops_run_and_removes_pid_file() {
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    let (tmp, cfg) = setup();
    let pid_file = tmp.path().join("run").join("attendsync_Device_A.pid");

    let mut child = Command::new(assert_cmd::cargo::cargo_bin!("attendsync"))
        .args(["--config", cfg.to_str().unwrap(), "run"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(20);
    while !pid_file.exists() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(50));
    }
    assert!(pid_file.exists(), "run never took its device lock");
    // Let the signal handler and polling threads come up.
    thread::sleep(Duration::from_millis(500));

    let killed = Command::new("kill")
        .args(["-TERM", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(killed.success());

    let status = child.wait().unwrap();
    assert!(status.success(), "run exited with {status}");
    assert!(!pid_file.exists());
}
