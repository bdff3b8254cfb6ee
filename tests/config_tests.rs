use attendsync::config::Config;
use std::fs;

mod common;
use common::write_config;

#[test]
fn test_missing_file_gives_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let cfg = Config::load(&tmp.path().join("absent.conf")).unwrap();

    assert_eq!(cfg.batch_size, 10);
    assert_eq!(cfg.poll_interval_secs, 3);
    assert_eq!(cfg.devices.len(), 1);
    assert_eq!(cfg.devices[0].port, 4370);
}

#[test]
fn test_save_then_load_keeps_values() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("nested").join("attendsync.conf");
    let mut cfg = Config::default();
    cfg.batch_size = 25;
    cfg.sms.account_id = "acct-9".into();

    cfg.save(&path).unwrap();
    let loaded = Config::load(&path).unwrap();

    assert_eq!(loaded, cfg);
}

#[test]
fn test_written_config_parses_with_defaults_filled_in() {
    let tmp = tempfile::tempdir().unwrap();
    let path = write_config(
        tmp.path(),
        &tmp.path().join("attlog.dat"),
        &tmp.path().join("dir.sqlite"),
        "http://127.0.0.1:9",
    );

    let cfg = Config::load(&path).unwrap();

    assert_eq!(cfg.batch_size, 2);
    assert_eq!(cfg.directory.busy_timeout_ms, 5000);
    assert_eq!(cfg.device("Device A").unwrap().safe_name(), "Device_A");
    assert!(cfg.device("Device Z").is_err());
    assert!(cfg.sms.template.contains("{name}"));
}

#[test]
fn test_invalid_values_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("attendsync.conf");

    let mut cfg = Config::default();
    cfg.batch_size = 0;
    fs::write(&path, serde_yaml::to_string(&cfg).unwrap()).unwrap();
    assert!(Config::load(&path).is_err());

    let mut cfg = Config::default();
    cfg.devices.push(cfg.devices[0].clone());
    fs::write(&path, serde_yaml::to_string(&cfg).unwrap()).unwrap();
    assert!(Config::load(&path).is_err());

    fs::write(&path, "devices: [not, a, device]").unwrap();
    assert!(Config::load(&path).is_err());
}
