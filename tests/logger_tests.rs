//! Integration tests for logger behavior.

use nomosdb::logger::{set_level, set_level_from_str, Level};
use nomosdb::{debug, error, info, warn};

#[test]
fn level_parse_accepts_valid() {
    assert!(set_level_from_str("error"));
    assert!(set_level_from_str("warn"));
    assert!(set_level_from_str("info"));
    assert!(set_level_from_str("debug"));
}

#[test]
fn level_parse_rejects_invalid() {
    assert!(!set_level_from_str("invalid"));
    assert!(!set_level_from_str(""));
}

#[test]
fn logs_do_not_panic() {
    set_level(Level::Debug);
    info!("info integration");
    warn!("warn integration");
    error!("error integration");
    debug!("debug integration");
}

#[cfg(feature = "file-logging")]
#[test]
fn file_logging_appends_with_prefix() {
    use nomosdb::logger::{close_file_logging, init_file_logging};

    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("logs").join("nomosdb.log");
    assert!(init_file_logging(&path));
    warn!("marks for LW100 recalculated");
    close_file_logging();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("[WARN] marks for LW100 recalculated"));
}
