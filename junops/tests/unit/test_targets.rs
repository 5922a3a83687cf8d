//! Target list builder tests

use std::io::Write;
use std::path::PathBuf;

use junops::errors::OpsError;
use junops::targets::{parse_inline, read_csv, Target, TargetSource, DEFAULT_PORT};
use tempfile::NamedTempFile;

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn pairs(targets: &[Target]) -> Vec<(&str, u16)> {
    targets.iter().map(|t| (t.host(), t.port())).collect()
}

#[test]
fn test_inline_keeps_order_and_duplicates() {
    let targets = parse_inline("device1.internal:22,device2.internal:830,device1.internal:22").unwrap();
    assert_eq!(
        pairs(&targets),
        vec![
            ("device1.internal", 22),
            ("device2.internal", 830),
            ("device1.internal", 22)
        ]
    );
}

#[test]
fn test_inline_trims_and_skips_trailing_comma() {
    let targets = parse_inline(" r1:22 , r2:830,").unwrap();
    assert_eq!(pairs(&targets), vec![("r1", 22), ("r2", 830)]);
}

#[test]
fn test_inline_missing_port_is_malformed() {
    let err = parse_inline("r1:22,r2").unwrap_err();
    assert!(matches!(err, OpsError::MalformedTarget(ref m) if m.contains("r2")));
}

#[test]
fn test_inline_rejects_bad_entries() {
    for list in ["r1:", ":22", "r1:ssh", "r1:22:33", "r1:0"] {
        assert!(
            matches!(parse_inline(list), Err(OpsError::MalformedTarget(_))),
            "{} should be malformed",
            list
        );
    }
}

#[test]
fn test_csv_host_and_port_columns() {
    let file = csv_file("name,ip,p\nedge,10.0.0.1,22\ncore,10.0.0.2,830\n");
    let source = TargetSource::File {
        path: file.path().to_path_buf(),
        host_column: "ip".into(),
        port_column: Some("p".into()),
    };

    let targets = source.build().unwrap();
    assert_eq!(pairs(&targets), vec![("10.0.0.1", 22), ("10.0.0.2", 830)]);
}

#[test]
fn test_csv_without_port_column_defaults_to_22() {
    let file = csv_file("ip,p\n10.0.0.1,830\n10.0.0.2,830\n");
    let targets = read_csv(file.path(), "ip", None).unwrap();
    assert!(targets.iter().all(|t| t.port() == DEFAULT_PORT));
    assert_eq!(targets.len(), 2);
}

#[test]
fn test_csv_missing_host_column() {
    let file = csv_file("ip,p\n10.0.0.1,22\n");
    let err = read_csv(file.path(), "address", Some("p")).unwrap_err();
    assert!(matches!(err, OpsError::MissingField(ref f) if f == "address"));
}

#[test]
fn test_csv_missing_port_column() {
    let file = csv_file("ip,p\n10.0.0.1,22\n");
    let err = read_csv(file.path(), "ip", Some("port")).unwrap_err();
    assert!(matches!(err, OpsError::MissingField(ref f) if f == "port"));
}

#[test]
fn test_csv_source_not_found() {
    let path = PathBuf::from("/nonexistent/junops/devices.csv");
    let err = read_csv(&path, "ip", None).unwrap_err();
    assert!(matches!(err, OpsError::SourceNotFound(ref p) if *p == path));
}

#[test]
fn test_csv_bad_cells_report_row() {
    let file = csv_file("ip,p\n10.0.0.1,22\n10.0.0.2,abc\n");
    let err = read_csv(file.path(), "ip", Some("p")).unwrap_err();
    assert!(matches!(err, OpsError::MalformedTarget(ref m) if m.contains("row 3")));

    let file = csv_file("ip,p\n,22\n");
    let err = read_csv(file.path(), "ip", Some("p")).unwrap_err();
    assert!(matches!(err, OpsError::MalformedTarget(ref m) if m.contains("row 2")));
}
