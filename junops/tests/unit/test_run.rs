//! End to end runs against the scripted connector

use std::io::Write;
use std::sync::Arc;

use junops::app::options::CommandOptions;
use junops::app::run::run;
use junops::credentials::StaticCredentials;
use junops::errors::OpsError;
use junops::targets::TargetSource;
use junops::tasks::{Operation, TaskParameters};
use tempfile::{NamedTempFile, TempDir};

use crate::common::{FakeConnector, FakeDevice};

fn creds() -> StaticCredentials {
    StaticCredentials::new("netops", "s3cret")
}

#[tokio::test]
async fn test_missing_field_stops_before_any_session() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "ip,p\n10.0.0.1,22").unwrap();
    let connector = Arc::new(FakeConnector::new().with("10.0.0.1", FakeDevice::up("r1")));
    let options = CommandOptions::new(
        Operation::Facts,
        TargetSource::File {
            path: file.path().to_path_buf(),
            host_column: "hostname".into(),
            port_column: None,
        },
    );
    let mut out: Vec<u8> = Vec::new();

    let err = run(&options, &creds(), connector.clone(), &mut out).await.unwrap_err();

    assert!(matches!(err, OpsError::MissingField(_)));
    assert_eq!(connector.connect_attempts(), 0);
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_malformed_inline_target_stops_before_any_session() {
    let connector = Arc::new(FakeConnector::new().with("r1", FakeDevice::up("r1")));
    let options = CommandOptions::new(Operation::Facts, TargetSource::Inline("r1:22,r2".into()));

    let err = run(&options, &creds(), connector.clone(), &mut Vec::<u8>::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OpsError::MalformedTarget(_)));
    assert_eq!(connector.connect_attempts(), 0);
}

#[tokio::test]
async fn test_facts_run_to_csv() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("facts.csv");
    let connector = Arc::new(
        FakeConnector::new()
            .with("r1", FakeDevice::up("edge-1"))
            .with("r3", FakeDevice::up("edge-3")),
    );
    let mut options =
        CommandOptions::new(Operation::Facts, TargetSource::Inline("r1:22,r2:22,r3:830".into()));
    options.output = Some(output.clone());
    let mut out: Vec<u8> = Vec::new();

    let summary = run(&options, &creds(), connector, &mut out).await.unwrap();

    assert_eq!((summary.succeeded, summary.failed), (2, 1));
    let csv = std::fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "host,port,hostname,model,version");
    assert!(lines[1].starts_with("r1,22,edge-1,"));
    assert!(lines[2].starts_with("r3,830,edge-3,"));
    assert_eq!(lines.len(), 3);

    let out = String::from_utf8(out).unwrap();
    assert!(out.starts_with("\nFetching Junos facts...\n"));
    assert!(out.contains("r2:22: Cannot connect to device"));
    assert!(out.trim_end().lines().last().unwrap().starts_with("Runtime of "));
}

#[tokio::test]
async fn test_reboot_run_uses_delay() {
    let connector = Arc::new(FakeConnector::new().with("r1", FakeDevice::up("r1")));
    let mut options = CommandOptions::new(Operation::Reboot, TargetSource::Inline("r1:22".into()));
    options.params = TaskParameters {
        delay_minutes: Some("5".into()),
    };
    let mut out: Vec<u8> = Vec::new();

    run(&options, &creds(), connector.clone(), &mut out).await.unwrap();

    assert_eq!(*connector.counters.reboot_delays.lock().unwrap(), vec![5]);
    let out = String::from_utf8(out).unwrap();
    assert!(out.contains("Performing reboot..."));
    assert!(out.contains("r1:\n Shutdown in 5 minute(s)"));
}

#[tokio::test]
async fn test_repeated_facts_runs_have_same_keys() {
    let connector = Arc::new(
        FakeConnector::new()
            .with("r1", FakeDevice::up("edge-1"))
            .with("r2", FakeDevice::up("edge-2")),
    );
    let dir = TempDir::new().unwrap();
    let mut headers = Vec::new();

    for name in ["first.csv", "second.csv"] {
        let mut options =
            CommandOptions::new(Operation::Facts, TargetSource::Inline("r1:22,r2:22".into()));
        options.output = Some(dir.path().join(name));
        run(&options, &creds(), connector.clone(), &mut Vec::<u8>::new())
            .await
            .unwrap();
        let csv = std::fs::read_to_string(dir.path().join(name)).unwrap();
        headers.push(csv.lines().next().unwrap().to_string());
    }

    assert_eq!(headers[0], headers[1]);
}

#[tokio::test]
async fn test_empty_target_list_is_rejected() {
    let connector = Arc::new(FakeConnector::new());
    let options = CommandOptions::new(Operation::Facts, TargetSource::Inline(" , ".into()));

    let err = run(&options, &creds(), connector, &mut Vec::<u8>::new()).await.unwrap_err();
    assert!(matches!(err, OpsError::InvalidArgument(_)));
}

#[tokio::test]
async fn test_unwritable_output_stops_before_any_session() {
    let connector = Arc::new(FakeConnector::new().with("r1", FakeDevice::up("r1")));
    let mut options = CommandOptions::new(Operation::Reboot, TargetSource::Inline("r1:22".into()));
    options.output = Some("/nonexistent-junops-dir/out.csv".into());
    let mut out: Vec<u8> = Vec::new();

    let err = run(&options, &creds(), connector.clone(), &mut out).await.unwrap_err();

    assert!(matches!(err, OpsError::OutputNotWritable { .. }));
    assert_eq!(connector.connect_attempts(), 0);
    assert!(connector.counters.reboot_delays.lock().unwrap().is_empty());
    assert!(out.is_empty());
}
