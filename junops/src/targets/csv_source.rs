//! CSV target sources

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use super::{parse_port, Target, DEFAULT_PORT};
use crate::errors::OpsError;

/// Read targets from a CSV file with a header row.
///
/// `host_column` must name a header. When `port_column` is `None` every
/// target gets port 22.
pub fn read_csv(
    path: &Path,
    host_column: &str,
    port_column: Option<&str>,
) -> Result<Vec<Target>, OpsError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => OpsError::SourceNotFound(path.to_path_buf()),
        _ => OpsError::IoError(e),
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .from_reader(file);

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| OpsError::MissingField(name.to_string()))
    };
    let host_idx = column(host_column)?;
    let port_idx = port_column.map(column).transpose()?;

    let mut targets = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1
        let row = format!("row {}", i + 2);

        let host = record.get(host_idx).unwrap_or_default();
        let port = match port_idx {
            Some(idx) => parse_port(record.get(idx).unwrap_or_default(), &row)?,
            None => DEFAULT_PORT,
        };
        let target = Target::new(host, port)
            .map_err(|_| OpsError::MalformedTarget(format!("{}: empty host", row)))?;
        targets.push(target);
    }

    debug!("Read {} targets from {}", targets.len(), path.display());
    Ok(targets)
}
