//! Rendering of task results: console text or a CSV table.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::OpsError;
use crate::session::Record;
use crate::tasks::{Operation, TaskResult};

/// What was rendered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// CSV file written, if any
    pub written: Option<PathBuf>,
}

/// CSV destination, opened before any device is contacted
pub struct TableOutput {
    path: PathBuf,
    sink: Box<dyn Write + Send>,
}

impl TableOutput {
    /// Create (or truncate) the file at `path`
    pub fn create(path: &Path) -> Result<Self, OpsError> {
        let file = File::create(path).map_err(|e| OpsError::OutputNotWritable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self::from_writer(path, file))
    }

    /// Table written to an arbitrary sink, reported under `path`
    pub fn from_writer(path: &Path, sink: impl Write + Send + 'static) -> Self {
        Self {
            path: path.to_path_buf(),
            sink: Box::new(sink),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for TableOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableOutput").field("path", &self.path).finish()
    }
}

/// Render `results` in order.
///
/// With no `output`, every result goes to `out`. With an `output` table,
/// successful records go to the CSV and failures still go to `out`. If the
/// CSV cannot be written the successful records are printed to `out`
/// instead, so every device still gets its outcome reported.
pub fn render<W: Write>(
    operation: Operation,
    results: &[TaskResult],
    output: Option<TableOutput>,
    out: &mut W,
) -> Result<RenderSummary, OpsError> {
    let mut summary = RenderSummary::default();
    let mut records = Vec::new();

    for result in results {
        match result {
            TaskResult::Success(record) => {
                summary.succeeded += 1;
                match output {
                    Some(_) => records.push(record),
                    None => writeln!(out, "{}\n", format_record(operation, record)?)?,
                }
            }
            TaskResult::Failure { target, message } => {
                summary.failed += 1;
                writeln!(out, "{}\n", format!("{}: {}", target, message).red())?;
            }
        }
    }

    if let Some(table) = output {
        let path = table.path;
        match write_table(table.sink, &records) {
            Ok(()) => {
                writeln!(out, "Output written to {}\n", path.display())?;
                summary.written = Some(path);
            }
            Err(e) => {
                warn!("Writing {} failed: {}", path.display(), e);
                let notice = format!("Could not write {}: {}", path.display(), e);
                writeln!(out, "{}\n", notice.red())?;
                for record in &records {
                    writeln!(out, "{}\n", format_record(operation, record)?)?;
                }
            }
        }
    }

    info!("{} succeeded, {} failed", summary.succeeded, summary.failed);
    Ok(summary)
}

fn format_record(operation: Operation, record: &Record) -> Result<String, OpsError> {
    match operation {
        Operation::Facts => Ok(serde_json::to_string_pretty(record)?),
        Operation::Reboot => {
            let host = record.get("host").map(cell).unwrap_or_default();
            let message = record.get("message").map(cell).unwrap_or_default();
            Ok(format!("{}:\n {}", host, message))
        }
    }
}

/// Union of the records' keys, in first-seen order
pub fn union_columns<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }
    columns
}

/// Write records as CSV. Keys a record lacks are left blank. No records
/// means an empty table.
pub fn write_table<S: Write>(sink: S, records: &[&Record]) -> Result<(), OpsError> {
    let columns = union_columns(records.iter().copied());
    if columns.is_empty() {
        return Ok(());
    }

    let mut writer = csv::Writer::from_writer(sink);
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| record.get(c).map(cell).unwrap_or_default()),
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV cell text for a record value
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
