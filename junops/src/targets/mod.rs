//! Device targets and the sources they are built from.
//!
//! A run starts from either an inline `host:port,host:port` list or a CSV
//! file whose host and port columns are named on the command line. Both
//! sources keep input order and duplicates.

mod csv_source;
mod inline;

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::errors::OpsError;

pub use csv_source::read_csv;
pub use inline::parse_inline;

/// Management port used when a CSV source names no port column.
pub const DEFAULT_PORT: u16 = 22;

/// One device, identified by host and management port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Target {
    host: String,
    port: u16,
}

impl Target {
    /// Create a target. The host must not be empty.
    pub fn new(host: impl Into<String>, port: u16) -> Result<Self, OpsError> {
        let host = host.into();
        let host = host.trim();
        if host.is_empty() {
            return Err(OpsError::MalformedTarget(format!(
                "empty host for port {}",
                port
            )));
        }
        Ok(Self {
            host: host.to_string(),
            port,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Where the target list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSource {
    /// Comma separated `host:port` pairs
    Inline(String),

    /// CSV file with a header row
    File {
        path: PathBuf,
        host_column: String,
        port_column: Option<String>,
    },
}

impl TargetSource {
    /// Build the target list, in source order.
    pub fn build(&self) -> Result<Vec<Target>, OpsError> {
        match self {
            TargetSource::Inline(list) => parse_inline(list),
            TargetSource::File {
                path,
                host_column,
                port_column,
            } => read_csv(path, host_column, port_column.as_deref()),
        }
    }
}

/// Parse a port value coming from either source.
pub(crate) fn parse_port(raw: &str, context: &str) -> Result<u16, OpsError> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(OpsError::MalformedTarget(format!(
            "{}: invalid port '{}'",
            context,
            raw.trim()
        ))),
    }
}
