//! Inline target lists: `device1.internal:22,device2.internal:830`

use tracing::debug;

use super::{parse_port, Target};
use crate::errors::OpsError;

/// Parse a comma separated list of `host:port` entries.
///
/// Whitespace around entries is ignored, as are empty entries left by a
/// trailing comma. IPv6 literals must be bracketed: `[2001:db8::1]:830`.
pub fn parse_inline(list: &str) -> Result<Vec<Target>, OpsError> {
    let mut targets = Vec::new();

    for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (host, port) = split_entry(entry)?;
        let port = parse_port(port, entry)?;
        targets.push(Target::new(host, port).map_err(|_| malformed(entry))?);
    }

    debug!("Parsed {} inline targets", targets.len());
    Ok(targets)
}

fn split_entry(entry: &str) -> Result<(&str, &str), OpsError> {
    if let Some(rest) = entry.strip_prefix('[') {
        return rest.split_once("]:").ok_or_else(|| malformed(entry));
    }

    let mut parts = entry.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(host), Some(port), None) => Ok((host, port)),
        _ => Err(malformed(entry)),
    }
}

fn malformed(entry: &str) -> OpsError {
    OpsError::MalformedTarget(format!("'{}' (expected host:port)", entry))
}
