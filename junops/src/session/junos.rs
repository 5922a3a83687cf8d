//! Helpers for reading Junos RPC replies.
//!
//! Replies are requested with `format="json"` where the device supports it,
//! so only a little XML handling is needed: the `<rpc-reply>` envelope,
//! `<rpc-error>` detection and single-element text lookups.

use serde_json::Value;

use super::Record;
use crate::errors::OpsError;

/// Junos field names mapped to the fact names operators expect
const FACT_NAMES: &[(&str, &str)] = &[
    ("host-name", "hostname"),
    ("product-model", "model"),
    ("product-name", "product"),
    ("junos-version", "version"),
];

/// Text of the first `<tag>` element, entities decoded.
pub fn tag_text(xml: &str, tag: &str) -> Option<String> {
    let open_exact = format!("<{}>", tag);
    let open_attrs = format!("<{} ", tag);
    let close = format!("</{}>", tag);

    let start = xml
        .find(&open_exact)
        .or_else(|| xml.find(&open_attrs))?;
    let body_start = start + xml[start..].find('>')? + 1;
    let body_len = xml[body_start..].find(&close)?;
    Some(unescape(xml[body_start..body_start + body_len].trim()))
}

/// Message of the first error-severity `<rpc-error>`, if the reply has one.
/// Warnings are ignored.
pub fn rpc_error_message(reply: &str) -> Option<String> {
    let mut rest = reply;
    while let Some(start) = rest.find("<rpc-error") {
        let end = rest[start..]
            .find("</rpc-error>")
            .map(|e| start + e)
            .unwrap_or(rest.len());
        let error = &rest[start..end];

        let severity = tag_text(error, "error-severity").unwrap_or_else(|| "error".into());
        if severity != "warning" {
            return Some(
                tag_text(error, "error-message").unwrap_or_else(|| "unspecified rpc-error".into()),
            );
        }
        rest = &rest[end..];
        if rest.starts_with("</rpc-error>") {
            rest = &rest["</rpc-error>".len()..];
        }
    }
    None
}

/// Pull the JSON document out of an `<rpc-reply>` envelope.
pub fn extract_json(reply: &str) -> Result<Value, OpsError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(serde_json::from_str(&reply[start..=end])?),
        _ => Err(OpsError::Internal("reply carries no JSON document".into())),
    }
}

/// Facts from `<get-software-information format="json"/>`.
pub fn software_facts(doc: &Value) -> Record {
    let mut record = Record::new();
    let Some(info) = find_object(doc, "software-information") else {
        return record;
    };

    for (key, value) in info {
        if let Some(text) = data_of(value) {
            let name = FACT_NAMES
                .iter()
                .find(|(junos, _)| *junos == key.as_str())
                .map(|(_, fact)| *fact)
                .unwrap_or(key.as_str());
            record.insert(name.to_string(), Value::String(text.to_string()));
        }
    }
    record
}

/// Facts from `<get-route-engine-information format="json"/>`, one group
/// of keys per routing engine slot.
pub fn route_engine_facts(doc: &Value) -> Record {
    let mut record = Record::new();
    let Some(info) = find_object(doc, "route-engine-information") else {
        return record;
    };
    let Some(engines) = info.get("route-engine").and_then(Value::as_array) else {
        return record;
    };

    for (i, engine) in engines.iter().enumerate() {
        let slot = engine
            .get("slot")
            .and_then(data_of)
            .map(str::to_string)
            .unwrap_or_else(|| i.to_string());
        for (field, name) in [
            ("mastership-state", "mastership"),
            ("status", "status"),
            ("model", "model"),
            ("up-time", "uptime"),
        ] {
            if let Some(text) = engine.get(field).and_then(data_of) {
                record.insert(format!("RE{}_{}", slot, name), Value::String(text.to_string()));
            }
        }
    }
    record
}

/// Chassis serial number from `<get-chassis-inventory format="json"/>`.
pub fn chassis_facts(doc: &Value) -> Record {
    let mut record = Record::new();
    let serial = find_object(doc, "chassis-inventory")
        .and_then(|inv| inv.get("chassis"))
        .and_then(first_object)
        .and_then(|chassis| chassis.get("serial-number"))
        .and_then(data_of);
    if let Some(serial) = serial {
        record.insert("serialnumber".into(), Value::String(serial.to_string()));
    }
    record
}

/// Junos wraps every element in a one-element array; leaves look like
/// `[{"data": "..."}]`.
fn data_of(value: &Value) -> Option<&str> {
    first_object(value)?.get("data")?.as_str()
}

fn first_object(value: &Value) -> Option<&serde_json::Map<String, Value>> {
    match value {
        Value::Array(items) => items.first()?.as_object(),
        Value::Object(map) => Some(map),
        _ => None,
    }
}

/// Find `name` at the top level or below the multi routing engine wrapper,
/// taking the first routing engine's answer.
fn find_object<'a>(doc: &'a Value, name: &str) -> Option<&'a serde_json::Map<String, Value>> {
    if let Some(found) = doc.get(name).and_then(first_object) {
        return Some(found);
    }
    doc.get("multi-routing-engine-results")
        .and_then(first_object)?
        .get("multi-routing-engine-item")
        .and_then(first_object)?
        .get(name)
        .and_then(first_object)
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
