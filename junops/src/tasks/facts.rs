use async_trait::async_trait;
use serde_json::Value;

use super::{DeviceTask, TaskInput};
use crate::errors::OpsError;
use crate::session::{Record, Session};

/// Collects the device's fact set
#[derive(Debug, Default)]
pub struct FactsTask;

#[async_trait]
impl DeviceTask for FactsTask {
    fn name(&self) -> &'static str {
        "facts"
    }

    async fn run(&self, session: &mut dyn Session, input: &TaskInput) -> Result<Record, OpsError> {
        let facts = session.get_facts().await?;

        let mut record = Record::new();
        record.insert("host".into(), Value::String(input.target.host().to_string()));
        record.insert("port".into(), Value::from(input.target.port()));
        record.extend(facts);
        Ok(record)
    }
}
