use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{DeviceTask, TaskInput, TaskParameters};
use crate::errors::OpsError;
use crate::session::{Record, Session};

/// Reboot delay used when none is given or it does not parse
pub const DEFAULT_REBOOT_DELAY: u32 = 1;

impl TaskParameters {
    /// The reboot delay to request. Unparsable input falls back to the
    /// default rather than failing the task.
    pub fn effective_delay(&self) -> u32 {
        match self.delay_minutes.as_deref().map(str::trim) {
            None | Some("") => DEFAULT_REBOOT_DELAY,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(
                    "Invalid reboot delay '{}', using {} minute",
                    raw, DEFAULT_REBOOT_DELAY
                );
                DEFAULT_REBOOT_DELAY
            }),
        }
    }
}

/// Schedules a delayed reboot
#[derive(Debug, Default)]
pub struct RebootTask;

#[async_trait]
impl DeviceTask for RebootTask {
    fn name(&self) -> &'static str {
        "reboot"
    }

    async fn run(&self, session: &mut dyn Session, input: &TaskInput) -> Result<Record, OpsError> {
        let delay = input.params.effective_delay();
        info!("Requesting reboot in {} minute(s)", delay);
        let message = session.reboot(delay).await?;

        let mut record = Record::new();
        record.insert("host".into(), Value::String(input.target.host().to_string()));
        record.insert("port".into(), Value::from(input.target.port()));
        record.insert("message".into(), Value::String(message));
        Ok(record)
    }
}
