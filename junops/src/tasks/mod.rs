//! Device tasks
//!
//! A task is one unit of work against one device. [`execute`] is the fault
//! barrier around it: whatever the connector or the task does, including
//! panicking, the caller gets exactly one [`TaskResult`] back and the
//! session is closed.

mod facts;
mod reboot;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{debug, info_span, warn, Instrument};

use crate::credentials::Credentials;
use crate::errors::OpsError;
use crate::session::{Connector, Record, Session};
use crate::targets::Target;

pub use facts::FactsTask;
pub use reboot::{RebootTask, DEFAULT_REBOOT_DELAY};

/// Which command is being run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Facts,
    Reboot,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Facts => "facts",
            Operation::Reboot => "reboot",
        }
    }

    /// Line printed before dispatch starts
    pub fn banner(&self) -> &'static str {
        match self {
            Operation::Facts => "Fetching Junos facts...",
            Operation::Reboot => "Performing reboot...",
        }
    }

    pub fn task(&self) -> Arc<dyn DeviceTask> {
        match self {
            Operation::Facts => Arc::new(FactsTask),
            Operation::Reboot => Arc::new(RebootTask),
        }
    }
}

/// Operation specific inputs, attached to every target before dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskParameters {
    /// Reboot delay in minutes, as given on the command line
    pub delay_minutes: Option<String>,
}

/// Everything one task needs. Each dispatched task owns its input.
#[derive(Debug, Clone)]
pub struct TaskInput {
    pub target: Target,
    pub credentials: Arc<Credentials>,
    pub params: TaskParameters,
}

/// Outcome of one task
#[derive(Debug, Clone, PartialEq)]
pub enum TaskResult {
    Success(Record),
    Failure { target: Target, message: String },
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TaskResult::Success(_))
    }

    pub(crate) fn failure(target: &Target, error: OpsError) -> Self {
        let message = match error {
            OpsError::ConnectionFailed { reason, .. } => {
                format!("Cannot connect to device: {}", reason)
            }
            OpsError::RemoteOperationFailed { reason, .. } => reason,
            other => other.to_string(),
        };
        TaskResult::Failure {
            target: target.clone(),
            message,
        }
    }
}

/// One kind of work done over an open session
#[async_trait]
pub trait DeviceTask: Send + Sync {
    fn name(&self) -> &'static str;

    async fn run(&self, session: &mut dyn Session, input: &TaskInput) -> Result<Record, OpsError>;
}

/// Connect, run `task`, close. Never fails and never panics past this
/// point.
pub async fn execute(
    task: &dyn DeviceTask,
    connector: &dyn Connector,
    input: TaskInput,
) -> TaskResult {
    let span = info_span!("device", target = %input.target, task = task.name());

    async move {
        let connecting = connector.connect(&input.target, &input.credentials);
        let mut session = match AssertUnwindSafe(connecting).catch_unwind().await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => {
                warn!("{}", e);
                return TaskResult::failure(&input.target, e);
            }
            Err(panic) => return panicked(&input.target, panic),
        };

        let outcome = AssertUnwindSafe(task.run(session.as_mut(), &input))
            .catch_unwind()
            .await;

        if let Err(e) = session.close().await {
            debug!("Session close failed: {}", e);
        }

        match outcome {
            Ok(Ok(record)) => {
                debug!("Task completed");
                TaskResult::Success(record)
            }
            Ok(Err(e)) => {
                warn!("{}", e);
                TaskResult::failure(&input.target, e)
            }
            Err(panic) => panicked(&input.target, panic),
        }
    }
    .instrument(span)
    .await
}

fn panicked(target: &Target, panic: Box<dyn Any + Send>) -> TaskResult {
    let reason = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    warn!("Task panicked: {}", reason);
    TaskResult::failure(target, OpsError::Internal(format!("task panicked: {}", reason)))
}
