//! Run one command end to end

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, info_span, Instrument};

use crate::app::options::CommandOptions;
use crate::credentials::{CredentialSource, Credentials};
use crate::dispatch::dispatch;
use crate::errors::OpsError;
use crate::report::{render, RenderSummary, TableOutput};
use crate::session::Connector;
use crate::targets::Target;
use crate::tasks::{TaskInput, TaskParameters};
use crate::utils::format_runtime;

/// Build targets, obtain credentials, fan out, render.
///
/// Input errors (bad target source, unwritable output, no credentials)
/// are returned before any device is contacted. Per-device failures are part of the rendered
/// output and do not make this fail.
pub async fn run<W: Write>(
    options: &CommandOptions,
    credentials: &dyn CredentialSource,
    connector: Arc<dyn Connector>,
    out: &mut W,
) -> Result<RenderSummary, OpsError> {
    let targets = options.source.build()?;
    if targets.is_empty() {
        return Err(OpsError::InvalidArgument("no devices to process".into()));
    }
    info!("Loaded {} targets", targets.len());

    // A bad output path must fail before any device is touched.
    let table = options.output.as_deref().map(TableOutput::create).transpose()?;

    let credentials = Arc::new(credentials.credentials().await?);
    let inputs = attach(targets, credentials, &options.params);

    writeln!(out, "\n{}\n", options.operation.banner())?;
    let start = Instant::now();

    let run_id = uuid::Uuid::new_v4();
    let span = info_span!("run", %run_id, operation = options.operation.name());
    let results = dispatch(options.operation.task(), connector, inputs, &options.dispatch)
        .instrument(span)
        .await;

    let summary = render(options.operation, &results, table, out)?;
    writeln!(out, "{}", format_runtime(start.elapsed()))?;
    Ok(summary)
}

/// Pair every target with the shared credentials and task parameters
pub fn attach(
    targets: Vec<Target>,
    credentials: Arc<Credentials>,
    params: &TaskParameters,
) -> Vec<TaskInput> {
    targets
        .into_iter()
        .map(|target| TaskInput {
            target,
            credentials: Arc::clone(&credentials),
            params: params.clone(),
        })
        .collect()
}
