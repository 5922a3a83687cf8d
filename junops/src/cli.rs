//! Command line surface

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::app::options::CommandOptions;
use crate::errors::OpsError;
use crate::logs::{LogLevel, LogOptions};
use crate::targets::TargetSource;
use crate::tasks::{Operation, TaskParameters};
use crate::utils::long_version;

/// Collect facts from, or schedule reboots on, many Junos devices at once
#[derive(Parser, Debug)]
#[command(name = "junops")]
#[command(version, long_version = long_version(), about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Maximum number of devices handled at the same time
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Connect timeout in seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout: u64,

    /// Log level, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: LogLevel,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Retrieve facts
    Facts(CommonArgs),

    /// Perform reboot
    Reboot(RebootArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Header in CSV file to identify hosts, or devices with the following
    /// syntax: device1.internal:22,device2.internal:830
    #[arg(long)]
    pub hosts: Option<String>,

    /// CSV filename to use as input for hosts. Use with --hosts & --ports to
    /// identify headers
    #[arg(long)]
    pub file: Option<PathBuf>,

    /// Header in CSV file to identify ports
    #[arg(long)]
    pub ports: Option<String>,

    /// CSV file to write results to. Otherwise, they are printed out
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RebootArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Delay to perform reboot in minutes e.g. '2'
    #[arg(long)]
    pub delaytime: Option<String>,
}

impl CommonArgs {
    /// Resolve `--hosts`, `--file` and `--ports` into a target source
    pub fn target_source(&self) -> Result<TargetSource, OpsError> {
        match (&self.file, &self.hosts) {
            (Some(_), None) => Err(OpsError::InvalidArgument(
                "No CSV hosts header specified. Use --hosts".into(),
            )),
            (Some(path), Some(host_column)) => Ok(TargetSource::File {
                path: path.clone(),
                host_column: host_column.clone(),
                port_column: self.ports.clone(),
            }),
            (None, _) if self.ports.is_some() => Err(OpsError::InvalidArgument(
                "--ports names a CSV header and needs --file".into(),
            )),
            (None, Some(hosts)) => Ok(TargetSource::Inline(hosts.clone())),
            (None, None) => Err(OpsError::InvalidArgument(
                "No devices specified. Use --hosts device1.internal:22,device2.internal:830"
                    .into(),
            )),
        }
    }
}

impl Cli {
    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level,
            json_format: self.log_json,
        }
    }

    /// Normalise into command options. `Ok(None)` when no subcommand was
    /// given.
    pub fn into_command(self) -> Result<Option<CommandOptions>, OpsError> {
        let (operation, common, params) = match self.command {
            None => return Ok(None),
            Some(Command::Facts(common)) => (Operation::Facts, common, TaskParameters::default()),
            Some(Command::Reboot(args)) => (
                Operation::Reboot,
                args.common,
                TaskParameters {
                    delay_minutes: args.delaytime,
                },
            ),
        };

        let mut options = CommandOptions::new(operation, common.target_source()?);
        options.output = common.output;
        options.params = params;
        options.session.connect_timeout = Duration::from_secs(self.timeout);
        if let Some(workers) = self.workers {
            options.dispatch.concurrency = usize::from(workers);
        }
        Ok(Some(options))
    }
}
