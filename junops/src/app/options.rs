//! Command options
//!
//! The parsed command line is normalised into a [`CommandOptions`] value
//! that is handed to [`crate::app::run::run`]; nothing downstream looks at
//! the raw arguments.

use std::path::PathBuf;

use crate::dispatch::DispatchOptions;
use crate::session::SessionOptions;
use crate::targets::TargetSource;
use crate::tasks::{Operation, TaskParameters};

/// One fully resolved command
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Facts or reboot
    pub operation: Operation,

    /// Where targets come from
    pub source: TargetSource,

    /// CSV destination; console when unset
    pub output: Option<PathBuf>,

    /// Per-target task parameters
    pub params: TaskParameters,

    /// Dispatcher configuration
    pub dispatch: DispatchOptions,

    /// Device session configuration
    pub session: SessionOptions,
}

impl CommandOptions {
    /// Options with default task parameters, dispatch and session settings
    pub fn new(operation: Operation, source: TargetSource) -> Self {
        Self {
            operation,
            source,
            output: None,
            params: TaskParameters::default(),
            dispatch: DispatchOptions::default(),
            session: SessionOptions::default(),
        }
    }
}
