//! Utility functions

use std::time::Duration;

/// Version string with build metadata, for `--version`
pub fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (",
        env!("GIT_HASH"),
        ", built ",
        env!("BUILD_TIME"),
        ")"
    )
}

/// Default number of tasks in flight: hardware parallelism plus a few
/// extra since tasks mostly wait on the network, capped at 32.
pub fn default_concurrency() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    (cpus + 4).min(32)
}

/// `Runtime of 1.23s`
pub fn format_runtime(elapsed: Duration) -> String {
    format!("Runtime of {:.2}s", elapsed.as_secs_f64())
}
