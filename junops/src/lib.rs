//! junops
//!
//! Fans a facts or reboot task out to many Junos devices over NETCONF and
//! collects the results in input order.

pub mod app;
pub mod cli;
pub mod credentials;
pub mod dispatch;
pub mod errors;
pub mod logs;
pub mod report;
pub mod session;
pub mod targets;
pub mod tasks;
pub mod utils;
