//! Device sessions
//!
//! A [`Connector`] opens an authenticated [`Session`] to one target. The
//! session is owned by the task that opened it and must be closed before
//! that task returns.

mod junos;
pub mod netconf;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::credentials::Credentials;
use crate::errors::OpsError;
use crate::targets::Target;

pub use netconf::NetconfConnector;

/// A key/value record returned by a device. Keys keep insertion order.
pub type Record = Map<String, Value>;

/// Session options
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Bound on TCP connect, SSH handshake and authentication
    pub connect_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
        }
    }
}

/// An authenticated connection to one device
#[async_trait]
pub trait Session: Send {
    /// Fetch the device's fact set
    async fn get_facts(&mut self) -> Result<Record, OpsError>;

    /// Schedule a reboot `delay_minutes` from now and return the device's
    /// confirmation message
    async fn reboot(&mut self, delay_minutes: u32) -> Result<String, OpsError>;

    /// Release the session
    async fn close(&mut self) -> Result<(), OpsError>;
}

/// Opens sessions
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        target: &Target,
        credentials: &Credentials,
    ) -> Result<Box<dyn Session>, OpsError>;
}
