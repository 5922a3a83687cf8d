//! NETCONF over SSH sessions for Junos devices.
//!
//! Uses the `netconf` SSH subsystem with NETCONF 1.0 end-of-message
//! framing. Only the RPCs needed for facts and reboot are issued.

use std::sync::Arc;

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use tracing::{debug, warn};

use super::junos;
use super::{Connector, Record, Session, SessionOptions};
use crate::credentials::Credentials;
use crate::errors::OpsError;
use crate::targets::Target;

/// NETCONF 1.0 end-of-message marker
const EOM: &[u8] = b"]]>]]>";

const BASE_NS: &str = "urn:ietf:params:xml:ns:netconf:base:1.0";

/// Opens NETCONF sessions over SSH
pub struct NetconfConnector {
    options: SessionOptions,
    config: Arc<client::Config>,
}

impl NetconfConnector {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            config: Arc::new(client::Config::default()),
        }
    }

    async fn open(
        &self,
        target: &Target,
        credentials: &Credentials,
    ) -> Result<NetconfSession, OpsError> {
        let handler = HostKeyHandler {
            target: target.to_string(),
        };
        let mut handle = client::connect(
            self.config.clone(),
            (target.host(), target.port()),
            handler,
        )
        .await
        .map_err(|e| connection_failed(target, e))?;

        let authenticated = handle
            .authenticate_password(credentials.username(), credentials.password())
            .await
            .map_err(|e| connection_failed(target, e))?;
        if !authenticated {
            let _ = handle
                .disconnect(Disconnect::ByApplication, "", "English")
                .await;
            return Err(connection_failed(target, "authentication failed"));
        }

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| connection_failed(target, e))?;
        channel
            .request_subsystem(true, "netconf")
            .await
            .map_err(|e| connection_failed(target, e))?;

        let mut session = NetconfSession {
            target: target.to_string(),
            handle,
            channel,
            framer: Framer::default(),
            message_id: 0,
            closed: false,
        };
        if let Err(e) = session.exchange_hello().await {
            let _ = session.close().await;
            return Err(match e {
                OpsError::RemoteOperationFailed { reason, .. } => connection_failed(target, reason),
                other => other,
            });
        }

        debug!("NETCONF session established with {}", target);
        Ok(session)
    }
}

#[async_trait]
impl Connector for NetconfConnector {
    async fn connect(
        &self,
        target: &Target,
        credentials: &Credentials,
    ) -> Result<Box<dyn Session>, OpsError> {
        let timeout = self.options.connect_timeout;
        match tokio::time::timeout(timeout, self.open(target, credentials)).await {
            Ok(Ok(session)) => Ok(Box::new(session)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(connection_failed(
                target,
                format!("timed out after {}s", timeout.as_secs()),
            )),
        }
    }
}

struct HostKeyHandler {
    target: String,
}

#[async_trait]
impl client::Handler for HostKeyHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!("Accepting host key for {} without verification", self.target);
        Ok(true)
    }
}

/// A NETCONF session on one SSH channel
pub struct NetconfSession {
    target: String,
    handle: Handle<HostKeyHandler>,
    channel: Channel<Msg>,
    framer: Framer,
    message_id: u64,
    closed: bool,
}

impl NetconfSession {
    async fn exchange_hello(&mut self) -> Result<(), OpsError> {
        let server_hello = self.read_message().await?;
        if !server_hello.contains("<hello") {
            return Err(self.remote_failure("device did not send a NETCONF hello"));
        }

        let hello = format!(
            "<hello xmlns=\"{}\"><capabilities>\
             <capability>urn:ietf:params:netconf:base:1.0</capability>\
             </capabilities></hello>",
            BASE_NS
        );
        self.send(&hello).await
    }

    async fn send(&mut self, message: &str) -> Result<(), OpsError> {
        let mut framed = Vec::with_capacity(message.len() + EOM.len());
        framed.extend_from_slice(message.as_bytes());
        framed.extend_from_slice(EOM);
        self.channel
            .data(&framed[..])
            .await
            .map_err(|e| self.remote_failure(e))
    }

    async fn read_message(&mut self) -> Result<String, OpsError> {
        loop {
            if let Some(message) = self.framer.next_message() {
                return Ok(message);
            }

            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => self.framer.push(&data),
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    return Err(self.remote_failure("channel closed before the reply completed"));
                }
                Some(_) => {}
            }
        }
    }

    async fn rpc(&mut self, operation: &str) -> Result<String, OpsError> {
        self.message_id += 1;
        let request = format!(
            "<rpc xmlns=\"{}\" message-id=\"{}\">{}</rpc>",
            BASE_NS, self.message_id, operation
        );
        self.send(&request).await?;

        let reply = self.read_message().await?;
        if let Some(message) = junos::rpc_error_message(&reply) {
            return Err(self.remote_failure(message));
        }
        Ok(reply)
    }

    async fn json_rpc(&mut self, operation: &str) -> Result<serde_json::Value, OpsError> {
        let reply = self.rpc(operation).await?;
        junos::extract_json(&reply).map_err(|e| self.remote_failure(e))
    }

    fn remote_failure(&self, reason: impl std::fmt::Display) -> OpsError {
        OpsError::RemoteOperationFailed {
            target: self.target.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl Session for NetconfSession {
    async fn get_facts(&mut self) -> Result<Record, OpsError> {
        let software = self
            .json_rpc("<get-software-information format=\"json\"/>")
            .await?;
        let mut facts = junos::software_facts(&software);

        // Extra facts are best-effort; not every platform answers these.
        match self.json_rpc("<get-chassis-inventory format=\"json\"/>").await {
            Ok(doc) => facts.extend(junos::chassis_facts(&doc)),
            Err(e) => debug!("Skipping chassis facts: {}", e),
        }
        match self
            .json_rpc("<get-route-engine-information format=\"json\"/>")
            .await
        {
            Ok(doc) => facts.extend(junos::route_engine_facts(&doc)),
            Err(e) => debug!("Skipping routing engine facts: {}", e),
        }

        Ok(facts)
    }

    async fn reboot(&mut self, delay_minutes: u32) -> Result<String, OpsError> {
        let reply = self
            .rpc(&format!(
                "<request-reboot><in>{}</in></request-reboot>",
                delay_minutes
            ))
            .await?;
        Ok(junos::tag_text(&reply, "request-reboot-status").unwrap_or(reply))
    }

    async fn close(&mut self) -> Result<(), OpsError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        if let Err(e) = self.rpc("<close-session/>").await {
            debug!("close-session on {} failed: {}", self.target, e);
        }
        if let Err(e) = self.channel.eof().await {
            debug!("Channel EOF on {} failed: {}", self.target, e);
        }
        self.handle
            .disconnect(Disconnect::ByApplication, "", "English")
            .await
            .map_err(|e| {
                warn!("Disconnect from {} failed: {}", self.target, e);
                self.remote_failure(e)
            })
    }
}

/// Splits the channel byte stream into `]]>]]>` terminated messages
#[derive(Debug, Default)]
struct Framer {
    buffer: Vec<u8>,
    /// Bytes already searched without finding a complete marker
    scanned: usize,
}

impl Framer {
    fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Next complete message, trimmed. Bytes after the marker stay buffered.
    fn next_message(&mut self) -> Option<String> {
        // A marker may straddle the previous scan boundary.
        let from = self.scanned.saturating_sub(EOM.len() - 1);
        let Some(offset) = self.buffer[from..]
            .windows(EOM.len())
            .position(|w| w == EOM)
        else {
            self.scanned = self.buffer.len();
            return None;
        };

        let end = from + offset;
        let message: Vec<u8> = self.buffer.drain(..end + EOM.len()).collect();
        self.scanned = 0;
        Some(String::from_utf8_lossy(&message[..end]).trim().to_string())
    }
}

fn connection_failed(target: &Target, reason: impl std::fmt::Display) -> OpsError {
    OpsError::ConnectionFailed {
        target: target.to_string(),
        reason: reason.to_string(),
    }
}
