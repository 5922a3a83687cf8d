//! Run credentials
//!
//! One username/password pair is obtained per run and shared read-only by
//! every device task. Where it comes from is pluggable: an interactive
//! terminal prompt, the environment, or a value supplied by the caller.

use std::io::{BufRead, Write};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::errors::OpsError;

/// Environment variable holding the username for non-interactive runs
pub const USERNAME_ENV_VAR: &str = "JUNOPS_USERNAME";

/// Environment variable holding the password for non-interactive runs
pub const PASSWORD_ENV_VAR: &str = "JUNOPS_PASSWORD";

/// SSH credentials shared by all targets of a run
#[derive(Debug)]
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Expose the password to hand it to the transport
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Something that can produce the run's credentials
#[async_trait]
pub trait CredentialSource: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, OpsError>;
}

/// Prompts on the controlling terminal: visible username, hidden password.
#[derive(Debug, Default)]
pub struct PromptCredentials;

#[async_trait]
impl CredentialSource for PromptCredentials {
    async fn credentials(&self) -> Result<Credentials, OpsError> {
        tokio::task::spawn_blocking(prompt)
            .await
            .map_err(|e| OpsError::Internal(format!("credential prompt failed: {e}")))?
    }
}

fn prompt() -> Result<Credentials, OpsError> {
    let mut stdout = std::io::stdout();
    write!(stdout, "Username: ")?;
    stdout.flush()?;

    let mut username = String::new();
    std::io::stdin().lock().read_line(&mut username)?;
    let username = username.trim().to_string();
    if username.is_empty() {
        return Err(OpsError::Credentials("username must not be empty".into()));
    }

    let password = rpassword::prompt_password("Password: ")?;
    Ok(Credentials::new(username, password))
}

/// Reads `JUNOPS_USERNAME` / `JUNOPS_PASSWORD`
#[derive(Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    /// True when both variables are set
    pub fn is_available() -> bool {
        std::env::var_os(USERNAME_ENV_VAR).is_some() && std::env::var_os(PASSWORD_ENV_VAR).is_some()
    }
}

#[async_trait]
impl CredentialSource for EnvCredentials {
    async fn credentials(&self) -> Result<Credentials, OpsError> {
        let read = |name: &str| {
            std::env::var(name)
                .map_err(|_| OpsError::Credentials(format!("{} is not set", name)))
        };
        let username = read(USERNAME_ENV_VAR)?;
        let password = read(PASSWORD_ENV_VAR)?;
        debug!("Using credentials from environment for user {}", username);
        Ok(Credentials::new(username, password))
    }
}

/// Credentials fixed up front, for batch callers and tests
#[derive(Debug)]
pub struct StaticCredentials {
    username: String,
    password: SecretString,
}

impl StaticCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

#[async_trait]
impl CredentialSource for StaticCredentials {
    async fn credentials(&self) -> Result<Credentials, OpsError> {
        Ok(Credentials::new(
            self.username.clone(),
            self.password.expose_secret().to_string(),
        ))
    }
}

/// Environment credentials when present, otherwise the terminal prompt.
pub fn default_source() -> Box<dyn CredentialSource> {
    if EnvCredentials::is_available() {
        Box::new(EnvCredentials)
    } else {
        Box::new(PromptCredentials)
    }
}
