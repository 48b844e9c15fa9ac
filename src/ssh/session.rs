//! Authenticated SSH sessions
//!
//! [`SessionConnector`] and [`RemoteSession`] are the seams the
//! [`Runner`](crate::runner::Runner) drives; [`SshConnector`] and
//! [`SshSession`] implement them on top of russh.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Handle};
use russh::keys::{load_secret_key, Algorithm, PrivateKey, PrivateKeyWithHashAlg};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use super::command::{exec_on_handle, CommandOutput};
use super::config::{ConnectionTarget, Credentials};
use super::handler::SshHandler;
use crate::config::CONNECTION_TIMEOUT_SECS;
use crate::error::{KeySetupError, Result};

/// One open, authenticated session
#[async_trait]
pub trait RemoteSession: Send {
    /// Execute a command and wait for it to finish
    async fn exec(&mut self, command: &str) -> Result<CommandOutput>;

    /// Release the session. Errors while closing are swallowed.
    async fn close(&mut self);
}

/// Opens authenticated sessions
#[async_trait]
pub trait SessionConnector: Send + Sync {
    type Session: RemoteSession;

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<Self::Session>;
}

/// russh-backed connector
#[derive(Debug, Clone)]
pub struct SshConnector {
    connection_timeout: Duration,
}

impl SshConnector {
    pub fn new() -> Self {
        Self {
            connection_timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Set the TCP connect + handshake timeout
    pub fn with_connection_timeout(mut self, connection_timeout: Duration) -> Self {
        self.connection_timeout = connection_timeout;
        self
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionConnector for SshConnector {
    type Session = SshSession;

    async fn connect(
        &self,
        target: &ConnectionTarget,
        credentials: &Credentials,
    ) -> Result<SshSession> {
        info!(
            "Connecting to SSH server {}:{}...",
            target.host(),
            target.port()
        );

        let ssh_config = Arc::new(client::Config::default());
        let addr = format!("{}:{}", target.host(), target.port());

        let connect_result = timeout(
            self.connection_timeout,
            client::connect(ssh_config, addr.as_str(), SshHandler::new()),
        )
        .await;

        let mut handle = match connect_result {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                error!("SSH connection failed: {}", e);
                return Err(KeySetupError::connection(e.to_string()));
            }
            Err(_) => {
                error!(
                    "SSH connection timeout after {}s",
                    self.connection_timeout.as_secs()
                );
                return Err(KeySetupError::connection(format!(
                    "Connection timeout after {}s",
                    self.connection_timeout.as_secs()
                )));
            }
        };

        let private_key = credentials
            .private_key
            .as_deref()
            .and_then(load_private_key_or_warn);

        if let Err(e) = authenticate(
            &mut handle,
            target.username(),
            &credentials.password,
            private_key,
        )
        .await
        {
            disconnect(&handle).await;
            return Err(e);
        }

        info!("Successfully connected to {}", target);

        Ok(SshSession {
            handle: Some(handle),
        })
    }
}

/// Load a private key, downgrading any failure to a warning
fn load_private_key_or_warn(path: &Path) -> Option<PrivateKey> {
    match load_secret_key(path, None) {
        Ok(key) => {
            debug!("Loaded private key {}", path.display());
            Some(key)
        }
        Err(e) => {
            warn!(
                "Could not load private key {}: {}. Continuing with password authentication only.",
                path.display(),
                e
            );
            None
        }
    }
}

/// Password first; the key only when the password is rejected
async fn authenticate(
    handle: &mut Handle<SshHandler>,
    username: &str,
    password: &str,
    private_key: Option<PrivateKey>,
) -> Result<()> {
    debug!("Attempting password authentication for user '{}'", username);
    let auth_result = handle
        .authenticate_password(username, password)
        .await
        .map_err(|e| KeySetupError::auth(e.to_string()))?;

    if auth_result.success() {
        info!("Password authentication successful");
        return Ok(());
    }

    let Some(key) = private_key else {
        return Err(KeySetupError::auth("Password authentication rejected"));
    };

    debug!("Password rejected, attempting key authentication");

    let hash_alg = if matches!(key.algorithm(), Algorithm::Rsa { .. }) {
        handle
            .best_supported_rsa_hash()
            .await
            .map_err(|e| KeySetupError::auth(e.to_string()))?
            .flatten()
    } else {
        None
    };

    let auth_result = handle
        .authenticate_publickey(username, PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg))
        .await
        .map_err(|e| KeySetupError::auth(e.to_string()))?;

    if auth_result.success() {
        info!("Key authentication successful");
        Ok(())
    } else {
        Err(KeySetupError::auth(
            "Password and key authentication rejected",
        ))
    }
}

async fn disconnect(handle: &Handle<SshHandler>) {
    let _ = handle
        .disconnect(russh::Disconnect::ByApplication, "", "")
        .await;
}

/// russh-backed session
pub struct SshSession {
    handle: Option<Handle<SshHandler>>,
}

impl SshSession {
    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}

#[async_trait]
impl RemoteSession for SshSession {
    async fn exec(&mut self, command: &str) -> Result<CommandOutput> {
        let handle = self
            .handle
            .as_ref()
            .ok_or_else(|| KeySetupError::connection("SSH session already closed"))?;

        debug!("Executing remote command: {}", command);
        exec_on_handle(handle, command).await
    }

    async fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            disconnect(&handle).await;
            info!("SSH connection closed");
        }
    }
}

impl std::fmt::Debug for SshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SshSession")
            .field("open", &self.is_open())
            .finish()
    }
}
