//! SSH connection types
//!
//! The remote endpoint and the credentials used to log into it.

use std::fmt;
use std::path::{Path, PathBuf};

/// Remote endpoint of a login: host, port and user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    host: String,
    port: u16,
    username: String,
}

impl ConnectionTarget {
    pub fn new(host: impl Into<String>, port: u16, username: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            username: username.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// `user@host`, as understood by the OpenSSH client
    pub fn destination(&self) -> String {
        format!("{}@{}", self.username, self.host)
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// Credentials for the password session
#[derive(Clone)]
pub struct Credentials {
    /// Password for password authentication
    pub password: String,

    /// Path to a private key tried when the password is rejected
    pub private_key: Option<PathBuf>,
}

impl Credentials {
    /// Password-only credentials
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
            private_key: None,
        }
    }

    /// Add a private key file (path, not content)
    pub fn with_private_key(mut self, path: impl AsRef<Path>) -> Self {
        self.private_key = Some(path.as_ref().to_path_buf());
        self
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("password", &"<redacted>")
            .field("private_key", &self.private_key)
            .finish()
    }
}
