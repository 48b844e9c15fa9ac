//! Configuration and CLI argument parsing for ssh-key-setup

use clap::Parser;
use std::path::PathBuf;

use crate::authorized_key::AuthorizedKey;
use crate::error::{KeySetupError, Result};
use crate::ssh::{ConnectionTarget, Credentials};

/// `-o ConnectTimeout` handed to the probing ssh client, in seconds
pub const PROBE_CONNECT_TIMEOUT_SECS: u64 = 3;

/// Deadline for the whole probing ssh process, in seconds
pub const PROBE_WAIT_TIMEOUT_SECS: u64 = 5;

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

const EXAMPLES: &str = "\
Examples:
  ssh-key-setup 127.0.0.1 22 admin mypassword
  ssh-key-setup example.com 2222 user secretpass ~/.ssh/id_rsa.pub
  ssh-key-setup 192.168.1.100 22 deploy mypass /home/user/.ssh/deploy_key.pub";

/// ssh-key-setup CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "ssh-key-setup")]
#[command(version)]
#[command(about = "Log into an SSH server with a password and optionally install a public key")]
#[command(after_help = EXAMPLES)]
pub struct Args {
    /// SSH server hostname or IP address
    pub host: String,

    /// SSH server port (1-65535)
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// SSH username
    pub username: String,

    /// SSH password
    pub password: String,

    /// Public key file to install into ~/.ssh/authorized_keys
    pub public_key_file: Option<PathBuf>,
}

/// Parsed and validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Where to log in
    pub target: ConnectionTarget,

    /// SSH password
    pub password: String,

    /// Key to provision, if any
    pub public_key: Option<AuthorizedKey>,
}

impl Config {
    /// Create Config from CLI Args
    pub fn from_args(args: Args) -> Result<Self> {
        validate_args(&args)?;

        let public_key = args
            .public_key_file
            .as_ref()
            .map(AuthorizedKey::from_file)
            .transpose()?;

        Ok(Config {
            target: ConnectionTarget::new(args.host, args.port, args.username),
            password: args.password,
            public_key,
        })
    }

    /// Credentials for the password session; includes the private half of
    /// `public_key` when it sits next to it on disk
    pub fn credentials(&self) -> Credentials {
        let credentials = Credentials::password(&self.password);
        match self
            .public_key
            .as_ref()
            .and_then(AuthorizedKey::private_key_path)
        {
            Some(path) => credentials.with_private_key(path),
            None => credentials,
        }
    }
}

/// Validate CLI arguments
fn validate_args(args: &Args) -> Result<()> {
    let mut errors = Vec::new();

    for (value, name) in [
        (&args.host, "Host"),
        (&args.username, "Username"),
        (&args.password, "Password"),
    ] {
        if value.trim().is_empty() {
            errors.push(format!("{} cannot be empty", name));
        }
    }

    if let Some(ref key_path) = args.public_key_file {
        if !key_path.exists() {
            errors.push(format!(
                "Public key file '{}' does not exist",
                key_path.display()
            ));
        }
    }

    if !errors.is_empty() {
        return Err(KeySetupError::config(errors.join("\n")));
    }

    Ok(())
}
