//! ssh-key-setup - password login and public-key provisioning over SSH
//!
//! Logs into a remote host with a password and, when given a public key
//! file, installs that key into `~/.ssh/authorized_keys`. Before and after
//! provisioning, the system `ssh` client is used to check whether
//! non-interactive key-based login works.
//!
//! # Components
//!
//! - [`LoginProber`] - bounded, side-effect-free check of key-based login
//! - [`Runner`] - one authenticated session, ordered steps, stop at first failure
//! - [`provision`] - the fixed step lists run by the CLI
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! ssh-key-setup 192.168.1.100 22 admin secret ~/.ssh/id_ed25519.pub
//! ```

pub mod authorized_key;
pub mod config;
pub mod error;
pub mod probe;
pub mod provision;
pub mod runner;
pub mod ssh;

// Re-exports for convenience
pub use authorized_key::AuthorizedKey;
pub use config::{Args, Config};
pub use error::{ErrorKind, KeySetupError, Result};
pub use probe::{run_bounded, BoundedExit, LoginProber};
pub use runner::{CommandStep, RunFailure, RunOutcome, Runner, StepOutcome};
pub use ssh::{
    CommandOutput, ConnectionTarget, Credentials, RemoteSession, SessionConnector, SshConnector,
    SshSession,
};
