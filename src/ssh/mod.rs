//! SSH transport module
//!
//! Connection types, the russh client handler, command execution and the
//! session seams used by the runner.

pub mod command;
pub mod config;
pub mod handler;
pub mod sanitize;
pub mod session;

// Re-exports
pub use command::CommandOutput;
pub use config::{ConnectionTarget, Credentials};
pub use handler::SshHandler;
pub use sanitize::{escape_for_shell, quote_for_shell, sanitize_command};
pub use session::{RemoteSession, SessionConnector, SshConnector, SshSession};
