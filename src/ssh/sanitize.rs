//! Command sanitization and shell quoting utilities

use crate::error::{KeySetupError, Result};

/// Sanitize a command before execution
///
/// Trims surrounding whitespace and rejects empty commands.
///
/// # Examples
/// ```
/// use ssh_key_setup::ssh::sanitize::sanitize_command;
///
/// let cmd = sanitize_command("  mkdir -p ~/.ssh  ").unwrap();
/// assert_eq!(cmd, "mkdir -p ~/.ssh");
///
/// assert!(sanitize_command("   ").is_err());
/// ```
pub fn sanitize_command(command: &str) -> Result<String> {
    let trimmed = command.trim();

    if trimmed.is_empty() {
        return Err(KeySetupError::config("Command cannot be empty"));
    }

    Ok(trimmed.to_string())
}

/// Escape a string for use inside a single-quoted shell word
///
/// Each `'` becomes `'"'"'`: close the quote, emit a literal quote inside
/// double quotes, reopen the quote.
///
/// # Example
/// ```
/// use ssh_key_setup::ssh::sanitize::escape_for_shell;
///
/// assert_eq!(escape_for_shell("it's"), "it'\"'\"'s");
/// ```
pub fn escape_for_shell(s: &str) -> String {
    s.replace('\'', "'\"'\"'")
}

/// Wrap `s` in single quotes so the shell passes it through verbatim
///
/// # Example
/// ```
/// use ssh_key_setup::ssh::sanitize::quote_for_shell;
///
/// assert_eq!(quote_for_shell("a $HOME b"), "'a $HOME b'");
/// ```
pub fn quote_for_shell(s: &str) -> String {
    format!("'{}'", escape_for_shell(s))
}
