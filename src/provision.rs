//! Fixed remote step lists

use crate::authorized_key::AuthorizedKey;
use crate::runner::CommandStep;

/// Steps run when no public key was given: report the remote working directory
pub fn default_steps() -> Vec<CommandStep> {
    vec![CommandStep::new("pwd", "Current working directory")]
}

/// Steps installing `key` for the logged-in user
pub fn provisioning_steps(key: &AuthorizedKey) -> Vec<CommandStep> {
    vec![
        CommandStep::new("mkdir -p ~/.ssh", "Create ~/.ssh directory"),
        CommandStep::new("chmod 700 ~/.ssh", "Set ~/.ssh permissions to 700"),
        CommandStep::new(
            key.append_command(),
            "Append public key to ~/.ssh/authorized_keys",
        ),
        CommandStep::new(
            "chmod 600 ~/.ssh/authorized_keys",
            "Set ~/.ssh/authorized_keys permissions to 600",
        ),
    ]
}
