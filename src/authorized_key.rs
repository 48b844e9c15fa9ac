//! Public keys to be installed into `~/.ssh/authorized_keys`

use std::path::{Path, PathBuf};

use ssh_key::{HashAlg, PublicKey};

use crate::error::{KeySetupError, Result};
use crate::ssh::quote_for_shell;

/// A validated OpenSSH public key read from disk
#[derive(Debug, Clone)]
pub struct AuthorizedKey {
    path: PathBuf,
    line: String,
    fingerprint: String,
}

impl AuthorizedKey {
    /// Read and validate a public key file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeySetupError::SshKey(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut key = Self::parse(&content)?;
        key.path = path.to_path_buf();
        Ok(key)
    }

    /// Parse a single OpenSSH public key line (surrounding whitespace allowed)
    pub fn parse(content: &str) -> Result<Self> {
        let trimmed = content.trim();

        if trimmed.is_empty() {
            return Err(KeySetupError::SshKey("Public key file is empty".into()));
        }
        if trimmed.contains(['\n', '\r']) {
            return Err(KeySetupError::SshKey(
                "Public key file must contain exactly one key on a single line".into(),
            ));
        }

        let key = PublicKey::from_openssh(trimmed)
            .map_err(|e| KeySetupError::SshKey(format!("Invalid public key: {}", e)))?;
        let line = key
            .to_openssh()
            .map_err(|e| KeySetupError::SshKey(format!("Invalid public key: {}", e)))?;

        Ok(Self {
            path: PathBuf::new(),
            line,
            fingerprint: key.fingerprint(HashAlg::Sha256).to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Canonical `algorithm base64 [comment]` line
    pub fn line(&self) -> &str {
        &self.line
    }

    /// `SHA256:...` fingerprint, for log output
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Matching private key: the same path without `.pub`, if present on disk
    pub fn private_key_path(&self) -> Option<PathBuf> {
        let name = self.path.file_name()?.to_str()?;
        let stem = name.strip_suffix(".pub")?;
        if stem.is_empty() {
            return None;
        }
        let candidate = self.path.with_file_name(stem);
        candidate.is_file().then_some(candidate)
    }

    /// Remote command appending this key to `~/.ssh/authorized_keys`
    ///
    /// The key line is single-quoted, so a comment carrying quotes or `$(..)`
    /// is written literally instead of being interpreted by the remote shell.
    pub fn append_command(&self) -> String {
        format!(
            "echo {} >> ~/.ssh/authorized_keys",
            quote_for_shell(&self.line)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ED25519: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAILM+rvN+ot98qgEN796jTiQfZfG1KaT0PtFDJ/XFSqti user@example.com";

    fn write_key(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_parse_valid_key() {
        let key = AuthorizedKey::parse(&format!("  {}\n", ED25519)).unwrap();
        assert_eq!(key.line(), ED25519);
        assert!(key.fingerprint().starts_with("SHA256:"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = AuthorizedKey::parse("not a key").unwrap_err();
        assert!(err.to_string().contains("Invalid public key"));
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(AuthorizedKey::parse("  \n").is_err());
    }

    #[test]
    fn test_parse_rejects_multiple_lines() {
        let content = format!("{}\n{}", ED25519, ED25519);
        let err = AuthorizedKey::parse(&content).unwrap_err();
        assert!(err.to_string().contains("single line"));
    }

    #[test]
    fn test_append_command_quotes_key() {
        let key = AuthorizedKey::parse(ED25519).unwrap();
        assert_eq!(
            key.append_command(),
            format!("echo '{}' >> ~/.ssh/authorized_keys", ED25519)
        );
    }

    #[test]
    fn test_from_file_and_private_key_path() {
        let dir = tempfile::tempdir().unwrap();
        let pub_path = write_key(dir.path(), "id_ed25519.pub", ED25519);

        let key = AuthorizedKey::from_file(&pub_path).unwrap();
        assert_eq!(key.path(), pub_path.as_path());
        // No private key next to it yet
        assert_eq!(key.private_key_path(), None);

        let priv_path = write_key(dir.path(), "id_ed25519", "private");
        assert_eq!(key.private_key_path(), Some(priv_path));
    }

    #[test]
    fn test_private_key_path_requires_pub_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_key(dir.path(), "deploy_key", ED25519);
        write_key(dir.path(), "deploy", "private");

        let key = AuthorizedKey::from_file(&path).unwrap();
        assert_eq!(key.private_key_path(), None);
    }

    #[test]
    fn test_from_file_missing() {
        let err = AuthorizedKey::from_file("/nonexistent/id_rsa.pub").unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
