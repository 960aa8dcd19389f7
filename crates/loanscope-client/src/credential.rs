//! Lifecycle of the bearer credential.
//!
//! The store is injected everywhere as `Arc<dyn CredentialStore>` so the file
//! slot used by the CLI can be swapped for [`MemoryCredentialStore`] in tests.

use anyhow::{Context, Result};
use loanscope_common::Credential;
use parking_lot::Mutex;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Persistent key-value slot holding at most one credential.
///
/// No expiry is tracked locally; validity is only learned from the backend.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;
    fn set(&self, credential: Credential) -> Result<()>;
    /// Remove the credential. Clearing an empty store is a no-op.
    fn clear(&self) -> Result<()>;
}

/// Credential kept in a single file so it survives process restarts
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let token = raw.trim();
        if token.is_empty() {
            return None;
        }
        Some(Credential::new(token))
    }

    fn set(&self, credential: Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create credential directory")?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .context("Failed to open credential file")?;

        // `mode` only applies on creation; an existing file keeps its own
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .context("Failed to restrict credential file permissions")?;
        }
        file.write_all(credential.as_str().as_bytes())
            .context("Failed to write credential")?;

        tracing::info!("Stored credential at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!("Cleared credential at {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).context("Failed to remove credential"),
        }
    }
}

/// In-process store for tests and embedding
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.slot.lock().clone()
    }

    fn set(&self, credential: Credential) -> Result<()> {
        *self.slot.lock() = Some(credential);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.slot.lock().take();
        Ok(())
    }
}
