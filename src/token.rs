//! Token Store
//!
//! Single-slot persistence for the operator's bearer token. Implementations
//! never cache: every read and write goes straight to the medium.

use parking_lot::RwLock;
use std::fs::OpenOptions;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persisted bearer credential
pub trait TokenStore: Send + Sync {
    /// Stored token, or an empty string when none exists
    fn get_token(&self) -> String;

    /// Persist `token`, replacing any previous value
    fn set_token(&self, token: &str) -> io::Result<()>;

    /// Remove the stored token; a no-op when nothing is stored
    fn clear_token(&self) -> io::Result<()>;
}

/// Token kept in a single file on disk
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/stellar-admin/token`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stellar-admin")
            .join("token")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> String {
        match std::fs::read_to_string(&self.path) {
            Ok(token) => token,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => {
                warn!("Failed to read token from {}: {}", self.path.display(), e);
                String::new()
            }
        }
    }

    fn set_token(&self, token: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write atomically via temp file, readable by the owner only
        let temp_path = self.path.with_extension("tmp");
        match std::fs::remove_file(&temp_path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e),
            _ => {}
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&temp_path)?;
        file.write_all(token.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp_path, &self.path)?;

        debug!("Token stored at {}", self.path.display());
        Ok(())
    }

    fn clear_token(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!("Token removed from {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

/// Process-local token slot
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: RwLock<String>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: RwLock::new(token.to_string()),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> String {
        self.slot.read().clone()
    }

    fn set_token(&self, token: &str) -> io::Result<()> {
        *self.slot.write() = token.to_string();
        Ok(())
    }

    fn clear_token(&self) -> io::Result<()> {
        self.slot.write().clear();
        Ok(())
    }
}
