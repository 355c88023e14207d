//! In-process registry of remote blob store adapters.
//!
//! Vendor integrations (cloud drives, WebDAV, ...) register here under a
//! stable id; at most one is active and used by the sync reconciler.

use crate::sync::blob::RemoteBlobStore;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Remote registration/selection errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteRegistryError {
    InvalidRemoteId(String),
    DuplicateRemoteId(String),
    RemoteNotFound(String),
}

impl Display for RemoteRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRemoteId(value) => write!(f, "remote id is invalid: {value}"),
            Self::DuplicateRemoteId(value) => write!(f, "remote id already registered: {value}"),
            Self::RemoteNotFound(value) => write!(f, "remote not found: {value}"),
        }
    }
}

impl Error for RemoteRegistryError {}

#[derive(Default)]
pub struct RemoteRegistry {
    remotes: BTreeMap<String, Arc<dyn RemoteBlobStore>>,
    active_remote_id: Option<String>,
}

impl RemoteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one adapter under its `remote_id()`.
    pub fn register(&mut self, remote: Arc<dyn RemoteBlobStore>) -> Result<(), RemoteRegistryError> {
        let remote_id = remote.remote_id().trim().to_string();
        if !is_valid_remote_id(&remote_id) {
            return Err(RemoteRegistryError::InvalidRemoteId(remote_id));
        }
        if self.remotes.contains_key(&remote_id) {
            return Err(RemoteRegistryError::DuplicateRemoteId(remote_id));
        }
        self.remotes.insert(remote_id, remote);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    /// Sorted remote ids.
    pub fn remote_ids(&self) -> Vec<String> {
        self.remotes.keys().cloned().collect()
    }

    pub fn select_active(&mut self, remote_id: &str) -> Result<(), RemoteRegistryError> {
        let normalized = remote_id.trim();
        if !self.remotes.contains_key(normalized) {
            return Err(RemoteRegistryError::RemoteNotFound(normalized.to_string()));
        }
        self.active_remote_id = Some(normalized.to_string());
        Ok(())
    }

    /// Disables remote sync; the reconciler falls back to cache-only mode.
    pub fn clear_active(&mut self) {
        self.active_remote_id = None;
    }

    pub fn active_remote_id(&self) -> Option<&str> {
        self.active_remote_id.as_deref()
    }

    pub fn get(&self, remote_id: &str) -> Option<Arc<dyn RemoteBlobStore>> {
        self.remotes.get(remote_id.trim()).cloned()
    }

    pub fn active_remote(&self) -> Option<Arc<dyn RemoteBlobStore>> {
        self.get(self.active_remote_id()?)
    }
}

fn is_valid_remote_id(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{RemoteRegistry, RemoteRegistryError};
    use crate::sync::blob::MemoryBlobStore;
    use std::sync::Arc;

    #[test]
    fn registers_and_selects_remote() {
        let mut registry = RemoteRegistry::new();
        registry
            .register(Arc::new(MemoryBlobStore::new("google_drive")))
            .expect("remote should register");
        assert_eq!(registry.len(), 1);
        assert!(registry.active_remote().is_none());

        registry
            .select_active("  google_drive ")
            .expect("trimmed id should select");
        assert_eq!(registry.active_remote_id(), Some("google_drive"));
        assert_eq!(
            registry.active_remote().map(|r| r.remote_id().to_string()),
            Some("google_drive".to_string())
        );
    }

    #[test]
    fn rejects_invalid_duplicate_and_unknown_ids() {
        let mut registry = RemoteRegistry::new();
        assert!(matches!(
            registry.register(Arc::new(MemoryBlobStore::new("Google Drive"))),
            Err(RemoteRegistryError::InvalidRemoteId(_))
        ));
        assert!(matches!(
            registry.register(Arc::new(MemoryBlobStore::new("  "))),
            Err(RemoteRegistryError::InvalidRemoteId(_))
        ));

        registry
            .register(Arc::new(MemoryBlobStore::new("onedrive")))
            .expect("first register");
        assert!(matches!(
            registry.register(Arc::new(MemoryBlobStore::new("onedrive"))),
            Err(RemoteRegistryError::DuplicateRemoteId(_))
        ));
        assert_eq!(
            registry.select_active("dropbox"),
            Err(RemoteRegistryError::RemoteNotFound("dropbox".to_string()))
        );
    }

    #[test]
    fn can_switch_and_clear_active_remote() {
        let mut registry = RemoteRegistry::new();
        registry
            .register(Arc::new(MemoryBlobStore::new("google_drive")))
            .expect("google registers");
        registry
            .register(Arc::new(MemoryBlobStore::new("onedrive")))
            .expect("onedrive registers");
        assert_eq!(registry.remote_ids(), vec!["google_drive", "onedrive"]);

        registry.select_active("google_drive").expect("select google");
        registry.select_active("onedrive").expect("select onedrive");
        assert_eq!(registry.active_remote_id(), Some("onedrive"));

        registry.clear_active();
        assert!(registry.active_remote().is_none());
    }
}
