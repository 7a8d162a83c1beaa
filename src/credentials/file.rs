//! JSON-file credential store — survives app restarts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::model::StoredCredential;
use super::{Credential, CredentialStore};
use crate::error::CredentialError;

/// Persists the credential as a small JSON document.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// reader never sees a token without its user id.
#[derive(Debug, Clone)]
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

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "credential".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredCredential = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(path = %self.path.display(), "Credential file is corrupt: {}", e);
            e
        })?;
        Ok(Some(stored.into()))
    }

    async fn set(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_vec(&StoredCredential::from(credential))?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), user_id = %credential.user_id(), "Credential stored");
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Credential cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_means_no_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credential.json"));
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credential.json");

        FileCredentialStore::new(&path)
            .set(&Credential::new("tok-1", "99"))
            .await
            .unwrap();

        let reopened = FileCredentialStore::new(&path);
        let credential = reopened.get().await.unwrap().unwrap();
        assert_eq!(credential.token(), "tok-1");
        assert_eq!(credential.user_id(), "99");
        assert!(!reopened.temp_path().exists());
    }

    #[tokio::test]
    async fn clear_removes_file_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credential.json"));
        store.set(&Credential::new("tok", "1")).await.unwrap();

        store.clear().await.unwrap();
        assert!(!store.path().exists());
        store.clear().await.unwrap();
        assert!(store.get().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error_not_an_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential.json");
        std::fs::write(&path, b"{not json").unwrap();

        let err = FileCredentialStore::new(&path).get().await.unwrap_err();
        assert!(matches!(err, CredentialError::Serialization(_)));
    }
}
