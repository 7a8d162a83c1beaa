//! In-process credential store.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Credential, CredentialStore};
use crate::error::CredentialError;

/// Keeps the credential in memory for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing session already stored.
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self.credential.read().await.clone())
    }

    async fn set(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.credential.write().await = Some(credential.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self.credential.write().await = None;
        Ok(())
    }
}
