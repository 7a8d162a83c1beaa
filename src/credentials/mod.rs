//! Session credential — the one piece of durable client state.
//!
//! Every component that needs the bearer token receives a
//! `CredentialStore` at construction time and asks it on demand; nothing
//! else keeps a copy.

pub mod file;
pub mod memory;
pub mod model;

use async_trait::async_trait;

use crate::error::CredentialError;

pub use file::FileCredentialStore;
pub use memory::MemoryCredentialStore;
pub use model::Credential;

/// Storage for the current session credential.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `None` when no session exists.
    async fn get(&self) -> Result<Option<Credential>, CredentialError>;

    /// Replace the stored credential. Token and user id are written together.
    async fn set(&self, credential: &Credential) -> Result<(), CredentialError>;

    /// Forget the stored credential. Clearing an empty store succeeds.
    async fn clear(&self) -> Result<(), CredentialError>;
}
