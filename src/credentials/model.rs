//! Credential model.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Bearer token and user identifier proving an authenticated session.
#[derive(Debug, Clone)]
pub struct Credential {
    token: SecretString,
    user_id: String,
}

impl Credential {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user_id: user_id.into(),
        }
    }

    /// The raw bearer token. Only the HTTP layer should need this.
    pub fn token(&self) -> &str {
        self.token.expose_secret()
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// On-disk shape, keyed by the same names the mobile app always used.
#[derive(Serialize, Deserialize)]
pub(crate) struct StoredCredential {
    pub token: String,
    #[serde(rename = "clientId")]
    pub client_id: String,
}

impl From<&Credential> for StoredCredential {
    fn from(c: &Credential) -> Self {
        Self {
            token: c.token().to_string(),
            client_id: c.user_id.clone(),
        }
    }
}

impl From<StoredCredential> for Credential {
    fn from(s: StoredCredential) -> Self {
        Credential::new(s.token, s.client_id)
    }
}
