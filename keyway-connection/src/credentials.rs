//! Built-in credential kinds shared by most store integrations

use crate::logging::redact;
use crate::protocol::Credential;
use crate::types::CredentialType;
use std::fmt;

/// Credential of a caller who has not authenticated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnonymousCredential;

impl AnonymousCredential {
    /// Tag of anonymous credentials
    pub const TYPE: CredentialType = CredentialType::new("AnonymousCredential");
}

impl Credential for AnonymousCredential {
    fn credential_type(&self) -> CredentialType {
        Self::TYPE
    }
}

/// Username and password held in clear text
#[derive(Clone, PartialEq, Eq)]
pub struct PlaintextUserPasswordCredential {
    user: String,
    password: String,
}

impl PlaintextUserPasswordCredential {
    /// Tag of user/password credentials
    pub const TYPE: CredentialType = CredentialType::new("PlaintextUserPasswordCredential");

    /// Credential for `user` with a plaintext `password`
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }

    /// User name
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Plaintext password
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for PlaintextUserPasswordCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaintextUserPasswordCredential")
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .finish()
    }
}

impl Credential for PlaintextUserPasswordCredential {
    fn credential_type(&self) -> CredentialType {
        Self::TYPE
    }
}

/// Opaque API token
#[derive(Clone, PartialEq, Eq)]
pub struct ApiTokenCredential {
    token: String,
}

impl ApiTokenCredential {
    /// Tag of API token credentials
    pub const TYPE: CredentialType = CredentialType::new("ApiTokenCredential");

    /// Wrap a bearer token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Raw token value
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for ApiTokenCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiTokenCredential")
            .field("token", &redact(&self.token))
            .finish()
    }
}

impl Credential for ApiTokenCredential {
    fn credential_type(&self) -> CredentialType {
        Self::TYPE
    }
}
