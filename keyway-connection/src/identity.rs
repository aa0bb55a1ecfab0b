//! Caller identity and the credentials it already holds

use crate::credentials::AnonymousCredential;
use crate::protocol::Credential;
use crate::types::CredentialType;
use std::sync::Arc;

/// Caller's bundle of held credentials
///
/// Credentials keep their insertion order, which is also the order in which
/// the flow resolver explores them. An identity with no credentials is valid.
#[derive(Debug, Clone)]
pub struct Identity {
    name: String,
    credentials: Vec<Arc<dyn Credential>>,
}

impl Identity {
    /// Create an identity holding no credentials
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            credentials: vec![],
        }
    }

    /// Identity of an unauthenticated caller, holding an [`AnonymousCredential`]
    pub fn anonymous() -> Self {
        Self::new("anonymous").with_credential(AnonymousCredential)
    }

    /// Add a credential
    pub fn with_credential(self, credential: impl Credential) -> Self {
        self.with_shared_credential(Arc::new(credential))
    }

    /// Add an already shared credential
    pub fn with_shared_credential(mut self, credential: Arc<dyn Credential>) -> Self {
        self.credentials.push(credential);
        self
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All held credentials, in insertion order
    pub fn credentials(&self) -> &[Arc<dyn Credential>] {
        &self.credentials
    }

    /// Distinct held credential types, in first-insertion order
    pub fn credential_types(&self) -> Vec<CredentialType> {
        let mut types: Vec<CredentialType> = Vec::with_capacity(self.credentials.len());
        for credential in &self.credentials {
            let credential_type = credential.credential_type();
            if !types.contains(&credential_type) {
                types.push(credential_type);
            }
        }
        types
    }

    /// First held credential of the given type
    pub fn credential(&self, credential_type: &CredentialType) -> Option<&Arc<dyn Credential>> {
        self.credentials
            .iter()
            .find(|credential| credential.credential_type() == *credential_type)
    }

    /// First held credential whose concrete type is `T`
    pub fn typed_credential<T: Credential>(&self) -> Option<&T> {
        self.credentials
            .iter()
            .find_map(|credential| credential.downcast_ref::<T>())
    }

    /// Whether a credential of the given type is held
    pub fn has_credential(&self, credential_type: &CredentialType) -> bool {
        self.credential(credential_type).is_some()
    }
}
