//! Credential vaults
//!
//! Vaults resolve secret references (a password name, an environment variable,
//! a properties key) into secret values on behalf of credential builders.
//! The environment indexes vaults by the [`SecretType`] they handle.

use crate::error::{ConnectionError, Result};
use crate::identity::Identity;
use crate::types::SecretType;
use async_trait::async_trait;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// Reference to a secret held by some vault
pub trait VaultSecret: Any + Send + Sync + fmt::Debug {
    /// Tag used to select the vault able to resolve this secret
    fn secret_type(&self) -> SecretType;

    /// Human-readable reference, used in error messages
    fn reference(&self) -> String;
}

impl dyn VaultSecret {
    /// Borrow the concrete secret reference if it is of type `T`
    pub fn downcast_ref<T: VaultSecret>(&self) -> Option<&T> {
        (self as &dyn Any).downcast_ref::<T>()
    }
}

/// Secret lookup backend
#[async_trait]
pub trait CredentialVault: Send + Sync {
    /// Kind of secret this vault resolves
    fn secret_type(&self) -> SecretType;

    /// Resolve a secret for the given identity
    async fn lookup_secret(&self, secret: &dyn VaultSecret, identity: &Identity)
    -> Result<String>;
}

/// Secret stored in a process environment variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentVariableSecret {
    /// Variable name, before any vault prefix
    pub name: String,
}

impl EnvironmentVariableSecret {
    /// Tag of environment variable secrets
    pub const TYPE: SecretType = SecretType::new("EnvironmentVariableSecret");

    /// Secret read from variable `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl VaultSecret for EnvironmentVariableSecret {
    fn secret_type(&self) -> SecretType {
        Self::TYPE
    }

    fn reference(&self) -> String {
        self.name.clone()
    }
}

/// Vault reading secrets from environment variables
#[derive(Debug, Clone, Default)]
pub struct EnvironmentVariableVault {
    prefix: Option<String>,
}

impl EnvironmentVariableVault {
    /// Vault reading variables as named
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend `prefix` to every looked-up variable name
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn variable_name(&self, name: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

#[async_trait]
impl CredentialVault for EnvironmentVariableVault {
    fn secret_type(&self) -> SecretType {
        EnvironmentVariableSecret::TYPE
    }

    async fn lookup_secret(
        &self,
        secret: &dyn VaultSecret,
        _identity: &Identity,
    ) -> Result<String> {
        let secret = secret
            .downcast_ref::<EnvironmentVariableSecret>()
            .ok_or_else(|| {
                ConnectionError::invalid_configuration(format!(
                    "Environment variable vault can't resolve secret of type '{}'",
                    secret.secret_type()
                ))
            })?;
        let variable = self.variable_name(&secret.name);
        debug!(variable = %variable, "Looking up secret in environment");
        std::env::var(&variable).map_err(|_| ConnectionError::SecretNotFound {
            reference: variable,
        })
    }
}

/// Secret stored under a key of a properties file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertiesSecret {
    /// Properties key
    pub key: String,
}

impl PropertiesSecret {
    /// Tag of properties secrets
    pub const TYPE: SecretType = SecretType::new("PropertiesSecret");

    /// Secret stored under `key`
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

impl VaultSecret for PropertiesSecret {
    fn secret_type(&self) -> SecretType {
        Self::TYPE
    }

    fn reference(&self) -> String {
        self.key.clone()
    }
}

/// Vault backed by a `key=value` properties file, parsed once when created
pub struct PropertiesFileVault {
    properties: HashMap<String, String>,
}

impl PropertiesFileVault {
    /// Load properties from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectionError::invalid_configuration(format!(
                "Can't read properties file '{}': {e}",
                path.display()
            ))
        })?;
        let vault = Self::parse(&content);
        debug!(
            path = %path.display(),
            entries = vault.properties.len(),
            "Loaded properties vault"
        );
        Ok(vault)
    }

    /// Parse properties content
    ///
    /// Blank lines and lines starting with `#` or `!` are skipped. The first
    /// `=` or `:` separates key from value; both sides are trimmed.
    pub fn parse(content: &str) -> Self {
        let properties = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
            .filter_map(|line| {
                let separator = line.find(['=', ':'])?;
                let key = line[..separator].trim();
                if key.is_empty() {
                    return None;
                }
                Some((key.to_string(), line[separator + 1..].trim().to_string()))
            })
            .collect();
        Self { properties }
    }

    /// Number of loaded entries
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the file had no entries
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl fmt::Debug for PropertiesFileVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.properties.keys().collect();
        keys.sort();
        f.debug_struct("PropertiesFileVault")
            .field("keys", &keys)
            .finish()
    }
}

#[async_trait]
impl CredentialVault for PropertiesFileVault {
    fn secret_type(&self) -> SecretType {
        PropertiesSecret::TYPE
    }

    async fn lookup_secret(
        &self,
        secret: &dyn VaultSecret,
        _identity: &Identity,
    ) -> Result<String> {
        let secret = secret.downcast_ref::<PropertiesSecret>().ok_or_else(|| {
            ConnectionError::invalid_configuration(format!(
                "Properties vault can't resolve secret of type '{}'",
                secret.secret_type()
            ))
        })?;
        self.properties
            .get(&secret.key)
            .cloned()
            .ok_or_else(|| ConnectionError::SecretNotFound {
                reference: secret.key.clone(),
            })
    }
}
