//! File-based environment settings
//!
//! Declarative counterpart of [`EnvironmentConfigurationBuilder`]: store
//! supports, authentication mechanisms and vaults can be read from TOML or
//! JSON. Default configuration generators and custom vaults can't be
//! expressed in a file; add them to the builder returned by
//! [`EnvironmentSettings::into_builder`].

use crate::environment::EnvironmentConfigurationBuilder;
use crate::error::{ConnectionError, Result};
use crate::mechanism::AuthenticationMechanismConfiguration;
use crate::store::StoreSupport;
use crate::types::{AuthenticationConfigurationType, AuthenticationMechanism};
use crate::vault::{EnvironmentVariableVault, PropertiesFileVault};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentSettings {
    /// Store supports, by identifier
    #[serde(default)]
    pub store_supports: Vec<StoreSupportSettings>,
    /// Globally declared authentication mechanisms
    #[serde(default)]
    pub authentication_mechanisms: Vec<AuthenticationMechanismSettings>,
    /// Secret vaults
    #[serde(default)]
    pub vaults: Vec<VaultSettings>,
}

/// One store support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSupportSettings {
    /// Store support identifier
    pub identifier: String,
    /// Accepted mechanisms
    #[serde(default)]
    pub authentication_mechanisms: Vec<AuthenticationMechanismSettings>,
}

/// One authentication mechanism and the configuration types realising it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthenticationMechanismSettings {
    /// Mechanism label
    pub mechanism: AuthenticationMechanism,
    /// Configuration types, in preference order
    #[serde(default)]
    pub configuration_types: Vec<AuthenticationConfigurationType>,
}

/// Vault backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VaultSettings {
    /// Process environment variables
    Environment {
        /// Prefix prepended to every variable name
        #[serde(default)]
        prefix: Option<String>,
    },
    /// `key=value` properties file
    PropertiesFile {
        /// Path to the properties file
        path: PathBuf,
    },
}

impl EnvironmentSettings {
    /// Conventional settings location: `<config dir>/keyway/environment.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("keyway").join("environment.toml"))
    }

    /// Parse TOML settings
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ConnectionError::invalid_configuration(format!("Invalid TOML settings: {e}"))
        })
    }

    /// Parse JSON settings
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| {
            ConnectionError::invalid_configuration(format!("Invalid JSON settings: {e}"))
        })
    }

    /// Load settings from a file; `.json` files are read as JSON, anything
    /// else as TOML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConnectionError::invalid_configuration(format!(
                "Can't read settings file '{}': {e}",
                path.display()
            ))
        })?;
        debug!(path = %path.display(), "Loading environment settings");
        match path.extension().and_then(|extension| extension.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// Turn the settings into an environment builder
    ///
    /// Store supports are validated here; environment-wide checks such as
    /// duplicate identifiers run when the returned builder is built.
    pub fn into_builder(self) -> Result<EnvironmentConfigurationBuilder> {
        let mut builder = crate::environment::EnvironmentConfiguration::builder();

        for vault in self.vaults {
            builder = match vault {
                VaultSettings::Environment { prefix: Some(prefix) } => {
                    builder.with_vault(EnvironmentVariableVault::with_prefix(prefix))
                }
                VaultSettings::Environment { prefix: None } => {
                    builder.with_vault(EnvironmentVariableVault::new())
                }
                VaultSettings::PropertiesFile { path } => {
                    builder.with_vault(PropertiesFileVault::from_file(path)?)
                }
            };
        }

        builder = builder.with_authentication_mechanisms(
            self.authentication_mechanisms
                .into_iter()
                .map(AuthenticationMechanismSettings::into_configuration),
        );

        for store_support in self.store_supports {
            let store_support = StoreSupport::builder()
                .with_identifier(store_support.identifier)
                .with_authentication_mechanism_configurations(
                    store_support
                        .authentication_mechanisms
                        .into_iter()
                        .map(AuthenticationMechanismSettings::into_configuration),
                )
                .build()?;
            builder = builder.with_store_support(store_support);
        }

        Ok(builder)
    }
}

impl AuthenticationMechanismSettings {
    fn into_configuration(self) -> AuthenticationMechanismConfiguration {
        AuthenticationMechanismConfiguration::builder(self.mechanism)
            .with_configuration_types(self.configuration_types)
            .build()
    }
}
