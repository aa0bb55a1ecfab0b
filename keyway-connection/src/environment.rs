//! Process-wide environment configuration
//!
//! Holds the secret vaults, the store supports and the authentication
//! mechanism metadata. Built once during application wiring, then read-only;
//! the `inject_*` methods exist for test instrumentation and need exclusive
//! access, so they can't race with live resolution.

use crate::error::{ConnectionError, Result};
use crate::identity::Identity;
use crate::mechanism::AuthenticationMechanismConfiguration;
use crate::store::StoreSupport;
use crate::types::{AuthenticationConfigurationType, AuthenticationMechanism, SecretType};
use crate::vault::{CredentialVault, VaultSecret};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Shared, read-only environment
pub struct EnvironmentConfiguration {
    vaults: HashMap<SecretType, Arc<dyn CredentialVault>>,
    store_supports: Vec<Arc<StoreSupport>>,
    store_support_index: HashMap<String, usize>,
    authentication_mechanisms: Vec<AuthenticationMechanismConfiguration>,
    mechanism_index: HashMap<AuthenticationConfigurationType, usize>,
}

impl EnvironmentConfiguration {
    /// Start building an environment
    pub fn builder() -> EnvironmentConfigurationBuilder {
        EnvironmentConfigurationBuilder::default()
    }

    /// Environment with no vault, store support or mechanism
    pub fn empty() -> Self {
        Self {
            vaults: HashMap::new(),
            store_supports: vec![],
            store_support_index: HashMap::new(),
            authentication_mechanisms: vec![],
            mechanism_index: HashMap::new(),
        }
    }

    /// Store support by identifier
    pub fn store_support(&self, identifier: &str) -> Result<Arc<StoreSupport>> {
        self.find_store_support(identifier)
            .cloned()
            .ok_or_else(|| ConnectionError::StoreSupportNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Store support by identifier, if registered
    pub fn find_store_support(&self, identifier: &str) -> Option<&Arc<StoreSupport>> {
        self.store_support_index
            .get(identifier)
            .map(|position| &self.store_supports[*position])
    }

    /// Store supports in registration order
    pub fn store_supports(&self) -> &[Arc<StoreSupport>] {
        &self.store_supports
    }

    /// Vault resolving secrets of `secret_type`
    pub fn vault(&self, secret_type: &SecretType) -> Option<&Arc<dyn CredentialVault>> {
        self.vaults.get(secret_type)
    }

    /// Resolve a secret through the vault registered for its secret type
    pub async fn lookup_secret(&self, secret: &dyn VaultSecret, identity: &Identity) -> Result<String> {
        let secret_type = secret.secret_type();
        let vault = self
            .vault(&secret_type)
            .ok_or_else(|| ConnectionError::VaultNotFound {
                secret_type: secret_type.clone(),
            })?;
        debug!(
            secret_type = %secret_type,
            reference = %secret.reference(),
            identity = identity.name(),
            "Looking up secret"
        );
        vault.lookup_secret(secret, identity).await
    }

    /// Globally declared mechanisms, in registration order
    pub fn authentication_mechanisms(&self) -> &[AuthenticationMechanismConfiguration] {
        &self.authentication_mechanisms
    }

    /// Globally declared configuration of `mechanism`
    pub fn authentication_mechanism_configuration(
        &self,
        mechanism: &AuthenticationMechanism,
    ) -> Option<&AuthenticationMechanismConfiguration> {
        self.authentication_mechanisms
            .iter()
            .find(|configuration| configuration.mechanism() == mechanism)
    }

    /// Mechanism realised by a configuration type
    pub fn authentication_mechanism_for(
        &self,
        configuration_type: &AuthenticationConfigurationType,
    ) -> Option<&AuthenticationMechanism> {
        self.mechanism_index
            .get(configuration_type)
            .map(|position| self.authentication_mechanisms[*position].mechanism())
    }

    /// Add a store support after build. Test instrumentation only.
    pub fn inject_store_support(&mut self, store_support: StoreSupport) -> Result<()> {
        self.register_store_support(Arc::new(store_support))
    }

    /// Add a vault after build. Test instrumentation only.
    pub fn inject_vault(&mut self, vault: Arc<dyn CredentialVault>) -> Result<()> {
        self.register_vault(vault)
    }

    fn register_store_support(&mut self, store_support: Arc<StoreSupport>) -> Result<()> {
        if self
            .store_support_index
            .contains_key(store_support.identifier())
        {
            return Err(ConnectionError::registration_conflict(format!(
                "Found multiple store supports with identifier '{}'",
                store_support.identifier()
            )));
        }
        self.store_support_index
            .insert(store_support.identifier().to_string(), self.store_supports.len());
        self.store_supports.push(store_support);
        Ok(())
    }

    fn register_vault(&mut self, vault: Arc<dyn CredentialVault>) -> Result<()> {
        let secret_type = vault.secret_type();
        if self.vaults.contains_key(&secret_type) {
            return Err(ConnectionError::registration_conflict(format!(
                "Found multiple credential vaults for secret type '{secret_type}'"
            )));
        }
        self.vaults.insert(secret_type, vault);
        Ok(())
    }

    fn register_authentication_mechanism(
        &mut self,
        configuration: AuthenticationMechanismConfiguration,
    ) -> Result<()> {
        if configuration.configuration_types().is_empty() {
            return Err(ConnectionError::invalid_configuration(format!(
                "No authentication configuration type is associated with authentication mechanism '{}'",
                configuration.mechanism()
            )));
        }
        if self
            .authentication_mechanism_configuration(configuration.mechanism())
            .is_some()
        {
            return Err(ConnectionError::registration_conflict(format!(
                "Found multiple configurations for authentication mechanism '{}'",
                configuration.mechanism()
            )));
        }
        let position = self.authentication_mechanisms.len();
        for configuration_type in configuration.configuration_types() {
            if let Some(existing) = self.mechanism_index.get(configuration_type) {
                return Err(ConnectionError::registration_conflict(format!(
                    "Authentication configuration type '{configuration_type}' is associated with multiple authentication mechanisms: '{}', '{}'",
                    self.authentication_mechanisms[*existing].mechanism(),
                    configuration.mechanism()
                )));
            }
        }
        for configuration_type in configuration.configuration_types() {
            self.mechanism_index
                .insert(configuration_type.clone(), position);
        }
        self.authentication_mechanisms.push(configuration);
        Ok(())
    }
}

impl fmt::Debug for EnvironmentConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut vaults: Vec<&SecretType> = self.vaults.keys().collect();
        vaults.sort();
        f.debug_struct("EnvironmentConfiguration")
            .field("vaults", &vaults)
            .field(
                "store_supports",
                &self
                    .store_supports
                    .iter()
                    .map(|store_support| store_support.identifier())
                    .collect::<Vec<_>>(),
            )
            .field("authentication_mechanisms", &self.authentication_mechanisms)
            .finish()
    }
}

/// Builder for [`EnvironmentConfiguration`]
#[derive(Default)]
pub struct EnvironmentConfigurationBuilder {
    vaults: Vec<Arc<dyn CredentialVault>>,
    store_supports: Vec<StoreSupport>,
    authentication_mechanisms: Vec<AuthenticationMechanismConfiguration>,
}

impl fmt::Debug for EnvironmentConfigurationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentConfigurationBuilder")
            .field(
                "vaults",
                &self
                    .vaults
                    .iter()
                    .map(|vault| vault.secret_type())
                    .collect::<Vec<_>>(),
            )
            .field(
                "store_supports",
                &self
                    .store_supports
                    .iter()
                    .map(StoreSupport::identifier)
                    .collect::<Vec<_>>(),
            )
            .field("authentication_mechanisms", &self.authentication_mechanisms)
            .finish()
    }
}

impl EnvironmentConfigurationBuilder {
    /// Register a vault
    pub fn with_vault(mut self, vault: impl CredentialVault + 'static) -> Self {
        self.vaults.push(Arc::new(vault));
        self
    }

    /// Register an already shared vault
    pub fn with_shared_vault(mut self, vault: Arc<dyn CredentialVault>) -> Self {
        self.vaults.push(vault);
        self
    }

    /// Register a store support
    pub fn with_store_support(mut self, store_support: StoreSupport) -> Self {
        self.store_supports.push(store_support);
        self
    }

    /// Register several store supports
    pub fn with_store_supports(mut self, store_supports: impl IntoIterator<Item = StoreSupport>) -> Self {
        self.store_supports.extend(store_supports);
        self
    }

    /// Declare an authentication mechanism globally
    pub fn with_authentication_mechanism(
        mut self,
        configuration: AuthenticationMechanismConfiguration,
    ) -> Self {
        self.authentication_mechanisms.push(configuration);
        self
    }

    /// Declare several authentication mechanisms globally
    pub fn with_authentication_mechanisms(
        mut self,
        configurations: impl IntoIterator<Item = AuthenticationMechanismConfiguration>,
    ) -> Self {
        self.authentication_mechanisms.extend(configurations);
        self
    }

    /// Fails on a duplicate vault secret type, a duplicate store support
    /// identifier, or two mechanisms sharing one configuration type
    pub fn build(self) -> Result<EnvironmentConfiguration> {
        let mut environment = EnvironmentConfiguration::empty();
        for vault in self.vaults {
            environment.register_vault(vault)?;
        }
        for store_support in self.store_supports {
            environment.register_store_support(Arc::new(store_support))?;
        }
        for configuration in self.authentication_mechanisms {
            environment.register_authentication_mechanism(configuration)?;
        }
        debug!(
            vaults = environment.vaults.len(),
            store_supports = environment.store_supports.len(),
            authentication_mechanisms = environment.authentication_mechanisms.len(),
            "Built environment configuration"
        );
        Ok(environment)
    }
}
