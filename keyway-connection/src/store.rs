//! Store capability declarations and concrete store endpoints

use crate::environment::EnvironmentConfiguration;
use crate::error::{ConnectionError, Result};
use crate::mechanism::AuthenticationMechanismConfiguration;
use crate::protocol::ConnectionSpecification;
use crate::types::{AuthenticationConfigurationType, AuthenticationMechanism};
use std::collections::HashMap;
use std::sync::Arc;

/// Authentication mechanisms indexed by mechanism and by configuration type,
/// preserving declaration order
#[derive(Debug, Clone, Default)]
struct MechanismIndex {
    configurations: Vec<AuthenticationMechanismConfiguration>,
    by_configuration_type: HashMap<AuthenticationConfigurationType, usize>,
}

impl MechanismIndex {
    fn build(owner: &str, configurations: Vec<AuthenticationMechanismConfiguration>) -> Result<Self> {
        let mut index = Self::default();
        for configuration in configurations {
            if configuration.configuration_types().is_empty() {
                return Err(ConnectionError::invalid_configuration(format!(
                    "No authentication configuration type is associated with authentication mechanism '{}' of '{owner}'",
                    configuration.mechanism()
                )));
            }
            if index.get(configuration.mechanism()).is_some() {
                return Err(ConnectionError::registration_conflict(format!(
                    "Found multiple configurations for authentication mechanism '{}' of '{owner}'",
                    configuration.mechanism()
                )));
            }
            let position = index.configurations.len();
            for configuration_type in configuration.configuration_types() {
                if let Some(existing) = index.by_configuration_type.get(configuration_type) {
                    return Err(ConnectionError::registration_conflict(format!(
                        "Authentication configuration type '{configuration_type}' of '{owner}' is associated with multiple authentication mechanisms: '{}', '{}'",
                        index.configurations[*existing].mechanism(),
                        configuration.mechanism()
                    )));
                }
                index
                    .by_configuration_type
                    .insert(configuration_type.clone(), position);
            }
            index.configurations.push(configuration);
        }
        Ok(index)
    }

    fn get(&self, mechanism: &AuthenticationMechanism) -> Option<&AuthenticationMechanismConfiguration> {
        self.configurations
            .iter()
            .find(|configuration| configuration.mechanism() == mechanism)
    }

    fn mechanism_for(
        &self,
        configuration_type: &AuthenticationConfigurationType,
    ) -> Option<&AuthenticationMechanism> {
        self.by_configuration_type
            .get(configuration_type)
            .map(|position| self.configurations[*position].mechanism())
    }

    fn mechanisms(&self) -> Vec<AuthenticationMechanism> {
        self.configurations
            .iter()
            .map(|configuration| configuration.mechanism().clone())
            .collect()
    }

    fn configuration_types(&self) -> Vec<AuthenticationConfigurationType> {
        self.configurations
            .iter()
            .flat_map(|configuration| configuration.configuration_types().iter().cloned())
            .collect()
    }
}

/// Capability declaration for a class of stores: which authentication
/// mechanisms, hence which configuration types, they accept
#[derive(Debug, Clone)]
pub struct StoreSupport {
    identifier: String,
    mechanisms: MechanismIndex,
}

impl StoreSupport {
    /// Start building a store support
    pub fn builder() -> StoreSupportBuilder {
        StoreSupportBuilder::default()
    }

    /// Store support identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Declared mechanism configurations, in declaration order
    pub fn authentication_mechanism_configurations(&self) -> &[AuthenticationMechanismConfiguration] {
        &self.mechanisms.configurations
    }

    /// Accepted configuration of `mechanism`
    pub fn authentication_mechanism_configuration(
        &self,
        mechanism: &AuthenticationMechanism,
    ) -> Option<&AuthenticationMechanismConfiguration> {
        self.mechanisms.get(mechanism)
    }

    /// Mechanism realised by `configuration_type`, if accepted
    pub fn authentication_mechanism_for(
        &self,
        configuration_type: &AuthenticationConfigurationType,
    ) -> Option<&AuthenticationMechanism> {
        self.mechanisms.mechanism_for(configuration_type)
    }

    /// Accepted mechanisms, in declaration order
    pub fn authentication_mechanisms(&self) -> Vec<AuthenticationMechanism> {
        self.mechanisms.mechanisms()
    }

    /// Accepted configuration types, in declaration order
    pub fn authentication_configuration_types(&self) -> Vec<AuthenticationConfigurationType> {
        self.mechanisms.configuration_types()
    }
}

/// Builder for [`StoreSupport`]
#[derive(Default)]
pub struct StoreSupportBuilder {
    identifier: Option<String>,
    configurations: Vec<AuthenticationMechanismConfiguration>,
}

impl StoreSupportBuilder {
    /// Set the identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Accept a mechanism
    pub fn with_authentication_mechanism_configuration(
        mut self,
        configuration: AuthenticationMechanismConfiguration,
    ) -> Self {
        self.configurations.push(configuration);
        self
    }

    /// Accept several mechanisms
    pub fn with_authentication_mechanism_configurations(
        mut self,
        configurations: impl IntoIterator<Item = AuthenticationMechanismConfiguration>,
    ) -> Self {
        self.configurations.extend(configurations);
        self
    }

    /// Fails on a missing identifier, a duplicated mechanism, a mechanism
    /// without configuration types, or a configuration type shared by two
    /// mechanisms
    pub fn build(self) -> Result<StoreSupport> {
        let identifier = self
            .identifier
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| {
                ConnectionError::invalid_configuration("Store support identifier is required")
            })?;
        let mechanisms = MechanismIndex::build(&identifier, self.configurations)?;
        Ok(StoreSupport {
            identifier,
            mechanisms,
        })
    }
}

/// One concrete, addressable store endpoint
#[derive(Debug, Clone)]
pub struct StoreInstance {
    identifier: String,
    store_support: Arc<StoreSupport>,
    mechanisms: MechanismIndex,
    connection_specification: Arc<dyn ConnectionSpecification>,
}

impl StoreInstance {
    /// Start building a store instance whose store support is looked up in
    /// `environment`
    pub fn builder(environment: &EnvironmentConfiguration) -> StoreInstanceBuilder<'_> {
        StoreInstanceBuilder {
            environment,
            identifier: None,
            store_support_identifier: None,
            configuration_types: vec![],
            connection_specification: None,
        }
    }

    /// Unique store identifier
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Store support the instance belongs to
    pub fn store_support(&self) -> &Arc<StoreSupport> {
        &self.store_support
    }

    /// Network target description
    pub fn connection_specification(&self) -> &Arc<dyn ConnectionSpecification> {
        &self.connection_specification
    }

    /// Permitted mechanism configurations, restricted to the permitted
    /// configuration types
    pub fn authentication_mechanism_configurations(&self) -> &[AuthenticationMechanismConfiguration] {
        &self.mechanisms.configurations
    }

    /// Permitted configuration of `mechanism`
    pub fn authentication_mechanism_configuration(
        &self,
        mechanism: &AuthenticationMechanism,
    ) -> Option<&AuthenticationMechanismConfiguration> {
        self.mechanisms.get(mechanism)
    }

    /// Mechanism realised by `configuration_type`, if permitted
    pub fn authentication_mechanism_for(
        &self,
        configuration_type: &AuthenticationConfigurationType,
    ) -> Option<&AuthenticationMechanism> {
        self.mechanisms.mechanism_for(configuration_type)
    }

    /// Permitted mechanisms, in declaration order
    pub fn authentication_mechanisms(&self) -> Vec<AuthenticationMechanism> {
        self.mechanisms.mechanisms()
    }

    /// Permitted configuration types, in declaration order
    pub fn authentication_configuration_types(&self) -> Vec<AuthenticationConfigurationType> {
        self.mechanisms.configuration_types()
    }

    /// Whether `configuration_type` is permitted for this store
    pub fn accepts(&self, configuration_type: &AuthenticationConfigurationType) -> bool {
        self.mechanisms.mechanism_for(configuration_type).is_some()
    }
}

/// Builder for [`StoreInstance`]
pub struct StoreInstanceBuilder<'a> {
    environment: &'a EnvironmentConfiguration,
    identifier: Option<String>,
    store_support_identifier: Option<String>,
    configuration_types: Vec<AuthenticationConfigurationType>,
    connection_specification: Option<Arc<dyn ConnectionSpecification>>,
}

impl StoreInstanceBuilder<'_> {
    /// Set the identifier
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    /// Reference a store support registered in the environment
    pub fn with_store_support_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.store_support_identifier = Some(identifier.into());
        self
    }

    /// Restrict the store to these configuration types; when none are given
    /// every type of the store support is permitted
    pub fn with_authentication_configuration_types<I, T>(mut self, configuration_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AuthenticationConfigurationType>,
    {
        for configuration_type in configuration_types {
            let configuration_type = configuration_type.into();
            if !self.configuration_types.contains(&configuration_type) {
                self.configuration_types.push(configuration_type);
            }
        }
        self
    }

    /// Set the connection specification
    pub fn with_connection_specification(
        mut self,
        connection_specification: impl ConnectionSpecification,
    ) -> Self {
        self.connection_specification = Some(Arc::new(connection_specification));
        self
    }

    /// Set an already shared connection specification
    pub fn with_shared_connection_specification(
        mut self,
        connection_specification: Arc<dyn ConnectionSpecification>,
    ) -> Self {
        self.connection_specification = Some(connection_specification);
        self
    }

    /// Fails when the store support is unknown or when a listed
    /// configuration type is not declared by it
    pub fn build(self) -> Result<StoreInstance> {
        let identifier = self
            .identifier
            .filter(|identifier| !identifier.is_empty())
            .ok_or_else(|| {
                ConnectionError::invalid_configuration("Store instance identifier is required")
            })?;
        let store_support_identifier = self.store_support_identifier.ok_or_else(|| {
            ConnectionError::invalid_configuration(format!(
                "Store support identifier is required for store instance '{identifier}'"
            ))
        })?;
        let connection_specification = self.connection_specification.ok_or_else(|| {
            ConnectionError::invalid_configuration(format!(
                "Connection specification is required for store instance '{identifier}'"
            ))
        })?;
        let store_support = self.environment.store_support(&store_support_identifier)?;

        let supported = store_support.authentication_configuration_types();
        let unsupported: Vec<_> = self
            .configuration_types
            .iter()
            .filter(|configuration_type| !supported.contains(configuration_type))
            .map(|configuration_type| configuration_type.to_string())
            .collect();
        if !unsupported.is_empty() {
            return Err(ConnectionError::registration_conflict(format!(
                "Authentication configuration type(s) not supported by store support '{}' of store instance '{identifier}': {}",
                store_support.identifier(),
                unsupported.join(", ")
            )));
        }

        let configurations = if self.configuration_types.is_empty() {
            store_support.authentication_mechanism_configurations().to_vec()
        } else {
            store_support
                .authentication_mechanism_configurations()
                .iter()
                .filter_map(|configuration| configuration.restricted_to(&self.configuration_types))
                .collect()
        };
        let mechanisms = MechanismIndex::build(&identifier, configurations)?;

        Ok(StoreInstance {
            identifier,
            store_support,
            mechanisms,
            connection_specification,
        })
    }
}
