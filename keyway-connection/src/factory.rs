//! Connection factory: builder registries, flow resolution and execution
//!
//! The factory is assembled once through [`ConnectionFactoryBuilder`] and is
//! read-only afterwards, apart from [`ConnectionFactory::register_store_instance`]
//! which needs exclusive access. Share a built factory as
//! `Arc<ConnectionFactory>`.

use crate::authenticator::Authenticator;
use crate::builders::{
    Connection, ConnectionBuilder, ConnectionBuilderKey, ConnectionManager, CredentialBuilder,
    CredentialBuilderKey,
};
use crate::environment::EnvironmentConfiguration;
use crate::error::{ConnectionError, Result};
use crate::identity::Identity;
use crate::mechanism::AuthenticationMechanismConfiguration;
use crate::protocol::AuthenticationConfiguration;
use crate::resolver::AuthenticationFlowResolver;
use crate::store::StoreInstance;
use crate::types::{AuthenticationConfigurationType, AuthenticationMechanism};
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span, info};

/// Store instance given either by identifier or directly
#[derive(Debug, Clone)]
pub enum StoreRef<'a> {
    /// Identifier of a registered store instance
    Identifier(&'a str),
    /// Store instance used as is, registered or not
    Instance(Arc<StoreInstance>),
}

impl<'a> From<&'a str> for StoreRef<'a> {
    fn from(identifier: &'a str) -> Self {
        StoreRef::Identifier(identifier)
    }
}

impl<'a> From<&'a String> for StoreRef<'a> {
    fn from(identifier: &'a String) -> Self {
        StoreRef::Identifier(identifier)
    }
}

impl From<Arc<StoreInstance>> for StoreRef<'_> {
    fn from(store_instance: Arc<StoreInstance>) -> Self {
        StoreRef::Instance(store_instance)
    }
}

impl From<&Arc<StoreInstance>> for StoreRef<'_> {
    fn from(store_instance: &Arc<StoreInstance>) -> Self {
        StoreRef::Instance(Arc::clone(store_instance))
    }
}

impl From<StoreInstance> for StoreRef<'_> {
    fn from(store_instance: StoreInstance) -> Self {
        StoreRef::Instance(Arc::new(store_instance))
    }
}

impl From<&StoreInstance> for StoreRef<'_> {
    fn from(store_instance: &StoreInstance) -> Self {
        StoreRef::Instance(Arc::new(store_instance.clone()))
    }
}

/// Façade owning the builder and store registries
pub struct ConnectionFactory {
    environment: Arc<EnvironmentConfiguration>,
    credential_builders: Vec<Arc<dyn CredentialBuilder>>,
    credential_builder_index: HashMap<CredentialBuilderKey, usize>,
    connection_builders: Vec<Arc<dyn ConnectionBuilder>>,
    connection_builder_index: HashMap<ConnectionBuilderKey, usize>,
    store_instances: Vec<Arc<StoreInstance>>,
    store_instance_index: HashMap<String, usize>,
}

impl ConnectionFactory {
    /// Start building a factory over `environment`
    pub fn builder(environment: impl Into<Arc<EnvironmentConfiguration>>) -> ConnectionFactoryBuilder {
        ConnectionFactoryBuilder {
            environment: environment.into(),
            credential_builders: vec![],
            connection_builders: vec![],
            store_instances: vec![],
        }
    }

    /// Environment shared with every builder
    pub fn environment(&self) -> &Arc<EnvironmentConfiguration> {
        &self.environment
    }

    /// Registered credential builders, in registration order
    pub fn credential_builders(&self) -> &[Arc<dyn CredentialBuilder>] {
        &self.credential_builders
    }

    /// Credential builder registered under `key`
    pub fn credential_builder(&self, key: &CredentialBuilderKey) -> Option<&Arc<dyn CredentialBuilder>> {
        self.credential_builder_index
            .get(key)
            .map(|position| &self.credential_builders[*position])
    }

    /// Registered connection builders, in registration order
    pub fn connection_builders(&self) -> &[Arc<dyn ConnectionBuilder>] {
        &self.connection_builders
    }

    /// Connection builder registered under `key`
    pub fn connection_builder(&self, key: &ConnectionBuilderKey) -> Option<&Arc<dyn ConnectionBuilder>> {
        self.connection_builder_index
            .get(key)
            .map(|position| &self.connection_builders[*position])
    }

    /// Registered store instance by identifier
    pub fn store_instance(&self, identifier: &str) -> Result<Arc<StoreInstance>> {
        self.store_instance_index
            .get(identifier)
            .map(|position| Arc::clone(&self.store_instances[*position]))
            .ok_or_else(|| ConnectionError::StoreInstanceNotFound {
                identifier: identifier.to_string(),
            })
    }

    /// Registered store instances, in registration order
    pub fn store_instances(&self) -> &[Arc<StoreInstance>] {
        &self.store_instances
    }

    /// Register a store instance after the factory was built
    pub fn register_store_instance(&mut self, store_instance: StoreInstance) -> Result<()> {
        register_store_instance(
            &mut self.store_instances,
            &mut self.store_instance_index,
            store_instance,
        )
    }

    /// Resolve the authentication flow for an explicit authentication
    /// configuration
    ///
    /// Fails when the store does not accept the configuration type, or when
    /// no chain of builders connects the identity to the store's connection
    /// specification.
    pub fn get_authenticator<'a>(
        &self,
        identity: &Identity,
        store: impl Into<StoreRef<'a>>,
        authentication_configuration: Arc<dyn AuthenticationConfiguration>,
    ) -> Result<Authenticator> {
        let store_instance = self.resolve_store(store.into())?;
        let configuration_type = authentication_configuration.configuration_type();
        let mechanism = store_instance
            .authentication_mechanism_for(&configuration_type)
            .cloned()
            .ok_or_else(|| ConnectionError::UnsupportedAuthenticationConfiguration {
                store: store_instance.identifier().to_string(),
                configuration_type: configuration_type.clone(),
                supported: store_instance.authentication_configuration_types(),
            })?;

        self.resolve_flow(identity, &store_instance, mechanism, authentication_configuration)?
            .ok_or_else(|| unresolvable_flow(&store_instance, configuration_type))
    }

    /// Resolve the authentication flow for a mechanism, using the
    /// mechanism's default configuration
    pub fn get_authenticator_for_mechanism<'a>(
        &self,
        identity: &Identity,
        store: impl Into<StoreRef<'a>>,
        mechanism: &AuthenticationMechanism,
    ) -> Result<Authenticator> {
        let store_instance = self.resolve_store(store.into())?;
        let mechanism_configuration = store_instance
            .authentication_mechanism_configuration(mechanism)
            .ok_or_else(|| ConnectionError::UnsupportedAuthenticationMechanism {
                store: store_instance.identifier().to_string(),
                mechanism: mechanism.clone(),
                supported: store_instance.authentication_mechanisms(),
            })?;
        let authentication_configuration = self
            .default_configuration(mechanism_configuration)
            .ok_or_else(|| ConnectionError::NoDefaultAuthenticationConfiguration {
                store: store_instance.identifier().to_string(),
                mechanism: mechanism.clone(),
                supported: mechanism_configuration.configuration_types().to_vec(),
            })?;
        let configuration_type = authentication_configuration.configuration_type();
        if !mechanism_configuration.accepts(&configuration_type) {
            return Err(ConnectionError::invalid_configuration(format!(
                "Default configuration of authentication mechanism '{mechanism}' has type '{configuration_type}', which does not realise that mechanism"
            )));
        }

        self.resolve_flow(
            identity,
            &store_instance,
            mechanism.clone(),
            authentication_configuration,
        )?
        .ok_or_else(|| unresolvable_flow(&store_instance, configuration_type))
    }

    /// Resolve the first flow that works with the default configuration of
    /// one of the store's mechanisms, tried in declaration order
    pub fn get_default_authenticator<'a>(
        &self,
        identity: &Identity,
        store: impl Into<StoreRef<'a>>,
    ) -> Result<Authenticator> {
        let store_instance = self.resolve_store(store.into())?;
        for mechanism_configuration in store_instance.authentication_mechanism_configurations() {
            let Some(authentication_configuration) = self.default_configuration(mechanism_configuration)
            else {
                continue;
            };
            if !mechanism_configuration.accepts(&authentication_configuration.configuration_type()) {
                debug!(
                    mechanism = %mechanism_configuration.mechanism(),
                    configuration_type = %authentication_configuration.configuration_type(),
                    "Skipping default configuration not realising its mechanism"
                );
                continue;
            }
            if let Some(authenticator) = self.resolve_flow(
                identity,
                &store_instance,
                mechanism_configuration.mechanism().clone(),
                authentication_configuration,
            )? {
                return Ok(authenticator);
            }
        }

        Err(ConnectionError::NoFlowForStore {
            store: store_instance.identifier().to_string(),
            supported: store_instance
                .authentication_mechanism_configurations()
                .iter()
                .flat_map(|configuration| {
                    configuration
                        .configuration_types()
                        .iter()
                        .map(|configuration_type| {
                            (configuration_type.clone(), configuration.mechanism().clone())
                        })
                })
                .collect(),
        })
    }

    /// Resolve a flow and build a connection from it
    pub async fn get_connection<'a>(
        &self,
        identity: &Identity,
        store: impl Into<StoreRef<'a>>,
        authentication_configuration: Arc<dyn AuthenticationConfiguration>,
    ) -> Result<Connection> {
        let authenticator = self.get_authenticator(identity, store, authentication_configuration)?;
        self.get_connection_with_authenticator(identity, &authenticator)
            .await
    }

    /// Build a connection using the store's default configurations
    pub async fn get_default_connection<'a>(
        &self,
        identity: &Identity,
        store: impl Into<StoreRef<'a>>,
    ) -> Result<Connection> {
        let authenticator = self.get_default_authenticator(identity, store)?;
        self.get_connection_with_authenticator(identity, &authenticator)
            .await
    }

    /// Resolve a flow, build a connection and downcast it to `T`
    pub async fn get_connection_as<'a, T: Any + Send>(
        &self,
        identity: &Identity,
        store: impl Into<StoreRef<'a>>,
        authentication_configuration: Arc<dyn AuthenticationConfiguration>,
    ) -> Result<T> {
        let connection = self
            .get_connection(identity, store, authentication_configuration)
            .await?;
        connection
            .downcast::<T>()
            .map(|connection| *connection)
            .map_err(|_| ConnectionError::ConnectionTypeMismatch {
                expected: std::any::type_name::<T>(),
            })
    }

    /// Run a previously resolved authenticator and build the connection
    ///
    /// The connection builder is looked up from the credential actually
    /// produced by the chain.
    pub async fn get_connection_with_authenticator(
        &self,
        identity: &Identity,
        authenticator: &Authenticator,
    ) -> Result<Connection> {
        let credential = authenticator
            .make_credential(identity, &self.environment)
            .await?;
        let specification = authenticator.store_instance().connection_specification();
        let key = ConnectionBuilderKey {
            specification_type: specification.specification_type(),
            credential_type: credential.credential_type(),
        };
        let builder = self.connection_builder(&key).cloned().ok_or_else(|| {
            ConnectionError::NoCompatibleConnectionBuilder {
                specification_type: key.specification_type.clone(),
                credential_type: key.credential_type.clone(),
            }
        })?;

        let span = debug_span!(
            "get_connection",
            flow_id = %authenticator.flow_id(),
            store = authenticator.store_instance().identifier(),
            builder = %key,
        );
        let connection = builder
            .get_connection(specification.as_ref(), credential, identity)
            .instrument(span)
            .await?;
        debug!(
            flow_id = %authenticator.flow_id(),
            store = authenticator.store_instance().identifier(),
            "Connection established"
        );
        Ok(connection)
    }

    fn resolve_store(&self, store: StoreRef<'_>) -> Result<Arc<StoreInstance>> {
        match store {
            StoreRef::Identifier(identifier) => self.store_instance(identifier),
            StoreRef::Instance(store_instance) => Ok(store_instance),
        }
    }

    /// Store-level generator first, then the environment-level declaration
    /// of the same mechanism
    fn default_configuration(
        &self,
        mechanism_configuration: &AuthenticationMechanismConfiguration,
    ) -> Option<Arc<dyn AuthenticationConfiguration>> {
        mechanism_configuration
            .generate_default_configuration()
            .or_else(|| {
                self.environment
                    .authentication_mechanism_configuration(mechanism_configuration.mechanism())
                    .and_then(AuthenticationMechanismConfiguration::generate_default_configuration)
            })
    }

    fn resolve_flow(
        &self,
        identity: &Identity,
        store_instance: &Arc<StoreInstance>,
        mechanism: AuthenticationMechanism,
        authentication_configuration: Arc<dyn AuthenticationConfiguration>,
    ) -> Result<Option<Authenticator>> {
        let configuration_type = authentication_configuration.configuration_type();
        let specification_type = store_instance.connection_specification().specification_type();
        let span = debug_span!(
            "resolve_flow",
            store = store_instance.identifier(),
            configuration_type = %configuration_type,
            specification_type = %specification_type,
        );
        let _entered = span.enter();

        let resolver =
            AuthenticationFlowResolver::new(&self.credential_builders, &self.connection_builders);
        let Some(flow) = resolver.resolve(identity, &configuration_type, &specification_type)? else {
            return Ok(None);
        };

        let key = ConnectionBuilderKey {
            specification_type,
            credential_type: flow.target_credential_type.clone(),
        };
        let connection_builder = self.connection_builder(&key).cloned().ok_or_else(|| {
            ConnectionError::NoCompatibleConnectionBuilder {
                specification_type: key.specification_type.clone(),
                credential_type: key.credential_type.clone(),
            }
        })?;

        Ok(Some(Authenticator::new(
            Arc::clone(store_instance),
            mechanism,
            authentication_configuration,
            flow,
            connection_builder,
        )))
    }
}

impl std::fmt::Debug for ConnectionFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionFactory")
            .field("environment", &self.environment)
            .field(
                "credential_builders",
                &self
                    .credential_builders
                    .iter()
                    .map(|builder| builder.key().to_string())
                    .collect::<Vec<_>>(),
            )
            .field(
                "connection_builders",
                &self
                    .connection_builders
                    .iter()
                    .map(|builder| builder.key().to_string())
                    .collect::<Vec<_>>(),
            )
            .field(
                "store_instances",
                &self
                    .store_instances
                    .iter()
                    .map(|store_instance| store_instance.identifier())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Builder for [`ConnectionFactory`]
///
/// Registration order matters: when several chains of equal length exist,
/// the one using the earlier-registered builders is chosen.
pub struct ConnectionFactoryBuilder {
    environment: Arc<EnvironmentConfiguration>,
    credential_builders: Vec<Arc<dyn CredentialBuilder>>,
    connection_builders: Vec<Arc<dyn ConnectionBuilder>>,
    store_instances: Vec<StoreInstance>,
}

impl ConnectionFactoryBuilder {
    /// Register a credential builder
    pub fn with_credential_builder(mut self, builder: impl CredentialBuilder + 'static) -> Self {
        self.credential_builders.push(Arc::new(builder));
        self
    }

    /// Register several already shared credential builders
    pub fn with_credential_builders(
        mut self,
        builders: impl IntoIterator<Item = Arc<dyn CredentialBuilder>>,
    ) -> Self {
        self.credential_builders.extend(builders);
        self
    }

    /// Register a connection builder
    pub fn with_connection_builder(mut self, builder: impl ConnectionBuilder + 'static) -> Self {
        self.connection_builders.push(Arc::new(builder));
        self
    }

    /// Register several already shared connection builders
    pub fn with_connection_builders(
        mut self,
        builders: impl IntoIterator<Item = Arc<dyn ConnectionBuilder>>,
    ) -> Self {
        self.connection_builders.extend(builders);
        self
    }

    /// Register a store instance
    pub fn with_store_instance(mut self, store_instance: StoreInstance) -> Self {
        self.store_instances.push(store_instance);
        self
    }

    /// Register several store instances
    pub fn with_store_instances(mut self, store_instances: impl IntoIterator<Item = StoreInstance>) -> Self {
        self.store_instances.extend(store_instances);
        self
    }

    /// Index every registration and initialise connection managers
    ///
    /// Duplicate keys are rejected rather than overwritten. A connection
    /// manager shared by several connection builders is initialised once.
    pub fn build(self) -> Result<ConnectionFactory> {
        let mut credential_builder_index = HashMap::new();
        for (position, builder) in self.credential_builders.iter().enumerate() {
            let key = builder.key();
            if credential_builder_index.contains_key(&key) {
                return Err(ConnectionError::registration_conflict(format!(
                    "Found multiple credential builders for key '{key}'"
                )));
            }
            credential_builder_index.insert(key, position);
        }

        let mut connection_builder_index = HashMap::new();
        for (position, builder) in self.connection_builders.iter().enumerate() {
            let key = builder.key();
            if connection_builder_index.contains_key(&key) {
                return Err(ConnectionError::registration_conflict(format!(
                    "Found multiple connection builders for key '{key}'"
                )));
            }
            connection_builder_index.insert(key, position);
        }

        let mut store_instances = vec![];
        let mut store_instance_index = HashMap::new();
        for store_instance in self.store_instances {
            register_store_instance(&mut store_instances, &mut store_instance_index, store_instance)?;
        }

        let mut managers: Vec<Arc<dyn ConnectionManager>> = vec![];
        for manager in self
            .connection_builders
            .iter()
            .filter_map(|builder| builder.connection_manager())
        {
            if managers
                .iter()
                .any(|known| std::ptr::addr_eq(Arc::as_ptr(known), Arc::as_ptr(&manager)))
            {
                continue;
            }
            manager.initialize(&self.environment)?;
            managers.push(manager);
        }

        info!(
            credential_builders = self.credential_builders.len(),
            connection_builders = self.connection_builders.len(),
            store_instances = store_instances.len(),
            connection_managers = managers.len(),
            "Connection factory ready"
        );

        Ok(ConnectionFactory {
            environment: self.environment,
            credential_builders: self.credential_builders,
            credential_builder_index,
            connection_builders: self.connection_builders,
            connection_builder_index,
            store_instances,
            store_instance_index,
        })
    }
}

fn unresolvable_flow(
    store_instance: &StoreInstance,
    configuration_type: AuthenticationConfigurationType,
) -> ConnectionError {
    ConnectionError::UnresolvableFlow {
        store: store_instance.identifier().to_string(),
        configuration_type,
        specification_type: store_instance.connection_specification().specification_type(),
    }
}

fn register_store_instance(
    store_instances: &mut Vec<Arc<StoreInstance>>,
    index: &mut HashMap<String, usize>,
    store_instance: StoreInstance,
) -> Result<()> {
    if index.contains_key(store_instance.identifier()) {
        return Err(ConnectionError::registration_conflict(format!(
            "Found multiple store instances with identifier '{}'",
            store_instance.identifier()
        )));
    }
    index.insert(store_instance.identifier().to_string(), store_instances.len());
    store_instances.push(Arc::new(store_instance));
    Ok(())
}
