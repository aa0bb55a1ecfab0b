//! Shared fixtures for the integration tests
//!
//! Credentials, configurations and builders are generic over their type tag,
//! so one struct covers every `Credential_*`, `AuthenticationConfiguration_*`
//! and builder variant a test needs.

#![allow(dead_code)]

use async_trait::async_trait;
use keyway_connection::{
    AuthenticationConfiguration, AuthenticationConfigurationType,
    AuthenticationMechanismConfiguration, Authenticator, Connection, ConnectionBuilder,
    ConnectionFactory, ConnectionSpecification, ConnectionSpecificationType, Credential,
    CredentialBuilder, CredentialType, EnvironmentConfiguration, Identity, StoreInstance,
    StoreSupport,
};
use std::sync::Arc;

pub const CREDENTIAL_A: CredentialType = CredentialType::new("Credential_A");
pub const CREDENTIAL_B: CredentialType = CredentialType::new("Credential_B");
pub const CREDENTIAL_C: CredentialType = CredentialType::new("Credential_C");

pub const CONFIG_X: AuthenticationConfigurationType =
    AuthenticationConfigurationType::new("AuthenticationConfiguration_X");
pub const CONFIG_Y: AuthenticationConfigurationType =
    AuthenticationConfigurationType::new("AuthenticationConfiguration_Y");
pub const CONFIG_Z: AuthenticationConfigurationType =
    AuthenticationConfigurationType::new("AuthenticationConfiguration_Z");

pub const TEST_SPECIFICATION: ConnectionSpecificationType =
    ConnectionSpecificationType::new("TestConnectionSpecification");

pub const TEST_STORE_SUPPORT: &str = "Test";

/// Credential carrying only its type tag
#[derive(Debug, Clone)]
pub struct TestCredential(pub CredentialType);

impl Credential for TestCredential {
    fn credential_type(&self) -> CredentialType {
        self.0.clone()
    }
}

#[derive(Debug, Clone)]
pub struct TestConfiguration(pub AuthenticationConfigurationType);

impl AuthenticationConfiguration for TestConfiguration {
    fn configuration_type(&self) -> AuthenticationConfigurationType {
        self.0.clone()
    }
}

pub fn configuration(
    configuration_type: AuthenticationConfigurationType,
) -> Arc<dyn AuthenticationConfiguration> {
    Arc::new(TestConfiguration(configuration_type))
}

#[derive(Debug, Clone)]
pub struct TestConnectionSpecification(pub ConnectionSpecificationType);

impl ConnectionSpecification for TestConnectionSpecification {
    fn specification_type(&self) -> ConnectionSpecificationType {
        self.0.clone()
    }
}

/// `input -> output` for one configuration type
pub struct TestCredentialBuilder {
    configuration_type: AuthenticationConfigurationType,
    input: CredentialType,
    output: CredentialType,
}

pub fn credential_builder(
    configuration_type: AuthenticationConfigurationType,
    input: CredentialType,
    output: CredentialType,
) -> Arc<dyn CredentialBuilder> {
    Arc::new(TestCredentialBuilder {
        configuration_type,
        input,
        output,
    })
}

#[async_trait]
impl CredentialBuilder for TestCredentialBuilder {
    fn authentication_configuration_type(&self) -> AuthenticationConfigurationType {
        self.configuration_type.clone()
    }

    fn input_credential_type(&self) -> CredentialType {
        self.input.clone()
    }

    fn output_credential_type(&self) -> CredentialType {
        self.output.clone()
    }

    async fn make_credential(
        &self,
        _identity: &Identity,
        _configuration: &dyn AuthenticationConfiguration,
        credential: Option<Arc<dyn Credential>>,
        _environment: &EnvironmentConfiguration,
    ) -> anyhow::Result<Arc<dyn Credential>> {
        if !self.input.is_any() {
            let credential = credential.ok_or_else(|| anyhow::anyhow!("missing input credential"))?;
            anyhow::ensure!(
                credential.credential_type() == self.input,
                "expected {}, got {}",
                self.input,
                credential.credential_type()
            );
        }
        Ok(Arc::new(TestCredential(self.output.clone())))
    }
}

/// Connection builder for [`TEST_SPECIFICATION`]; the connection is a
/// `String` naming the credential type it received
pub struct TestConnectionBuilder {
    credential_type: CredentialType,
}

pub fn connection_builder(credential_type: CredentialType) -> Arc<dyn ConnectionBuilder> {
    Arc::new(TestConnectionBuilder { credential_type })
}

#[async_trait]
impl ConnectionBuilder for TestConnectionBuilder {
    fn connection_specification_type(&self) -> ConnectionSpecificationType {
        TEST_SPECIFICATION
    }

    fn credential_type(&self) -> CredentialType {
        self.credential_type.clone()
    }

    async fn get_connection(
        &self,
        _specification: &dyn ConnectionSpecification,
        credential: Arc<dyn Credential>,
        _identity: &Identity,
    ) -> anyhow::Result<Connection> {
        Ok(Box::new(format!("connection:{}", credential.credential_type())))
    }
}

pub fn mechanism(
    name: &'static str,
    configuration_type: AuthenticationConfigurationType,
) -> AuthenticationMechanismConfiguration {
    AuthenticationMechanismConfiguration::builder(name)
        .with_configuration_type(configuration_type)
        .build()
}

/// Factory over a single `Test` store support
pub struct TestEnv {
    pub factory: ConnectionFactory,
}

impl TestEnv {
    pub fn create(
        credential_builders: Vec<Arc<dyn CredentialBuilder>>,
        connection_builders: Vec<Arc<dyn ConnectionBuilder>>,
        mechanisms: Vec<AuthenticationMechanismConfiguration>,
    ) -> Self {
        keyway_connection::logging::init_tracing("keyway_connection=debug");
        let environment = EnvironmentConfiguration::builder()
            .with_store_support(
                StoreSupport::builder()
                    .with_identifier(TEST_STORE_SUPPORT)
                    .with_authentication_mechanism_configurations(mechanisms)
                    .build()
                    .expect("valid store support"),
            )
            .build()
            .expect("valid environment");
        let factory = ConnectionFactory::builder(environment)
            .with_credential_builders(credential_builders)
            .with_connection_builders(connection_builders)
            .build()
            .expect("valid factory");
        Self { factory }
    }

    /// Unregistered store instance of the `Test` store support
    pub fn new_store(
        &self,
        identifier: &str,
        configuration_types: Vec<AuthenticationConfigurationType>,
    ) -> StoreInstance {
        StoreInstance::builder(self.factory.environment())
            .with_identifier(identifier)
            .with_store_support_identifier(TEST_STORE_SUPPORT)
            .with_authentication_configuration_types(configuration_types)
            .with_connection_specification(TestConnectionSpecification(TEST_SPECIFICATION))
            .build()
            .expect("valid store instance")
    }
}

pub fn identity_with(credential_types: &[CredentialType]) -> Identity {
    credential_types
        .iter()
        .fold(Identity::new("test"), |identity, credential_type| {
            identity.with_credential(TestCredential(credential_type.clone()))
        })
}

/// Check source type, chain and connection builder, then run the flow
pub async fn assert_authenticator(
    identity: &Identity,
    factory: &ConnectionFactory,
    authenticator: &Authenticator,
    source_credential_type: &CredentialType,
    credential_builders: &[&str],
    connection_credential_type: &CredentialType,
) {
    assert_eq!(authenticator.source_credential_type(), source_credential_type);
    assert_eq!(authenticator.describe_flow(), credential_builders);
    assert_eq!(
        &authenticator.connection_builder().credential_type(),
        connection_credential_type
    );

    let connection = factory
        .get_connection_with_authenticator(identity, authenticator)
        .await
        .expect("connection");
    assert_eq!(
        connection.downcast_ref::<String>().map(String::as_str),
        Some(format!("connection:{connection_credential_type}").as_str())
    );
}
