//! Fixtures shared by the unit tests

use crate::builders::{Connection, ConnectionBuilder, CredentialBuilder};
use crate::environment::EnvironmentConfiguration;
use crate::identity::Identity;
use crate::mechanism::AuthenticationMechanismConfiguration;
use crate::protocol::{AuthenticationConfiguration, ConnectionSpecification, Credential};
use crate::store::{StoreInstance, StoreSupport};
use crate::types::{AuthenticationConfigurationType, ConnectionSpecificationType, CredentialType};
use async_trait::async_trait;
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
pub const OTHER_SPECIFICATION: ConnectionSpecificationType =
    ConnectionSpecificationType::new("OtherConnectionSpecification");

pub const TEST_STORE_SUPPORT: &str = "Test";

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

#[derive(Debug, Clone)]
pub struct TestSpecification(pub ConnectionSpecificationType);

impl ConnectionSpecification for TestSpecification {
    fn specification_type(&self) -> ConnectionSpecificationType {
        self.0.clone()
    }
}

pub fn configuration(
    configuration_type: AuthenticationConfigurationType,
) -> Arc<dyn AuthenticationConfiguration> {
    Arc::new(TestConfiguration(configuration_type))
}

/// Emits a [`TestCredential`] of the output type, checking that it received
/// the input it declared
pub struct TestCredentialBuilder {
    pub configuration_type: AuthenticationConfigurationType,
    pub input: CredentialType,
    pub output: CredentialType,
}

impl TestCredentialBuilder {
    pub fn shared(
        configuration_type: AuthenticationConfigurationType,
        input: CredentialType,
        output: CredentialType,
    ) -> Arc<dyn CredentialBuilder> {
        Arc::new(Self {
            configuration_type,
            input,
            output,
        })
    }
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
        configuration: &dyn AuthenticationConfiguration,
        credential: Option<Arc<dyn Credential>>,
        _environment: &EnvironmentConfiguration,
    ) -> anyhow::Result<Arc<dyn Credential>> {
        anyhow::ensure!(
            configuration.configuration_type() == self.configuration_type,
            "unexpected configuration {}",
            configuration.configuration_type()
        );
        match (&credential, self.input.is_any()) {
            (None, true) => {}
            (Some(credential), false) if credential.credential_type() == self.input => {}
            _ => anyhow::bail!("unexpected input credential {credential:?}"),
        }
        Ok(Arc::new(TestCredential(self.output.clone())))
    }
}

/// Always fails with the given message
pub struct FailingCredentialBuilder {
    pub input: CredentialType,
    pub output: CredentialType,
    pub message: &'static str,
}

#[async_trait]
impl CredentialBuilder for FailingCredentialBuilder {
    fn authentication_configuration_type(&self) -> AuthenticationConfigurationType {
        CONFIG_X
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
        _credential: Option<Arc<dyn Credential>>,
        _environment: &EnvironmentConfiguration,
    ) -> anyhow::Result<Arc<dyn Credential>> {
        Err(anyhow::anyhow!(self.message))
    }
}

/// Produces a `String` connection naming the credential it was given
pub struct TestConnectionBuilder {
    pub specification_type: ConnectionSpecificationType,
    pub credential_type: CredentialType,
}

impl TestConnectionBuilder {
    pub fn shared(credential_type: CredentialType) -> Arc<dyn ConnectionBuilder> {
        Arc::new(Self {
            specification_type: TEST_SPECIFICATION,
            credential_type,
        })
    }
}

#[async_trait]
impl ConnectionBuilder for TestConnectionBuilder {
    fn connection_specification_type(&self) -> ConnectionSpecificationType {
        self.specification_type.clone()
    }

    fn credential_type(&self) -> CredentialType {
        self.credential_type.clone()
    }

    async fn get_connection(
        &self,
        specification: &dyn ConnectionSpecification,
        credential: Arc<dyn Credential>,
        _identity: &Identity,
    ) -> anyhow::Result<Connection> {
        anyhow::ensure!(
            credential.credential_type() == self.credential_type,
            "unexpected credential {}",
            credential.credential_type()
        );
        Ok(Box::new(format!(
            "{}:{}",
            specification.specification_type(),
            credential.credential_type()
        )))
    }
}

/// Mechanism `X`, `Y`, `Z` realised by configuration type `X`, `Y`, `Z`
pub fn mechanism(
    name: &'static str,
    configuration_type: AuthenticationConfigurationType,
) -> AuthenticationMechanismConfiguration {
    AuthenticationMechanismConfiguration::builder(name)
        .with_configuration_type(configuration_type)
        .build()
}

pub fn test_store_support(mechanisms: Vec<AuthenticationMechanismConfiguration>) -> StoreSupport {
    StoreSupport::builder()
        .with_identifier(TEST_STORE_SUPPORT)
        .with_authentication_mechanism_configurations(mechanisms)
        .build()
        .expect("valid store support")
}

pub fn test_environment() -> EnvironmentConfiguration {
    EnvironmentConfiguration::builder()
        .with_store_support(test_store_support(vec![
            mechanism("X", CONFIG_X),
            mechanism("Y", CONFIG_Y),
            mechanism("Z", CONFIG_Z),
        ]))
        .build()
        .expect("valid environment")
}

pub fn test_store(
    environment: &EnvironmentConfiguration,
    identifier: &str,
    configuration_types: Vec<AuthenticationConfigurationType>,
) -> StoreInstance {
    StoreInstance::builder(environment)
        .with_identifier(identifier)
        .with_store_support_identifier(TEST_STORE_SUPPORT)
        .with_authentication_configuration_types(configuration_types)
        .with_connection_specification(TestSpecification(TEST_SPECIFICATION))
        .build()
        .expect("valid store instance")
}
