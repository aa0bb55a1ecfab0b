//! Pairwise credential and connection builder contracts
//!
//! A [`CredentialBuilder`] turns one credential type into another for one
//! authentication configuration type. A [`ConnectionBuilder`] turns a
//! credential into a live connection for one connection specification type.
//! Both declare their types as tags so registries can key them without
//! inspecting the implementation.

use crate::environment::EnvironmentConfiguration;
use crate::identity::Identity;
use crate::protocol::{AuthenticationConfiguration, ConnectionSpecification, Credential};
use crate::types::{AuthenticationConfigurationType, ConnectionSpecificationType, CredentialType};
use async_trait::async_trait;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Live, store-dependent connection produced by a [`ConnectionBuilder`]
pub type Connection = Box<dyn Any + Send>;

/// Registry key of a credential builder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CredentialBuilderKey {
    /// Configuration type the builder is registered for
    pub configuration_type: AuthenticationConfigurationType,
    /// Credential type consumed
    pub input_type: CredentialType,
    /// Credential type produced
    pub output_type: CredentialType,
}

impl fmt::Display for CredentialBuilderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}->{} [{}]",
            self.input_type, self.output_type, self.configuration_type
        )
    }
}

/// Registry key of a connection builder
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionBuilderKey {
    /// Connection specification type served
    pub specification_type: ConnectionSpecificationType,
    /// Credential type consumed
    pub credential_type: CredentialType,
}

impl fmt::Display for ConnectionBuilderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.credential_type, self.specification_type)
    }
}

/// Transform from one credential type to another, scoped to one
/// authentication configuration type
///
/// Builders whose input is [`CredentialType::ANY`] receive `None` when they
/// start a chain. Builders with equal input and output types act as
/// extractors of a credential the identity already holds.
#[async_trait]
pub trait CredentialBuilder: Send + Sync {
    /// Configuration type this builder is scoped to
    fn authentication_configuration_type(&self) -> AuthenticationConfigurationType;

    /// Credential type consumed, or [`CredentialType::ANY`]
    fn input_credential_type(&self) -> CredentialType;

    /// Credential type produced
    fn output_credential_type(&self) -> CredentialType;

    /// Registry key derived from the declared types
    fn key(&self) -> CredentialBuilderKey {
        CredentialBuilderKey {
            configuration_type: self.authentication_configuration_type(),
            input_type: self.input_credential_type(),
            output_type: self.output_credential_type(),
        }
    }

    /// Produce the output credential
    async fn make_credential(
        &self,
        identity: &Identity,
        configuration: &dyn AuthenticationConfiguration,
        credential: Option<Arc<dyn Credential>>,
        environment: &EnvironmentConfiguration,
    ) -> anyhow::Result<Arc<dyn Credential>>;
}

/// One-time initialisation hook for shared connection resources
pub trait ConnectionManager: Send + Sync {
    /// Called once with the built environment; a failure aborts the factory build
    fn initialize(&self, environment: &EnvironmentConfiguration) -> anyhow::Result<()>;
}

/// Transform from a credential into a live connection for one connection
/// specification type
#[async_trait]
pub trait ConnectionBuilder: Send + Sync {
    /// Connection specification type served
    fn connection_specification_type(&self) -> ConnectionSpecificationType;

    /// Credential type accepted
    fn credential_type(&self) -> CredentialType;

    /// Registry key derived from the declared types
    fn key(&self) -> ConnectionBuilderKey {
        ConnectionBuilderKey {
            specification_type: self.connection_specification_type(),
            credential_type: self.credential_type(),
        }
    }

    /// Manager initialised once when the factory is built
    fn connection_manager(&self) -> Option<Arc<dyn ConnectionManager>> {
        None
    }

    /// Open a connection to the target described by `specification`
    async fn get_connection(
        &self,
        specification: &dyn ConnectionSpecification,
        credential: Arc<dyn Credential>,
        identity: &Identity,
    ) -> anyhow::Result<Connection>;
}
