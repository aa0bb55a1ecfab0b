//! Authenticated connection factory over pluggable credential flows
//!
//! Callers hold an [`Identity`] with whatever credentials they already have.
//! Stores declare which authentication mechanisms they accept. Between the
//! two sit pairwise [`CredentialBuilder`]s (credential to credential, for one
//! authentication configuration type) and [`ConnectionBuilder`]s (credential
//! to live connection, for one connection specification type). For every
//! request the [`ConnectionFactory`] resolves the shortest chain of builders
//! from the identity to the store and runs it.
//!
//! # Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use keyway_connection::*;
//! use std::sync::Arc;
//!
//! #[derive(Debug)]
//! struct HttpSpecification {
//!     url: String,
//! }
//!
//! impl ConnectionSpecification for HttpSpecification {
//!     fn specification_type(&self) -> ConnectionSpecificationType {
//!         ConnectionSpecificationType::new("HttpSpecification")
//!     }
//! }
//!
//! #[derive(Debug)]
//! struct ApiKeyConfiguration;
//!
//! impl AuthenticationConfiguration for ApiKeyConfiguration {
//!     fn configuration_type(&self) -> AuthenticationConfigurationType {
//!         AuthenticationConfigurationType::new("ApiKeyConfiguration")
//!     }
//! }
//!
//! struct AnonymousToToken;
//!
//! #[async_trait]
//! impl CredentialBuilder for AnonymousToToken {
//!     fn authentication_configuration_type(&self) -> AuthenticationConfigurationType {
//!         "ApiKeyConfiguration".into()
//!     }
//!
//!     fn input_credential_type(&self) -> CredentialType {
//!         AnonymousCredential::TYPE
//!     }
//!
//!     fn output_credential_type(&self) -> CredentialType {
//!         ApiTokenCredential::TYPE
//!     }
//!
//!     async fn make_credential(
//!         &self,
//!         _identity: &Identity,
//!         _configuration: &dyn AuthenticationConfiguration,
//!         _credential: Option<Arc<dyn Credential>>,
//!         _environment: &EnvironmentConfiguration,
//!     ) -> anyhow::Result<Arc<dyn Credential>> {
//!         Ok(Arc::new(ApiTokenCredential::new("public-token")))
//!     }
//! }
//!
//! struct HttpConnectionBuilder;
//!
//! #[async_trait]
//! impl ConnectionBuilder for HttpConnectionBuilder {
//!     fn connection_specification_type(&self) -> ConnectionSpecificationType {
//!         "HttpSpecification".into()
//!     }
//!
//!     fn credential_type(&self) -> CredentialType {
//!         ApiTokenCredential::TYPE
//!     }
//!
//!     async fn get_connection(
//!         &self,
//!         specification: &dyn ConnectionSpecification,
//!         credential: Arc<dyn Credential>,
//!         _identity: &Identity,
//!     ) -> anyhow::Result<Connection> {
//!         let specification = specification.expect_type::<HttpSpecification>()?;
//!         let token = credential.expect_type::<ApiTokenCredential>()?;
//!         Ok(Box::new(format!("{} ({} byte token)", specification.url, token.token().len())))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> keyway_connection::Result<()> {
//!     let environment = EnvironmentConfiguration::builder()
//!         .with_store_support(
//!             StoreSupport::builder()
//!                 .with_identifier("http")
//!                 .with_authentication_mechanism_configuration(
//!                     AuthenticationMechanismConfiguration::builder("ApiKey")
//!                         .with_configuration_type("ApiKeyConfiguration")
//!                         .build(),
//!                 )
//!                 .build()?,
//!         )
//!         .build()?;
//!
//!     let weather = StoreInstance::builder(&environment)
//!         .with_identifier("weather")
//!         .with_store_support_identifier("http")
//!         .with_connection_specification(HttpSpecification {
//!             url: "https://weather.example.com".to_string(),
//!         })
//!         .build()?;
//!
//!     let factory = ConnectionFactory::builder(environment)
//!         .with_credential_builder(AnonymousToToken)
//!         .with_connection_builder(HttpConnectionBuilder)
//!         .with_store_instance(weather)
//!         .build()?;
//!
//!     let connection: String = factory
//!         .get_connection_as(&Identity::anonymous(), "weather", Arc::new(ApiKeyConfiguration))
//!         .await?;
//!     assert_eq!(connection, "https://weather.example.com (12 byte token)");
//!     Ok(())
//! }
//! ```

pub mod authenticator;
pub mod builders;
pub mod credentials;
pub mod environment;
pub mod error;
pub mod factory;
pub mod identity;
pub mod logging;
pub mod mechanism;
pub mod protocol;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod types;
pub mod vault;

#[cfg(test)]
mod test_support;

// Re-export core types for easy access
pub use authenticator::Authenticator;
pub use builders::{
    Connection, ConnectionBuilder, ConnectionBuilderKey, ConnectionManager, CredentialBuilder,
    CredentialBuilderKey,
};
pub use credentials::{AnonymousCredential, ApiTokenCredential, PlaintextUserPasswordCredential};
pub use environment::{EnvironmentConfiguration, EnvironmentConfigurationBuilder};
pub use error::{ConnectionError, Result};
pub use factory::{ConnectionFactory, ConnectionFactoryBuilder, StoreRef};
pub use identity::Identity;
pub use mechanism::{
    AuthenticationMechanismConfiguration, AuthenticationMechanismConfigurationBuilder,
    DefaultConfigurationGenerator,
};
pub use protocol::{AuthenticationConfiguration, ConnectionSpecification, Credential};
pub use resolver::{AuthenticationFlowResolver, ResolvedFlow};
pub use settings::{
    AuthenticationMechanismSettings, EnvironmentSettings, StoreSupportSettings, VaultSettings,
};
pub use store::{StoreInstance, StoreInstanceBuilder, StoreSupport, StoreSupportBuilder};
pub use types::{
    AuthenticationConfigurationType, AuthenticationMechanism, ConnectionSpecificationType,
    CredentialType, SecretType,
};
pub use vault::{
    CredentialVault, EnvironmentVariableSecret, EnvironmentVariableVault, PropertiesFileVault,
    PropertiesSecret, VaultSecret,
};
