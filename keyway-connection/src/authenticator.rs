//! Bound authentication plans

use crate::builders::{ConnectionBuilder, CredentialBuilder};
use crate::environment::EnvironmentConfiguration;
use crate::error::{ConnectionError, Result};
use crate::identity::Identity;
use crate::protocol::{AuthenticationConfiguration, Credential};
use crate::resolver::ResolvedFlow;
use crate::store::StoreInstance;
use crate::types::{AuthenticationMechanism, CredentialType};
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, debug_span};
use uuid::Uuid;

/// Resolved plan for one identity, store instance and authentication
/// configuration
///
/// The chain of credential builders is fixed at resolution time, so running
/// an authenticator never branches.
#[derive(Clone)]
pub struct Authenticator {
    flow_id: Uuid,
    store_instance: Arc<StoreInstance>,
    authentication_mechanism: AuthenticationMechanism,
    authentication_configuration: Arc<dyn AuthenticationConfiguration>,
    source_credential_type: CredentialType,
    target_credential_type: CredentialType,
    credential_builders: Vec<Arc<dyn CredentialBuilder>>,
    connection_builder: Arc<dyn ConnectionBuilder>,
}

impl Authenticator {
    pub(crate) fn new(
        store_instance: Arc<StoreInstance>,
        authentication_mechanism: AuthenticationMechanism,
        authentication_configuration: Arc<dyn AuthenticationConfiguration>,
        flow: ResolvedFlow,
        connection_builder: Arc<dyn ConnectionBuilder>,
    ) -> Self {
        Self {
            flow_id: Uuid::new_v4(),
            store_instance,
            authentication_mechanism,
            authentication_configuration,
            source_credential_type: flow.source_credential_type,
            target_credential_type: flow.target_credential_type,
            credential_builders: flow.credential_builders,
            connection_builder,
        }
    }

    /// Correlation id attached to every log event of this flow
    pub fn flow_id(&self) -> Uuid {
        self.flow_id
    }

    /// Store instance the flow targets
    pub fn store_instance(&self) -> &Arc<StoreInstance> {
        &self.store_instance
    }

    /// Mechanism realised by the authentication configuration
    pub fn authentication_mechanism(&self) -> &AuthenticationMechanism {
        &self.authentication_mechanism
    }

    /// Authentication configuration handed to every credential builder
    pub fn authentication_configuration(&self) -> &Arc<dyn AuthenticationConfiguration> {
        &self.authentication_configuration
    }

    /// Credential type taken from the identity, or [`CredentialType::ANY`]
    /// when the chain starts from a builder that needs no input
    pub fn source_credential_type(&self) -> &CredentialType {
        &self.source_credential_type
    }

    /// Credential type handed to the connection builder
    pub fn target_credential_type(&self) -> &CredentialType {
        &self.target_credential_type
    }

    /// Credential builders, in execution order
    pub fn credential_builders(&self) -> &[Arc<dyn CredentialBuilder>] {
        &self.credential_builders
    }

    /// Connection builder receiving the final credential
    pub fn connection_builder(&self) -> &Arc<dyn ConnectionBuilder> {
        &self.connection_builder
    }

    /// One `In->Out [Config]` line per credential builder, in execution order
    pub fn describe_flow(&self) -> Vec<String> {
        self.credential_builders
            .iter()
            .map(|builder| builder.key().to_string())
            .collect()
    }

    /// Run the credential chain and return the credential for the
    /// connection builder
    ///
    /// Fails with [`ConnectionError::MissingSourceCredential`] when the
    /// identity no longer holds the source credential. Builder failures are
    /// returned unchanged.
    pub async fn make_credential(
        &self,
        identity: &Identity,
        environment: &EnvironmentConfiguration,
    ) -> Result<Arc<dyn Credential>> {
        let span = debug_span!(
            "make_credential",
            flow_id = %self.flow_id,
            store = self.store_instance.identifier(),
            identity = identity.name(),
        );
        self.run_chain(identity, environment).instrument(span).await
    }

    async fn run_chain(
        &self,
        identity: &Identity,
        environment: &EnvironmentConfiguration,
    ) -> Result<Arc<dyn Credential>> {
        let mut credential = if self.source_credential_type.is_any() {
            None
        } else {
            let held = identity
                .credential(&self.source_credential_type)
                .cloned()
                .ok_or_else(|| ConnectionError::MissingSourceCredential {
                    credential_type: self.source_credential_type.clone(),
                })?;
            Some(held)
        };

        for builder in &self.credential_builders {
            debug!(step = %builder.key(), "Running credential builder");
            let next = builder
                .make_credential(
                    identity,
                    self.authentication_configuration.as_ref(),
                    credential.take(),
                    environment,
                )
                .await?;
            credential = Some(next);
        }

        credential.ok_or_else(|| ConnectionError::MissingSourceCredential {
            credential_type: self.source_credential_type.clone(),
        })
    }
}

impl fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("flow_id", &self.flow_id)
            .field("store_instance", &self.store_instance.identifier())
            .field("authentication_mechanism", &self.authentication_mechanism)
            .field("authentication_configuration", &self.authentication_configuration)
            .field("source_credential_type", &self.source_credential_type)
            .field("target_credential_type", &self.target_credential_type)
            .field("credential_builders", &self.describe_flow())
            .field("connection_builder", &self.connection_builder.key().to_string())
            .finish()
    }
}
