//! Error types for connection resolution and construction

use crate::types::{
    AuthenticationConfigurationType, AuthenticationMechanism, ConnectionSpecificationType,
    CredentialType, SecretType,
};
use std::fmt::Display;
use thiserror::Error;

/// Result type alias for connection factory operations
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Errors raised while wiring registries, resolving authentication flows
/// or constructing connections
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Duplicate store, store support, vault or builder key
    #[error("Registration conflict: {0}")]
    RegistrationConflict(String),

    /// Incomplete or malformed configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// No registered store instance has this identifier
    #[error("Can't find store instance with identifier '{identifier}'")]
    StoreInstanceNotFound {
        /// Requested identifier
        identifier: String,
    },

    /// No store support has this identifier
    #[error("Can't find store support with identifier '{identifier}'")]
    StoreSupportNotFound {
        /// Requested identifier
        identifier: String,
    },

    /// No vault resolves this secret type
    #[error("Can't find credential vault for secret type '{secret_type}'")]
    VaultNotFound {
        /// Secret type without a vault
        secret_type: SecretType,
    },

    /// The vault has no value for the secret
    #[error("Can't find secret '{reference}'")]
    SecretNotFound {
        /// Secret reference
        reference: String,
    },

    /// The store does not permit the configuration type
    #[error(
        "Store '{store}' does not accept authentication configuration type '{configuration_type}'. Supported configuration type(s):\n{}",
        bullet_list(.supported)
    )]
    UnsupportedAuthenticationConfiguration {
        /// Store identifier
        store: String,
        /// Rejected configuration type
        configuration_type: AuthenticationConfigurationType,
        /// Configuration types the store permits
        supported: Vec<AuthenticationConfigurationType>,
    },

    /// The store does not accept the mechanism
    #[error(
        "Store '{store}' does not support authentication mechanism '{mechanism}'. Supported mechanism(s):\n{}",
        bullet_list(.supported)
    )]
    UnsupportedAuthenticationMechanism {
        /// Store identifier
        store: String,
        /// Rejected mechanism
        mechanism: AuthenticationMechanism,
        /// Mechanisms the store accepts
        supported: Vec<AuthenticationMechanism>,
    },

    /// The mechanism has no default configuration generator
    #[error(
        "Can't auto-generate authentication configuration for store '{store}' with authentication mechanism '{mechanism}'. Please provide a configuration of one of the following type(s):\n{}",
        bullet_list(.supported)
    )]
    NoDefaultAuthenticationConfiguration {
        /// Store identifier
        store: String,
        /// Requested mechanism
        mechanism: AuthenticationMechanism,
        /// Configuration types realising the mechanism
        supported: Vec<AuthenticationConfigurationType>,
    },

    /// No chain of builders connects the identity to the store
    #[error(
        "No authentication flow for store '{store}' can be resolved for the specified identity (authentication configuration: {configuration_type}, connection specification: {specification_type})"
    )]
    UnresolvableFlow {
        /// Store identifier
        store: String,
        /// Requested configuration type
        configuration_type: AuthenticationConfigurationType,
        /// Store connection specification type
        specification_type: ConnectionSpecificationType,
    },

    /// No default configuration of any mechanism resolves a flow
    #[error(
        "No authentication flow for store '{store}' can be resolved for the specified identity. Try specifying an authentication mechanism or authentication configuration. Supported configuration type(s):\n{}",
        mechanism_list(.supported)
    )]
    NoFlowForStore {
        /// Store identifier
        store: String,
        /// Permitted configuration types with their mechanism
        supported: Vec<(AuthenticationConfigurationType, AuthenticationMechanism)>,
    },

    /// Internal inconsistency while reconstructing a flow
    #[error("Can't resolve connection authentication flow for specified identity: {0}")]
    InvalidFlowState(String),

    /// The identity lost the credential a resolved flow starts from
    #[error("Can't find any credential of type '{credential_type}' in the specified identity")]
    MissingSourceCredential {
        /// Expected source credential type
        credential_type: CredentialType,
    },

    /// No connection builder accepts the final credential
    #[error(
        "Can't find a compatible connection builder (connection specification: {specification_type}, credential: {credential_type})"
    )]
    NoCompatibleConnectionBuilder {
        /// Store connection specification type
        specification_type: ConnectionSpecificationType,
        /// Final credential type
        credential_type: CredentialType,
    },

    /// The produced connection is not of the requested Rust type
    #[error("Connection is not of the requested type '{expected}'")]
    ConnectionTypeMismatch {
        /// Requested type name
        expected: &'static str,
    },

    /// Failure raised by a plug-in (credential builder, connection builder,
    /// vault or connection manager), passed through untouched
    #[error(transparent)]
    External(#[from] anyhow::Error),
}

impl ConnectionError {
    /// Duplicate registration
    pub fn registration_conflict(msg: impl Into<String>) -> Self {
        Self::RegistrationConflict(msg.into())
    }

    /// Invalid or incomplete configuration
    pub fn invalid_configuration(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Inconsistent flow graph
    pub fn invalid_flow_state(msg: impl Into<String>) -> Self {
        Self::InvalidFlowState(msg.into())
    }

    /// Conflicts are raised while wiring registries and are unrecoverable at startup
    pub fn is_registration_conflict(&self) -> bool {
        matches!(self, Self::RegistrationConflict(_))
    }

    /// Errors scoped to a single request rather than to process wiring
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Self::StoreInstanceNotFound { .. }
                | Self::SecretNotFound { .. }
                | Self::UnsupportedAuthenticationConfiguration { .. }
                | Self::UnsupportedAuthenticationMechanism { .. }
                | Self::NoDefaultAuthenticationConfiguration { .. }
                | Self::UnresolvableFlow { .. }
                | Self::NoFlowForStore { .. }
                | Self::MissingSourceCredential { .. }
                | Self::NoCompatibleConnectionBuilder { .. }
                | Self::ConnectionTypeMismatch { .. }
                | Self::External(_)
        )
    }
}

fn bullet_list<T: Display>(items: &[T]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn mechanism_list(
    items: &[(AuthenticationConfigurationType, AuthenticationMechanism)],
) -> String {
    items
        .iter()
        .map(|(configuration_type, mechanism)| format!("- {configuration_type} ({mechanism})"))
        .collect::<Vec<_>>()
        .join("\n")
}
