//! Authentication mechanism metadata

use crate::protocol::AuthenticationConfiguration;
use crate::types::{AuthenticationConfigurationType, AuthenticationMechanism};
use std::fmt;
use std::sync::Arc;

/// Produces a ready-to-use authentication configuration for a mechanism
pub type DefaultConfigurationGenerator =
    Arc<dyn Fn() -> Arc<dyn AuthenticationConfiguration> + Send + Sync>;

/// What a mechanism accepts: the authentication configuration types that
/// realise it, and optionally a generator for a default configuration
#[derive(Clone)]
pub struct AuthenticationMechanismConfiguration {
    mechanism: AuthenticationMechanism,
    configuration_types: Vec<AuthenticationConfigurationType>,
    default_configuration: Option<DefaultConfigurationGenerator>,
}

impl AuthenticationMechanismConfiguration {
    /// Start declaring `mechanism`
    pub fn builder(
        mechanism: impl Into<AuthenticationMechanism>,
    ) -> AuthenticationMechanismConfigurationBuilder {
        AuthenticationMechanismConfigurationBuilder {
            mechanism: mechanism.into(),
            configuration_types: vec![],
            default_configuration: None,
        }
    }

    /// Mechanism label
    pub fn mechanism(&self) -> &AuthenticationMechanism {
        &self.mechanism
    }

    /// Configuration types realising the mechanism, in preference order
    pub fn configuration_types(&self) -> &[AuthenticationConfigurationType] {
        &self.configuration_types
    }

    /// Whether `configuration_type` realises this mechanism
    pub fn accepts(&self, configuration_type: &AuthenticationConfigurationType) -> bool {
        self.configuration_types.contains(configuration_type)
    }

    /// Whether a default configuration can be generated
    pub fn has_default_configuration(&self) -> bool {
        self.default_configuration.is_some()
    }

    /// Generate the default configuration, if the mechanism declares one
    pub fn generate_default_configuration(&self) -> Option<Arc<dyn AuthenticationConfiguration>> {
        self.default_configuration
            .as_ref()
            .map(|generator| generator())
    }

    /// Copy restricted to the given configuration types, or `None` when no
    /// declared type remains
    pub(crate) fn restricted_to(
        &self,
        permitted: &[AuthenticationConfigurationType],
    ) -> Option<Self> {
        let configuration_types: Vec<_> = self
            .configuration_types
            .iter()
            .filter(|configuration_type| permitted.contains(configuration_type))
            .cloned()
            .collect();
        if configuration_types.is_empty() {
            return None;
        }
        Some(Self {
            mechanism: self.mechanism.clone(),
            configuration_types,
            default_configuration: self.default_configuration.clone(),
        })
    }
}

impl fmt::Debug for AuthenticationMechanismConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticationMechanismConfiguration")
            .field("mechanism", &self.mechanism)
            .field("configuration_types", &self.configuration_types)
            .field("default_configuration", &self.default_configuration.is_some())
            .finish()
    }
}

/// Builder for [`AuthenticationMechanismConfiguration`]
pub struct AuthenticationMechanismConfigurationBuilder {
    mechanism: AuthenticationMechanism,
    configuration_types: Vec<AuthenticationConfigurationType>,
    default_configuration: Option<DefaultConfigurationGenerator>,
}

impl AuthenticationMechanismConfigurationBuilder {
    /// Accept one more configuration type; repeated types are kept once
    pub fn with_configuration_type(
        mut self,
        configuration_type: impl Into<AuthenticationConfigurationType>,
    ) -> Self {
        let configuration_type = configuration_type.into();
        if !self.configuration_types.contains(&configuration_type) {
            self.configuration_types.push(configuration_type);
        }
        self
    }

    /// Add several configuration types
    pub fn with_configuration_types<I, T>(self, configuration_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<AuthenticationConfigurationType>,
    {
        configuration_types
            .into_iter()
            .fold(self, |builder, configuration_type| {
                builder.with_configuration_type(configuration_type)
            })
    }

    /// Generator used when a caller picks the mechanism without supplying
    /// a configuration
    pub fn with_default_configuration<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Arc<dyn AuthenticationConfiguration> + Send + Sync + 'static,
    {
        self.default_configuration = Some(Arc::new(generator));
        self
    }

    /// Finish the declaration
    pub fn build(self) -> AuthenticationMechanismConfiguration {
        AuthenticationMechanismConfiguration {
            mechanism: self.mechanism,
            configuration_types: self.configuration_types,
            default_configuration: self.default_configuration,
        }
    }
}
