//! Type tags
//!
//! Builders, registries and the flow resolver never inspect concrete Rust
//! types. Every credential, authentication configuration, connection
//! specification and vault secret declares a named tag instead, and all
//! registry keys are built from those tags.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

macro_rules! type_tag {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Create a tag from a static name, usable in `const` items
            pub const fn new(name: &'static str) -> Self {
                Self(Cow::Borrowed(name))
            }

            /// Create a tag from a runtime name (e.g. read from a settings file)
            pub fn from_name(name: impl Into<String>) -> Self {
                Self(Cow::Owned(name.into()))
            }

            /// The tag name
            pub fn name(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&'static str> for $name {
            fn from(name: &'static str) -> Self {
                Self::new(name)
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self::from_name(name)
            }
        }
    };
}

type_tag!(
    /// Tag identifying a kind of credential (ticket, token, key pair, ...)
    CredentialType
);

type_tag!(
    /// Tag identifying a kind of authentication configuration
    AuthenticationConfigurationType
);

type_tag!(
    /// Tag identifying a kind of connection specification
    ConnectionSpecificationType
);

type_tag!(
    /// Authentication mechanism label (e.g. `UsernamePassword`, `Kerberos`)
    AuthenticationMechanism
);

type_tag!(
    /// Tag identifying the kind of secret a vault can resolve
    SecretType
);

impl CredentialType {
    /// Marker accepted by builders that do not need a specific input credential
    pub const ANY: CredentialType = CredentialType::new("Credential");

    /// Whether this is the generic "any credential" marker
    pub fn is_any(&self) -> bool {
        *self == Self::ANY
    }
}

impl AuthenticationMechanism {
    /// Human-readable label of the mechanism
    pub fn label(&self) -> &str {
        self.name()
    }
}
