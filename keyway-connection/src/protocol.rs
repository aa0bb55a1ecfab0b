//! Protocol traits for credentials, authentication configurations and
//! connection specifications
//!
//! Each trait exposes a single type-tag accessor. The core dispatches on tags
//! only; concrete builders recover their concrete types with `downcast_ref`.

use crate::types::{AuthenticationConfigurationType, ConnectionSpecificationType, CredentialType};
use std::any::Any;
use std::fmt;

/// A typed, already-verified token of authentication
pub trait Credential: Any + Send + Sync + fmt::Debug {
    /// Tag used by the resolver and the builder registries
    fn credential_type(&self) -> CredentialType;
}

/// Declared recipe describing how a store expects authentication to proceed
pub trait AuthenticationConfiguration: Any + Send + Sync + fmt::Debug {
    /// Tag used to select credential builders
    fn configuration_type(&self) -> AuthenticationConfigurationType;
}

/// Declared description of a store's network target
pub trait ConnectionSpecification: Any + Send + Sync + fmt::Debug {
    /// Tag used to select connection builders
    fn specification_type(&self) -> ConnectionSpecificationType;
}

macro_rules! downcast_helpers {
    ($trait:ident, $tag:ident) => {
        impl dyn $trait {
            /// Borrow the concrete value if it is of type `T`
            pub fn downcast_ref<T: $trait>(&self) -> Option<&T> {
                (self as &dyn Any).downcast_ref::<T>()
            }

            /// Whether the concrete value is of type `T`
            pub fn is<T: $trait>(&self) -> bool {
                (self as &dyn Any).is::<T>()
            }

            /// Borrow the concrete value, failing with a descriptive error
            /// that builder implementations can propagate with `?`
            pub fn expect_type<T: $trait>(&self) -> anyhow::Result<&T> {
                self.downcast_ref::<T>().ok_or_else(|| {
                    anyhow::anyhow!(
                        "Expected {} of type '{}', found '{}'",
                        stringify!($trait),
                        std::any::type_name::<T>(),
                        self.$tag()
                    )
                })
            }
        }
    };
}

downcast_helpers!(Credential, credential_type);
downcast_helpers!(AuthenticationConfiguration, configuration_type);
downcast_helpers!(ConnectionSpecification, specification_type);
