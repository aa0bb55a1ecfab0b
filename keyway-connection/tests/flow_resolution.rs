//! Flow resolution through the factory, from an identity to a connection

mod common;

use assert_matches::assert_matches;
use common::*;
use keyway_connection::{ConnectionError, CredentialType, Identity};

#[tokio::test]
async fn test_get_connection_with_failures() {
    let env = TestEnv::create(
        vec![credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_A)],
        vec![connection_builder(CREDENTIAL_A)],
        vec![mechanism("X", CONFIG_X), mechanism("Y", CONFIG_Y)],
    );
    let identity = Identity::new("test");

    // success
    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();
    env.factory
        .get_connection_with_authenticator(&identity, &authenticator)
        .await
        .unwrap();

    // unsupported authentication configuration
    let error = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_Z),
        )
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "Store 'test::connectionX' does not accept authentication configuration type 'AuthenticationConfiguration_Z'. Supported configuration type(s):\n\
         - AuthenticationConfiguration_X\n\
         - AuthenticationConfiguration_Y"
    );

    // unresolvable authentication flow
    let error = env
        .factory
        .get_connection(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_Y),
        )
        .await
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "No authentication flow for store 'test::connectionX' can be resolved for the specified identity \
         (authentication configuration: AuthenticationConfiguration_Y, connection specification: TestConnectionSpecification)"
    );
}

/// Any -> A -> [Connection]
#[tokio::test]
async fn test_get_connection_with_simple_flow() {
    let env = TestEnv::create(
        vec![
            credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_A),
            credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_B),
        ],
        vec![connection_builder(CREDENTIAL_A), connection_builder(CREDENTIAL_B)],
        vec![mechanism("X", CONFIG_X), mechanism("Y", CONFIG_Y)],
    );
    let identity = Identity::new("test");

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CredentialType::ANY,
        &["Credential->Credential_A [AuthenticationConfiguration_X]"],
        &CREDENTIAL_A,
    )
    .await;
}

/// Any -> B -> [Connection], because Any -> B is registered first
#[tokio::test]
async fn test_get_connection_with_specific_builder_order() {
    let env = TestEnv::create(
        vec![
            credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_B),
            credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_A),
        ],
        vec![connection_builder(CREDENTIAL_A), connection_builder(CREDENTIAL_B)],
        vec![mechanism("X", CONFIG_X)],
    );
    let identity = Identity::new("test");

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CredentialType::ANY,
        &["Credential->Credential_B [AuthenticationConfiguration_X]"],
        &CREDENTIAL_B,
    )
    .await;
}

/// Any -> A -> B -> C -> [Connection]
#[tokio::test]
async fn test_get_connection_with_chain_flow() {
    let env = TestEnv::create(
        vec![
            credential_builder(CONFIG_X, CREDENTIAL_A, CREDENTIAL_B),
            credential_builder(CONFIG_X, CREDENTIAL_B, CREDENTIAL_C),
            credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_A),
        ],
        vec![connection_builder(CREDENTIAL_C)],
        vec![mechanism("X", CONFIG_X)],
    );
    let identity = Identity::new("test");

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CredentialType::ANY,
        &[
            "Credential->Credential_A [AuthenticationConfiguration_X]",
            "Credential_A->Credential_B [AuthenticationConfiguration_X]",
            "Credential_B->Credential_C [AuthenticationConfiguration_X]",
        ],
        &CREDENTIAL_C,
    )
    .await;
}

/// B -> C -> [Connection]
#[tokio::test]
async fn test_get_connection_with_shortest_flow_resolved() {
    let env = TestEnv::create(
        vec![
            credential_builder(CONFIG_X, CREDENTIAL_A, CREDENTIAL_B),
            credential_builder(CONFIG_X, CREDENTIAL_B, CREDENTIAL_C),
            credential_builder(CONFIG_X, CredentialType::ANY, CREDENTIAL_A),
        ],
        vec![connection_builder(CREDENTIAL_C)],
        vec![mechanism("X", CONFIG_X)],
    );
    let identity = identity_with(&[CREDENTIAL_B]);

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CREDENTIAL_B,
        &["Credential_B->Credential_C [AuthenticationConfiguration_X]"],
        &CREDENTIAL_C,
    )
    .await;
}

/// A -> B -> [Connection] with an explicitly chosen configuration
#[tokio::test]
async fn test_get_connection_with_custom_configuration() {
    let env = TestEnv::create(
        vec![credential_builder(CONFIG_Y, CREDENTIAL_A, CREDENTIAL_B)],
        vec![connection_builder(CREDENTIAL_B)],
        vec![
            mechanism("X", CONFIG_X),
            mechanism("Y", CONFIG_Y),
            mechanism("Z", CONFIG_Z),
        ],
    );
    let identity = identity_with(&[CREDENTIAL_A]);

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_Y),
        )
        .unwrap();

    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CREDENTIAL_A,
        &["Credential_A->Credential_B [AuthenticationConfiguration_Y]"],
        &CREDENTIAL_B,
    )
    .await;

    // no mechanism declares a default configuration
    let error = env
        .factory
        .get_default_authenticator(&Identity::new("test"), env.new_store("test::connectionX", vec![]))
        .unwrap_err();
    assert_eq!(
        error.to_string(),
        "No authentication flow for store 'test::connectionX' can be resolved for the specified identity. \
         Try specifying an authentication mechanism or authentication configuration. Supported configuration type(s):\n\
         - AuthenticationConfiguration_X (X)\n\
         - AuthenticationConfiguration_Y (Y)\n\
         - AuthenticationConfiguration_Z (Z)"
    );
}

/// Default configuration generated for the first workable mechanism
#[tokio::test]
async fn test_get_connection_with_default_configuration() {
    let env = TestEnv::create(
        vec![credential_builder(CONFIG_Y, CREDENTIAL_A, CREDENTIAL_B)],
        vec![connection_builder(CREDENTIAL_B)],
        vec![
            keyway_connection::AuthenticationMechanismConfiguration::builder("X")
                .with_configuration_type(CONFIG_X)
                .with_default_configuration(|| configuration(CONFIG_X))
                .build(),
            keyway_connection::AuthenticationMechanismConfiguration::builder("Y")
                .with_configuration_type(CONFIG_Y)
                .with_default_configuration(|| configuration(CONFIG_Y))
                .build(),
        ],
    );
    let identity = identity_with(&[CREDENTIAL_A]);
    let store = env.new_store("test::connectionX", vec![]);

    let authenticator = env
        .factory
        .get_default_authenticator(&identity, &store)
        .unwrap();
    assert_eq!(authenticator.authentication_mechanism().name(), "Y");
    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CREDENTIAL_A,
        &["Credential_A->Credential_B [AuthenticationConfiguration_Y]"],
        &CREDENTIAL_B,
    )
    .await;

    let connection = env
        .factory
        .get_default_connection(&identity, &store)
        .await
        .unwrap();
    assert!(connection.is::<String>());
}

/// A -> A -> [Connection] when the store does not accept A directly
#[tokio::test]
async fn test_get_connection_with_credential_extractor() {
    let env = TestEnv::create(
        vec![
            credential_builder(CONFIG_X, CREDENTIAL_A, CREDENTIAL_A),
            credential_builder(CONFIG_X, CREDENTIAL_A, CREDENTIAL_B),
        ],
        vec![connection_builder(CREDENTIAL_B)],
        vec![mechanism("X", CONFIG_X)],
    );
    let identity = identity_with(&[CREDENTIAL_A]);

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(
        &identity,
        &env.factory,
        &authenticator,
        &CREDENTIAL_A,
        &["Credential_A->Credential_B [AuthenticationConfiguration_X]"],
        &CREDENTIAL_B,
    )
    .await;
}

/// A held and accepted directly: the extractor is not needed
#[tokio::test]
async fn test_held_credential_short_circuits_extractor() {
    let env = TestEnv::create(
        vec![credential_builder(CONFIG_X, CREDENTIAL_A, CREDENTIAL_A)],
        vec![connection_builder(CREDENTIAL_A)],
        vec![mechanism("X", CONFIG_X)],
    );
    let identity = identity_with(&[CREDENTIAL_A]);

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(&identity, &env.factory, &authenticator, &CREDENTIAL_A, &[], &CREDENTIAL_A)
        .await;
}

/// A held, no credential builder at all, connection builder for A
#[tokio::test]
async fn test_held_credential_without_extractor() {
    let env = TestEnv::create(
        vec![],
        vec![connection_builder(CREDENTIAL_A)],
        vec![mechanism("X", CONFIG_X)],
    );
    let identity = identity_with(&[CREDENTIAL_A]);

    let authenticator = env
        .factory
        .get_authenticator(
            &identity,
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    assert_authenticator(&identity, &env.factory, &authenticator, &CREDENTIAL_A, &[], &CREDENTIAL_A)
        .await;
}

#[tokio::test]
async fn test_identity_losing_credential_between_resolution_and_execution() {
    let env = TestEnv::create(
        vec![credential_builder(CONFIG_X, CREDENTIAL_A, CREDENTIAL_B)],
        vec![connection_builder(CREDENTIAL_B)],
        vec![mechanism("X", CONFIG_X)],
    );

    let authenticator = env
        .factory
        .get_authenticator(
            &identity_with(&[CREDENTIAL_A]),
            env.new_store("test::connectionX", vec![]),
            configuration(CONFIG_X),
        )
        .unwrap();

    let result = env
        .factory
        .get_connection_with_authenticator(&Identity::new("someone else"), &authenticator)
        .await;

    assert_matches!(
        result,
        Err(ConnectionError::MissingSourceCredential { credential_type }) if credential_type == CREDENTIAL_A
    );
}
