//! Tests for credential resolution
//!
//! A credential is either inline or named by a secret reference.

use backup_worker::config::ConfigError;
use backup_worker::secrets::{fields, CredentialError, CredentialReference};
use secrecy::ExposeSecret;
use std::sync::Arc;
use test_utils::*;

#[tokio::test]
async fn test_inline_password_needs_no_store() {
    let store = MockSecretStore::new();
    let resolver = CredentialResolver::new(Arc::new(store.clone()), TEST_NAMESPACE);

    let value = resolver
        .resolve(&CredentialReference::inline("secret123"), fields::DB_PASSWORD)
        .await
        .unwrap();

    assert_eq!(value.expose_secret(), "secret123");
    assert_eq!(store.call_count(), 0);
}

#[tokio::test]
async fn test_secret_reference_reads_store_once() {
    let store = store_with_db_password("db-secret", "from-store");
    let resolver = CredentialResolver::new(Arc::new(store.clone()), TEST_NAMESPACE);
    let job = JobSpecBuilder::postgres()
        .password("inline-ignored")
        .password_secret("db-secret")
        .build();

    let reference = job.credential().unwrap();
    let value = resolver.resolve(&reference, fields::DB_PASSWORD).await.unwrap();

    assert_eq!(value.expose_secret(), "from-store");
    assert_eq!(store.call_count(), 1);
    let call = &store.get_calls()[0];
    assert_eq!(call.namespace, TEST_NAMESPACE);
    assert_eq!(call.name, "db-secret");
}

#[tokio::test]
async fn test_missing_secret_is_credential_error() {
    let store = MockSecretStore::new();
    let resolver = CredentialResolver::new(Arc::new(store), TEST_NAMESPACE);

    let err = resolver
        .resolve(&CredentialReference::external("nope"), fields::DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialError::SecretNotFound { .. }));
}

#[tokio::test]
async fn test_secret_without_field_is_credential_error() {
    let store = MockSecretStore::new().with_secret(TEST_NAMESPACE, "db-secret", &[("other", "x")]);
    let resolver = CredentialResolver::new(Arc::new(store), TEST_NAMESPACE);

    let err = resolver
        .resolve(&CredentialReference::external("db-secret"), fields::DB_PASSWORD)
        .await
        .unwrap_err();

    match err {
        CredentialError::SecretFieldMissing { name, field } => {
            assert_eq!(name, "db-secret");
            assert_eq!(field, "dbPassword");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_unreachable_store() {
    let store = MockSecretStore::new().unavailable();
    let resolver = CredentialResolver::new(Arc::new(store), TEST_NAMESPACE);

    let err = resolver
        .resolve(&CredentialReference::external("db-secret"), fields::DB_PASSWORD)
        .await
        .unwrap_err();

    assert!(matches!(err, CredentialError::SecretStoreUnavailable(_)));
}

#[tokio::test]
async fn test_s3_credentials_in_one_lookup() {
    let store = store_with_s3_credentials("s3-creds");
    let resolver = CredentialResolver::new(Arc::new(store.clone()), TEST_NAMESPACE);

    let values = resolver
        .resolve_fields("s3-creds", &[fields::ACCESS_KEY, fields::SECRET_KEY])
        .await
        .unwrap();

    assert_eq!(values[0].expose_secret(), "AKIAEXAMPLE");
    assert_eq!(values[1].expose_secret(), "wJalrXUtnFEMI");
    assert_eq!(store.call_count(), 1);
}

#[test]
fn test_job_without_any_password_field() {
    let job = JobSpecBuilder::postgres().without("dbPassword").build();
    assert!(matches!(
        job.credential(),
        Err(ConfigError::MissingField { .. })
    ));
}
