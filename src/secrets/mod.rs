//! Credential references and the secret store abstraction
//!
//! A credential is either carried inline in a spec or named by reference
//! to a secret object held in an external store. The [`SecretStore`] trait
//! is the seam between the resolver and the store client, so tests can
//! swap in [`mock::MockSecretStore`].

mod kube_store;
mod resolver;

pub use kube_store::{ConnectionStrategy, KubeSecretStore};
pub use resolver::CredentialResolver;

use async_trait::async_trait;
use secrecy::SecretString;
use std::collections::BTreeMap;
use std::fmt;

/// Well-known secret field names
pub mod fields {
    pub const DB_PASSWORD: &str = "dbPassword";
    pub const ACCESS_KEY: &str = "accessKey";
    pub const SECRET_KEY: &str = "secretKey";
    pub const JSON_KEY: &str = "jsonKey";
}

/// Tagged pointer to a secret
#[derive(Debug)]
pub enum CredentialReference {
    Inline(SecretString),
    External(String),
}

impl CredentialReference {
    pub fn inline(value: impl Into<String>) -> Self {
        CredentialReference::Inline(SecretString::from(value.into()))
    }

    pub fn external(name: impl Into<String>) -> Self {
        CredentialReference::External(name.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("Secret store unavailable: {0}")]
    SecretStoreUnavailable(String),

    #[error("Secret '{name}' not found in namespace '{namespace}'")]
    SecretNotFound { namespace: String, name: String },

    #[error("Secret '{name}' has no field '{field}'")]
    SecretFieldMissing { name: String, field: String },
}

/// Field name to raw bytes, as returned by the store
#[derive(Default)]
pub struct SecretData {
    fields: BTreeMap<String, Vec<u8>>,
}

impl SecretData {
    pub fn new(fields: BTreeMap<String, Vec<u8>>) -> Self {
        Self { fields }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Extract a field as a secret string
    pub fn field(&self, field: &str) -> Option<SecretString> {
        self.fields
            .get(field)
            .map(|bytes| SecretString::from(String::from_utf8_lossy(bytes).into_owned()))
    }
}

impl fmt::Debug for SecretData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretData")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K: Into<String>, V: Into<Vec<u8>>> FromIterator<(K, V)> for SecretData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Read-only lookup of named secrets, scoped to a namespace
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, CredentialError>;
}

/// In-memory secret store that records lookups
/// Available for use in external test crates
#[allow(dead_code)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Recorded lookup
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct SecretLookup {
        pub namespace: String,
        pub name: String,
    }

    #[derive(Clone, Default)]
    pub struct MockSecretStore {
        /// Recorded lookups
        pub calls: Arc<Mutex<Vec<SecretLookup>>>,
        /// (namespace, name) -> fields
        secrets: Arc<Mutex<HashMap<(String, String), BTreeMap<String, Vec<u8>>>>>,
        /// Whether every lookup should fail as unreachable
        unavailable: Arc<Mutex<bool>>,
    }

    impl MockSecretStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a secret with the given string fields
        pub fn with_secret(self, namespace: &str, name: &str, fields: &[(&str, &str)]) -> Self {
            let data = fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                .collect();
            self.secrets
                .lock()
                .unwrap()
                .insert((namespace.to_string(), name.to_string()), data);
            self
        }

        /// Make every lookup fail with SecretStoreUnavailable
        pub fn unavailable(self) -> Self {
            *self.unavailable.lock().unwrap() = true;
            self
        }

        pub fn get_calls(&self) -> Vec<SecretLookup> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SecretStore for MockSecretStore {
        async fn get_secret(
            &self,
            namespace: &str,
            name: &str,
        ) -> Result<SecretData, CredentialError> {
            self.calls.lock().unwrap().push(SecretLookup {
                namespace: namespace.to_string(),
                name: name.to_string(),
            });

            if *self.unavailable.lock().unwrap() {
                return Err(CredentialError::SecretStoreUnavailable(
                    "mock store unreachable".to_string(),
                ));
            }

            self.secrets
                .lock()
                .unwrap()
                .get(&(namespace.to_string(), name.to_string()))
                .cloned()
                .map(SecretData::new)
                .ok_or_else(|| CredentialError::SecretNotFound {
                    namespace: namespace.to_string(),
                    name: name.to_string(),
                })
        }
    }
}
