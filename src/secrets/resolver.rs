//! Credential resolution

use super::{CredentialError, CredentialReference, SecretStore};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::debug;

/// Resolves credential references against a namespaced secret store
pub struct CredentialResolver {
    store: Arc<dyn SecretStore>,
    namespace: String,
}

impl CredentialResolver {
    pub fn new(store: Arc<dyn SecretStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Resolve a reference to a single secret value.
    ///
    /// Inline references never touch the store; external references read
    /// `field` from the named secret.
    pub async fn resolve(
        &self,
        reference: &CredentialReference,
        field: &str,
    ) -> Result<SecretString, CredentialError> {
        match reference {
            CredentialReference::Inline(value) => {
                Ok(SecretString::from(value.expose_secret().to_owned()))
            }
            CredentialReference::External(name) => {
                let mut values = self.resolve_fields(name, &[field]).await?;
                Ok(values.remove(0))
            }
        }
    }

    /// Read several fields from one named secret with a single store lookup.
    ///
    /// Values are returned in the order of `fields`.
    pub async fn resolve_fields(
        &self,
        name: &str,
        fields: &[&str],
    ) -> Result<Vec<SecretString>, CredentialError> {
        debug!(
            "Looking up secret '{}' in namespace '{}' for fields {:?}",
            name, self.namespace, fields
        );

        let data = self.store.get_secret(&self.namespace, name).await?;

        fields
            .iter()
            .map(|field| {
                data.field(field)
                    .ok_or_else(|| CredentialError::SecretFieldMissing {
                        name: name.to_string(),
                        field: field.to_string(),
                    })
            })
            .collect()
    }
}
