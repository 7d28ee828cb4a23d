//! Kubernetes-backed secret store
//!
//! The client is built lazily on the first lookup by trying each
//! [`ConnectionStrategy`] in order. In-cluster service account credentials
//! come first; a kubeconfig file is only consulted when configured as a
//! fallback, which is meant for running the worker outside the cluster.

use super::{CredentialError, SecretData, SecretStore};
use crate::config::{expand_tilde, SecretsSettings};
use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client};
use std::fmt;
use std::path::PathBuf;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// One way of building a cluster client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStrategy {
    /// Ambient service account credentials of the running pod
    InCluster,
    /// Explicit kubeconfig file
    Kubeconfig(PathBuf),
}

impl fmt::Display for ConnectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStrategy::InCluster => write!(f, "in-cluster"),
            ConnectionStrategy::Kubeconfig(path) => write!(f, "kubeconfig {}", path.display()),
        }
    }
}

impl ConnectionStrategy {
    async fn build_config(&self) -> anyhow::Result<kube::Config> {
        match self {
            ConnectionStrategy::InCluster => {
                kube::Config::incluster().context("in-cluster environment not detected")
            }
            ConnectionStrategy::Kubeconfig(path) => {
                let kubeconfig = Kubeconfig::read_from(path)
                    .with_context(|| format!("failed to read kubeconfig {}", path.display()))?;
                kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                    .await
                    .context("invalid kubeconfig")
            }
        }
    }
}

/// Build the ordered strategy list from settings
pub fn strategies_from_settings(settings: &SecretsSettings) -> Vec<ConnectionStrategy> {
    let mut strategies = vec![ConnectionStrategy::InCluster];

    if settings.kubeconfig_fallback {
        let path = settings
            .kubeconfig
            .as_deref()
            .map(expand_tilde)
            .or_else(|| dirs::home_dir().map(|home| home.join(".kube").join("config")));

        if let Some(path) = path {
            strategies.push(ConnectionStrategy::Kubeconfig(path));
        }
    }

    strategies
}

pub struct KubeSecretStore {
    strategies: Vec<ConnectionStrategy>,
    client: OnceCell<(Client, ConnectionStrategy)>,
}

impl KubeSecretStore {
    pub fn new(strategies: Vec<ConnectionStrategy>) -> Self {
        Self {
            strategies,
            client: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &SecretsSettings) -> Self {
        Self::new(strategies_from_settings(settings))
    }

    /// Strategy that produced the client, once connected
    pub fn connected_via(&self) -> Option<&ConnectionStrategy> {
        self.client.get().map(|(_, strategy)| strategy)
    }

    async fn client(&self) -> Result<&Client, CredentialError> {
        self.client
            .get_or_try_init(|| self.connect())
            .await
            .map(|(client, _)| client)
    }

    async fn connect(&self) -> Result<(Client, ConnectionStrategy), CredentialError> {
        let mut failures = Vec::new();

        for (index, strategy) in self.strategies.iter().enumerate() {
            debug!("Trying secret store connection: {}", strategy);

            let attempt = match strategy.build_config().await {
                Ok(config) => Client::try_from(config).context("failed to create client"),
                Err(e) => Err(e),
            };

            match attempt {
                Ok(client) => {
                    if index == 0 {
                        info!("Connected to secret store via {}", strategy);
                    } else {
                        warn!("Connected to secret store via fallback {}", strategy);
                    }
                    return Ok((client, strategy.clone()));
                }
                Err(e) => {
                    debug!("Connection via {} failed: {:#}", strategy, e);
                    failures.push(format!("{}: {:#}", strategy, e));
                }
            }
        }

        if failures.is_empty() {
            failures.push("no connection strategies configured".to_string());
        }

        Err(CredentialError::SecretStoreUnavailable(failures.join("; ")))
    }
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretData, CredentialError> {
        let client = self.client().await?;
        let secrets: Api<Secret> = Api::namespaced(client.clone(), namespace);

        match secrets.get_opt(name).await {
            Ok(Some(secret)) => Ok(secret
                .data
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key, value.0))
                .collect()),
            Ok(None) => Err(CredentialError::SecretNotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
            Err(e) => Err(CredentialError::SecretStoreUnavailable(format!(
                "failed to read secret '{}': {}",
                name, e
            ))),
        }
    }
}
