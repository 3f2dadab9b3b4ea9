// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory test double for the remote cluster manager.
//!
//! Used by this crate's own test suite and available to downstream users
//! who want to exercise fetch flows without a live cluster manager.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::client::ClusterApi;
use crate::error::{QbertError, Result};
use crate::resources::Cluster;

/// A [`ClusterApi`] backed by in-memory fixtures.
///
/// Clusters and their kubeconfig payloads are registered up front;
/// failures can be injected per operation; every call is recorded.
#[derive(Debug, Default)]
pub struct MockClusterApi {
    clusters: Vec<Cluster>,
    payloads: HashMap<String, Vec<u8>>,
    listing_failure: Option<String>,
    payload_failure: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl MockClusterApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cluster and the payload its kubeconfig request returns.
    #[must_use]
    pub fn with_cluster(mut self, cluster: Cluster, payload: impl Into<Vec<u8>>) -> Self {
        self.payloads.insert(cluster.uuid.clone(), payload.into());
        self.clusters.push(cluster);
        self
    }

    /// Register a cluster the listing reports but whose payload request
    /// has no fixture (the mock answers it with a remote failure).
    #[must_use]
    pub fn with_listed_cluster(mut self, cluster: Cluster) -> Self {
        self.clusters.push(cluster);
        self
    }

    /// Make every listing call fail with [`QbertError::Remote`].
    #[must_use]
    pub fn with_listing_failure(mut self, message: impl Into<String>) -> Self {
        self.listing_failure = Some(message.into());
        self
    }

    /// Make every payload call fail with [`QbertError::Remote`].
    #[must_use]
    pub fn with_payload_failure(mut self, message: impl Into<String>) -> Self {
        self.payload_failure = Some(message.into());
        self
    }

    /// Calls recorded so far, in order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl ClusterApi for MockClusterApi {
    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        self.calls.lock().await.push("list_clusters".to_string());
        if let Some(message) = &self.listing_failure {
            return Err(QbertError::Remote(message.clone()));
        }
        Ok(self.clusters.clone())
    }

    async fn kubeconfig_payload(&self, cluster: &Cluster) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .await
            .push(format!("kubeconfig_payload:{}", cluster.uuid));
        if let Some(message) = &self.payload_failure {
            return Err(QbertError::Remote(message.clone()));
        }
        self.payloads
            .get(&cluster.uuid)
            .cloned()
            .ok_or_else(|| QbertError::Remote(format!("no kubeconfig for cluster {}", cluster.uuid)))
    }
}

/// Render a minimal single-cluster kubeconfig document, the shape the
/// cluster manager hands back for one cluster.
#[must_use]
pub fn single_cluster_kubeconfig(cluster: &str, user: &str, context: &str) -> String {
    format!(
        r#"apiVersion: v1
kind: Config
clusters:
- name: {cluster}
  cluster:
    server: https://{cluster}.example:6443
    certificate-authority-data: Q0EtREFUQQ==
users:
- name: {user}
  user:
    token: dG9rZW4tZm9yLXtjbHVzdGVyfQ==
contexts:
- name: {context}
  context:
    cluster: {cluster}
    user: {user}
current-context: {context}
preferences: {{}}
"#
    )
}
