// SPDX-License-Identifier: MIT OR Apache-2.0

//! Remote cluster manager client and cluster resolution.
//!
//! [`ClusterApi`] is the whole transport boundary: two logical operations,
//! listing the clusters the caller can see and retrieving one cluster's raw
//! kubeconfig payload. Implementations own HTTP, TLS, and the
//! authentication handshake (built from
//! [`CloudCredentials`](crate::config::CloudCredentials)) and map transport
//! or server-side failures to [`QbertError::Remote`]. The crate ships an
//! in-memory implementation in [`testkit`](crate::testkit).
//!
//! [`QbertClient`] layers the lookup protocol on top: resolving a
//! human-given cluster name or identifier into exactly one unambiguous
//! [`Cluster`] descriptor.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{QbertError, Result};
use crate::resources::{Cluster, KubeconfigPayload};

/// The remote cluster manager API, reduced to the two operations this
/// crate consumes.
#[async_trait]
pub trait ClusterApi: Send + Sync {
    /// List all clusters visible to the authenticated caller.
    async fn list_clusters(&self) -> Result<Vec<Cluster>>;

    /// Retrieve the raw kubeconfig payload for a resolved cluster.
    async fn kubeconfig_payload(&self, cluster: &Cluster) -> Result<Vec<u8>>;
}

/// Typed client for the cluster manager: resolves clusters and retrieves
/// their kubeconfig documents over a [`ClusterApi`] transport.
#[derive(Debug, Clone)]
pub struct QbertClient<A> {
    api: A,
}

impl<A: ClusterApi> QbertClient<A> {
    /// Wrap a transport implementation.
    #[must_use]
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Access the underlying transport.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Resolve a cluster by identifier and/or display name.
    ///
    /// Selector policy:
    /// - both absent fails with [`QbertError::Ambiguous`] — no cluster
    ///   was specified;
    /// - a uuid is looked up directly and fails with
    ///   [`QbertError::NotFound`] when absent;
    /// - a name alone fails with [`QbertError::NotFound`] on zero matches
    ///   and with [`QbertError::Ambiguous`] (listing every candidate) when
    ///   the remote system holds several clusters under that name;
    /// - when both are given, the uuid takes precedence; the name is not
    ///   used for disambiguation.
    ///
    /// # Errors
    ///
    /// Besides the selector outcomes above, transport failures from the
    /// listing call propagate as [`QbertError::Remote`].
    pub async fn find_cluster(&self, uuid: Option<&str>, name: Option<&str>) -> Result<Cluster> {
        match (uuid, name) {
            (None, None) => Err(QbertError::Ambiguous(
                "no cluster specified: provide a cluster uuid or name".to_string(),
            )),
            (Some(uuid), name) => {
                if name.is_some() {
                    debug!(uuid, "both uuid and name given; uuid takes precedence");
                }
                let clusters = self.api.list_clusters().await?;
                clusters
                    .into_iter()
                    .find(|c| c.uuid == uuid)
                    .ok_or_else(|| QbertError::NotFound(format!("no cluster with uuid '{uuid}'")))
            }
            (None, Some(name)) => {
                let clusters = self.api.list_clusters().await?;
                let mut matches: Vec<Cluster> =
                    clusters.into_iter().filter(|c| c.name == name).collect();
                match matches.len() {
                    0 => Err(QbertError::NotFound(format!("no cluster named '{name}'"))),
                    1 => {
                        let cluster = matches.remove(0);
                        debug!(cluster = %cluster.selector(), "resolved cluster by name");
                        Ok(cluster)
                    }
                    n => {
                        let candidates: Vec<String> =
                            matches.iter().map(Cluster::selector).collect();
                        Err(QbertError::Ambiguous(format!(
                            "{n} clusters named '{name}': {}",
                            candidates.join(", ")
                        )))
                    }
                }
            }
        }
    }

    /// Retrieve the kubeconfig payload for a resolved cluster.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Remote`] on transport or server-side failure.
    pub async fn kubeconfig(&self, cluster: &Cluster) -> Result<KubeconfigPayload> {
        let data = self.api.kubeconfig_payload(cluster).await?;
        debug!(cluster = %cluster.selector(), bytes = data.len(), "kubeconfig payload retrieved");
        Ok(KubeconfigPayload::new(data))
    }
}
