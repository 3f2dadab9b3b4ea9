// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fetch orchestration: resolve a cluster, retrieve its kubeconfig, merge
//! it into the master document, and save.
//!
//! One [`Fetcher`] owns one master [`Kubeconfig`] for the lifetime of a
//! run; fetches are sequential and a failed fetch never leaves a partially
//! merged master behind.
//!
//! # Example
//!
//! ```no_run
//! use qbertconfig_rs::{Fetcher, FetcherConfig, QbertClient};
//! use qbertconfig_rs::testkit::MockClusterApi;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = QbertClient::new(MockClusterApi::new());
//! let mut fetcher = Fetcher::new(client, FetcherConfig::new())?;
//!
//! fetcher.fetch(Some("prod"), None).await?;
//! fetcher.save()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::client::{ClusterApi, QbertClient};
use crate::config::Kubeconfig;
use crate::error::Result;

/// Options for constructing a [`Fetcher`]. Every recognized option is an
/// explicit field; unset fields fall back to the documented defaults.
#[derive(Debug, Clone, Default)]
pub struct FetcherConfig {
    /// Where the master document is loaded from and saved to. Defaults to
    /// [`Kubeconfig::config_path`] (`KUBECONFIG` env var, else
    /// `~/.kube/config`).
    pub kubeconfig_path: Option<PathBuf>,
    /// Initial master document content. When set, the on-disk file is not
    /// read; the supplied document is used as the starting master.
    pub initial_document: Option<Kubeconfig>,
}

impl FetcherConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the master kubeconfig path.
    #[must_use]
    pub fn with_kubeconfig_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig_path = Some(path.into());
        self
    }

    /// Supply the starting master document instead of loading it.
    #[must_use]
    pub fn with_initial_document(mut self, document: Kubeconfig) -> Self {
        self.initial_document = Some(document);
        self
    }
}

/// Where a fetch call currently stands. Observable after the fact via
/// [`Fetcher::phase`]; a failed fetch records which stage it died in via
/// the error kind it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    #[default]
    Idle,
    Resolving,
    Fetching,
    Merging,
    Done,
    Failed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Resolving => write!(f, "resolving"),
            Self::Fetching => write!(f, "fetching"),
            Self::Merging => write!(f, "merging"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Orchestrates fetches against one master kubeconfig document.
pub struct Fetcher<A> {
    client: QbertClient<A>,
    master: Kubeconfig,
    path: PathBuf,
    phase: FetchPhase,
}

impl<A: ClusterApi> Fetcher<A> {
    /// Create a fetcher owning the master document described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Config`](crate::QbertError::Config) when no
    /// path is given and the default location cannot be determined,
    /// [`QbertError::Io`](crate::QbertError::Io) /
    /// [`QbertError::Parse`](crate::QbertError::Parse) when an existing
    /// master file cannot be read.
    pub fn new(client: QbertClient<A>, config: FetcherConfig) -> Result<Self> {
        let path = match config.kubeconfig_path {
            Some(path) => path,
            None => Kubeconfig::config_path()?,
        };
        let master = match config.initial_document {
            Some(document) => document,
            None => Kubeconfig::load(&path)?,
        };
        debug!(path = %path.display(), "fetcher initialized");
        Ok(Self {
            client,
            master,
            path,
            phase: FetchPhase::Idle,
        })
    }

    /// The master document in its current state.
    pub fn master(&self) -> &Kubeconfig {
        &self.master
    }

    /// Where [`save`](Self::save) persists the master document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Outcome of the most recent fetch call.
    #[must_use]
    pub fn phase(&self) -> FetchPhase {
        self.phase
    }

    /// Fetch one cluster's kubeconfig and merge it into the master.
    ///
    /// Resolves the cluster (uuid takes precedence over name), retrieves
    /// and parses its kubeconfig payload, then merges. Any failure before
    /// the payload is parsed aborts with the master untouched; a
    /// validation failure during the merge also leaves it unmodified.
    ///
    /// # Errors
    ///
    /// Propagates every resolver, remote, parse, and validation error kind
    /// unchanged; none of them are retried.
    pub async fn fetch(&mut self, name: Option<&str>, uuid: Option<&str>) -> Result<&Kubeconfig> {
        match self.run_fetch(name, uuid).await {
            Ok(()) => {
                self.phase = FetchPhase::Done;
                Ok(&self.master)
            }
            Err(e) => {
                warn!(phase = %self.phase, error = %e, "fetch aborted");
                self.phase = FetchPhase::Failed;
                Err(e)
            }
        }
    }

    async fn run_fetch(&mut self, name: Option<&str>, uuid: Option<&str>) -> Result<()> {
        self.phase = FetchPhase::Resolving;
        debug!(?name, ?uuid, "resolving cluster");
        let cluster = self.client.find_cluster(uuid, name).await?;

        self.phase = FetchPhase::Fetching;
        info!(cluster = %cluster.selector(), "retrieving kubeconfig");
        let payload = self.client.kubeconfig(&cluster).await?;
        let incoming = payload.parse()?;

        self.phase = FetchPhase::Merging;
        let summary = self.master.merge(&incoming)?;
        info!(
            cluster = %cluster.selector(),
            added = summary.added.len(),
            replaced = summary.replaced.len(),
            unchanged = summary.unchanged,
            "kubeconfig merged"
        );
        Ok(())
    }

    /// Persist the master document to its configured path.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Io`](crate::QbertError::Io) when the write
    /// fails; the previously saved file is left intact in that case.
    pub fn save(&self) -> Result<()> {
        self.master.save(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QbertError;
    use crate::resources::Cluster;
    use crate::testkit::{single_cluster_kubeconfig, MockClusterApi};

    fn fetcher_with(api: MockClusterApi, dir: &Path) -> Fetcher<MockClusterApi> {
        let config = FetcherConfig::new().with_kubeconfig_path(dir.join("config"));
        Fetcher::new(QbertClient::new(api), config).unwrap()
    }

    fn two_cluster_api() -> MockClusterApi {
        MockClusterApi::new()
            .with_cluster(
                Cluster::new("uuid-1", "alpha"),
                single_cluster_kubeconfig("c1", "u1", "ctx1"),
            )
            .with_cluster(
                Cluster::new("uuid-2", "beta"),
                single_cluster_kubeconfig("c2", "u2", "ctx2"),
            )
    }

    #[tokio::test]
    async fn test_fetch_into_empty_master() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher_with(two_cluster_api(), dir.path());
        assert_eq!(fetcher.phase(), FetchPhase::Idle);

        let master = fetcher.fetch(Some("alpha"), None).await.unwrap();

        assert_eq!(master.clusters.len(), 1);
        assert_eq!(master.users.len(), 1);
        assert_eq!(master.contexts.len(), 1);
        assert_eq!(master.current_context, "ctx1");
        assert_eq!(fetcher.phase(), FetchPhase::Done);
    }

    #[tokio::test]
    async fn test_sequential_fetches_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher_with(two_cluster_api(), dir.path());

        fetcher.fetch(Some("alpha"), None).await.unwrap();
        fetcher.fetch(None, Some("uuid-2")).await.unwrap();

        let master = fetcher.master();
        assert_eq!(master.clusters.len(), 2);
        assert_eq!(master.current_context, "ctx2");
        assert!(master.get_context("ctx1").is_some());
    }

    #[tokio::test]
    async fn test_failed_resolve_leaves_master_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher_with(two_cluster_api(), dir.path());
        fetcher.fetch(Some("alpha"), None).await.unwrap();
        let before = fetcher.master().clone();

        let result = fetcher.fetch(Some("gamma"), None).await;

        assert!(matches!(result, Err(QbertError::NotFound(_))));
        assert_eq!(fetcher.phase(), FetchPhase::Failed);
        assert_eq!(fetcher.master(), &before);
    }

    #[tokio::test]
    async fn test_malformed_payload_aborts_before_merge() {
        let dir = tempfile::tempdir().unwrap();
        let api = MockClusterApi::new().with_cluster(Cluster::new("uuid-1", "alpha"), "{bad: [");
        let mut fetcher = fetcher_with(api, dir.path());

        let result = fetcher.fetch(Some("alpha"), None).await;

        assert!(matches!(result, Err(QbertError::Parse(_))));
        assert!(fetcher.master().is_empty());
    }

    #[tokio::test]
    async fn test_save_persists_master() {
        let dir = tempfile::tempdir().unwrap();
        let mut fetcher = fetcher_with(two_cluster_api(), dir.path());

        fetcher.fetch(Some("alpha"), None).await.unwrap();
        fetcher.save().unwrap();

        let reloaded = Kubeconfig::load(fetcher.path()).unwrap();
        assert_eq!(&reloaded, fetcher.master());
    }

    #[tokio::test]
    async fn test_initial_document_skips_disk() {
        let dir = tempfile::tempdir().unwrap();
        let initial =
            Kubeconfig::from_yaml(&single_cluster_kubeconfig("c9", "u9", "ctx9")).unwrap();
        let config = FetcherConfig::new()
            .with_kubeconfig_path(dir.path().join("config"))
            .with_initial_document(initial.clone());

        let fetcher = Fetcher::new(QbertClient::new(two_cluster_api()), config).unwrap();
        assert_eq!(fetcher.master(), &initial);
    }
}
