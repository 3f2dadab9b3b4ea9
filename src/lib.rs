// SPDX-License-Identifier: MIT OR Apache-2.0

pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod resources;
pub mod testkit;

pub use client::{ClusterApi, QbertClient};
pub use config::{CloudCredentials, Kubeconfig, MergeSummary};
pub use error::QbertError;
pub use fetcher::{FetchPhase, Fetcher, FetcherConfig};
pub use resources::{Cluster, KubeconfigPayload};
