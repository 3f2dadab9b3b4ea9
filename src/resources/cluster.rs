// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed wrappers for cluster manager resources.

use serde::{Deserialize, Serialize};

use crate::config::Kubeconfig;
use crate::error::{QbertError, Result};

/// Descriptor for one cluster known to the remote cluster manager.
///
/// Produced only by the resolver; never persisted. Carries the addressing
/// detail needed to request the cluster's kubeconfig payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cluster {
    /// Unique identifier assigned by the cluster manager.
    pub uuid: String,
    /// Display name; not guaranteed unique in the remote system.
    pub name: String,
    /// API server endpoint, when the listing reply includes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Cluster {
    /// Create a new cluster descriptor.
    #[must_use]
    pub fn new(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
            endpoint: None,
        }
    }

    /// Set the API server endpoint.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Human-readable `name (uuid)` form used in log and error messages.
    #[must_use]
    pub fn selector(&self) -> String {
        format!("{} ({})", self.name, self.uuid)
    }
}

/// Raw kubeconfig payload retrieved from the remote API for one cluster.
///
/// The payload is carried as opaque bytes until [`parse`](Self::parse)
/// turns it into a [`Kubeconfig`] document.
#[derive(Debug, Clone)]
pub struct KubeconfigPayload {
    data: Vec<u8>,
}

impl KubeconfigPayload {
    /// Wrap raw payload bytes.
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get the payload as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Parse`] if the payload is not valid UTF-8.
    pub fn as_str(&self) -> Result<&str> {
        std::str::from_utf8(&self.data)
            .map_err(|e| QbertError::Parse(format!("kubeconfig payload is not valid UTF-8: {e}")))
    }

    /// Parse the payload into a [`Kubeconfig`] document.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Parse`] if the payload is not valid UTF-8 or
    /// not a well-formed kubeconfig.
    pub fn parse(&self) -> Result<Kubeconfig> {
        Kubeconfig::from_yaml(self.as_str()?)
    }

    /// Check if the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }
}
