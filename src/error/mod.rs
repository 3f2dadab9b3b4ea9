// SPDX-License-Identifier: MIT OR Apache-2.0

use thiserror::Error;

/// Error kinds surfaced by this crate.
///
/// Every failure mode is a distinct, inspectable variant; callers can match
/// on the kind to distinguish "cluster doesn't exist" from "could not reach
/// the service" or "the local file is broken". No variant is ever silently
/// downgraded into another, and the core never retries any of them.
#[derive(Debug, Error)]
pub enum QbertError {
    /// Credential discovery failed before any network use.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote API was unreachable or returned a server-side failure.
    #[error("Remote API error: {0}")]
    Remote(String),

    /// No cluster matched the given selector.
    #[error("Cluster not found: {0}")]
    NotFound(String),

    /// The selector matched zero or more than one cluster in an
    /// unresolvable way, or no selector was given at all.
    #[error("Ambiguous cluster selection: {0}")]
    Ambiguous(String),

    /// An on-disk file or API payload was not well-formed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A merge would violate a kubeconfig document invariant.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisting a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, QbertError>;
