// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strongly typed wrappers for cluster manager resources.

pub mod cluster;

pub use cluster::{Cluster, KubeconfigPayload};
