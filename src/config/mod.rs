// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file handling: the kubeconfig document model and cloud
//! credential discovery.

pub mod cloud;
pub mod kubeconfig;

pub use cloud::CloudCredentials;
pub use kubeconfig::{
    ContextSpec, Kubeconfig, MergeSummary, NamedCluster, NamedContext, NamedUser,
};
