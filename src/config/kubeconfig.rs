// SPDX-License-Identifier: MIT OR Apache-2.0

//! Multi-context kubeconfig document model.
//!
//! This module provides the in-memory representation of a kubeconfig file
//! (typically `~/.kube/config`): named clusters, named user credentials, and
//! named contexts pairing a cluster with a user, plus a pointer to the
//! currently active context. Documents can be loaded from disk, merged with
//! a freshly fetched single-cluster document, and saved back atomically.
//!
//! Credential material (certificate authority data, client certificates,
//! tokens) is carried as opaque YAML and never interpreted.
//!
//! # Example
//!
//! ```no_run
//! use qbertconfig_rs::config::Kubeconfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load the master document (absent file yields an empty document)
//! let mut master = Kubeconfig::load(Kubeconfig::config_path()?)?;
//!
//! let incoming = Kubeconfig::from_yaml("apiVersion: v1\nkind: Config\n")?;
//! let summary = master.merge(&incoming)?;
//! println!("added {} entries", summary.added.len());
//!
//! master.save(Kubeconfig::config_path()?)?;
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{QbertError, Result};

fn default_api_version() -> String {
    "v1".to_string()
}

fn default_kind() -> String {
    "Config".to_string()
}

fn empty_mapping() -> serde_yaml::Value {
    serde_yaml::Value::Mapping(serde_yaml::Mapping::new())
}

/// A named cluster entry. The `cluster` block (server URL, certificate
/// authority data) is opaque and preserved verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: serde_yaml::Value,
}

/// A named user entry. The `user` block holds opaque authentication data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedUser {
    pub name: String,
    pub user: serde_yaml::Value,
}

/// A named context entry pairing one cluster with one user, by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextSpec,
}

/// The body of a context entry: by-name references into the document's
/// cluster and user sets, plus an optional default namespace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextSpec {
    pub cluster: String,
    pub user: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Entries merged into a master document by [`Kubeconfig::merge`].
///
/// Replace events are recorded here (and logged) so callers can observe
/// which credentials were refreshed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeSummary {
    /// Entries inserted, as `kind/name`.
    pub added: Vec<String>,
    /// Entries that existed under the same name but differed and were
    /// overwritten with the incoming value, as `kind/name`.
    pub replaced: Vec<String>,
    /// Entries that were byte-for-byte identical to the incoming ones.
    pub unchanged: usize,
}

impl MergeSummary {
    /// True if the merge changed nothing in the master document.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.replaced.is_empty()
    }
}

trait NamedEntry {
    fn entry_name(&self) -> &str;
}

impl NamedEntry for NamedCluster {
    fn entry_name(&self) -> &str {
        &self.name
    }
}

impl NamedEntry for NamedUser {
    fn entry_name(&self) -> &str {
        &self.name
    }
}

impl NamedEntry for NamedContext {
    fn entry_name(&self) -> &str {
        &self.name
    }
}

fn duplicate_name<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    names.find(|name| !seen.insert(*name))
}

fn merge_entries<T>(target: &mut Vec<T>, incoming: &[T], kind: &str, summary: &mut MergeSummary)
where
    T: NamedEntry + Clone + PartialEq,
{
    for entry in incoming {
        match target
            .iter_mut()
            .find(|existing| existing.entry_name() == entry.entry_name())
        {
            None => {
                summary.added.push(format!("{kind}/{}", entry.entry_name()));
                target.push(entry.clone());
            }
            Some(existing) if *existing == *entry => {
                summary.unchanged += 1;
            }
            Some(existing) => {
                info!(kind, name = entry.entry_name(), "replacing entry with incoming version");
                summary
                    .replaced
                    .push(format!("{kind}/{}", entry.entry_name()));
                *existing = entry.clone();
            }
        }
    }
}

/// Represents an entire multi-context kubeconfig file.
///
/// Field names and structure are byte-compatible with what cluster tooling
/// expects, since the persisted file is consumed by unrelated downstream
/// tools.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Kubeconfig {
    /// Schema marker, preserved verbatim from whichever source produced it.
    #[serde(rename = "apiVersion", default = "default_api_version")]
    pub api_version: String,

    /// Schema marker, preserved verbatim.
    #[serde(default = "default_kind")]
    pub kind: String,

    /// Cluster entries, keyed by unique name.
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,

    /// Context entries, keyed by unique name.
    #[serde(default)]
    pub contexts: Vec<NamedContext>,

    /// Name of the currently active context, or empty.
    #[serde(
        rename = "current-context",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub current_context: String,

    /// Opaque pass-through block, never interpreted.
    #[serde(default = "empty_mapping")]
    pub preferences: serde_yaml::Value,

    /// User entries, keyed by unique name.
    #[serde(default)]
    pub users: Vec<NamedUser>,
}

impl Default for Kubeconfig {
    fn default() -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            clusters: Vec::new(),
            contexts: Vec::new(),
            current_context: String::new(),
            preferences: empty_mapping(),
            users: Vec::new(),
        }
    }
}

impl Kubeconfig {
    /// Load a kubeconfig document from `path`.
    ///
    /// An absent file yields a well-formed empty document; this is the
    /// normal first-run case.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Io`] if an existing file cannot be read, and
    /// [`QbertError::Parse`] if its content is malformed (invalid YAML or
    /// duplicate entry names).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "kubeconfig does not exist, starting empty");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| QbertError::Parse(format!("{}: {e}", path.display())))
    }

    /// Parse a kubeconfig document from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Parse`] if the YAML is malformed or entry
    /// names are not unique within a set.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| QbertError::Parse(format!("malformed kubeconfig: {e}")))?;

        for (kind, dup) in [
            ("cluster", duplicate_name(config.clusters.iter().map(|c| c.name.as_str()))),
            ("user", duplicate_name(config.users.iter().map(|u| u.name.as_str()))),
            ("context", duplicate_name(config.contexts.iter().map(|c| c.name.as_str()))),
        ] {
            if let Some(name) = dup {
                return Err(QbertError::Parse(format!(
                    "duplicate {kind} name '{name}'"
                )));
            }
        }

        Ok(config)
    }

    /// Serialize the document to YAML.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Parse`] if serialization fails.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| QbertError::Parse(format!("failed to serialize kubeconfig: {e}")))
    }

    /// The default on-disk location: the `KUBECONFIG` environment variable
    /// if set, else `~/.kube/config`.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Config`] if the home directory cannot be
    /// determined when `KUBECONFIG` is not set.
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("KUBECONFIG") {
            return Ok(PathBuf::from(env_path));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| QbertError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".kube").join("config"))
    }

    /// Check that this document satisfies the kubeconfig invariants:
    /// unique entry names, every context referencing an existing cluster
    /// and user, and `current-context` (if non-empty) naming an existing
    /// context.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Validation`] naming the offending entry.
    pub fn validate(&self) -> Result<()> {
        for (kind, dup) in [
            ("cluster", duplicate_name(self.clusters.iter().map(|c| c.name.as_str()))),
            ("user", duplicate_name(self.users.iter().map(|u| u.name.as_str()))),
            ("context", duplicate_name(self.contexts.iter().map(|c| c.name.as_str()))),
        ] {
            if let Some(name) = dup {
                return Err(QbertError::Validation(format!(
                    "duplicate {kind} name '{name}'"
                )));
            }
        }

        for ctx in &self.contexts {
            if self.get_cluster(&ctx.context.cluster).is_none() {
                return Err(QbertError::Validation(format!(
                    "context '{}' references missing cluster '{}'",
                    ctx.name, ctx.context.cluster
                )));
            }
            if self.get_user(&ctx.context.user).is_none() {
                return Err(QbertError::Validation(format!(
                    "context '{}' references missing user '{}'",
                    ctx.name, ctx.context.user
                )));
            }
        }

        if !self.current_context.is_empty() && self.get_context(&self.current_context).is_none() {
            return Err(QbertError::Validation(format!(
                "current-context '{}' names no existing context",
                self.current_context
            )));
        }

        Ok(())
    }

    /// Merge `incoming` into this document.
    ///
    /// For each entry in the incoming cluster/user/context sets: insert it
    /// if the name is new, leave it alone if an identical entry already
    /// exists, or overwrite the existing entry if it differs (a refreshed
    /// credential for the same cluster name wins). Merging the same
    /// document twice is a no-op the second time.
    ///
    /// Whenever the incoming context set is non-empty, `current-context` is
    /// switched to the incoming document's context (the most recently
    /// fetched cluster becomes the active one); an incoming document with
    /// no contexts leaves the master's `current-context` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Validation`] if the incoming document itself
    /// violates the invariants (duplicate names, dangling references); the
    /// master is left unmodified in that case.
    pub fn merge(&mut self, incoming: &Kubeconfig) -> Result<MergeSummary> {
        incoming.validate().map_err(|e| match e {
            QbertError::Validation(msg) => {
                QbertError::Validation(format!("incoming document: {msg}"))
            }
            other => other,
        })?;

        let mut summary = MergeSummary::default();
        merge_entries(&mut self.clusters, &incoming.clusters, "cluster", &mut summary);
        merge_entries(&mut self.users, &incoming.users, "user", &mut summary);
        merge_entries(&mut self.contexts, &incoming.contexts, "context", &mut summary);

        if let Some(next) = incoming.active_context_name() {
            if next != self.current_context {
                debug!(from = %self.current_context, to = %next, "switching current-context");
            }
            self.current_context = next.to_string();
        }

        Ok(summary)
    }

    /// Serialize the document and write it atomically to `path`.
    ///
    /// The content is written to a temporary file in the target directory
    /// and renamed into place, so a crash mid-write never corrupts a
    /// previously saved file.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Io`] on permission or disk-space failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let yaml = self.to_yaml()?;

        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(yaml.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| QbertError::Io(e.error))?;

        debug!(path = %path.display(), "kubeconfig saved");
        Ok(())
    }

    /// Get a cluster entry by name.
    pub fn get_cluster(&self, name: &str) -> Option<&NamedCluster> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Get a user entry by name.
    pub fn get_user(&self, name: &str) -> Option<&NamedUser> {
        self.users.iter().find(|u| u.name == name)
    }

    /// Get a context entry by name.
    pub fn get_context(&self, name: &str) -> Option<&NamedContext> {
        self.contexts.iter().find(|c| c.name == name)
    }

    /// List all context names.
    pub fn context_names(&self) -> Vec<&str> {
        self.contexts.iter().map(|c| c.name.as_str()).collect()
    }

    /// True if the document has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty() && self.users.is_empty() && self.contexts.is_empty()
    }

    // The context this document itself designates as active: its own
    // current-context when that names one of its contexts, else its first
    // context. None when the context set is empty.
    fn active_context_name(&self) -> Option<&str> {
        if !self.current_context.is_empty() && self.get_context(&self.current_context).is_some() {
            return Some(&self.current_context);
        }
        self.contexts.first().map(|c| c.name.as_str())
    }
}
