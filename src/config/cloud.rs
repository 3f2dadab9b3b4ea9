// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cloud credential discovery.
//!
//! The remote cluster manager sits behind an authenticating identity
//! service; a transport implementation needs an auth URL and user
//! credentials before any fetch is attempted. This module resolves those
//! from the process environment (`QBERT_AUTH_URL`, `QBERT_USERNAME`,
//! `QBERT_PASSWORD`, optionally `QBERT_PROJECT`/`QBERT_REGION`) or from a
//! clouds file with named cloud entries.
//!
//! Discovery failures are reported as [`QbertError::Config`] and are
//! terminal for the run; this library never exits the process on the
//! caller's behalf.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

use crate::error::{QbertError, Result};

/// Cloud name looked up when the caller does not select one.
const DEFAULT_CLOUD: &str = "defaults";

/// Authentication context for the remote cluster manager.
///
/// The contained credentials are opaque to this crate; they are handed to
/// whatever transport implements [`ClusterApi`](crate::client::ClusterApi).
#[derive(Clone, PartialEq)]
pub struct CloudCredentials {
    /// Identity service endpoint.
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub project: Option<String>,
    pub region: Option<String>,
}

// password never appears in logs or debug output
impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("auth_url", &self.auth_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("project", &self.project)
            .field("region", &self.region)
            .finish()
    }
}

#[derive(Debug, Default, Deserialize)]
struct CloudEntry {
    auth_url: Option<String>,
    username: Option<String>,
    password: Option<String>,
    project: Option<String>,
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloudsFile {
    #[serde(default)]
    clouds: HashMap<String, CloudEntry>,
}

impl CloudsFile {
    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QbertError::Config(format!(
                "Failed to read clouds file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| QbertError::Config(format!("Failed to parse clouds file: {e}")))
    }

    fn select(&self, name: &str) -> Result<CloudCredentials> {
        let entry = self.clouds.get(name).ok_or_else(|| {
            let mut available: Vec<&str> = self.clouds.keys().map(String::as_str).collect();
            available.sort_unstable();
            QbertError::Config(format!(
                "cloud '{name}' not found in clouds file (available: {})",
                available.join(", ")
            ))
        })?;

        let require = |field: &Option<String>, what: &str| {
            field.clone().ok_or_else(|| {
                QbertError::Config(format!("cloud '{name}' is missing {what}"))
            })
        };

        let auth_url = require(&entry.auth_url, "auth_url")?;
        validate_auth_url(&auth_url)?;

        Ok(CloudCredentials {
            auth_url,
            username: require(&entry.username, "username")?,
            password: require(&entry.password, "password")?,
            project: entry.project.clone(),
            region: entry.region.clone(),
        })
    }
}

fn validate_auth_url(auth_url: &str) -> Result<()> {
    Url::parse(auth_url)
        .map_err(|e| QbertError::Config(format!("invalid auth URL '{auth_url}': {e}")))?;
    Ok(())
}

impl CloudCredentials {
    /// Discover credentials for the given cloud.
    ///
    /// When `cloud_name` is `None`, environment variables are preferred
    /// and the clouds file's `defaults` entry is the fallback; a named
    /// cloud is always looked up in the clouds file.
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Config`] when no usable credential source is
    /// found, the message naming what is missing.
    pub fn discover(cloud_name: Option<&str>) -> Result<Self> {
        if cloud_name.is_none() {
            if let Some(creds) = Self::from_env()? {
                debug!("using cloud credentials from environment variables");
                return Ok(creds);
            }
        }

        let path = Self::clouds_path()?;
        debug!(path = %path.display(), "reading clouds file");
        CloudsFile::load(&path)?.select(cloud_name.unwrap_or(DEFAULT_CLOUD))
    }

    /// Read credentials from `QBERT_*` environment variables.
    ///
    /// Returns `Ok(None)` when `QBERT_AUTH_URL` is unset (no environment
    /// source configured at all).
    ///
    /// # Errors
    ///
    /// Returns [`QbertError::Config`] when the environment source is
    /// present but incomplete or the auth URL does not parse.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F: Fn(&str) -> Option<String>>(get: F) -> Result<Option<Self>> {
        let Some(auth_url) = get("QBERT_AUTH_URL") else {
            return Ok(None);
        };
        validate_auth_url(&auth_url)?;

        let required = |key: &str| {
            get(key).ok_or_else(|| {
                QbertError::Config(format!("QBERT_AUTH_URL is set but {key} is missing"))
            })
        };

        Ok(Some(Self {
            auth_url,
            username: required("QBERT_USERNAME")?,
            password: required("QBERT_PASSWORD")?,
            project: get("QBERT_PROJECT"),
            region: get("QBERT_REGION"),
        }))
    }

    /// Path of the clouds file: the `QBERT_CLOUDS_FILE` environment
    /// variable if set, else `~/.config/qbert/clouds.yaml`.
    pub fn clouds_path() -> Result<PathBuf> {
        if let Ok(env_path) = std::env::var("QBERT_CLOUDS_FILE") {
            return Ok(PathBuf::from(env_path));
        }
        let home = dirs::home_dir()
            .ok_or_else(|| QbertError::Config("Could not determine home directory".to_string()))?;
        Ok(home.join(".config").join("qbert").join("clouds.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CLOUDS: &str = r#"
clouds:
  defaults:
    auth_url: https://keystone.example:5000/v3
    username: svc-kubeconfig
    password: hunter2
    region: us-west-1
  staging:
    auth_url: https://keystone.staging.example:5000/v3
    username: stage-user
    password: stage-pass
    project: staging-project
  broken:
    username: nobody
"#;

    fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_string())
        }
    }

    #[test]
    fn test_select_default_cloud() {
        let file: CloudsFile = serde_yaml::from_str(SAMPLE_CLOUDS).unwrap();
        let creds = file.select("defaults").unwrap();

        assert_eq!(creds.auth_url, "https://keystone.example:5000/v3");
        assert_eq!(creds.username, "svc-kubeconfig");
        assert_eq!(creds.region, Some("us-west-1".to_string()));
        assert_eq!(creds.project, None);
    }

    #[test]
    fn test_select_named_cloud() {
        let file: CloudsFile = serde_yaml::from_str(SAMPLE_CLOUDS).unwrap();
        let creds = file.select("staging").unwrap();
        assert_eq!(creds.project, Some("staging-project".to_string()));
    }

    #[test]
    fn test_select_unknown_cloud_lists_available() {
        let file: CloudsFile = serde_yaml::from_str(SAMPLE_CLOUDS).unwrap();
        match file.select("production") {
            Err(QbertError::Config(msg)) => {
                assert!(msg.contains("broken, defaults, staging"), "{msg}");
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_select_incomplete_cloud() {
        let file: CloudsFile = serde_yaml::from_str(SAMPLE_CLOUDS).unwrap();
        match file.select("broken") {
            Err(QbertError::Config(msg)) => assert!(msg.contains("auth_url")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_clouds_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CloudsFile::load(&dir.path().join("clouds.yaml")).unwrap_err();
        assert!(matches!(err, QbertError::Config(_)));
    }

    #[test]
    fn test_from_vars_complete() {
        let creds = CloudCredentials::from_vars(env(&[
            ("QBERT_AUTH_URL", "https://keystone.example:5000/v3"),
            ("QBERT_USERNAME", "alice"),
            ("QBERT_PASSWORD", "pw"),
            ("QBERT_PROJECT", "proj"),
        ]))
        .unwrap()
        .unwrap();

        assert_eq!(creds.username, "alice");
        assert_eq!(creds.project, Some("proj".to_string()));
        assert_eq!(creds.region, None);
    }

    #[test]
    fn test_from_vars_unset_is_none() {
        assert!(CloudCredentials::from_vars(env(&[])).unwrap().is_none());
    }

    #[test]
    fn test_from_vars_incomplete() {
        let result = CloudCredentials::from_vars(env(&[
            ("QBERT_AUTH_URL", "https://keystone.example:5000/v3"),
            ("QBERT_USERNAME", "alice"),
        ]));
        match result {
            Err(QbertError::Config(msg)) => assert!(msg.contains("QBERT_PASSWORD")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_from_vars_bad_url() {
        let result = CloudCredentials::from_vars(env(&[
            ("QBERT_AUTH_URL", "not a url"),
            ("QBERT_USERNAME", "alice"),
            ("QBERT_PASSWORD", "pw"),
        ]));
        assert!(matches!(result, Err(QbertError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = CloudCredentials {
            auth_url: "https://keystone.example:5000/v3".to_string(),
            username: "alice".to_string(),
            password: "hunter2".to_string(),
            project: None,
            region: None,
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("hunter2"));
    }
}
