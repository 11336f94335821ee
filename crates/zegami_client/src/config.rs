//! Client configuration.
//!
//! Loaded from ~/.config/zegami/client.toml or from ZEGAMI_* environment
//! variables. Read-only: this crate never writes tokens to disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ZegamiError};

const ENV_API_URL: &str = "ZEGAMI_API_URL";
const ENV_PROJECT: &str = "ZEGAMI_PROJECT";
const ENV_TOKEN: &str = "ZEGAMI_TOKEN";

/// Connection settings for one Zegami project.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// API base URL, including the trailing slash (e.g. "https://zegami.com/api/")
    pub api_url: String,
    /// Project identifier
    pub project: String,
    /// Bearer token
    pub token: String,
}

impl ClientConfig {
    pub fn new(
        api_url: impl Into<String>,
        project: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self { api_url: api_url.into(), project: project.into(), token: token.into() }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| ZegamiError::Config(e.to_string()))
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ZegamiError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Read ZEGAMI_API_URL, ZEGAMI_PROJECT and ZEGAMI_TOKEN.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. All three keys are required.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ZegamiError::Config(format!("{} is not set", key)))
        };
        Ok(Self {
            api_url: get(ENV_API_URL)?,
            project: get(ENV_PROJECT)?,
            token: get(ENV_TOKEN)?,
        })
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("project", &self.project)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Returns the path to the client config file.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("zegami/client.toml"))
}

/// Load the config file from the per-user config directory.
pub fn load_config() -> Result<ClientConfig> {
    let path = config_file_path()
        .ok_or_else(|| ZegamiError::Config("Could not determine config directory".into()))?;
    ClientConfig::from_path(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_from_toml() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_url = "https://zegami.com/api/"
            project = "p1"
            token = "tok"
            "#,
        )
        .unwrap();
        assert_eq!(config, ClientConfig::new("https://zegami.com/api/", "p1", "tok"));
    }

    #[test]
    fn test_config_missing_field() {
        let err = ClientConfig::from_toml_str(r#"api_url = "https://zegami.com/api/""#)
            .unwrap_err();
        assert!(matches!(err, ZegamiError::Config(_)));
    }

    #[test]
    fn test_config_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.toml");
        let config = ClientConfig::new("https://zegami.com/api/", "p1", "tok123");
        std::fs::write(&path, toml::to_string(&config).unwrap()).unwrap();

        let loaded = ClientConfig::from_path(&path).unwrap();
        assert_eq!(loaded.token, "tok123");
        assert_eq!(loaded.project, "p1");
    }

    #[test]
    fn test_config_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientConfig::from_path(&dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("nope.toml"));
    }

    #[test]
    fn test_config_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("ZEGAMI_API_URL", "https://zegami.com/api/"),
            ("ZEGAMI_PROJECT", "p1"),
            ("ZEGAMI_TOKEN", "tok"),
        ]
        .into_iter()
        .collect();

        let config = ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.api_url, "https://zegami.com/api/");
        assert_eq!(config.project, "p1");
        assert_eq!(config.token, "tok");
    }

    #[test]
    fn test_config_from_lookup_empty_token() {
        let err = ClientConfig::from_lookup(|k| match k {
            "ZEGAMI_TOKEN" => Some(String::new()),
            _ => Some("x".into()),
        })
        .unwrap_err();
        assert!(err.to_string().contains("ZEGAMI_TOKEN"));
    }

    #[test]
    fn test_config_debug_redacts_token() {
        let config = ClientConfig::new("https://zegami.com/api/", "p1", "supersecret");
        let dbg = format!("{:?}", config);
        assert!(dbg.contains("p1"));
        assert!(!dbg.contains("supersecret"));
    }

    #[test]
    fn test_config_file_path() {
        // No config dir without a home directory (bare CI containers)
        let Some(path) = config_file_path() else {
            return;
        };
        assert!(path.to_string_lossy().contains("zegami"));
        assert!(path.to_string_lossy().ends_with("client.toml"));
    }
}
