use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub hub: HubConfig,
    #[serde(default)]
    pub content: ContentConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root of the pending/approved directory tree.
    pub data_dir: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

/// Target repositories and push behaviour for the dataset hub.
#[derive(Debug, Deserialize, Clone)]
pub struct HubConfig {
    #[serde(default)]
    pub raw_repo: Option<String>,
    #[serde(default)]
    pub cleaned_repo: Option<String>,
    #[serde(default)]
    pub chunked_repo: Option<String>,
    /// API base URL; overridable for self-hosted hubs and tests.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Best-effort per-file timeout so one hanging upload cannot stall
    /// the whole batch.
    #[serde(default = "default_push_timeout_secs")]
    pub push_timeout_secs: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            raw_repo: None,
            cleaned_repo: None,
            chunked_repo: None,
            endpoint: default_endpoint(),
            push_timeout_secs: default_push_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://huggingface.co".to_string()
}
fn default_push_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    #[serde(default = "default_language")]
    pub default_language: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            default_language: default_language(),
        }
    }
}

fn default_language() -> String {
    "ta".to_string()
}

impl Config {
    /// Minimal config rooted at the given directory, for tests and
    /// commands that run without a config file.
    pub fn minimal(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig {
                data_dir: data_dir.into(),
            },
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
            },
            hub: HubConfig::default(),
            content: ContentConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.storage.data_dir.as_os_str().is_empty() {
        anyhow::bail!("storage.data_dir must not be empty");
    }

    if config.server.bind.parse::<std::net::SocketAddr>().is_err() {
        anyhow::bail!(
            "server.bind must be a socket address, got '{}'",
            config.server.bind
        );
    }

    if config.hub.push_timeout_secs == 0 {
        anyhow::bail!("hub.push_timeout_secs must be > 0");
    }

    if config.content.default_language.trim().is_empty() {
        anyhow::bail!("content.default_language must not be empty");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let cfg: Config = toml::from_str(
            r#"
[storage]
data_dir = "./data"

[server]
bind = "127.0.0.1:7410"

[hub]
raw_repo = "acme/corpus-raw"
cleaned_repo = "acme/corpus-cleaned"
chunked_repo = "acme/corpus-chunked"
push_timeout_secs = 10

[content]
default_language = "ta"
"#,
        )
        .unwrap();

        assert_eq!(cfg.server.bind, "127.0.0.1:7410");
        assert_eq!(cfg.hub.raw_repo.as_deref(), Some("acme/corpus-raw"));
        assert_eq!(cfg.hub.push_timeout_secs, 10);
        assert_eq!(cfg.content.default_language, "ta");
    }

    #[test]
    fn test_defaults_apply() {
        let cfg: Config = toml::from_str(
            r#"
[storage]
data_dir = "./data"

[server]
bind = "127.0.0.1:7410"
"#,
        )
        .unwrap();

        assert_eq!(cfg.hub.endpoint, "https://huggingface.co");
        assert_eq!(cfg.hub.push_timeout_secs, 30);
        assert_eq!(cfg.content.default_language, "ta");
        assert!(cfg.hub.raw_repo.is_none());
    }
}
