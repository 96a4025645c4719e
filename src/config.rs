use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Result, RoveError};

#[derive(Debug, Clone, Deserialize)]
pub struct SshConfig {
    pub public_url: String,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            public_url: "ssh://localhost:23231".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub spinner_interval_ms: u64,
    pub render_rate_ms: u64,
    pub log_page_size: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            spinner_interval_ms: 100,
            render_rate_ms: 16,
            log_page_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ssh: SshConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("rove").join("config.toml"))
}

impl Config {
    /// Load the user config, falling back to defaults when it is missing or broken.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match Config::from_toml(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring {}: {}", path.display(), e);
                Config::default()
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RoveError::Config(e.to_string()))
    }

    pub fn spinner_interval(&self) -> Duration {
        Duration::from_millis(self.ui.spinner_interval_ms)
    }

    pub fn render_rate(&self) -> Duration {
        Duration::from_millis(self.ui.render_rate_ms.max(1))
    }
}

/// Strip slashes and a trailing `.git` from a repository name.
pub fn sanitize_repo(name: &str) -> String {
    let name = name.trim().trim_matches('/');
    name.strip_suffix(".git").unwrap_or(name).to_string()
}

/// Build the clone URL for a repository served under `public_url`.
///
/// SSH URLs on the default port use the scp-like `git@host:repo.git` form.
pub fn repo_url(public_url: &str, name: &str) -> String {
    let name = format!("{}.git", sanitize_repo(name));

    if let Some(rest) = public_url.strip_prefix("ssh://") {
        let authority = rest.split('/').next().unwrap_or("");
        // Drop any user@ part
        let host_port = authority.rsplit('@').next().unwrap_or(authority);
        let (host, port) = host_port.split_once(':').unwrap_or((host_port, ""));
        if port.is_empty() || port == "22" {
            return format!("git@{}:{}", host, name);
        }
        return format!("ssh://{}:{}/{}", host, port, name);
    }

    format!("{}/{}", public_url.trim_end_matches('/'), name)
}

/// The command shown in the header and copied on click.
pub fn clone_cmd(public_url: &str, name: &str) -> String {
    format!("git clone {}", repo_url(public_url, name))
}
