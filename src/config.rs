use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::filters::FilterSpec;
use crate::mastodon::DEFAULT_INSTANCE;

const DEFAULT_ENV_PREFIX: &str = "MASTODON_COMMENTS";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub mastodon: MastodonConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MastodonConfig {
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for MastodonConfig {
    fn default() -> Self {
        Self {
            instance: default_instance(),
            user_agent: default_user_agent(),
            timeout: default_timeout(),
        }
    }
}

fn default_instance() -> String {
    DEFAULT_INSTANCE.to_string()
}

fn default_user_agent() -> String {
    format!("mastodon-comments/{}", crate::VERSION)
}

fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CommentsConfig {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterSpec>,
}

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub config_file: Option<PathBuf>,
    pub env_prefix: Option<String>,
}

pub fn load(options: LoadOptions) -> Result<Config> {
    let mut cfg = Config::default();

    if let Some(path) = options.config_file.as_ref() {
        if path.exists() {
            let from_file = read_config_file(path)?;
            cfg = merge_config(cfg, from_file);
        }
    } else if let Some(default_path) = default_config_path() {
        if default_path.exists() {
            let from_file = read_config_file(&default_path)?;
            cfg = merge_config(cfg, from_file);
        }
    }

    let prefix = options.env_prefix.as_deref().unwrap_or(DEFAULT_ENV_PREFIX);
    cfg = apply_env(cfg, prefix)?;

    Ok(cfg)
}

fn read_config_file(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;
    let config: Config = serde_yaml::from_str(&data)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))?;
    Ok(config)
}

fn merge_config(mut base: Config, other: Config) -> Config {
    if !other.mastodon.instance.is_empty() {
        base.mastodon.instance = other.mastodon.instance;
    }
    if !other.mastodon.user_agent.is_empty() {
        base.mastodon.user_agent = other.mastodon.user_agent;
    }
    if !other.mastodon.timeout.is_zero() {
        base.mastodon.timeout = other.mastodon.timeout;
    }

    if other.comments.author.is_some() {
        base.comments.author = other.comments.author;
    }
    if !other.comments.filters.is_empty() {
        base.comments.filters = other.comments.filters;
    }

    base
}

fn apply_env(mut cfg: Config, prefix: &str) -> Result<Config> {
    let mut map: HashMap<String, String> = HashMap::new();
    let upper_prefix = format!("{}_", prefix.to_uppercase());

    for (key, value) in env::vars() {
        if let Some(stripped) = key.strip_prefix(&upper_prefix) {
            let normalized = stripped.to_ascii_lowercase().replace("__", ".");
            map.insert(normalized, value);
        }
    }

    for (key, value) in map {
        apply_env_value(&mut cfg, &key, value)?;
    }

    Ok(cfg)
}

fn apply_env_value(cfg: &mut Config, key: &str, value: String) -> Result<()> {
    match key {
        "mastodon.instance" => cfg.mastodon.instance = value,
        "mastodon.user_agent" => cfg.mastodon.user_agent = value,
        "mastodon.timeout" => {
            if let Ok(duration) = humantime::parse_duration(&value) {
                cfg.mastodon.timeout = duration;
            }
        }
        "comments.author" => {
            let author = value.trim();
            cfg.comments.author = (!author.is_empty()).then(|| author.to_string());
        }
        "comments.filters" => {
            cfg.comments.filters = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(FilterSpec::parse)
                .collect::<Result<_>>()
                .with_context(|| format!("config: invalid comments.filters {value:?}"))?;
        }
        _ => {}
    }
    Ok(())
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mastodon-comments").join("config.yaml"))
}
