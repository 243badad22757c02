use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use client_core::CacheConfig;
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "viewer.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub graphql_endpoint: String,
    pub request_timeout_seconds: u64,
    pub cache_capacity: usize,
    pub cache_ttl_seconds: Option<u64>,
    pub default_limit: i64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            graphql_endpoint: "http://localhost:8000/graphql".into(),
            request_timeout_seconds: 30,
            cache_capacity: client_core::cache::DEFAULT_CACHE_CAPACITY,
            cache_ttl_seconds: None,
            default_limit: 12,
        }
    }
}

/// Every key is optional; missing keys keep their defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    graphql_endpoint: Option<String>,
    request_timeout_seconds: Option<u64>,
    cache_capacity: Option<usize>,
    cache_ttl_seconds: Option<u64>,
    default_limit: Option<i64>,
}

impl Settings {
    pub fn endpoint(&self) -> anyhow::Result<Url> {
        let url = Url::parse(self.graphql_endpoint.trim())
            .with_context(|| format!("invalid graphql endpoint '{}'", self.graphql_endpoint))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "graphql endpoint '{}' must use http or https",
                self.graphql_endpoint
            );
        }
        Ok(url)
    }

    /// Rejects values that would make every request or cache read fail.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.request_timeout_seconds == 0 {
            bail!("request_timeout_seconds must be at least 1");
        }
        if self.cache_capacity == 0 {
            bail!("cache_capacity must be at least 1");
        }
        if self.cache_ttl_seconds == Some(0) {
            bail!("cache_ttl_seconds must be at least 1; leave it unset to keep entries until evicted");
        }
        if self.default_limit <= 0 {
            bail!("default_limit must be a positive integer, got {}", self.default_limit);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            capacity: self.cache_capacity,
            ttl: self.cache_ttl_seconds.map(Duration::from_secs),
        }
    }

    fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.graphql_endpoint {
            self.graphql_endpoint = v;
        }
        if let Some(v) = file.request_timeout_seconds {
            self.request_timeout_seconds = v;
        }
        if let Some(v) = file.cache_capacity {
            self.cache_capacity = v;
        }
        if let Some(v) = file.cache_ttl_seconds {
            self.cache_ttl_seconds = Some(v);
        }
        if let Some(v) = file.default_limit {
            self.default_limit = v;
        }
    }
}

/// Defaults, then the config file, then environment variables.
///
/// An explicit `path` must exist; without one, `viewer.toml` in the working
/// directory is read when present.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file_path = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|path| path.exists()),
    };
    if let Some(file_path) = file_path {
        let raw = fs::read_to_string(&file_path)
            .with_context(|| format!("failed to read config file '{}'", file_path.display()))?;
        let file: FileSettings = toml::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", file_path.display()))?;
        settings.apply_file(file);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok())?;
    settings.validate()?;
    Ok(settings)
}

/// `APP__*` wins over the bare `GRAPHQL_ENDPOINT`. An empty
/// `APP__CACHE_TTL_SECONDS` turns the TTL off.
pub fn apply_env_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = lookup("GRAPHQL_ENDPOINT") {
        settings.graphql_endpoint = v;
    }
    if let Some(v) = lookup("APP__GRAPHQL_ENDPOINT") {
        settings.graphql_endpoint = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
        settings.request_timeout_seconds = parse_env("APP__REQUEST_TIMEOUT_SECONDS", &v)?;
    }
    if let Some(v) = lookup("APP__CACHE_CAPACITY") {
        settings.cache_capacity = parse_env("APP__CACHE_CAPACITY", &v)?;
    }
    if let Some(v) = lookup("APP__CACHE_TTL_SECONDS") {
        settings.cache_ttl_seconds = if v.trim().is_empty() {
            None
        } else {
            Some(parse_env("APP__CACHE_TTL_SECONDS", &v)?)
        };
    }
    if let Some(v) = lookup("APP__DEFAULT_LIMIT") {
        settings.default_limit = parse_env("APP__DEFAULT_LIMIT", &v)?;
    }

    Ok(())
}

fn parse_env<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} has invalid value '{raw}'"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
