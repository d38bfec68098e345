//! Runtime configuration
//!
//! Loaded from TOML, overridden by `RCA_*` environment variables.

use anyhow::Context;
use rca_remote::{CacheConfig, ClientConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub default_filter: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RcaConfig {
    pub client: ClientConfig,
    pub cache: CacheConfig,
    pub telemetry: TelemetryConfig,
}

impl RcaConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With client settings
    #[inline]
    #[must_use]
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// With cache settings
    #[inline]
    #[must_use]
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// With JSON log output
    #[inline]
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.telemetry.json = json;
        self
    }

    /// Parse TOML; missing keys keep their defaults.
    ///
    /// # Errors
    /// Fails on malformed TOML or mistyped values.
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        toml::from_str(text).context("parsing RCA configuration")
    }

    /// Read and parse a TOML file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading configuration from {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    /// Apply `RCA_*` variables from the process environment.
    ///
    /// # Errors
    /// Fails if a numeric variable does not parse.
    pub fn apply_env(self) -> anyhow::Result<Self> {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by the process environment.
    ///
    /// # Errors
    /// Fails if a numeric variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::default().apply_env()
    }

    fn apply_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        fn number(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<u64>> {
            lookup(name)
                .map(|v| v.trim().parse::<u64>().with_context(|| format!("{name} must be a number, got '{v}'")))
                .transpose()
        }

        if let Some(url) = lookup("RCA_BASE_URL") {
            self.client.base_url = url;
        }
        if let Some(token) = lookup("RCA_API_TOKEN") {
            self.client.api_token = Some(token);
        }
        if let Some(secs) = number(&lookup, "RCA_TIMEOUT_SECS")? {
            self.client.timeout_secs = secs;
        }
        if let Some(capacity) = number(&lookup, "RCA_CACHE_CAPACITY")? {
            self.cache.capacity = capacity;
        }
        if let Some(ttl) = number(&lookup, "RCA_CACHE_TTL_SECS")? {
            self.cache.ttl_secs = ttl;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = RcaConfig::from_toml_str(
            r#"
            [client]
            base_url = "https://compliance.example.edu/api"

            [cache]
            ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.client.base_url, "https://compliance.example.edu/api");
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.capacity, 1_000);
        assert_eq!(config.telemetry, TelemetryConfig::default());
    }

    #[test]
    fn malformed_toml_is_an_error() {
        let err = RcaConfig::from_toml_str("[client\nbase_url=").unwrap_err();
        assert!(err.to_string().contains("parsing RCA configuration"));
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telemetry]\njson = true").unwrap();
        let config = RcaConfig::from_file(file.path()).unwrap();
        assert!(config.telemetry.json);
    }

    #[test]
    fn missing_file_names_path() {
        let err = RcaConfig::from_file("/nonexistent/rca.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/rca.toml"));
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("RCA_BASE_URL", "https://override.example.edu"),
            ("RCA_API_TOKEN", "tok"),
            ("RCA_CACHE_CAPACITY", "5"),
        ]
        .into_iter()
        .collect();
        let config = RcaConfig::default()
            .apply_vars(|name| vars.get(name).map(|v| (*v).to_string()))
            .unwrap();
        assert_eq!(config.client.base_url, "https://override.example.edu");
        assert_eq!(config.client.api_token.as_deref(), Some("tok"));
        assert_eq!(config.cache.capacity, 5);
        assert_eq!(config.client.timeout_secs, 30);
    }

    #[test]
    fn bad_number_in_env() {
        let err = RcaConfig::default()
            .apply_vars(|name| (name == "RCA_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("RCA_TIMEOUT_SECS"));
    }
}
