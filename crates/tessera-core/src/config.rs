//! Configuration for requesters and participant nodes
//!
//! Loaded from TOML, overridden by `TESSERA_`-prefixed environment variables,
//! then validated with every field problem reported together.

use crate::errors::{Result, TesseraError};
use crate::validation::FieldValidator;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "TESSERA_";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Requester-side retrieval settings
    pub retrieval: RetrievalConfig,
    /// Participant-side settings
    pub node: NodeConfig,
}

/// Requester-side retrieval settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Relay endpoint, when a remote relay is used
    pub relay_uri: Option<String>,
    /// Per-participant transport timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum in-flight participant calls; 0 means unbounded
    pub max_concurrent_requests: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            relay_uri: None,
            request_timeout_ms: 10_000,
            max_concurrent_requests: 0,
        }
    }
}

impl RetrievalConfig {
    /// Per-participant timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Participant-side settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Maximum age of a requester authentication proof, in seconds
    pub max_auth_proof_age_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            max_auth_proof_age_secs: 3_600,
        }
    }
}

impl TesseraConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| TesseraError::invalid(format!("Invalid TOML: {e}")))
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TesseraError::internal(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment
    pub fn merge_with_env(&mut self) -> Result<()> {
        self.merge_with_vars(std::env::vars())
    }

    /// Apply overrides from `TESSERA_*` key/value pairs
    pub fn merge_with_vars<I>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "RELAY_URI" => self.retrieval.relay_uri = Some(value),
                "REQUEST_TIMEOUT_MS" => {
                    self.retrieval.request_timeout_ms = parse_number(&key, &value)?;
                }
                "MAX_CONCURRENT_REQUESTS" => {
                    self.retrieval.max_concurrent_requests = parse_number(&key, &value)?;
                }
                "MAX_AUTH_PROOF_AGE_SECS" => {
                    self.node.max_auth_proof_age_secs = parse_number(&key, &value)?;
                }
                _ => tracing::debug!(key = %key, "Ignoring unknown configuration override"),
            }
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let mut v = FieldValidator::new();
        v.range(
            "retrieval.request_timeout_ms",
            self.retrieval.request_timeout_ms,
            Some(1),
            None,
        )
        .range(
            "node.max_auth_proof_age_secs",
            self.node.max_auth_proof_age_secs,
            Some(1),
            None,
        );
        if let Some(uri) = &self.retrieval.relay_uri {
            v.custom(
                "retrieval.relay_uri",
                uri,
                |u| u.starts_with("http://") || u.starts_with("https://"),
                "Must be an http(s) URL",
            );
        }

        v.finish().map_err(|issues| {
            TesseraError::invalid(
                issues
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| TesseraError::invalid(format!("{key} must be a number, got {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(TesseraConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = TesseraConfig::from_toml_str(
            r#"
            [retrieval]
            relay_uri = "https://relay.example"
            "#,
        )
        .unwrap();
        assert_eq!(config.retrieval.relay_uri.as_deref(), Some("https://relay.example"));
        assert_eq!(config.retrieval.request_timeout_ms, 10_000);
        assert_eq!(config.node, NodeConfig::default());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = TesseraConfig::default();
        config
            .merge_with_vars(vec![
                ("TESSERA_REQUEST_TIMEOUT_MS".to_string(), "250".to_string()),
                ("TESSERA_MAX_AUTH_PROOF_AGE_SECS".to_string(), "60".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ])
            .unwrap();
        assert_eq!(config.retrieval.request_timeout_ms, 250);
        assert_eq!(config.node.max_auth_proof_age_secs, 60);
    }

    #[test]
    fn test_bad_env_number_is_rejected() {
        let mut config = TesseraConfig::default();
        let result = config.merge_with_vars(vec![(
            "TESSERA_REQUEST_TIMEOUT_MS".to_string(),
            "soon".to_string(),
        )]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_reports_every_field() {
        let mut config = TesseraConfig::default();
        config.retrieval.request_timeout_ms = 0;
        config.node.max_auth_proof_age_secs = 0;
        config.retrieval.relay_uri = Some("ftp://relay".into());

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("request_timeout_ms"));
        assert!(message.contains("max_auth_proof_age_secs"));
        assert!(message.contains("relay_uri"));
    }
}
