use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application configuration.
///
/// Loaded from an optional TOML file merged with `PUBMED_AGENT_*`
/// environment variables; every field has a sensible default so an empty
/// configuration is valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub agent: AgentConfig,
    pub pubmed: PubMedConfig,
    pub translation: TranslationConfig,
}

/// Execution limits shared by every tool the agent owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Upper bound on concurrently in-flight tool operations.
    pub max_concurrent_tasks: usize,
    /// Default per-attempt deadline in seconds.
    pub timeout_secs: u64,
    /// Default retry budget per operation.
    pub max_retries: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 10,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// NCBI E-utilities settings for the PubMed tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PubMedConfig {
    /// E-utilities root, without a trailing slash.
    pub base_url: String,
    /// Optional NCBI API key; raises the rate limit when present.
    pub api_key: Option<String>,
    /// Cap on PMIDs returned by a single search.
    pub max_search_results: u32,
    pub user_agent: String,
}

impl Default for PubMedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            api_key: None,
            max_search_results: 100,
            user_agent: concat!("pubmed-agent/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// OpenAI-compatible backend settings for the translation tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub base_url: String,
    /// API key; also read from `PUBMED_AGENT_TRANSLATION__API_KEY`.
    pub api_key: Option<String>,
    pub model: String,
    /// Language used when a request does not name one.
    pub target_language: String,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            target_language: "Chinese".to_string(),
        }
    }
}

impl Config {
    /// Load configuration, merging (in order) defaults, an optional TOML
    /// file, and environment variables prefixed with `PUBMED_AGENT`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(config::File::from(path));
            }
            None => {
                if let Some(default_path) = Self::default_path() {
                    builder =
                        builder.add_source(config::File::from(default_path).required(false));
                }
            }
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("PUBMED_AGENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Default config file location: `<config dir>/pubmed-agent/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pubmed-agent").join("config.toml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.pubmed.base_url.is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "pubmed.base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.translation.base_url.is_empty() {
            return Err(crate::Error::InvalidInput {
                field: "translation.base_url".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.pubmed.max_search_results == 0 {
            return Err(crate::Error::InvalidInput {
                field: "pubmed.max_search_results".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_limits() {
        let config = Config::default();
        assert_eq!(config.agent.max_concurrent_tasks, 10);
        assert_eq!(config.agent.timeout(), Duration::from_secs(30));
        assert_eq!(config.agent.max_retries, 3);
        assert_eq!(config.pubmed.max_search_results, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn loads_partial_toml_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        writeln!(
            file,
            "[agent]\nmax_concurrent_tasks = 4\n\n[pubmed]\nmax_search_results = 25\n"
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.agent.max_concurrent_tasks, 4);
        // Untouched sections keep their defaults.
        assert_eq!(config.agent.max_retries, 3);
        assert_eq!(config.pubmed.max_search_results, 25);
    }

    #[test]
    fn rejects_zero_search_results() {
        let mut config = Config::default();
        config.pubmed.max_search_results = 0;
        assert!(config.validate().is_err());
    }
}
