//! Configuration
//!
//! YAML with kebab-case keys. Without `--config` the first readable file of
//! `./.legallens.yml` and `~/.config/legallens/legallens.yml` wins; with no
//! file at all the defaults apply.

use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Project-local config file name
const LOCAL_CONFIG: &str = ".legallens.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,

    pub prompts: PromptsConfig,

    /// Default log level; `--log-level` takes precedence
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Fail fast when the provider cannot be reached with this config
    ///
    /// Only the commands that call a model need this.
    pub fn validate(&self) -> Result<()> {
        self.llm.get_api_key().map(|_| ()).map_err(|_| {
            eyre::eyre!(
                "LLM API key not found. Set the {} environment variable.",
                self.llm.api_key_env
            )
        })
    }

    /// Load the explicit file, or the first readable default location
    ///
    /// An explicit path must load; default locations that fail to parse are
    /// skipped with a warning.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).with_context(|| format!("Failed to load config from {}", path.display()));
        }

        for path in default_paths().into_iter().filter(|p| p.exists()) {
            match Self::load_from_file(&path) {
                Ok(config) => return Ok(config),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable config"),
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed here; the full `load` reports them once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => default_paths(),
        };

        candidates
            .into_iter()
            .filter(|p| p.exists())
            .find_map(|p| Self::load_from_file(&p).ok())
            .and_then(|c| c.log_level)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "load_from_file: called");
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// Default locations, most specific first
fn default_paths() -> Vec<PathBuf> {
    std::iter::once(PathBuf::from(LOCAL_CONFIG))
        .chain(dirs::config_dir().map(|d| d.join("legallens").join("legallens.yml")))
        .collect()
}

/// Model provider settings under `llm:`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct LlmConfig {
    /// "anthropic" or "openai"
    pub provider: String,
    pub model: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub base_url: String,
    /// Upper bound on reply tokens for every operation
    pub max_tokens: u32,
    pub timeout_ms: u64,
    /// Transport retries for transient HTTP failures; operations never retry
    pub max_retries: u32,
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        let key = std::env::var(&self.api_key_env)
            .map_err(|_| eyre::eyre!("Environment variable {} is not set", self.api_key_env))?;
        if key.trim().is_empty() {
            return Err(eyre::eyre!("Environment variable {} is empty", self.api_key_env));
        }
        Ok(key)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 120_000,
            max_retries: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory holding `{name}.pmt` overrides
    pub dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.max_retries, 0);
        assert!(config.prompts.dir.is_none());
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_llm_config_defaults() {
        let config = LlmConfig::default();

        assert_eq!(config.provider, "anthropic");
        assert!(config.model.contains("sonnet"));
        assert_eq!(config.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url, "https://api.anthropic.com");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o
  api-key-env: MY_API_KEY
  base-url: https://api.example.com
  max-tokens: 4096
  timeout-ms: 60000
  max-retries: 2

prompts:
  dir: /etc/legallens/prompts

log-level: debug
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 4096);
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.prompts.dir, Some(PathBuf::from("/etc/legallens/prompts")));
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: claude-haiku
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "claude-haiku");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.llm.api_key_env, "ANTHROPIC_API_KEY");
        assert_eq!(config.llm.timeout_ms, 120_000);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lens.yml");
        std::fs::write(&path, "log-level: warn\nllm:\n  provider: openai\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(Config::load_log_level(Some(&path)).as_deref(), Some("warn"));
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let path = PathBuf::from("/nonexistent/legallens.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert!(Config::load_log_level(Some(&path)).is_none());
    }

    #[test]
    fn test_get_api_key_missing_env() {
        let config = LlmConfig {
            api_key_env: "LEGALLENS_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..Default::default()
        };
        assert!(config.get_api_key().is_err());
    }
}
