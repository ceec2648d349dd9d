use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::report::OutputFormat;

pub const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 1024;
pub const DEFAULT_CHAT_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_STORE_NAME: &str = "mdrag.db";
pub const DEFAULT_SPLIT_MARKER: &str = "###";

/// Environment variable holding the embedding API key.
pub const EMBEDDING_API_KEY_VAR: &str = "MDRAG_EMBEDDING_API_KEY";
/// Environment variable holding the chat API key.
pub const CHAT_API_KEY_VAR: &str = "MDRAG_CHAT_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub split: SplitConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mdrag").join("config.toml"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Number of chunks embedded per request group during ingestion.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Fixed pause between ingestion groups, to stay under the backend's
    /// rate limit. Not a tuning knob for throughput.
    #[serde(default = "default_batch_pause")]
    pub batch_pause_secs: u64,
}

fn default_embedding_url() -> String {
    DEFAULT_EMBEDDING_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_embedding_dimension() -> usize {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_timeout() -> u64 {
    60
}

fn default_batch_size() -> usize {
    3
}

fn default_batch_pause() -> u64 {
    2
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_embedding_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_timeout(),
            batch_size: default_batch_size(),
            batch_pause_secs: default_batch_pause(),
        }
    }
}

impl EmbeddingConfig {
    /// API keys come from the environment only; the config file never
    /// carries secret material.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(EMBEDDING_API_KEY_VAR).ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_url")]
    pub url: String,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_chat_url() -> String {
    DEFAULT_CHAT_URL.to_string()
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_temperature() -> f32 {
    0.1
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            url: default_chat_url(),
            model: default_chat_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout(),
        }
    }
}

impl ChatConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(CHAT_API_KEY_VAR).ok().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Database name; also the name of the store directory on disk.
    #[serde(default = "default_store_name")]
    pub name: String,

    /// Parent directory for store directories. Defaults to the platform
    /// data dir when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,

    /// Chunk id prefix for this store.
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
}

fn default_store_name() -> String {
    DEFAULT_STORE_NAME.to_string()
}

fn default_id_prefix() -> String {
    "chunk".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: default_store_name(),
            data_dir: None,
            id_prefix: default_id_prefix(),
        }
    }
}

impl StoreConfig {
    /// Directory holding this store, keyed by the database name.
    pub fn store_dir(&self) -> Result<PathBuf, crate::error::ConfigError> {
        let base = match &self.data_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .ok_or_else(|| {
                    crate::error::ConfigError::PathError(
                        "could not determine data directory".to_string(),
                    )
                })?
                .join("mdrag"),
        };
        Ok(base.join(&self.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Heading prefix that starts a new chunk, e.g. `###`.
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker() -> String {
    DEFAULT_SPLIT_MARKER.to_string()
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Token budget for the generated context.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,
}

fn default_k() -> usize {
    5
}

fn default_max_context_tokens() -> usize {
    3000
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: default_k(),
            max_context_tokens: default_max_context_tokens(),
        }
    }
}

/// Which answer generator backs `ask`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// Hosted chat-completion API.
    Remote,
    /// Keyword-dispatched canned answers; needs no credentials.
    #[default]
    RuleBased,
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remote" | "llm" => Ok(StrategyKind::Remote),
            "rule-based" | "rulebased" | "rules" => Ok(StrategyKind::RuleBased),
            _ => Err(format!("unknown generation strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyKind::Remote => write!(f, "remote"),
            StrategyKind::RuleBased => write!(f, "rule-based"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    #[serde(default)]
    pub strategy: StrategyKind,

    /// Fixed pause between queries in batch mode.
    #[serde(default = "default_query_pause")]
    pub query_pause_secs: u64,
}

fn default_query_pause() -> u64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.url, DEFAULT_EMBEDDING_URL);
        assert_eq!(config.embedding.dimension, DEFAULT_EMBEDDING_DIMENSION);
        assert_eq!(config.store.name, DEFAULT_STORE_NAME);
        assert_eq!(config.split.marker, "###");
        assert_eq!(config.retrieval.default_k, 5);
        assert_eq!(config.generation.strategy, StrategyKind::RuleBased);
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.is_some());
    }

    #[test]
    fn test_embedding_config_default() {
        let config = EmbeddingConfig::default();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.batch_pause_secs, 2);
    }

    #[test]
    fn test_store_dir_uses_name() {
        let config = StoreConfig {
            data_dir: Some(PathBuf::from("/tmp/mdrag-test")),
            ..Default::default()
        };
        let dir = config.store_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/mdrag-test").join(DEFAULT_STORE_NAME));
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("remote".parse::<StrategyKind>().unwrap(), StrategyKind::Remote);
        assert_eq!(
            "rule-based".parse::<StrategyKind>().unwrap(),
            StrategyKind::RuleBased
        );
        assert!("canned".parse::<StrategyKind>().is_err());
    }

    #[test]
    fn test_config_roundtrip_has_no_secrets() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(!serialized.contains("api_key"));
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.chat.model, DEFAULT_CHAT_MODEL);
    }
}
