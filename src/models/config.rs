use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "doc_knowledge";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub ingestion: IngestionConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("ragchat").join("config.toml"))
    }

    /// Load the config file (when present), then apply environment
    /// variable overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides matching the documented configuration
    /// surface: EMBEDDING_MODEL, LLM_MODEL, CHUNK_SIZE, CHUNK_OVERLAP,
    /// BATCH_SIZE, RETRIEVAL_K, QDRANT_URL, COLLECTION_NAME.
    fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(model) = std::env::var("LLM_MODEL") {
            self.llm.model = model;
        }
        if let Ok(v) = std::env::var("CHUNK_SIZE")
            && let Ok(n) = v.parse()
        {
            self.ingestion.chunk_size = n;
        }
        if let Ok(v) = std::env::var("CHUNK_OVERLAP")
            && let Ok(n) = v.parse()
        {
            self.ingestion.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("BATCH_SIZE")
            && let Ok(n) = v.parse()
        {
            self.ingestion.batch_size = n;
        }
        if let Ok(v) = std::env::var("RETRIEVAL_K")
            && let Ok(n) = v.parse()
        {
            self.query.top_k = n;
        }
        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.vector_store.url = url;
        }
        if let Ok(name) = std::env::var("COLLECTION_NAME") {
            self.vector_store.collection = name;
        }
    }

    /// Validate settings that would otherwise fail deep inside a run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ingestion.chunk_overlap >= self.ingestion.chunk_size {
            return Err(ConfigError::Validation(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.ingestion.chunk_overlap, self.ingestion.chunk_size
            )));
        }
        if self.ingestion.batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.query.top_k == 0 {
            return Err(ConfigError::Validation(
                "top_k must be at least 1".to_string(),
            ));
        }
        if let Some(0) = self.query.max_history_turns {
            return Err(ConfigError::Validation(
                "max_history_turns must be at least 1 when set".to_string(),
            ));
        }
        Ok(())
    }

    /// Read the OpenAI API key from the environment.
    ///
    /// Absence is a startup-time fatal error, never a per-call one.
    pub fn require_api_key() -> Result<String, ConfigError> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(ConfigError::MissingCredential("OPENAI_API_KEY".to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Vector width produced by the model. text-embedding-3-small
    /// produces 1536-dimensional vectors.
    #[serde(default = "default_embedding_dimension")]
    pub dimension: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimension() -> u32 {
    1536
}

fn default_timeout() -> u64 {
    120
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_openai_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            collection: default_collection(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Maximum new characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Trailing characters of the previous chunk carried into the next.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks embedded and appended per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_batch_size() -> usize {
    100
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/.git/**".to_string(),
        "**/node_modules/**".to_string(),
        "**/target/**".to_string(),
        "**/__pycache__/**".to_string(),
        "**/.venv/**".to_string(),
    ]
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            batch_size: default_batch_size(),
            max_file_size: default_max_file_size(),
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Retrieval width: chunks fed to the language model per question.
    #[serde(default = "default_top_k")]
    pub top_k: u64,

    /// Optional FIFO bound on remembered conversation turns. Unset
    /// means unbounded history.
    #[serde(default)]
    pub max_history_turns: Option<usize>,
}

fn default_top_k() -> u64 {
    4
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_history_turns: None,
        }
    }
}
