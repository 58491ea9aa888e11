//! Application configuration.
//!
//! Everything the pipeline needs is carried in one explicit [`AppConfig`]
//! value threaded through constructors; there is no process-wide mutable
//! settings object. Loaded from a YAML file with per-field defaults, so an
//! empty or missing file yields the stock research setup.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::errors::PipelineError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub retrieval: RetrievalConfig,
    /// Image paths handed to the batch driver by the demo binary.
    pub sources: Vec<String>,
    /// Optional directory for rolling log files.
    pub log_dir: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            llm: LlmConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            sources: Vec::new(),
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file. A missing file is not an
    /// error; unreadable or malformed YAML is.
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            tracing::info!("config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|err| {
            PipelineError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        serde_yaml::from_str(&contents).map_err(|err| {
            PipelineError::Config(format!("failed to parse {}: {}", path.display(), err))
        })
    }
}

/// OCR serving connection and model selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Base URL of the OCR serving endpoint.
    pub endpoint: String,
    /// Recognition language code ("ch", "en", "fr", ...).
    pub lang: String,
    /// Device the serving instance runs on ("cpu" or "gpu").
    pub device: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Extra request options forwarded to the engine unchanged.
    pub options: Map<String, Value>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8080".to_string(),
            lang: "ch".to_string(),
            device: "cpu".to_string(),
            timeout_secs: 120,
            options: Map::new(),
        }
    }
}

/// Chat model connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            model: "qwen-plus".to_string(),
            api_key_env: "DASHSCOPE_API_KEY".to_string(),
        }
    }
}

impl LlmConfig {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Option<String> {
        env::var(&self.api_key_env).ok().filter(|key| !key.is_empty())
    }
}

/// Embedding model selection and batching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding model identifier.
    pub model: String,
    /// How many texts to embed per provider call.
    pub batch_size: usize,
    /// Maximum characters per text sent to the embedding model; longer
    /// texts are clipped.
    pub max_input_length: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "text-embedding-v4".to_string(),
            batch_size: 6,
            max_input_length: 8192,
        }
    }
}

/// Retrieval behavior of the query engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Maximum number of documents included in the answer context.
    pub top_k: usize,
    /// Minimum cosine similarity for a document to qualify.
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 2,
            similarity_threshold: 0.0,
        }
    }
}
