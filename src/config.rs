use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use thiserror::Error;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_DOCS_DIR: &str = "data/legal_docs";
const DEFAULT_VECTOR_STORE_PATH: &str = "data/vector_store";
const DEFAULT_COLLECTION_NAME: &str = "legal_documents";
const DEFAULT_EMBEDDING_MODEL: &str = "all-minilm";
const DEFAULT_EMBEDDING_DIMENSION: usize = 384;
const DEFAULT_CHUNK_SIZE: usize = 1000;
const DEFAULT_TOP_K: usize = 3;
const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_TEMPERATURE: f32 = 0.2;
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Runtime configuration for the legal assistant.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API key for the hosted Gemini model. Startup fails without it.
    pub google_api_key: String,
    /// Gemini model identifier used for every prompt.
    pub gemini_model: String,
    /// Optional override for the Gemini REST base URL.
    pub gemini_base_url: Option<String>,
    /// Sampling temperature passed with each generation request.
    pub llm_temperature: f32,
    /// Timeout applied to outbound LLM and embedding HTTP requests.
    pub llm_timeout_secs: u64,
    /// Directory scanned for `*.pdf` files at startup.
    pub docs_dir: PathBuf,
    /// Character budget per chunk.
    pub chunk_size: usize,
    /// Vector store backend holding the chunk embeddings.
    pub vector_store: VectorStoreKind,
    /// Directory used by the local store for its persisted collections.
    pub vector_store_path: PathBuf,
    /// Collection holding the indexed chunks.
    pub collection_name: String,
    /// Base URL of the Qdrant instance when the `qdrant` backend is selected.
    pub qdrant_url: Option<String>,
    /// Optional API key required to access Qdrant.
    pub qdrant_api_key: Option<String>,
    /// Embedding provider used to generate vector representations.
    pub embedding_provider: EmbeddingProvider,
    /// Embedding model identifier passed to the provider.
    pub embedding_model: String,
    /// Dimensionality of the produced vectors.
    pub embedding_dimension: usize,
    /// Base URL of the Ollama runtime for the `ollama` embedding provider.
    pub ollama_url: Option<String>,
    /// Number of chunks retrieved per legal query.
    pub retrieval_top_k: usize,
    /// Rebuild the index from the PDFs even if a persisted collection exists.
    pub reindex_on_startup: bool,
    /// Port the HTTP server binds to.
    pub server_port: u16,
}

/// Supported embedding backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Deterministic in-process token hashing; needs no external service.
    Hash,
    /// Local Ollama runtime.
    Ollama,
}

/// Supported vector store backends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreKind {
    /// In-process store persisted as JSON under `vector_store_path`.
    Local,
    /// Remote Qdrant instance reached over HTTP.
    Qdrant,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);
        let chunk_size = vars.parse_or("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        if chunk_size == 0 {
            return Err(ConfigError::InvalidValue("CHUNK_SIZE".into()));
        }
        let embedding_dimension = vars.parse_or("EMBEDDING_DIMENSION", DEFAULT_EMBEDDING_DIMENSION)?;
        if embedding_dimension == 0 {
            return Err(ConfigError::InvalidValue("EMBEDDING_DIMENSION".into()));
        }
        let retrieval_top_k = vars.parse_or("RETRIEVAL_TOP_K", DEFAULT_TOP_K)?.max(1);

        let vector_store = match vars.optional("VECTOR_STORE") {
            Some(value) => value
                .parse()
                .map_err(|()| ConfigError::InvalidValue("VECTOR_STORE".into()))?,
            None => VectorStoreKind::Local,
        };
        let qdrant_url = vars.optional("QDRANT_URL");
        if vector_store == VectorStoreKind::Qdrant && qdrant_url.is_none() {
            return Err(ConfigError::MissingVariable("QDRANT_URL".into()));
        }

        Ok(Self {
            google_api_key: vars.required("GOOGLE_API_KEY")?,
            gemini_model: vars
                .optional("GEMINI_MODEL")
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            gemini_base_url: vars.optional("GEMINI_BASE_URL"),
            llm_temperature: vars.parse_or("LLM_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            llm_timeout_secs: vars.parse_or("LLM_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
            docs_dir: vars
                .optional("DOCS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOCS_DIR)),
            chunk_size,
            vector_store,
            vector_store_path: vars
                .optional("VECTOR_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_VECTOR_STORE_PATH)),
            collection_name: vars
                .optional("COLLECTION_NAME")
                .unwrap_or_else(|| DEFAULT_COLLECTION_NAME.to_string()),
            qdrant_url,
            qdrant_api_key: vars.optional("QDRANT_API_KEY"),
            embedding_provider: match vars.optional("EMBEDDING_PROVIDER") {
                Some(value) => value
                    .parse()
                    .map_err(|()| ConfigError::InvalidValue("EMBEDDING_PROVIDER".into()))?,
                None => EmbeddingProvider::Hash,
            },
            embedding_model: vars
                .optional("EMBEDDING_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimension,
            ollama_url: vars.optional("OLLAMA_URL"),
            retrieval_top_k,
            reindex_on_startup: vars
                .optional("REINDEX_ON_STARTUP")
                .map(|value| parse_flag(&value))
                .transpose()?
                .unwrap_or(false),
            server_port: vars.parse_or("SERVER_PORT", DEFAULT_SERVER_PORT)?,
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
    }

    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    fn parse_or<T: std::str::FromStr>(&self, key: &str, default: T) -> Result<T, ConfigError> {
        self.optional(key)
            .map(|value| {
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue(key.to_string()))
            })
            .transpose()
            .map(|value| value.unwrap_or(default))
    }
}

fn parse_flag(value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue("REINDEX_ON_STARTUP".into())),
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hash" => Ok(Self::Hash),
            "ollama" => Ok(Self::Ollama),
            _ => Err(()),
        }
    }
}

impl std::str::FromStr for VectorStoreKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "qdrant" => Ok(Self::Qdrant),
            _ => Err(()),
        }
    }
}

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Load configuration from the environment and install it in the global cache.
///
/// A missing `GOOGLE_API_KEY` surfaces here, before any request is served.
pub fn init_config() -> Result<&'static Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        model = %config.gemini_model,
        docs_dir = %config.docs_dir.display(),
        chunk_size = config.chunk_size,
        vector_store = ?config.vector_store,
        embedding_provider = ?config.embedding_provider,
        server_port = config.server_port,
        "Loaded configuration"
    );
    Ok(CONFIG.get_or_init(|| config))
}
