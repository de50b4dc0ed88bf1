use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Data load error: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Operation timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Request failed: {message}")]
    RequestFailed {
        message: String,
        status_code: Option<u16>,
    },
}

impl CoreError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("Data file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read data file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    #[error("Data file {path} is not valid JSON: {reason}")]
    InvalidJson { path: String, reason: String },

    #[error("Expected a JSON array of posts, found {found}")]
    NotASequence { found: String },

    #[error("Post #{index}: tags must be an object, found {found}")]
    InvalidTags { index: usize, found: String },
}

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API key invalid or missing for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Rate limit exceeded for {provider}. Retry after {retry_after} seconds")]
    RateLimitExceeded { provider: String, retry_after: u64 },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Invalid prompt: {reason}")]
    InvalidPrompt { reason: String },

    #[error("Provider service unavailable: {provider} (status {status_code})")]
    ServiceUnavailable { provider: String, status_code: u16 },

    #[error("Request timeout for {provider}")]
    RequestTimeout { provider: String },

    #[error("Invalid response format from {provider}: {details}")]
    InvalidResponseFormat { provider: String, details: String },
}

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Model loading failed: {model}: {reason}")]
    ModelLoadingFailed { model: String, reason: String },

    #[error("Tokenization failed: {text_length} characters: {reason}")]
    TokenizationFailed { text_length: usize, reason: String },

    #[error("Model inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("Model download failed: {model}/{file}: {reason}")]
    DownloadFailed {
        model: String,
        file: String,
        reason: String,
    },
}

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot index an empty vector")]
    EmptyVector,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not readable: {path}")]
    FileNotReadable { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}
