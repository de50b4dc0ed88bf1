use crate::error::*;
use std::time::Duration;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl CoreError {
    /// Errors raised by the embedding, index or generation collaborators at query time.
    pub fn is_external_service(&self) -> bool {
        matches!(
            self,
            CoreError::Llm(_)
                | CoreError::Embedding(_)
                | CoreError::Index(_)
                | CoreError::Network(_)
                | CoreError::Timeout { .. }
                | CoreError::RequestFailed { .. }
        )
    }
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::DataLoad(e) => {
                error!("Data load error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Embedding(e) => {
                error!("Embedding error details: {:?}", e);
            }
            CoreError::Index(e) => {
                error!("Index error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::Llm(e) => e.is_retryable(),
            CoreError::Embedding(e) => e.is_retryable(),
            CoreError::Network(_) => true,
            CoreError::Timeout { .. } => true,
            CoreError::RequestFailed { status_code, .. } => {
                matches!(status_code, Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::Llm(LlmError::RateLimitExceeded { retry_after, .. }) => {
                Some(Duration::from_secs(*retry_after))
            }
            CoreError::Timeout { seconds } => Some(Duration::from_secs(*seconds)),
            _ if self.is_retryable() => Some(Duration::from_secs(2)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::DataLoad(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Embedding(e) => e.user_friendly_message(),
            CoreError::Index(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::InvalidInput { message } => format!("Invalid input: {}", message),
            CoreError::Timeout { .. } => {
                "The operation took too long to complete. Please try again.".to_string()
            }
            CoreError::RequestFailed { message, .. } => {
                format!("Request failed: {}", message)
            }
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::DataLoad(_) => "DATA_LOAD".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Embedding(_) => "EMBEDDING".to_string(),
            CoreError::Index(_) => "INDEX".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::InvalidInput { .. } => "INVALID_INPUT".to_string(),
            CoreError::Timeout { .. } => "TIMEOUT".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
            CoreError::RequestFailed { .. } => "REQUEST_FAILED".to_string(),
        }
    }
}

impl ErrorExt for DataLoadError {
    fn log_error(&self) -> &Self {
        error!("DataLoadError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("DataLoadError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            DataLoadError::FileNotFound { path } => {
                format!("Post data file '{}' was not found.", path)
            }
            DataLoadError::Unreadable { path, .. } => {
                format!("Post data file '{}' could not be read.", path)
            }
            DataLoadError::InvalidJson { path, .. } => {
                format!("Post data file '{}' is not valid JSON.", path)
            }
            DataLoadError::NotASequence { .. } => {
                "Post data file must contain a list of posts.".to_string()
            }
            DataLoadError::InvalidTags { index, .. } => {
                format!("Post #{} has malformed tags.", index)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            DataLoadError::FileNotFound { .. } => "DATA_FILE_NOT_FOUND".to_string(),
            DataLoadError::Unreadable { .. } => "DATA_UNREADABLE".to_string(),
            DataLoadError::InvalidJson { .. } => "DATA_INVALID_JSON".to_string(),
            DataLoadError::NotASequence { .. } => "DATA_NOT_A_SEQUENCE".to_string(),
            DataLoadError::InvalidTags { .. } => "DATA_INVALID_TAGS".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!("LlmError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("LlmError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimitExceeded { .. }
                | LlmError::ServiceUnavailable { .. }
                | LlmError::RequestTimeout { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            LlmError::RateLimitExceeded { retry_after, .. } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ if self.is_retryable() => Some(Duration::from_secs(10)),
            _ => None,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey { provider } => format!(
                "Invalid API key for {}. Please update TOGETHER_API_KEY.",
                provider
            ),
            LlmError::RateLimitExceeded {
                provider,
                retry_after,
            } => format!(
                "Rate limit exceeded for {}. Please wait {} seconds.",
                provider, retry_after
            ),
            LlmError::ModelNotAvailable { model } => format!(
                "Model '{}' is not available. Please configure a different model.",
                model
            ),
            LlmError::ServiceUnavailable { provider, .. } => format!(
                "{} service is temporarily unavailable. Please try again later.",
                provider
            ),
            LlmError::RequestTimeout { provider } => {
                format!("{} did not answer in time. Please try again.", provider)
            }
            LlmError::InvalidPrompt { reason } => {
                format!("The question could not be sent to the model: {}", reason)
            }
            _ => "AI service error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE".to_string(),
            LlmError::InvalidPrompt { .. } => "LLM_INVALID_PROMPT".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for EmbeddingError {
    fn log_error(&self) -> &Self {
        error!("EmbeddingError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("EmbeddingError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(self, EmbeddingError::DownloadFailed { .. })
    }

    fn retry_after(&self) -> Option<Duration> {
        if self.is_retryable() {
            Some(Duration::from_secs(2))
        } else {
            None
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            EmbeddingError::ModelLoadingFailed { model, .. } => {
                format!("Failed to load embedding model '{}'.", model)
            }
            EmbeddingError::DownloadFailed { model, .. } => format!(
                "Failed to download embedding model '{}'. Please check your connection.",
                model
            ),
            _ => "Embedding processing error occurred. Please try again.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            EmbeddingError::ModelLoadingFailed { .. } => "EMBED_MODEL_LOAD_FAILED".to_string(),
            EmbeddingError::TokenizationFailed { .. } => "EMBED_TOKENIZATION_FAILED".to_string(),
            EmbeddingError::InferenceFailed { .. } => "EMBED_INFERENCE_FAILED".to_string(),
            EmbeddingError::DownloadFailed { .. } => "EMBED_DOWNLOAD_FAILED".to_string(),
        }
    }
}

impl ErrorExt for IndexError {
    fn log_error(&self) -> &Self {
        error!("IndexError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("IndexError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        "The search index is inconsistent with the embedding model. Please restart.".to_string()
    }

    fn error_code(&self) -> String {
        match self {
            IndexError::DimensionMismatch { .. } => "INDEX_DIMENSION_MISMATCH".to_string(),
            IndexError::EmptyVector => "INDEX_EMPTY_VECTOR".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false // Config errors need user intervention
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotReadable { path } => {
                format!("Configuration file '{}' could not be read.", path)
            }
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::Parse(_) => {
                "Configuration file format is invalid. Please check the settings.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotReadable { .. } => "CONFIG_FILE_NOT_READABLE".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

pub struct ErrorReporter {
    report_errors: bool,
    report_warnings: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self {
            report_errors: true,
            report_warnings: true,
        }
    }

    pub fn with_error_reporting(mut self, enabled: bool) -> Self {
        self.report_errors = enabled;
        self
    }

    pub fn with_warning_reporting(mut self, enabled: bool) -> Self {
        self.report_warnings = enabled;
        self
    }

    pub fn report_error(&self, error: &CoreError) {
        if self.report_errors {
            error.log_error();
            info!("Error code: {}", error.error_code());
            info!("User message: {}", error.user_friendly_message());
            if error.is_retryable() {
                if let Some(retry_after) = error.retry_after() {
                    info!("Error is retryable. Retry after: {:?}", retry_after);
                }
            }
        }
    }

    pub fn report_warning(&self, error: &CoreError) {
        if self.report_warnings {
            error.log_warn();
        }
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}
