use solefacts_core::{
    ConfigError, CoreError, DataLoadError, EmbeddingError, ErrorExt, ErrorReporter, IndexError,
    LlmError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let data_error = CoreError::DataLoad(DataLoadError::NotASequence {
        found: "object".to_string(),
    });
    assert_eq!(data_error.error_code(), "DATA_LOAD");

    let llm_error = CoreError::Llm(LlmError::InvalidApiKey {
        provider: "together".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM");

    let embedding_error = CoreError::Embedding(EmbeddingError::InferenceFailed {
        reason: "shape".to_string(),
    });
    assert_eq!(embedding_error.error_code(), "EMBEDDING");

    let index_error = CoreError::Index(IndexError::DimensionMismatch {
        expected: 384,
        actual: 3,
    });
    assert_eq!(index_error.error_code(), "INDEX");

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "TOGETHER_API_KEY".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_retryable_errors() {
    let retryable_error = CoreError::Llm(LlmError::RateLimitExceeded {
        provider: "together".to_string(),
        retry_after: 30,
    });
    assert!(retryable_error.is_retryable());

    let non_retryable_error = CoreError::DataLoad(DataLoadError::FileNotFound {
        path: "posts.json".to_string(),
    });
    assert!(!non_retryable_error.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error = CoreError::Llm(LlmError::RateLimitExceeded {
        provider: "together".to_string(),
        retry_after: 30,
    });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(30))
    );

    let timeout_error = CoreError::Timeout { seconds: 15 };
    assert_eq!(timeout_error.retry_after(), Some(Duration::from_secs(15)));

    let input_error = CoreError::invalid_input("blank question");
    assert_eq!(input_error.retry_after(), None);
}

#[test]
fn test_external_service_classification() {
    assert!(CoreError::Llm(LlmError::ServiceUnavailable {
        provider: "together".to_string(),
        status_code: 503,
    })
    .is_external_service());
    assert!(CoreError::Index(IndexError::EmptyVector).is_external_service());

    assert!(!CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "TOGETHER_API_KEY".to_string(),
    })
    .is_external_service());
    assert!(!CoreError::DataLoad(DataLoadError::InvalidTags {
        index: 3,
        found: "string".to_string(),
    })
    .is_external_service());
}

#[test]
fn test_user_friendly_messages() {
    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "TOGETHER_API_KEY".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("TOGETHER_API_KEY"));

    let data_error = CoreError::DataLoad(DataLoadError::InvalidTags {
        index: 12,
        found: "array".to_string(),
    });
    assert!(data_error.user_friendly_message().contains("#12"));

    let key_error = CoreError::Llm(LlmError::InvalidApiKey {
        provider: "together".to_string(),
    });
    assert!(key_error.user_friendly_message().contains("together"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new()
        .with_error_reporting(true)
        .with_warning_reporting(true);
    let error = CoreError::Llm(LlmError::RequestTimeout {
        provider: "together".to_string(),
    });

    // Only checks that reporting never panics
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
