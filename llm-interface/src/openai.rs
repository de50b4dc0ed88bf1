//! Chat-completions client for OpenAI-compatible endpoints.
//!
//! The default target is Together AI, which hosts the Mistral instruct model
//! used for answers; any server speaking the same `/chat/completions` dialect
//! (vLLM, Ollama, OpenAI itself) works through [`OpenAiCompatibleGenerator::custom`].

use crate::prompt::{build_qa_prompt, QA_SYSTEM_PROMPT};
use crate::Generator;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use solefacts_core::{ApiKey, AppConfig, CoreError, DocumentRef, LlmError};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const TOGETHER_BASE_URL: &str = "https://api.together.xyz/v1";

const DEFAULT_TEMPERATURE: f32 = 0.1;
const DEFAULT_MAX_TOKENS: usize = 512;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: usize,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

pub struct OpenAiCompatibleGenerator {
    client: reqwest::Client,
    provider: String,
    base_url: String,
    api_key: ApiKey,
    model: String,
    temperature: f32,
    max_tokens: usize,
}

impl OpenAiCompatibleGenerator {
    /// Generator for Together AI's hosted models.
    pub fn together(api_key: ApiKey, model: impl Into<String>) -> Self {
        Self::custom("together", TOGETHER_BASE_URL, api_key, model)
    }

    pub fn custom(
        provider: impl Into<String>,
        base_url: impl Into<String>,
        api_key: ApiKey,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            provider: provider.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let provider = if config.llm_base_url.contains("together.xyz") {
            "together"
        } else {
            "openai-compatible"
        };
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self::custom(
            provider,
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        )
        .with_client(client)
        .with_temperature(config.llm_temperature)
        .with_max_tokens(config.llm_max_tokens))
    }

    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_headers(&self) -> Result<HeaderMap, CoreError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose()))
            .map_err(|_| LlmError::InvalidApiKey {
                provider: self.provider.clone(),
            })?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    fn build_request<'a>(&'a self, prompt: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: QA_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    fn transport_error(&self, error: reqwest::Error) -> CoreError {
        if error.is_timeout() {
            LlmError::RequestTimeout {
                provider: self.provider.clone(),
            }
            .into()
        } else {
            CoreError::Network(error)
        }
    }
}

#[async_trait]
impl Generator for OpenAiCompatibleGenerator {
    async fn answer(
        &self,
        question: &str,
        documents: &[DocumentRef],
    ) -> Result<String, CoreError> {
        if question.trim().is_empty() {
            return Err(LlmError::InvalidPrompt {
                reason: "question is empty".to_string(),
            }
            .into());
        }

        let prompt = build_qa_prompt(question, documents);
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request(&prompt);

        info!(
            "Requesting answer from {} ({}) with {} documents",
            self.provider,
            self.model,
            documents.len()
        );

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let text = response.text().await.map_err(|e| self.transport_error(e))?;

        if !(200..300).contains(&status) {
            warn!("{} returned HTTP {}", self.provider, status);
            return Err(status_error(
                &self.provider,
                &self.model,
                status,
                retry_after,
                &text,
            ));
        }

        let answer = parse_completion(&self.provider, &text)?;
        debug!("Received {} characters from {}", answer.len(), self.provider);
        Ok(answer)
    }

    fn name(&self) -> &str {
        &self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Extracts the first choice's message text from a chat-completions body.
pub fn parse_completion(provider: &str, body: &str) -> Result<String, CoreError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| LlmError::InvalidResponseFormat {
            provider: provider.to_string(),
            details: e.to_string(),
        })?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponseFormat {
            provider: provider.to_string(),
            details: "no choices in response".to_string(),
        })?;

    Ok(choice.message.content.unwrap_or_default().trim().to_string())
}

/// Maps a non-success HTTP status to the error taxonomy.
pub fn status_error(
    provider: &str,
    model: &str,
    status: u16,
    retry_after: Option<u64>,
    body: &str,
) -> CoreError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| format!("HTTP {}", status));

    match status {
        401 | 403 => LlmError::InvalidApiKey {
            provider: provider.to_string(),
        }
        .into(),
        400 | 422 => LlmError::InvalidPrompt { reason: message }.into(),
        404 => LlmError::ModelNotAvailable {
            model: model.to_string(),
        }
        .into(),
        429 => LlmError::RateLimitExceeded {
            provider: provider.to_string(),
            retry_after: retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        }
        .into(),
        500..=599 => LlmError::ServiceUnavailable {
            provider: provider.to_string(),
            status_code: status,
        }
        .into(),
        _ => CoreError::RequestFailed {
            message,
            status_code: Some(status),
        },
    }
}
