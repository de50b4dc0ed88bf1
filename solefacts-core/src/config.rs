use crate::{ConfigError, CoreError};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const API_KEY_ENV: &str = "TOGETHER_API_KEY";
pub const CONFIG_PATH_ENV: &str = "SOLEFACTS_CONFIG";
pub const DATA_PATH_ENV: &str = "SOLEFACTS_DATA";
pub const LLM_MODEL_ENV: &str = "SOLEFACTS_LLM_MODEL";
pub const DEFAULT_CONFIG_FILE: &str = "solefacts.toml";

/// Credential for the hosted generative model. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// Settings read from `solefacts.toml`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub data_path: PathBuf,
    pub embedding_model: String,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: usize,
    pub top_k: usize,
    pub result_limit: usize,
    pub request_timeout_secs: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/solefacts_tagged_data.json"),
            embedding_model: "sentence-transformers/all-MiniLM-L6-v2".to_string(),
            llm_model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            llm_base_url: "https://api.together.xyz/v1".to_string(),
            llm_temperature: 0.1,
            llm_max_tokens: 512,
            top_k: 5,
            result_limit: 5,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub embedding_model: String,
    pub llm_model: String,
    pub llm_base_url: String,
    pub llm_api_key: ApiKey,
    pub llm_temperature: f32,
    pub llm_max_tokens: usize,
    pub top_k: usize,
    pub result_limit: usize,
    pub request_timeout_secs: u64,
}

impl AppConfig {
    /// Loads configuration from the process environment and the optional config file.
    pub fn load() -> Result<Self, CoreError> {
        Self::from_sources(|name| std::env::var(name).ok())
    }

    /// Resolves the config file and overrides through `env`, which stands in for
    /// the process environment.
    pub fn from_sources<E>(env: E) -> Result<Self, CoreError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let file = match non_blank(env(CONFIG_PATH_ENV)) {
            Some(path) => Self::read_file(Path::new(&path))?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::read_file(default_path)?
                } else {
                    debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                    FileConfig::default()
                }
            }
        };

        Self::resolve(file, env)
    }

    pub fn read_file(path: &Path) -> Result<FileConfig, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotReadable {
            path: path.display().to_string(),
        })?;
        let file: FileConfig = toml::from_str(&raw).map_err(ConfigError::from)?;
        info!("Loaded configuration from {}", path.display());
        Ok(file)
    }

    /// Applies environment overrides to `file` and validates the result.
    pub fn resolve<E>(file: FileConfig, env: E) -> Result<Self, CoreError>
    where
        E: Fn(&str) -> Option<String>,
    {
        let llm_api_key = non_blank(env(API_KEY_ENV)).map(ApiKey::new).ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: API_KEY_ENV.to_string(),
            }
        })?;

        if file.top_k == 0 {
            return Err(invalid_value("top_k", "0"));
        }
        if file.result_limit == 0 {
            return Err(invalid_value("result_limit", "0"));
        }
        if file.request_timeout_secs == 0 {
            return Err(invalid_value("request_timeout_secs", "0"));
        }
        if file.llm_max_tokens == 0 {
            return Err(invalid_value("llm_max_tokens", "0"));
        }
        if !(0.0..=2.0).contains(&file.llm_temperature) {
            return Err(invalid_value(
                "llm_temperature",
                &file.llm_temperature.to_string(),
            ));
        }

        let data_path = non_blank(env(DATA_PATH_ENV))
            .map(PathBuf::from)
            .unwrap_or(file.data_path);
        let llm_model = non_blank(env(LLM_MODEL_ENV)).unwrap_or(file.llm_model);

        Ok(Self {
            data_path,
            embedding_model: file.embedding_model,
            llm_model,
            llm_base_url: file.llm_base_url.trim_end_matches('/').to_string(),
            llm_api_key,
            llm_temperature: file.llm_temperature,
            llm_max_tokens: file.llm_max_tokens,
            top_k: file.top_k,
            result_limit: file.result_limit,
            request_timeout_secs: file.request_timeout_secs,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn invalid_value(field: &str, value: &str) -> CoreError {
    CoreError::Config(ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_missing_api_key_fails_fast() {
        let err = AppConfig::resolve(FileConfig::default(), env_of(&[])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::MissingEnvironmentVariable { ref var_name })
                if var_name == API_KEY_ENV
        ));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let err =
            AppConfig::resolve(FileConfig::default(), env_of(&[(API_KEY_ENV, "  ")])).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_defaults_and_env_overrides() {
        let config = AppConfig::resolve(
            FileConfig::default(),
            env_of(&[
                (API_KEY_ENV, "sk-test"),
                (DATA_PATH_ENV, "/tmp/posts.json"),
                (LLM_MODEL_ENV, "meta-llama/Llama-3-8b-chat-hf"),
            ]),
        )
        .unwrap();

        assert_eq!(config.llm_api_key.expose(), "sk-test");
        assert_eq!(config.data_path, PathBuf::from("/tmp/posts.json"));
        assert_eq!(config.llm_model, "meta-llama/Llama-3-8b-chat-hf");
        assert_eq!(config.top_k, 5);
        assert_eq!(config.result_limit, 5);
        assert_eq!(config.llm_base_url, "https://api.together.xyz/v1");
        assert_eq!(config.llm_temperature, 0.1);
        assert_eq!(config.llm_max_tokens, 512);
    }

    #[test]
    fn test_generation_settings_are_validated() {
        let file = FileConfig {
            llm_temperature: 0.7,
            llm_max_tokens: 256,
            ..Default::default()
        };
        let config = AppConfig::resolve(file, env_of(&[(API_KEY_ENV, "sk-test")])).unwrap();
        assert_eq!(config.llm_temperature, 0.7);
        assert_eq!(config.llm_max_tokens, 256);

        let too_hot = FileConfig {
            llm_temperature: 3.5,
            ..Default::default()
        };
        let err = AppConfig::resolve(too_hot, env_of(&[(API_KEY_ENV, "sk-test")])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "llm_temperature"
        ));

        let no_tokens = FileConfig {
            llm_max_tokens: 0,
            ..Default::default()
        };
        let err = AppConfig::resolve(no_tokens, env_of(&[(API_KEY_ENV, "sk-test")])).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "llm_max_tokens"
        ));
    }

    #[test]
    fn test_api_key_is_redacted_in_debug() {
        let config =
            AppConfig::resolve(FileConfig::default(), env_of(&[(API_KEY_ENV, "sk-secret")]))
                .unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("ApiKey(***)"));
    }

    #[test]
    fn test_file_config_is_read_and_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solefacts.toml");
        std::fs::write(
            &path,
            "data_path = \"posts.json\"\ntop_k = 3\nllm_base_url = \"http://localhost:8000/v1/\"\n",
        )
        .unwrap();

        let config = AppConfig::from_sources(env_of(&[
            (API_KEY_ENV, "sk-test"),
            (CONFIG_PATH_ENV, path.to_str().unwrap()),
        ]))
        .unwrap();
        assert_eq!(config.data_path, PathBuf::from("posts.json"));
        assert_eq!(config.top_k, 3);
        assert_eq!(config.llm_base_url, "http://localhost:8000/v1");

        std::fs::write(&path, "top_k = 0\n").unwrap();
        let err = AppConfig::from_sources(env_of(&[
            (API_KEY_ENV, "sk-test"),
            (CONFIG_PATH_ENV, path.to_str().unwrap()),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::InvalidValue { ref field, .. }) if field == "top_k"
        ));
    }

    #[test]
    fn test_unknown_or_malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solefacts.toml");
        std::fs::write(&path, "topk = 3\n").unwrap();

        let err = AppConfig::read_file(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_explicit_missing_config_file_is_an_error() {
        let err = AppConfig::from_sources(env_of(&[
            (API_KEY_ENV, "sk-test"),
            (CONFIG_PATH_ENV, "/definitely/not/here.toml"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::FileNotReadable { .. })
        ));
    }
}
