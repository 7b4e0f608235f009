use std::env;

use crate::errors::{ReasonerError, ReasonerResult};

pub const DEEPSEEK_DEFAULT_HOST: &str = "https://api.deepseek.com";
pub const DEEPSEEK_DEFAULT_MODEL: &str = "deepseek-reasoner";

pub trait ProviderConfig {
    fn from_env() -> ReasonerResult<Self>
    where
        Self: Sized;

    fn get_env(key: &str, required: bool, default: Option<String>) -> ReasonerResult<Option<String>> {
        match env::var(key) {
            Ok(value) if !value.trim().is_empty() => Ok(Some(value)),
            Ok(_) | Err(env::VarError::NotPresent) if !required => Ok(default),
            Ok(_) | Err(env::VarError::NotPresent) => Err(ReasonerError::Configuration(format!(
                "Environment variable '{}' is required but not set.",
                key
            ))),
            Err(e) => Err(ReasonerError::Configuration(format!("{}: {}", key, e))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeepSeekProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

impl DeepSeekProviderConfig {
    pub fn new<S: Into<String>>(api_key: S) -> Self {
        Self {
            host: DEEPSEEK_DEFAULT_HOST.to_string(),
            api_key: api_key.into(),
            model: DEEPSEEK_DEFAULT_MODEL.to_string(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }
}

impl ProviderConfig for DeepSeekProviderConfig {
    /// Reads `DEEPSEEK_API_KEY`, `DEEPSEEK_HOST` and `DEEPSEEK_MODEL`, after loading `.env` if present
    fn from_env() -> ReasonerResult<Self> {
        let _ = dotenv::dotenv();

        let api_key = Self::get_env("DEEPSEEK_API_KEY", true, None)?.ok_or_else(|| {
            ReasonerError::Configuration("DEEPSEEK_API_KEY must be set".to_string())
        })?;
        let host = Self::get_env("DEEPSEEK_HOST", false, Some(DEEPSEEK_DEFAULT_HOST.to_string()))?
            .unwrap_or_else(|| DEEPSEEK_DEFAULT_HOST.to_string());
        let model = Self::get_env("DEEPSEEK_MODEL", false, Some(DEEPSEEK_DEFAULT_MODEL.to_string()))?
            .unwrap_or_else(|| DEEPSEEK_DEFAULT_MODEL.to_string());

        Ok(Self::new(api_key).with_host(host).with_model(model))
    }
}
