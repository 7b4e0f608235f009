use crate::error::{to_env_var, ConfigError};
use config::{Config, Environment};
use reasoner::format::FormatOptions;
use reasoner::providers::configs::{
    DeepSeekProviderConfig, DEEPSEEK_DEFAULT_HOST, DEEPSEEK_DEFAULT_MODEL,
};
use reasoner::turn::ErrorPolicy;
use serde::Deserialize;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_provider_host")]
    pub host: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
}

impl ProviderSettings {
    // Convert to the reasoner provider config
    pub fn into_config(self) -> Result<DeepSeekProviderConfig, ConfigError> {
        let api_key = self
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar {
                env_var: to_env_var("provider.api_key"),
            })?;
        let mut config = DeepSeekProviderConfig::new(api_key)
            .with_host(self.host)
            .with_model(self.model);
        config.temperature = self.temperature;
        config.max_tokens = self.max_tokens;
        Ok(config)
    }
}

/// Defaults for every chat served by this process
#[derive(Debug, Deserialize)]
pub struct ChatSettings {
    #[serde(default = "default_true")]
    pub show_reasoning: bool,
    #[serde(default = "default_true")]
    pub substitute_asterisk: bool,
    #[serde(default)]
    pub record_errors: bool,
    /// Idle sessions older than this are dropped
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            show_reasoning: true,
            substitute_asterisk: true,
            record_errors: false,
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl ChatSettings {
    pub fn format_options(&self) -> FormatOptions {
        FormatOptions {
            substitute_asterisk: self.substitute_asterisk,
            ..FormatOptions::html()
        }
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        if self.record_errors {
            ErrorPolicy::RecordAsAnswer
        } else {
            ErrorPolicy::Discard
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub provider: ProviderSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load_and_validate()
    }

    fn load_and_validate() -> Result<Self, ConfigError> {
        // Start with default configuration
        let config = Config::builder()
            // Server defaults
            .set_default("server.host", default_host())?
            .set_default("server.port", default_port())?
            // Provider defaults
            .set_default("provider.host", default_provider_host())?
            .set_default("provider.model", default_model())?
            // Layer on the environment variables
            .add_source(
                Environment::with_prefix("REASONER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let result: Result<Self, config::ConfigError> = config.try_deserialize();
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);
                if let config::ConfigError::NotFound(field) = &err {
                    let env_var = to_env_var(field);
                    Err(ConfigError::MissingEnvVar { env_var })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_model() -> String {
    DEEPSEEK_DEFAULT_MODEL.to_string()
}

fn default_provider_host() -> String {
    DEEPSEEK_DEFAULT_HOST.to_string()
}

fn default_session_ttl_secs() -> u64 {
    60 * 60
}

fn default_true() -> bool {
    true
}
