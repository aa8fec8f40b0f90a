use crate::domain::meal_plan::{DietaryPolicy, NormalizerConfig};
use crate::domain::risk::ClassifierPolicy;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} missing")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub pexels_api_key: Option<String>,
    pub default_city: String,
    pub classifier: ClassifierPolicy,
    pub normalizer: NormalizerConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests do not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let bind_addr = get("BIND_ADDR").unwrap_or_else(|| {
            let port = get("PORT").unwrap_or_else(|| "3000".to_string());
            format!("0.0.0.0:{}", port)
        });

        let classifier = match get("CLASSIFIER") {
            Some(raw) => raw
                .parse::<ClassifierPolicy>()
                .map_err(|e| ConfigError::Invalid {
                    key: "CLASSIFIER",
                    reason: e.to_string(),
                })?,
            None => ClassifierPolicy::default(),
        };

        let dietary = match get("DIETARY_POLICY") {
            Some(raw) => raw
                .parse::<DietaryPolicy>()
                .map_err(|e| ConfigError::Invalid {
                    key: "DIETARY_POLICY",
                    reason: e.to_string(),
                })?,
            None => DietaryPolicy::default(),
        };

        Ok(Self {
            database_url,
            bind_addr,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string()),
            pexels_api_key: get("PEXELS_API_KEY"),
            default_city: get("DEFAULT_CITY").unwrap_or_else(|| "Melbourne".to_string()),
            classifier,
            normalizer: NormalizerConfig { dietary },
        })
    }
}
