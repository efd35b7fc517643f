use crate::domain::{Decimal, ProductId};
use crate::engine::EngineSettings;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Global amount subtracted from the reference price.
    pub fixed_offset: Decimal,
    pub short_expiry_hours: i64,
    /// Products in flight at once during a batch run.
    pub batch_concurrency: usize,
    pub context_url_base: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            fixed_offset: Decimal::from_cents(1),
            short_expiry_hours: 24,
            batch_concurrency: 8,
            context_url_base: "https://www.net32.com/mp".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let fixed_offset = env_map
            .get("FIXED_OFFSET")
            .map(|s| s.as_str())
            .unwrap_or("0.01")
            .parse::<Decimal>()
            .ok()
            .filter(|d| !d.is_negative())
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "FIXED_OFFSET".to_string(),
                    "must be a non-negative decimal".to_string(),
                )
            })?;

        let short_expiry_hours = env_map
            .get("SHORT_EXPIRY_HOURS")
            .map(|s| s.as_str())
            .unwrap_or("24")
            .parse::<i64>()
            .ok()
            .filter(|h| *h >= 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "SHORT_EXPIRY_HOURS".to_string(),
                    "must be a non-negative integer".to_string(),
                )
            })?;

        let batch_concurrency = env_map
            .get("BATCH_CONCURRENCY")
            .map(|s| s.as_str())
            .unwrap_or("8")
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "BATCH_CONCURRENCY".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let context_url_base = env_map
            .get("CONTEXT_URL_BASE")
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| Config::default().context_url_base);

        Ok(Config {
            port,
            fixed_offset,
            short_expiry_hours,
            batch_concurrency,
            context_url_base,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            fixed_offset: self.fixed_offset,
            short_expiry: chrono::Duration::hours(self.short_expiry_hours),
        }
    }

    /// Marketplace page for a product, quoted in explanations.
    pub fn context_url(&self, product_id: ProductId) -> String {
        format!("{}/{}", self.context_url_base, product_id)
    }
}
