use config::{ConfigError, Environment};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Payment-provider credentials. Both are optional at startup: without an
/// API key only health/read endpoints are useful, and without a webhook
/// secret every delivery is rejected.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            // Server defaults
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("server.workers", 4)?
            // Database defaults
            .set_default("database.url", "sqlite://transactions.db?mode=rwc")?
            .set_default("database.max_connections", 5)?;

        builder = builder.add_source(Environment::with_prefix("FRAUD_GUARD").separator("__"));

        // Override from environment variables
        if let Ok(port) = env::var("SERVICE_PORT") {
            builder = builder.set_override("server.port", port)?;
        }

        if let Ok(db_url) = env::var("DATABASE_URL") {
            builder = builder.set_override("database.url", db_url)?;
        }

        if let Ok(api_key) = env::var("STRIPE_API_KEY") {
            builder = builder.set_override("provider.api_key", api_key)?;
        }

        if let Ok(secret) = env::var("STRIPE_WEBHOOK_SECRET") {
            builder = builder.set_override("provider.webhook_secret", secret)?;
        }

        builder.build()?.try_deserialize()
    }
}
