//! Server configuration read from the environment

use thiserror::Error;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_DATABASE: &str = "guias_db";
pub const DEFAULT_COLLECTION: &str = "processos";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Which browser origins may call the API
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CorsPolicy {
    /// Any origin, echoed back so credentials keep working
    #[default]
    AllowAll,
    AllowList(Vec<String>),
}

impl CorsPolicy {
    /// Parse a comma separated origin list. Empty input or `*` allows all.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            Self::AllowAll
        } else {
            Self::AllowList(origins)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Without a URI the server still starts and reports the database as disconnected
    pub mongodb_uri: Option<String>,
    pub database: String,
    pub collection: String,
    pub cors: CorsPolicy,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            mongodb_uri: None,
            database: DEFAULT_DATABASE.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            cors: CorsPolicy::default(),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl ServerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match env_non_empty("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: "PORT",
                    value: raw.clone(),
                })?,
            None => defaults.port,
        };

        Ok(Self {
            host: env_non_empty("HOST").unwrap_or(defaults.host),
            port,
            mongodb_uri: env_non_empty("MONGODB_URI"),
            database: env_non_empty("MONGODB_DATABASE").unwrap_or(defaults.database),
            collection: env_non_empty("MONGODB_COLLECTION").unwrap_or(defaults.collection),
            cors: env_non_empty("CORS_ALLOWED_ORIGINS")
                .map(|raw| CorsPolicy::parse(&raw))
                .unwrap_or_default(),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
