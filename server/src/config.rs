//! Process configuration, read once at startup.

use std::fmt;

use thiserror::Error;

use crate::logging::LogFormat;

pub const DEFAULT_API_URL: &str = "https://rickandmortyapi.com/api";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Service-account credentials for the managed document store.
#[derive(Clone)]
pub struct FirebaseCredentials {
    pub project_id: String,
    pub client_email: String,
    /// PEM-encoded RSA key.
    pub private_key: String,
}

impl fmt::Debug for FirebaseCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseCredentials")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Server configuration.
///
/// | Env Var                 | Default                          |
/// |-------------------------|----------------------------------|
/// | `HOST`                  | `0.0.0.0`                        |
/// | `PORT`                  | `8080`                           |
/// | `API_URL`               | `https://rickandmortyapi.com/api`|
/// | `FIREBASE_PROJECT_ID`   | required                         |
/// | `FIREBASE_CLIENT_EMAIL` | required                         |
/// | `FIREBASE_PRIVATE_KEY`  | required                         |
/// | `CORS_ORIGINS`          | any origin                       |
/// | `LOG_FORMAT`            | `pretty`                         |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub firebase: FirebaseCredentials,
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let port = match optional("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
                ConfigError::Invalid {
                    name: "PORT",
                    reason: e.to_string(),
                }
            })?,
            None => 8080,
        };

        let log_format = match optional("LOG_FORMAT") {
            Some(raw) => raw.parse::<LogFormat>().map_err(|reason| ConfigError::Invalid {
                name: "LOG_FORMAT",
                reason,
            })?,
            None => LogFormat::default(),
        };

        let cors_origins = optional("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: optional("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            api_url: optional("API_URL").unwrap_or_else(|| DEFAULT_API_URL.into()),
            firebase: FirebaseCredentials {
                project_id: required("FIREBASE_PROJECT_ID")?,
                client_email: required("FIREBASE_CLIENT_EMAIL")?,
                // Keys pasted into .env files carry literal "\n" sequences.
                private_key: required("FIREBASE_PRIVATE_KEY")?.replace("\\n", "\n"),
            },
            cors_origins,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
