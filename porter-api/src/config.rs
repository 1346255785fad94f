//! Runtime configuration.
//!
//! Everything the HTTP layer needs besides the database pool: where to
//! bind and how to answer CORS. Read once at startup from `PORTER_*`
//! environment variables and passed into the router and entry point
//! explicitly; nothing here is global state.

use std::net::SocketAddr;

use crate::error::{ApiError, ApiResult};

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind (`PORTER_API_BIND`).
    pub bind_host: String,

    /// Port to listen on. `PORT` wins over `PORTER_API_PORT` so platform
    /// schedulers that inject `PORT` work unchanged.
    pub port: u16,

    /// Exact origins allowed by CORS (`PORTER_CORS_ORIGINS`,
    /// comma-separated). Empty leaves CORS unrestricted.
    pub cors_origins: Vec<String>,

    /// Whether CORS responses may carry credentials
    /// (`PORTER_CORS_ALLOW_CREDENTIALS`). Only honored together with an
    /// explicit origin list; a wildcard origin cannot carry credentials.
    pub cors_allow_credentials: bool,

    /// Preflight cache lifetime in seconds (`PORTER_CORS_MAX_AGE_SECS`).
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: 86400,
        }
    }
}

impl ApiConfig {
    /// Read the configuration from the environment, falling back to the
    /// defaults above for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_host =
            std::env::var("PORTER_API_BIND").unwrap_or(defaults.bind_host);
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("PORTER_API_PORT"))
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.port);

        let cors_origins = std::env::var("PORTER_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let cors_allow_credentials = std::env::var("PORTER_CORS_ALLOW_CREDENTIALS")
            .map(|raw| raw.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.cors_allow_credentials);
        let cors_max_age_secs = std::env::var("PORTER_CORS_MAX_AGE_SECS")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(defaults.cors_max_age_secs);

        Self {
            bind_host,
            port,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
        }
    }

    /// The socket address to serve on.
    pub fn bind_addr(&self) -> ApiResult<SocketAddr> {
        format!("{}:{}", self.bind_host, self.port)
            .parse()
            .map_err(|e| {
                ApiError::invalid_input(format!(
                    "Invalid bind address {}:{}: {}",
                    self.bind_host, self.port, e
                ))
            })
    }

    /// Whether CORS is locked down to an explicit origin list.
    pub fn cors_is_restricted(&self) -> bool {
        !self.cors_origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.bind_host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert!(!config.cors_is_restricted());
        assert!(!config.cors_allow_credentials);
    }

    #[test]
    fn test_bind_addr() {
        let config = ApiConfig {
            bind_host: "127.0.0.1".to_string(),
            port: 8080,
            ..Default::default()
        };
        assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:8080");

        let bad = ApiConfig {
            bind_host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(bad.bind_addr().is_err());
    }

    #[test]
    fn test_cors_restriction_follows_origin_list() {
        let mut config = ApiConfig::default();
        assert!(!config.cors_is_restricted());

        config.cors_origins = vec!["https://porterdesk.io".to_string()];
        assert!(config.cors_is_restricted());
    }
}
