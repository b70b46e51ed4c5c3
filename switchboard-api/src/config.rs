//! API Configuration Module
//!
//! Bind address and listener settings for the HTTP server, loaded from
//! environment variables with sensible defaults for development.

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind the listener to.
    pub host: String,

    /// Port to bind the listener to.
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SWITCHBOARD_API_HOST`: Listener host (default: "0.0.0.0")
    /// - `SWITCHBOARD_API_PORT`: Listener port (default: 8080)
    /// - `PORT`: Fallback for the port, for platforms that inject it
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("SWITCHBOARD_API_HOST")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.host);

        let port = std::env::var("SWITCHBOARD_API_PORT")
            .ok()
            .or_else(|| std::env::var("PORT").ok())
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        Self { host, port }
    }

    /// The socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_bind_addr() {
        let config = ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:3000");
    }
}
