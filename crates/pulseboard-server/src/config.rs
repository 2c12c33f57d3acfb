// Server configuration from environment variables

/// Server configuration. All fields are optional in the environment and
/// resolved through the defaulting accessors.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind
    pub bind_addr: Option<String>,
    /// SQLite database URL
    pub database_url: Option<String>,
}

impl ServerConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            bind_addr: std::env::var("PULSEBOARD_BIND").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
        }
    }

    /// Get bind address with default
    pub fn bind_addr(&self) -> String {
        self.bind_addr
            .clone()
            .unwrap_or_else(|| "0.0.0.0:8000".to_string())
    }

    /// Get database URL with default
    pub fn database_url(&self) -> String {
        self.database_url
            .clone()
            .unwrap_or_else(|| "sqlite:events.db".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_apply_when_unset() {
        let config = ServerConfig {
            bind_addr: None,
            database_url: None,
        };
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.database_url(), "sqlite:events.db");
    }

    #[test]
    fn test_explicit_values_win() {
        let config = ServerConfig {
            bind_addr: Some("127.0.0.1:9999".to_string()),
            database_url: Some("sqlite:/tmp/other.db".to_string()),
        };
        assert_eq!(config.bind_addr(), "127.0.0.1:9999");
        assert_eq!(config.database_url(), "sqlite:/tmp/other.db");
    }
}
