//! Configuration management

use anyhow::{Context, Result};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// VRoouty optimizer URL (optional, falls back to the mock optimizer
    /// when unset)
    pub vroouty_url: Option<String>,

    /// VRoouty request timeout in seconds
    pub vroouty_timeout_seconds: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let nats_url =
            std::env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let vroouty_url = std::env::var("VROOUTY_URL").ok();

        let vroouty_timeout_seconds = match std::env::var("VROOUTY_TIMEOUT_SECONDS") {
            Ok(raw) => raw
                .parse()
                .context("VROOUTY_TIMEOUT_SECONDS must be an integer")?,
            Err(_) => 30,
        };

        Ok(Self {
            nats_url,
            vroouty_url,
            vroouty_timeout_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_vroouty_url_some_when_set() {
        std::env::set_var("VROOUTY_URL", "http://localhost:3000");

        let config = Config::from_env().unwrap();
        assert_eq!(
            config.vroouty_url,
            Some("http://localhost:3000".to_string())
        );

        // Cleanup
        std::env::remove_var("VROOUTY_URL");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_defaults_when_unset() {
        std::env::remove_var("NATS_URL");
        std::env::remove_var("VROOUTY_URL");
        std::env::remove_var("VROOUTY_TIMEOUT_SECONDS");

        let config = Config::from_env().unwrap();
        assert_eq!(config.nats_url, "nats://localhost:4222");
        assert!(config.vroouty_url.is_none());
        assert_eq!(config.vroouty_timeout_seconds, 30);
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_rejects_bad_timeout() {
        std::env::set_var("VROOUTY_TIMEOUT_SECONDS", "soon");

        assert!(Config::from_env().is_err());

        std::env::remove_var("VROOUTY_TIMEOUT_SECONDS");
    }
}
