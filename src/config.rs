// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Handles environment variables, deployment modes, and runtime configuration parsing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Action Relay Contributors

//! Environment-based configuration management
//!
//! The relay is configured entirely from environment variables; there is no
//! configuration file. `ServerConfig::from_env` is the single entry point.

use crate::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::env;

/// Default HTTP port when `PORT` is not set
pub const DEFAULT_HTTP_PORT: u16 = 3000;

/// Built-in demo token seeded outside production deployments
pub const DEMO_TOKEN: &str = "demo_key_12345";

/// Environment type for security and seeding decisions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Complete server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the unified HTTP/WebSocket listener binds to
    pub http_port: u16,
    /// Bind address, defaults to all interfaces
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// Comma-separated CORS origin allow-list; "*" or empty means any origin
    pub cors_allowed_origins: String,
    /// Access tokens seeded into the registry at startup
    pub seed_tokens: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|e| AppError::config(format!("invalid PORT value {raw:?}: {e}")))?,
            Err(_) => DEFAULT_HTTP_PORT,
        };

        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let environment = Environment::from_str_or_default(
            &env::var("ENVIRONMENT").unwrap_or_default(),
        );

        let cors_allowed_origins =
            env::var("CORS_ALLOWED_ORIGINS").unwrap_or_else(|_| "*".into());

        let seed_tokens = Self::parse_seed_tokens(
            env::var("RELAY_SEED_TOKENS").ok().as_deref(),
            &environment,
        );

        Ok(Self {
            http_port,
            host,
            environment,
            cors_allowed_origins,
            seed_tokens,
        })
    }

    /// Parse the seed token list; defaults to the demo token outside production
    fn parse_seed_tokens(raw: Option<&str>, environment: &Environment) -> Vec<String> {
        match raw {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None if environment.is_production() => Vec::new(),
            None => vec![DEMO_TOKEN.into()],
        }
    }

    /// One-line configuration summary for startup logging
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} host={} environment={} seed_tokens={}",
            self.http_port,
            self.host,
            self.environment,
            self.seed_tokens.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_parse_seed_tokens_explicit() {
        let tokens = ServerConfig::parse_seed_tokens(
            Some("alpha_key, beta_key ,"),
            &Environment::Production,
        );
        assert_eq!(tokens, vec!["alpha_key".to_owned(), "beta_key".to_owned()]);
    }

    #[test]
    fn test_parse_seed_tokens_default_dev() {
        let tokens = ServerConfig::parse_seed_tokens(None, &Environment::Development);
        assert_eq!(tokens, vec![DEMO_TOKEN.to_owned()]);
    }

    #[test]
    fn test_parse_seed_tokens_default_production_empty() {
        let tokens = ServerConfig::parse_seed_tokens(None, &Environment::Production);
        assert!(tokens.is_empty());
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        std::env::remove_var("PORT");
        std::env::remove_var("HOST");
        std::env::remove_var("ENVIRONMENT");
        std::env::remove_var("RELAY_SEED_TOKENS");

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.http_port, DEFAULT_HTTP_PORT);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port() {
        std::env::set_var("PORT", "not-a-port");
        let result = ServerConfig::from_env();
        std::env::remove_var("PORT");
        assert!(result.is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert!(Environment::from_str_or_default("prod").is_production());
        assert!(!Environment::from_str_or_default("dev").is_production());
        assert_eq!(
            Environment::from_str_or_default("garbage"),
            Environment::Development
        );
    }
}
