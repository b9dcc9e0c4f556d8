//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every violation is reported,
//! not just the first.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("listener.max_connections must be greater than zero")]
    ZeroMaxConnections,

    #[error("parser.initial_buffer_size must be greater than zero")]
    ZeroInitialBuffer,

    #[error("parser.max_buffer_size {max} is smaller than initial_buffer_size {initial}")]
    BufferCapTooSmall { initial: usize, max: usize },

    #[error("observability.log_level {0:?} is not one of trace, debug, info, warn, error")]
    LogLevel(String),

    #[error("demo.upstream_base_url {0:?} is not an http(s) URL")]
    UpstreamUrl(String),
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(ValidationError::ZeroMaxConnections);
    }

    let parser = &config.parser;
    if parser.initial_buffer_size == 0 {
        errors.push(ValidationError::ZeroInitialBuffer);
    }
    if parser.max_buffer_size < parser.initial_buffer_size {
        errors.push(ValidationError::BufferCapTooSmall {
            initial: parser.initial_buffer_size,
            max: parser.max_buffer_size,
        });
    }

    let level = config.observability.log_level.to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    let upstream = &config.demo.upstream_base_url;
    let is_http = Url::parse(upstream)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !is_http {
        errors.push(ValidationError::UpstreamUrl(upstream.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn reports_every_violation() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "localhost".to_string();
        config.listener.max_connections = 0;
        config.parser.initial_buffer_size = 16;
        config.parser.max_buffer_size = 8;
        config.observability.log_level = "loud".to_string();
        config.demo.upstream_base_url = "ftp://example.com".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("localhost".to_string()),
                ValidationError::ZeroMaxConnections,
                ValidationError::BufferCapTooSmall { initial: 16, max: 8 },
                ValidationError::LogLevel("loud".to_string()),
                ValidationError::UpstreamUrl("ftp://example.com".to_string()),
            ]
        );
    }

    #[test]
    fn zero_buffer_is_rejected() {
        let mut config = ServerConfig::default();
        config.parser.initial_buffer_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::ZeroInitialBuffer]);
    }
}
