//! Configuration validation.

use std::net::IpAddr;

use crate::error::ConfigError;
use crate::schema::Config;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Worker pools above this size get a warning.
const LARGE_WORKER_POOL: usize = 4096;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Turn the first error, if any, into a [`ConfigError`].
    pub fn into_result(self) -> Result<Vec<ValidationWarning>, ConfigError> {
        match self.errors.into_iter().next() {
            Some(error) => Err(ConfigError::InvalidValue {
                field: error.path,
                message: error.message,
            }),
            None => Ok(self.warnings),
        }
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_session(config, &mut result);
        Self::validate_kernel(config, &mut result);
        Self::validate_websocket(config, &mut result);
        Self::validate_logging(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        } else if !is_loopback(&config.server.host) {
            result.add_warning(ValidationWarning::new(
                "server.host",
                format!(
                    "Listening on non-loopback host '{}', the server is reachable from the network",
                    config.server.host
                ),
            ));
        }

        if let Some(root_path) = &config.server.root_path {
            if !root_path.is_empty() && !root_path.starts_with('/') {
                result.add_warning(ValidationWarning::new(
                    "server.root_path",
                    "root_path should start with '/'",
                ));
            }
        }
    }

    fn validate_session(config: &Config, result: &mut ValidationResult) {
        if config.session.cookie_name.is_empty() {
            result.add_error(ValidationError::new(
                "session.cookie_name",
                "Cookie name cannot be empty",
            ));
        }
    }

    fn validate_kernel(config: &Config, result: &mut ValidationResult) {
        if config.kernel.max_workers == 0 {
            result.add_error(ValidationError::new(
                "kernel.max_workers",
                "max_workers must be greater than 0",
            ));
        }

        if config.kernel.max_workers > LARGE_WORKER_POOL {
            result.add_warning(ValidationWarning::new(
                "kernel.max_workers",
                format!(
                    "max_workers is very high (>{}), each worker holds an OS thread",
                    LARGE_WORKER_POOL
                ),
            ));
        }
    }

    fn validate_websocket(config: &Config, result: &mut ValidationResult) {
        if config.websocket.max_message_size == 0 {
            result.add_error(ValidationError::new(
                "websocket.max_message_size",
                "max_message_size must be greater than 0",
            ));
        }
    }

    fn validate_logging(config: &Config, result: &mut ValidationResult) {
        let level = config.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_error(ValidationError::new(
                "logging.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.logging.level, LOG_LEVELS
                ),
            ));
        }
    }
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
