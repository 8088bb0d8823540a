//! Error types shared by every sentiflow crate.
//!
//! Configuration problems are detected before any stage does work, so they get
//! their own type instead of riding inside the per-stage failure.

use std::path::PathBuf;

/// Errors from loading and validating the pipeline configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::ParseError {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ConfigError::EnvVarMissing {
            var: "DAGSHUB_PAT".into(),
        };
        assert_eq!(err.to_string(), "Environment variable not set: DAGSHUB_PAT");

        let err = ConfigError::invalid("test_size must be in (0, 1)");
        assert!(err.to_string().contains("test_size"));
    }
}
