// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration error types.
//!
//! Configuration errors are the only fatal errors in the bridge: a process
//! with a broken configuration refuses to start, so these errors surface at
//! startup and in `sluice validate`, never at runtime.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse the configuration file.
    #[error("Failed to parse config file '{path}': {message}")]
    Parse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Parser error message.
        message: String,
    },

    /// A field failed validation.
    #[error("Validation failed for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// What is wrong with it.
        message: String,
    },

    /// A required field is missing.
    #[error("Missing required field: {field}")]
    MissingField {
        /// The missing field name.
        field: String,
    },

    /// Two tag entries share a name.
    #[error("Duplicate tag name: {name}")]
    DuplicateTag {
        /// The duplicated tag name.
        name: String,
    },

    /// File I/O error.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        /// Path to the file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file does not exist.
    #[error("Config file not found: {path}")]
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The file extension maps to no supported format.
    #[error("Unsupported config format '{extension}' (expected yaml, toml, or json)")]
    UnsupportedFormat {
        /// The unrecognized extension.
        extension: String,
    },

    /// An environment variable override could not be applied.
    #[error("Invalid value in environment variable '{name}': {message}")]
    InvalidEnvVar {
        /// The environment variable name.
        name: String,
        /// What is wrong with the value.
        message: String,
    },
}

impl ConfigError {
    /// Creates a validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates a missing-field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate-tag error.
    pub fn duplicate_tag(name: impl Into<String>) -> Self {
        Self::DuplicateTag { name: name.into() }
    }

    /// Creates an invalid-environment-variable error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ConfigError::validation("source.endpoint", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation failed for 'source.endpoint': must not be empty"
        );

        let err = ConfigError::duplicate_tag("Flow");
        assert_eq!(err.to_string(), "Duplicate tag name: Flow");
    }
}
