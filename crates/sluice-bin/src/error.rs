// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Binary-level error types.

use thiserror::Error;

/// Result type alias for binary operations.
pub type BinResult<T> = Result<T, BinError>;

/// Errors surfaced by the `sluice` binary.
#[derive(Debug, Error)]
pub enum BinError {
    /// Configuration could not be loaded or is invalid. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A component failed to initialize.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// The API server failed.
    #[error("API server error: {0}")]
    Api(#[from] sluice_api::ApiError),

    /// A background task failed unexpectedly.
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl From<sluice_config::ConfigError> for BinError {
    fn from(err: sluice_config::ConfigError) -> Self {
        BinError::Configuration(err.to_string())
    }
}

impl From<sluice_core::RegistryError> for BinError {
    fn from(err: sluice_core::RegistryError) -> Self {
        BinError::Configuration(err.to_string())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = BinError::Configuration("bad tags".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad tags");
    }

    #[test]
    fn test_from_registry_error() {
        let err: BinError = sluice_core::RegistryError::duplicate("Flow").into();
        assert!(matches!(err, BinError::Configuration(_)));
    }
}
