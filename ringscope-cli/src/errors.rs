// src/errors.rs

//! Error types for the inspector front end.

use ringscope_core::ScopeError;
use ringscope_crypto::CryptoError;
use thiserror::Error;

/// Main error type for CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file could not be parsed or written
    #[error("Config error: {0}")]
    ConfigError(String),

    /// A command-line value was malformed or inconsistent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Wallet keys did not form a consistent wallet
    #[error("Wallet error: {0}")]
    WalletError(String),

    /// Inspection failed before any input could be processed
    #[error(transparent)]
    Scope(#[from] ScopeError),

    /// Key or address decoding failed
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CliError::InvalidArgument("--idx 4 but transaction has 2 inputs".to_string());
        assert_eq!(format!("{}", err), "Invalid argument: --idx 4 but transaction has 2 inputs");

        let err = CliError::from(ScopeError::NotFound("transaction ab".to_string()));
        assert_eq!(format!("{}", err), "Not found: transaction ab");
    }
}
