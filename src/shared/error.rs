//! Error handling for the wallet core
//!
//! This module defines the error types used throughout the wallet core.

use thiserror::Error;

/// Wallet error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// Authentication or format failure during decryption. Always fails
    /// closed; wrong passwords and corrupt blobs are deliberately not
    /// distinguishable from each other.
    #[error("Decryption failed")]
    Decryption,

    /// The candidate password did not match the stored verification tag.
    #[error("Invalid password")]
    InvalidPassword,

    /// Structurally invalid persisted state.
    #[error("Malformed data: {0}")]
    MalformedData(String),

    /// A prompt was dismissed or a request timed out. Distinct from
    /// authentication failures so callers can retry without re-prompting
    /// for credentials.
    #[error("Operation canceled: {0}")]
    Canceled(String),

    /// A context received a request for a method it does not service.
    #[error("Method not supported: {0}")]
    MethodNotSupported(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A response channel closed with neither result nor error. Must never
    /// be treated as success.
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl WalletError {
    /// Create a malformed data error
    pub fn malformed_data(message: impl Into<String>) -> Self {
        Self::MalformedData(message.into())
    }

    /// Create a cancellation error
    pub fn canceled(message: impl Into<String>) -> Self {
        Self::Canceled(message.into())
    }

    /// Create a method-not-supported error
    pub fn method_not_supported(message: impl Into<String>) -> Self {
        Self::MethodNotSupported(message.into())
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    /// True for timeout/dismissal errors that are safe to retry without
    /// re-prompting for credentials.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Canceled(_))
    }
}

/// Result alias used throughout the wallet core
pub type WalletResult<T> = Result<T, WalletError>;

// Standard library error conversions
impl From<std::io::Error> for WalletError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("JSON error: {}", err))
    }
}

impl From<tokio::task::JoinError> for WalletError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::internal(format!("Task join error: {}", err))
    }
}

// Cryptographic error conversions
impl From<argon2::Error> for WalletError {
    fn from(err: argon2::Error) -> Self {
        Self::internal(format!("Argon2 error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let malformed = WalletError::malformed_data("no tag");
        let canceled = WalletError::canceled("dismissed");

        assert!(matches!(malformed, WalletError::MalformedData(_)));
        assert!(matches!(canceled, WalletError::Canceled(_)));
    }

    #[test]
    fn test_error_conversions() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let wallet_error: WalletError = io_error.into();

        assert!(matches!(wallet_error, WalletError::Storage(_)));
    }

    #[test]
    fn test_error_display() {
        let error = WalletError::Decryption;
        let display = format!("{}", error);

        assert_eq!(display, "Decryption failed");
    }

    #[test]
    fn test_transient_classification() {
        assert!(WalletError::canceled("timed out").is_transient());
        assert!(!WalletError::InvalidPassword.is_transient());
        assert!(!WalletError::Decryption.is_transient());
    }
}
