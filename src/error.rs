//! Error types for walletlink.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Launch parameter error: {0}")]
    Launch(#[from] LaunchParamError),

    #[error("Signer error: {0}")]
    Signer(#[from] SignerError),

    #[error("Relay error: {0}")]
    Relay(#[from] RelayError),

    #[error("Transaction flow error: {0}")]
    Transaction(#[from] TransactionFlowError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors extracting flow inputs from the launch-context start parameter.
#[derive(Debug, thiserror::Error)]
pub enum LaunchParamError {
    #[error("No nonce found in start parameters")]
    MissingNonce,

    #[error("Failed to parse transaction data from start parameter: {0}")]
    UnparsableTransaction(String),

    #[error("Invalid transaction field {field}: {message}")]
    InvalidField { field: &'static str, message: String },

    #[error("Failed to encode start parameter: {0}")]
    Encode(String),
}

/// Wallet signing capability errors.
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    #[error("No wallet session is connected")]
    NotConnected,

    #[error("Signature request rejected: {reason}")]
    Rejected { reason: String },

    #[error("Transaction submission failed: {reason}")]
    Submission { reason: String },

    #[error("Receipt watch failed for {hash}: {reason}")]
    Watch { hash: String, reason: String },

    #[error("Invalid signing key: {reason}")]
    InvalidKey { reason: String },
}

/// Outbound relay errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Outbound relay is not available: the mini app may not have been launched from the host")]
    Unavailable,

    #[error("Failed to hand payload to the host: {0}")]
    SendFailed(String),

    #[error("Failed to encode envelope: {0}")]
    Encode(String),

    #[error("Failed to decode envelope: {0}")]
    Decode(String),
}

/// Transaction lifecycle misuse errors.
#[derive(Debug, thiserror::Error)]
pub enum TransactionFlowError {
    #[error("A submission was already attempted for this controller instance")]
    AlreadySubmitted,

    #[error("No submitted transaction is awaiting confirmation")]
    NothingToConfirm,
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
