//! Error types for the vote campaign runner

use thiserror::Error;

/// Main error type for the voter
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VoterError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC endpoint unreachable: {0}")]
    AdapterUnreachable(String),

    #[error("Connected to chain {actual}, expected chain {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("Nonce query failed: {0}")]
    NonceQueryFailed(String),

    #[error("Gas estimation failed: {0}")]
    GasEstimationFailed(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Submission failed: {0}")]
    SubmissionFailed(String),

    #[error("Receipt lookup failed: {0}")]
    ReceiptLookup(String),
}

impl VoterError {
    /// Errors that end only the current attempt; everything else aborts
    /// before the campaign starts.
    pub fn is_attempt_scoped(&self) -> bool {
        matches!(
            self,
            VoterError::NonceQueryFailed(_)
                | VoterError::GasEstimationFailed(_)
                | VoterError::SubmissionFailed(_)
                | VoterError::ReceiptLookup(_)
        )
    }

    /// Errors the confirmation poller absorbs as continued pendingness
    pub fn is_transient(&self) -> bool {
        matches!(self, VoterError::ReceiptLookup(_))
    }
}

/// Result type for voter operations
pub type VoterResult<T> = Result<T, VoterError>;
