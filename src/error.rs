//! Error types for the subscription charger

use thiserror::Error;

/// Main error type for the charger
#[derive(Error, Debug)]
pub enum ChargerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chain connection error for chain {chain_id}: {message}")]
    ChainConnection { chain_id: u64, message: String },

    #[error("Nonce lookup failed for {address}: {message}")]
    Nonce { address: String, message: String },

    #[error("Gas estimation error: {0}")]
    GasEstimation(String),

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Timeout waiting for {operation}")]
    Timeout { operation: String },

    #[error("Transaction {tx_hash} was dropped from the mempool")]
    Dropped { tx_hash: String },

    #[error("Transaction {tx_hash} reverted in block {block_number}")]
    Reverted { tx_hash: String, block_number: u64 },

    #[error("Log file error: {0}")]
    Journal(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChargerError {
    /// Whether the transaction may have reached the network before failing
    pub fn after_broadcast(&self) -> bool {
        matches!(
            self,
            ChargerError::Timeout { .. }
                | ChargerError::Dropped { .. }
                | ChargerError::Reverted { .. }
        )
    }
}

/// Result type for charger operations
pub type ChargerResult<T> = Result<T, ChargerError>;
