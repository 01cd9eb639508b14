//! Network primitives consumed by a charge cycle

use crate::error::ChargerResult;
use crate::tx::ChargeRequest;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, H256, U256};

/// Inclusion of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

/// Account, gas and transaction primitives of a zkSync node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChargeClient: Send + Sync {
    /// Chain id reported by the node
    async fn chain_id(&self) -> ChargerResult<u64>;

    /// Next nonce for `address`
    async fn transaction_count(&self, address: Address) -> ChargerResult<U256>;

    async fn gas_price(&self) -> ChargerResult<U256>;

    async fn estimate_gas(&self, request: &ChargeRequest) -> ChargerResult<U256>;

    /// Broadcast a signed envelope, returning its hash
    async fn send_raw_transaction(&self, raw: Bytes) -> ChargerResult<H256>;

    /// Block until the transaction has one confirmation
    async fn wait_for_confirmation(&self, tx_hash: H256) -> ChargerResult<Confirmation>;
}
