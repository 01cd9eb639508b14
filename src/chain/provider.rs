//! JSON-RPC client for zkSync Era nodes

use super::client::{ChargeClient, Confirmation};
use crate::chains;
use crate::error::{ChargerError, ChargerResult};
use crate::tx::ChargeRequest;

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// HTTP provider bound to one chain
pub struct ZkSyncProvider {
    /// Chain id from the network table, used for error context
    expected_chain_id: u64,
    provider: Provider<Http>,
    confirmation_timeout: Option<Duration>,
}

impl ZkSyncProvider {
    /// Create a new provider for `rpc_url`
    pub fn new(
        rpc_url: &str,
        expected_chain_id: u64,
        poll_interval: Duration,
        confirmation_timeout: Option<Duration>,
    ) -> ChargerResult<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ChargerError::ChainConnection {
                chain_id: expected_chain_id,
                message: format!("Invalid RPC URL {}: {}", rpc_url, e),
            })?
            .interval(poll_interval);

        debug!("Added HTTP provider for chain {}: {}", expected_chain_id, rpc_url);

        Ok(Self {
            expected_chain_id,
            provider,
            confirmation_timeout,
        })
    }

    fn connection_error(&self, e: impl std::fmt::Display) -> ChargerError {
        ChargerError::ChainConnection {
            chain_id: self.expected_chain_id,
            message: e.to_string(),
        }
    }

    async fn await_receipt(&self, tx_hash: H256) -> ChargerResult<Option<TransactionReceipt>> {
        PendingTransaction::new(tx_hash, &self.provider)
            .confirmations(1)
            .await
            .map_err(|e| self.connection_error(e))
    }
}

#[async_trait]
impl ChargeClient for ZkSyncProvider {
    async fn chain_id(&self) -> ChargerResult<u64> {
        let chain_id = self
            .provider
            .get_chainid()
            .await
            .map_err(|e| self.connection_error(e))?
            .as_u64();

        if chain_id != self.expected_chain_id {
            warn!(
                "Node reports chain {} ({}) but network table expects {}",
                chain_id,
                chains::by_id(chain_id).map(|n| n.name).unwrap_or("unknown"),
                self.expected_chain_id
            );
        }
        Ok(chain_id)
    }

    async fn transaction_count(&self, address: Address) -> ChargerResult<U256> {
        self.provider
            .get_transaction_count(address, None)
            .await
            .map_err(|e| ChargerError::Nonce {
                address: format!("{:?}", address),
                message: e.to_string(),
            })
    }

    async fn gas_price(&self) -> ChargerResult<U256> {
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| ChargerError::GasEstimation(e.to_string()))
    }

    async fn estimate_gas(&self, request: &ChargeRequest) -> ChargerResult<U256> {
        self.provider
            .request("eth_estimateGas", [request.to_call_request()])
            .await
            .map_err(|e| ChargerError::GasEstimation(e.to_string()))
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> ChargerResult<H256> {
        let pending = self
            .provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| ChargerError::Transaction(e.to_string()))?;

        let tx_hash = pending.tx_hash();
        info!("Transaction sent: {:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_confirmation(&self, tx_hash: H256) -> ChargerResult<Confirmation> {
        let receipt = match self.confirmation_timeout {
            Some(limit) => timeout(limit, self.await_receipt(tx_hash))
                .await
                .map_err(|_| ChargerError::Timeout {
                    operation: format!("confirmation of {:?}", tx_hash),
                })??,
            None => self.await_receipt(tx_hash).await?,
        };

        let receipt = receipt.ok_or_else(|| ChargerError::Dropped {
            tx_hash: format!("{:?}", tx_hash),
        })?;

        let block_number = receipt.block_number.map(|b| b.as_u64());
        if receipt.status == Some(U64::zero()) {
            return Err(ChargerError::Reverted {
                tx_hash: format!("{:?}", tx_hash),
                block_number: block_number.unwrap_or_default(),
            });
        }

        Ok(Confirmation {
            tx_hash,
            block_number,
            gas_used: receipt.gas_used,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_malformed_url() {
        let result = ZkSyncProvider::new("not a url", 260, Duration::from_millis(100), None);
        assert!(matches!(
            result,
            Err(ChargerError::ChainConnection { chain_id: 260, .. })
        ));
    }

    #[test]
    fn test_accepts_local_node() {
        let provider = ZkSyncProvider::new(
            "http://127.0.0.1:8011",
            260,
            Duration::from_millis(100),
            Some(Duration::from_secs(60)),
        )
        .unwrap();
        assert_eq!(provider.confirmation_timeout, Some(Duration::from_secs(60)));
    }
}
