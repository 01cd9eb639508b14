//! The charge cycle: one `chargeExpiredSubscriptions()` transaction

use super::journal::{ChargeLog, ChargeReceipt};
use crate::chain::ChargeClient;
use crate::chains::NetworkDescriptor;
use crate::error::ChargerResult;
use crate::metrics;
use crate::scheduler::ScheduledTask;
use crate::tx::{format_ether, format_gwei, ChargeRequest, ZkSyncSigner};

use async_trait::async_trait;
use chrono::Utc;
use ethers::types::Address;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Builds, prices, signs and submits the charge transaction, then records it
pub struct ChargeJob<C> {
    client: C,
    signer: ZkSyncSigner,
    contract: Address,
    network: &'static NetworkDescriptor,
    journal: ChargeLog,
}

impl<C: ChargeClient> ChargeJob<C> {
    pub fn new(
        client: C,
        signer: ZkSyncSigner,
        contract: Address,
        network: &'static NetworkDescriptor,
        journal: ChargeLog,
    ) -> Self {
        Self {
            client,
            signer,
            contract,
            network,
            journal,
        }
    }

    /// Run one cycle and append its block to the log. Once the transaction is
    /// confirmed the cycle counts as a success even if the log write fails.
    pub async fn run_cycle(&self) -> ChargerResult<ChargeReceipt> {
        let started_at = Utc::now();
        info!("Charging expired subscriptions...");

        let sender = self.signer.address();
        let chain_id = self.client.chain_id().await?;
        let nonce = self.client.transaction_count(sender).await?;

        let request = ChargeRequest::charge_expired_subscriptions(self.contract)
            .from(sender)
            .chain_id(chain_id)
            .nonce(nonce);

        let gas_price = self.client.gas_price().await?;
        let request = request.gas_price(gas_price);
        let gas_limit = self.client.estimate_gas(&request).await?;
        let request = request.gas_limit(gas_limit);
        let cost = request.cost().unwrap_or_default();

        info!("Estimated gas: {}", gas_limit);
        info!("Gas price: {} gwei", format_gwei(gas_price));
        info!("Estimated transaction cost: {} ETH", format_ether(cost));

        let raw = self.signer.sign_transaction(&request).await?;
        let tx_hash = self.client.send_raw_transaction(raw).await?;
        info!("Transaction sent. Waiting for confirmation...");

        let confirmation = self.client.wait_for_confirmation(tx_hash).await?;
        let finished_at = Utc::now();
        info!(
            "Expired subscriptions charged successfully in block {:?}",
            confirmation.block_number
        );

        let receipt = ChargeReceipt {
            started_at,
            finished_at,
            gas_limit,
            gas_price,
            cost,
            tx_hash,
            tx_url: self.network.tx_url(&format!("{:?}", tx_hash)),
            block_number: confirmation.block_number,
        };
        if let Err(e) = self.journal.record_success(&receipt).await {
            warn!(
                "Charge {:?} confirmed on-chain but {} was not updated: {}",
                tx_hash,
                self.journal.path().display(),
                e
            );
        }

        Ok(receipt)
    }

    /// Run one cycle; failures are logged and swallowed
    pub async fn trigger(&self) -> Option<ChargeReceipt> {
        let span = info_span!("charge_cycle", run_id = %Uuid::new_v4(), chain = self.network.id);

        async {
            match self.run_cycle().await {
                Ok(receipt) => {
                    metrics::record_cycle_success(receipt.cost);
                    Some(receipt)
                }
                Err(e) => {
                    error!("Error charging expired subscriptions: {}", e);
                    if e.after_broadcast() {
                        warn!("The transaction may still land; check the explorer before retrying");
                    }
                    metrics::record_cycle_failure();

                    if let Err(log_err) = self.journal.record_error(Utc::now(), &e.to_string()).await {
                        error!(
                            "Failed to append to {}: {}",
                            self.journal.path().display(),
                            log_err
                        );
                    }
                    None
                }
            }
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl<C: ChargeClient + 'static> ScheduledTask for ChargeJob<C> {
    async fn run(&self) {
        self.trigger().await;
    }
}
