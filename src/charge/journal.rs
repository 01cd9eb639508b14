//! Append-only text log of charge cycles

use crate::error::ChargerResult;
use crate::tx::{format_ether, format_gwei};

use chrono::{DateTime, SecondsFormat, Utc};
use ethers::types::{H256, U256};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Outcome of a successful charge cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeReceipt {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub gas_limit: U256,
    pub gas_price: U256,
    pub cost: U256,
    pub tx_hash: H256,
    /// Explorer link, when the network has an explorer
    pub tx_url: Option<String>,
    pub block_number: Option<u64>,
}

/// Millisecond RFC 3339 timestamp with a `Z` suffix
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Multi-line block for a successful cycle, terminated by a blank line
pub fn format_success(receipt: &ChargeReceipt) -> String {
    let start = timestamp(receipt.started_at);
    let end = timestamp(receipt.finished_at);
    let tx = receipt
        .tx_url
        .clone()
        .unwrap_or_else(|| format!("{:?}", receipt.tx_hash));

    format!(
        "[{start}] Charging expired subscriptions...\n\
         [{start}] Estimated gas: {gas}\n\
         [{start}] Gas price: {price} gwei\n\
         [{start}] Estimated transaction cost: {cost} ETH\n\
         [{end}] Transaction hash: {tx}\n\
         [{end}] Expired subscriptions charged successfully\n\n",
        gas = receipt.gas_limit,
        price = format_gwei(receipt.gas_price),
        cost = format_ether(receipt.cost),
    )
}

/// Single error line followed by a blank line
pub fn format_error(at: DateTime<Utc>, message: &str) -> String {
    let message: String = message
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    format!("[{}] Error: {}\n\n", timestamp(at), message)
}

/// Append-only log file
pub struct ChargeLog {
    path: PathBuf,
    /// Keeps blocks from interleaving
    write_lock: Mutex<()>,
}

impl ChargeLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn record_success(&self, receipt: &ChargeReceipt) -> ChargerResult<()> {
        self.append(&format_success(receipt)).await
    }

    pub async fn record_error(&self, at: DateTime<Utc>, message: &str) -> ChargerResult<()> {
        self.append(&format_error(at, message)).await
    }

    /// Append a whole block in one write, creating the file if needed
    async fn append(&self, block: &str) -> ChargerResult<()> {
        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
