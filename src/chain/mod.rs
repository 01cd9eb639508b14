//! Chain module - the network side of a charge cycle
//!
//! This module provides:
//! - The `ChargeClient` seam the cycle is written against
//! - A zkSync Era JSON-RPC implementation of it

pub mod client;
pub mod provider;

pub use client::ChargeClient;
pub use provider::ZkSyncProvider;

#[cfg(test)]
pub use client::MockChargeClient;
