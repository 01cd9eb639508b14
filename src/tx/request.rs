//! The charge transaction request assembled for every cycle

use super::gas::calculate_cost;

use ethers::abi::AbiEncode;
use ethers::contract::abigen;
use ethers::types::{Address, Bytes, U256, U64};
use serde::Serialize;

abigen!(
    SubscriptionManager,
    r#"[
        function chargeExpiredSubscriptions()
    ]"#
);

/// zkSync Era EIP-712 transaction type
pub const EIP712_TX_TYPE: u8 = 0x71;

/// Default gas-per-pubdata limit used by zkSync wallets
pub const DEFAULT_GAS_PER_PUBDATA_LIMIT: u64 = 50_000;

/// Unsigned `chargeExpiredSubscriptions()` call with every field the
/// network needs to price and accept it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub chain_id: u64,
    pub nonce: U256,
    pub tx_type: u8,
    pub gas_per_pubdata: U256,
    pub value: U256,
    pub gas_price: Option<U256>,
    pub gas_limit: Option<U256>,
}

impl ChargeRequest {
    /// Populate the bare contract call
    pub fn charge_expired_subscriptions(contract: Address) -> Self {
        let data = ChargeExpiredSubscriptionsCall.encode();

        Self {
            from: Address::zero(),
            to: contract,
            data: data.into(),
            chain_id: 0,
            nonce: U256::zero(),
            tx_type: EIP712_TX_TYPE,
            gas_per_pubdata: U256::from(DEFAULT_GAS_PER_PUBDATA_LIMIT),
            value: U256::zero(),
            gas_price: None,
            gas_limit: None,
        }
    }

    pub fn from(mut self, from: Address) -> Self {
        self.from = from;
        self
    }

    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = chain_id;
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn gas_price(mut self, gas_price: U256) -> Self {
        self.gas_price = Some(gas_price);
        self
    }

    pub fn gas_limit(mut self, gas_limit: U256) -> Self {
        self.gas_limit = Some(gas_limit);
        self
    }

    /// `gas_price * gas_limit`, once both are known
    pub fn cost(&self) -> Option<U256> {
        match (self.gas_limit, self.gas_price) {
            (Some(limit), Some(price)) => Some(calculate_cost(limit, price)),
            _ => None,
        }
    }

    /// Request body for `eth_estimateGas` in the shape zkSync nodes expect
    pub fn to_call_request(&self) -> ZkCallRequest {
        ZkCallRequest {
            from: self.from,
            to: self.to,
            data: self.data.clone(),
            value: self.value,
            nonce: self.nonce,
            gas_price: self.gas_price,
            tx_type: U64::from(self.tx_type),
            eip712_meta: Eip712Meta {
                gas_per_pubdata: self.gas_per_pubdata,
            },
        }
    }
}

/// JSON-RPC call object carrying zkSync EIP-712 metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZkCallRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
    pub nonce: U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde(rename = "type")]
    pub tx_type: U64,
    pub eip712_meta: Eip712Meta,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Eip712Meta {
    pub gas_per_pubdata: U256,
}
