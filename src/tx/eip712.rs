//! zkSync Era type-113 transactions: EIP-712 sign input and raw encoding
//!
//! The account signs the typed-data digest of [`SignInput`]; the signature
//! travels inside the RLP envelope as the custom signature field rather than
//! as `v, r, s`.

use super::request::{ChargeRequest, EIP712_TX_TYPE};
use crate::error::ChargerError;

use ethers::abi::{self, Token};
use ethers::types::transaction::eip712::{EIP712Domain, Eip712};
use ethers::types::{Address, Bytes, Signature, U256};
use ethers::utils::keccak256;
use ethers::utils::rlp::RlpStream;

const TRANSACTION_TYPE: &str = "Transaction(uint256 txType,uint256 from,uint256 to,uint256 gasLimit,uint256 gasPerPubdataByteLimit,uint256 maxFeePerGas,uint256 maxPriorityFeePerGas,uint256 paymaster,uint256 nonce,uint256 value,bytes data,bytes32[] factoryDeps,bytes paymasterInput)";

/// Fully-priced transaction fields covered by the signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInput {
    pub tx_type: u8,
    pub from: Address,
    pub to: Address,
    pub gas_limit: U256,
    pub gas_per_pubdata: U256,
    pub max_fee_per_gas: U256,
    pub max_priority_fee_per_gas: U256,
    pub nonce: U256,
    pub value: U256,
    pub data: Bytes,
    pub chain_id: u64,
}

impl TryFrom<&ChargeRequest> for SignInput {
    type Error = ChargerError;

    fn try_from(request: &ChargeRequest) -> Result<Self, Self::Error> {
        let gas_price = request
            .gas_price
            .ok_or_else(|| ChargerError::Signing("gas price not set".to_string()))?;
        let gas_limit = request
            .gas_limit
            .ok_or_else(|| ChargerError::Signing("gas limit not set".to_string()))?;

        Ok(Self {
            tx_type: request.tx_type,
            from: request.from,
            to: request.to,
            gas_limit,
            gas_per_pubdata: request.gas_per_pubdata,
            // Legacy-style pricing: both EIP-1559 caps equal the quoted price
            max_fee_per_gas: gas_price,
            max_priority_fee_per_gas: gas_price,
            nonce: request.nonce,
            value: request.value,
            data: request.data.clone(),
            chain_id: request.chain_id,
        })
    }
}

impl Eip712 for SignInput {
    type Error = ChargerError;

    fn domain(&self) -> Result<EIP712Domain, Self::Error> {
        Ok(EIP712Domain {
            name: Some("zkSync".to_string()),
            version: Some("2".to_string()),
            chain_id: Some(U256::from(self.chain_id)),
            verifying_contract: None,
            salt: None,
        })
    }

    fn type_hash() -> Result<[u8; 32], Self::Error> {
        Ok(keccak256(TRANSACTION_TYPE))
    }

    fn struct_hash(&self) -> Result<[u8; 32], Self::Error> {
        let empty = keccak256(b"");
        let encoded = abi::encode(&[
            Token::FixedBytes(Self::type_hash()?.to_vec()),
            Token::Uint(U256::from(self.tx_type)),
            Token::Address(self.from),
            Token::Address(self.to),
            Token::Uint(self.gas_limit),
            Token::Uint(self.gas_per_pubdata),
            Token::Uint(self.max_fee_per_gas),
            Token::Uint(self.max_priority_fee_per_gas),
            // No paymaster
            Token::Address(Address::zero()),
            Token::Uint(self.nonce),
            Token::Uint(self.value),
            Token::FixedBytes(keccak256(self.data.as_ref()).to_vec()),
            // Empty factoryDeps and paymasterInput
            Token::FixedBytes(empty.to_vec()),
            Token::FixedBytes(empty.to_vec()),
        ]);

        Ok(keccak256(encoded))
    }
}

impl SignInput {
    /// Raw `0x71`-prefixed envelope ready for `eth_sendRawTransaction`
    pub fn encode_signed(&self, signature: &Signature) -> Bytes {
        let chain_id = U256::from(self.chain_id);

        let mut rlp = RlpStream::new_list(16);
        rlp.append(&self.nonce);
        rlp.append(&self.max_priority_fee_per_gas);
        rlp.append(&self.max_fee_per_gas);
        rlp.append(&self.gas_limit);
        rlp.append(&self.to);
        rlp.append(&self.value);
        rlp.append(&self.data.to_vec());
        // Signature slots stay unset; the chain id takes the `v` position
        rlp.append(&chain_id);
        rlp.append_empty_data();
        rlp.append_empty_data();
        rlp.append(&chain_id);
        rlp.append(&self.from);
        rlp.append(&self.gas_per_pubdata);
        rlp.begin_list(0);
        rlp.append(&signature.to_vec());
        rlp.begin_list(0);

        let mut raw = vec![EIP712_TX_TYPE];
        raw.extend_from_slice(&rlp.out());
        raw.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::{LocalWallet, Signer};
    use ethers::types::H256;
    use ethers::utils::rlp::Rlp;

    const KEY: &str = "0x7726827caac94a7f9e1b160f7ea819f172f7b6f9d2a97f992c38edeab82d4110";

    fn sign_input(from: Address) -> SignInput {
        let request = ChargeRequest::charge_expired_subscriptions(
            "0x5FbDB2315678afecb367f032d93F642f64180aa3".parse().unwrap(),
        )
        .from(from)
        .chain_id(260)
        .nonce(U256::from(3u64))
        .gas_price(U256::from(1_000_000_000u64))
        .gas_limit(U256::from(50_000u64));

        SignInput::try_from(&request).unwrap()
    }

    #[test]
    fn test_requires_gas_fields() {
        let request = ChargeRequest::charge_expired_subscriptions(Address::zero());
        assert!(matches!(
            SignInput::try_from(&request),
            Err(ChargerError::Signing(_))
        ));
    }

    #[test]
    fn test_domain_separator_only_covers_name_version_chain() {
        let input = sign_input(Address::zero());
        let domain = input.domain().unwrap();

        let expected = keccak256(abi::encode(&[
            Token::FixedBytes(
                keccak256("EIP712Domain(string name,string version,uint256 chainId)").to_vec(),
            ),
            Token::FixedBytes(keccak256("zkSync").to_vec()),
            Token::FixedBytes(keccak256("2").to_vec()),
            Token::Uint(U256::from(260u64)),
        ]));
        assert_eq!(domain.separator(), expected);
    }

    #[tokio::test]
    async fn test_signature_recovers_sender() {
        let wallet: LocalWallet = KEY.parse().unwrap();
        let input = sign_input(wallet.address());

        let signature = wallet.sign_typed_data(&input).await.unwrap();
        let digest = H256::from(input.encode_eip712().unwrap());

        assert_eq!(signature.recover(digest).unwrap(), wallet.address());
    }

    #[tokio::test]
    async fn test_envelope_layout() {
        let wallet: LocalWallet = KEY.parse().unwrap();
        let input = sign_input(wallet.address());
        let signature = wallet.sign_typed_data(&input).await.unwrap();

        let raw = input.encode_signed(&signature);
        assert_eq!(raw[0], 0x71);

        let rlp = Rlp::new(&raw[1..]);
        assert_eq!(rlp.item_count().unwrap(), 16);
        assert_eq!(rlp.val_at::<U256>(0).unwrap(), U256::from(3u64));
        assert_eq!(rlp.val_at::<U256>(3).unwrap(), U256::from(50_000u64));
        assert_eq!(rlp.val_at::<U256>(7).unwrap(), U256::from(260u64));
        assert_eq!(rlp.val_at::<U256>(10).unwrap(), U256::from(260u64));
        assert_eq!(rlp.val_at::<Address>(11).unwrap(), wallet.address());
        assert_eq!(rlp.val_at::<U256>(12).unwrap(), U256::from(50_000u64));
        assert_eq!(rlp.at(13).unwrap().item_count().unwrap(), 0);
        assert_eq!(rlp.val_at::<Vec<u8>>(14).unwrap(), signature.to_vec());
        assert_eq!(rlp.at(15).unwrap().item_count().unwrap(), 0);
    }
}
