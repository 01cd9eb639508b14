//! Local key signer for zkSync EIP-712 transactions

use super::eip712::SignInput;
use super::request::ChargeRequest;
use crate::error::{ChargerError, ChargerResult};

use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes};
use tracing::{debug, info};

/// Signs charge requests with a private key held in memory
#[derive(Debug, Clone)]
pub struct ZkSyncSigner {
    wallet: LocalWallet,
}

impl ZkSyncSigner {
    pub fn new(wallet: LocalWallet) -> Self {
        Self { wallet }
    }

    /// Load the key from the named environment variable
    pub fn from_env(var_name: &str) -> ChargerResult<Self> {
        let key = std::env::var(var_name).map_err(|_| {
            ChargerError::Wallet(format!("No wallet configured. Set {}", var_name))
        })?;

        let wallet = key
            .trim()
            .parse::<LocalWallet>()
            .map_err(|e| ChargerError::Wallet(format!("Invalid private key: {}", e)))?;

        info!("Signer loaded from {} with address {:?}", var_name, wallet.address());
        Ok(Self::new(wallet))
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    /// Sign a fully-populated request and return the raw envelope
    pub async fn sign_transaction(&self, request: &ChargeRequest) -> ChargerResult<Bytes> {
        if request.from != self.address() {
            return Err(ChargerError::Signing(format!(
                "request sender {:?} does not match signer {:?}",
                request.from,
                self.address()
            )));
        }

        let input = SignInput::try_from(request)?;
        let signature = self
            .wallet
            .sign_typed_data(&input)
            .await
            .map_err(|e| ChargerError::Signing(e.to_string()))?;

        let raw = input.encode_signed(&signature);
        debug!("Signed type-{} transaction, {} bytes", request.tx_type, raw.len());
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    const KEY: &str = "0x7726827caac94a7f9e1b160f7ea819f172f7b6f9d2a97f992c38edeab82d4110";

    #[test]
    fn test_from_env() {
        std::env::set_var("CHARGER_SIGNER_TEST_KEY", KEY);
        let signer = ZkSyncSigner::from_env("CHARGER_SIGNER_TEST_KEY").unwrap();
        assert_eq!(signer.address(), KEY.parse::<LocalWallet>().unwrap().address());

        assert!(matches!(
            ZkSyncSigner::from_env("CHARGER_SIGNER_TEST_MISSING"),
            Err(ChargerError::Wallet(_))
        ));

        std::env::set_var("CHARGER_SIGNER_TEST_BAD", "not-a-key");
        assert!(matches!(
            ZkSyncSigner::from_env("CHARGER_SIGNER_TEST_BAD"),
            Err(ChargerError::Wallet(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_foreign_sender() {
        let signer = ZkSyncSigner::new(KEY.parse().unwrap());
        let request = ChargeRequest::charge_expired_subscriptions(Address::zero())
            .from(Address::repeat_byte(0x11))
            .gas_price(U256::one())
            .gas_limit(U256::one());

        assert!(matches!(
            signer.sign_transaction(&request).await,
            Err(ChargerError::Signing(_))
        ));
    }
}
