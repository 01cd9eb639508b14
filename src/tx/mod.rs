//! Charge transaction construction, pricing and signing

mod eip712;
mod gas;
mod request;
mod signer;

pub use gas::{format_ether, format_gwei};
pub use request::ChargeRequest;
pub use signer::ZkSyncSigner;
