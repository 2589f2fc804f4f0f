//! scout-core crate

pub mod config;
pub mod error;
pub mod types;

pub use config::ScoutConfig;
pub use error::AnalysisError;
pub use types::{Evidence, PendingTransaction};

use alloy::primitives::{b256, B256, U256};

/// ERC-20 Transfer event signature: `keccak256("Transfer(address,address,uint256)")`.
pub const TRANSFER_EVENT_TOPIC: B256 =
    b256!("ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef");

/// Gas limit applied to shadow contract-creation transactions.
pub const CONTRACT_CREATE_GAS_LIMIT: u64 = 10_000_000;

/// One whole token unit for 18-decimal tokens (10^18 Wei).
pub const ETHER: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);
