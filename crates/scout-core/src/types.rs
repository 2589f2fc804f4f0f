//! Type definitions shared across the scout pipeline.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// An observed, not-yet-finalized transaction.
///
/// Built from the host node's pending-transaction feed. Read-only;
/// discarded after one pipeline pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransaction {
    /// Transaction hash.
    pub hash: B256,
    /// Recovered sender address.
    pub sender: Address,
    /// Recipient address (None for contract creation).
    pub to: Option<Address>,
    /// Transaction value in Wei.
    pub value: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in Wei.
    pub gas_price: u128,
    /// Nonce.
    pub nonce: u64,
    /// Call data (init code for creations).
    pub input: Bytes,
    /// Chain id the transaction was signed for.
    pub chain_id: u64,
}

impl PendingTransaction {
    /// True when the transaction creates a contract (no recipient).
    pub fn is_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// A qualifying token transfer detected by a profitability heuristic.
///
/// Reported through structured logging and then discarded; nothing
/// in the scout persists evidence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Evidence {
    /// Hash of the observed transaction that produced the opportunity.
    pub source_tx: B256,
    /// Token contract that emitted the transfer.
    pub token: Address,
    /// Transferred amount.
    pub amount: U256,
    /// Credited address (the impersonating identity).
    pub recipient: Address,
    /// Name of the heuristic that produced this record.
    pub heuristic: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_has_no_recipient() {
        let tx = PendingTransaction {
            hash: B256::ZERO,
            sender: Address::ZERO,
            to: None,
            value: U256::ZERO,
            gas_limit: 21_000,
            gas_price: 1_000_000_000,
            nonce: 0,
            input: Bytes::new(),
            chain_id: 56,
        };
        assert!(tx.is_creation());

        let call = PendingTransaction {
            to: Some(Address::repeat_byte(0x11)),
            ..tx
        };
        assert!(!call.is_creation());
    }
}
