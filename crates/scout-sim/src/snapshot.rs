//! World-state snapshots backing sandbox execution.
//!
//! [`SnapshotState`] holds the accounts and storage fetched from the host
//! node at the current chain head and implements REVM's [`DatabaseRef`]
//! for read-only access. Each simulation attempt wraps its own clone in a
//! `CacheDB`, so writes land in the cache layer and never reach the
//! snapshot or any other attempt.

use std::collections::HashMap;
use std::convert::Infallible;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use revm::db::DatabaseRef;
use revm::primitives::{AccountInfo, BlobExcessGasAndPrice, BlockEnv, Bytecode, KECCAK_EMPTY};

/// Block header context a sandbox executes under.
#[derive(Clone, Debug)]
pub struct HeaderContext {
    /// Block number.
    pub number: u64,
    /// Block timestamp in unix seconds.
    pub timestamp: u64,
    /// Block gas limit.
    pub gas_limit: u64,
    /// Base fee per gas in Wei.
    pub base_fee: u128,
    /// Coinbase address.
    pub coinbase: Address,
}

impl HeaderContext {
    /// Map the header onto a REVM block environment.
    pub fn to_block_env(&self) -> BlockEnv {
        BlockEnv {
            number: U256::from(self.number),
            timestamp: U256::from(self.timestamp),
            gas_limit: U256::from(self.gas_limit),
            basefee: U256::from(self.base_fee),
            difficulty: U256::ZERO,
            prevrandao: Some(B256::ZERO),
            coinbase: self.coinbase,
            // Cancun header validation rejects a block env without the
            // blob gas fields; the scout never replays blob carriers.
            blob_excess_gas_and_price: Some(BlobExcessGasAndPrice::new(0, false)),
        }
    }
}

/// Accounts and storage captured from the chain head.
#[derive(Clone, Debug, Default)]
pub struct SnapshotState {
    accounts: HashMap<Address, AccountInfo>,
    storage: HashMap<Address, HashMap<U256, U256>>,
}

impl SnapshotState {
    /// Empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an externally-owned account.
    pub fn insert_eoa(&mut self, address: Address, balance: U256, nonce: u64) {
        self.accounts.insert(
            address,
            AccountInfo {
                balance,
                nonce,
                code_hash: KECCAK_EMPTY,
                code: None,
            },
        );
    }

    /// Seed a contract account with its runtime code.
    pub fn insert_contract(&mut self, address: Address, code: Bytes) {
        self.accounts.insert(
            address,
            AccountInfo {
                balance: U256::ZERO,
                nonce: 1,
                code_hash: keccak256(&code),
                code: Some(Bytecode::new_raw(code)),
            },
        );
    }

    /// Seed one storage slot of a contract.
    pub fn insert_storage(&mut self, address: Address, slot: U256, value: U256) {
        self.storage.entry(address).or_default().insert(slot, value);
    }

    /// Look up a seeded account.
    pub fn account(&self, address: Address) -> Option<&AccountInfo> {
        self.accounts.get(&address)
    }
}

impl DatabaseRef for SnapshotState {
    type Error = Infallible;

    fn basic_ref(&self, address: Address) -> Result<Option<AccountInfo>, Self::Error> {
        Ok(self.accounts.get(&address).cloned())
    }

    fn code_by_hash_ref(&self, _code_hash: B256) -> Result<Bytecode, Self::Error> {
        // Code is carried inline on AccountInfo.
        Ok(Bytecode::new())
    }

    fn storage_ref(&self, address: Address, slot: U256) -> Result<U256, Self::Error> {
        // Untouched slots read as zero, matching on-chain semantics.
        Ok(self
            .storage
            .get(&address)
            .and_then(|slots| slots.get(&slot))
            .copied()
            .unwrap_or(U256::ZERO))
    }

    fn block_hash_ref(&self, _number: u64) -> Result<B256, Self::Error> {
        Ok(B256::ZERO)
    }
}
