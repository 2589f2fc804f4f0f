//! Host-node interface consumed by the pipeline.
//!
//! The scout never talks to the network itself; the host node supplies
//! the chain head, state snapshots, and pending-pool nonces. Snapshot
//! derivation is assumed safe for concurrent independent callers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::Address;
use async_trait::async_trait;
use eyre::Result;

use scout_sim::{HeaderContext, SnapshotState};

/// Chain-state access provided by the host node.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    /// Number of the current chain head.
    async fn current_head_number(&self) -> Result<u64>;

    /// State snapshot and header context at the given block number.
    async fn state_and_header_at(&self, number: u64) -> Result<(SnapshotState, HeaderContext)>;

    /// Pending-pool nonce for an address.
    async fn pool_nonce(&self, address: Address) -> Result<u64>;
}

/// In-memory backend over a fixed snapshot.
///
/// Serves the CLI replay mode and the integration tests; every call
/// hands out an independent clone of the seeded state.
pub struct MemoryBackend {
    head: u64,
    header: HeaderContext,
    state: SnapshotState,
    pool_nonces: HashMap<Address, u64>,
    nonce_queries: AtomicU64,
}

impl MemoryBackend {
    /// Build a backend serving `state` at head `header.number`.
    pub fn new(header: HeaderContext, state: SnapshotState) -> Self {
        Self {
            head: header.number,
            header,
            state,
            pool_nonces: HashMap::new(),
            nonce_queries: AtomicU64::new(0),
        }
    }

    /// Override the pending-pool nonce for one address.
    ///
    /// Without an override the pool nonce falls back to the seeded
    /// account nonce (an empty pool).
    pub fn with_pool_nonce(mut self, address: Address, nonce: u64) -> Self {
        self.pool_nonces.insert(address, nonce);
        self
    }

    /// How many pool-nonce lookups have been served.
    pub fn nonce_query_count(&self) -> u64 {
        self.nonce_queries.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChainBackend for MemoryBackend {
    async fn current_head_number(&self) -> Result<u64> {
        Ok(self.head)
    }

    async fn state_and_header_at(&self, number: u64) -> Result<(SnapshotState, HeaderContext)> {
        if number != self.head {
            eyre::bail!("no state for block {number}, head is {}", self.head);
        }
        Ok((self.state.clone(), self.header.clone()))
    }

    async fn pool_nonce(&self, address: Address) -> Result<u64> {
        self.nonce_queries.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .pool_nonces
            .get(&address)
            .copied()
            .or_else(|| self.state.account(address).map(|info| info.nonce))
            .unwrap_or(0))
    }
}
