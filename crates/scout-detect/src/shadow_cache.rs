//! Bounded cache of not-yet-deployed contract code.
//!
//! When a creation transaction is observed, its init code is stored under
//! the deterministic address the contract will occupy once mined
//! (`create(sender, nonce)`). A later replay that targets that address
//! before deployment can then redeploy the contract inside its own
//! sandbox. Whether the contract ever lands on-chain is irrelevant to
//! the key.

use std::num::NonZeroUsize;
use std::sync::Mutex;

use alloy::primitives::{Address, Bytes};
use lru::LruCache;

use scout_core::PendingTransaction;

/// Concurrent, capacity-bounded LRU of deployment code.
pub struct ShadowCodeCache {
    inner: Mutex<LruCache<Address, Bytes>>,
}

impl ShadowCodeCache {
    /// Build a cache holding at most `capacity` entries (minimum one).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Record init code under its deterministic deployment address.
    pub fn put(&self, deploy_address: Address, init_code: Bytes) {
        self.lock().put(deploy_address, init_code);
    }

    /// Fetch cached init code, refreshing its recency.
    pub fn get(&self, address: Address) -> Option<Bytes> {
        self.lock().get(&address).cloned()
    }

    /// Derive the deployment address of an observed creation transaction
    /// and cache its init code. Returns the derived address.
    pub fn record_creation(&self, tx: &PendingTransaction) -> Address {
        let deploy_address = tx.sender.create(tx.nonce);
        self.put(deploy_address, tx.input.clone());
        tracing::debug!(
            tx_hash = %tx.hash,
            %deploy_address,
            code_len = tx.input.len(),
            "cached contract creation code"
        );
        deploy_address
    }

    /// Current number of cached entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<Address, Bytes>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
