//! Nonce planning for the impersonating identity.
//!
//! Forged transactions never leave their sandbox, so every analysis
//! starts from a fresh state copy in which the identity's account nonce
//! equals the pool nonce. The allocator fetches that seed once, under a
//! lock so concurrent analyses never race to re-query the pool, and
//! each analysis draws consecutive nonces from its own sequence.

use alloy::primitives::Address;
use tokio::sync::Mutex;

use scout_core::AnalysisError;

use crate::backend::ChainBackend;

/// Shared nonce seed for one identity.
pub struct NonceAllocator {
    identity: Address,
    seed: Mutex<Option<u64>>,
}

impl NonceAllocator {
    /// Allocator for `identity`, seeded lazily on first use.
    pub fn new(identity: Address) -> Self {
        Self {
            identity,
            seed: Mutex::new(None),
        }
    }

    /// Start the nonce sequence for one analysis.
    ///
    /// # Errors
    /// [`AnalysisError::NonceUnavailable`] when the initial pool-nonce
    /// fetch fails; the allocator stays unseeded and a later call
    /// retries the fetch.
    pub async fn sequence(
        &self,
        backend: &dyn ChainBackend,
    ) -> Result<NonceSequence, AnalysisError> {
        let mut seed = self.seed.lock().await;
        let base = match *seed {
            Some(nonce) => nonce,
            None => {
                let fetched = backend
                    .pool_nonce(self.identity)
                    .await
                    .map_err(AnalysisError::NonceUnavailable)?;
                *seed = Some(fetched);
                fetched
            }
        };
        Ok(NonceSequence { next: base })
    }
}

/// Consecutive nonces for the forged transactions of one analysis.
///
/// Scoped to a single sandbox; a new analysis starts a new sequence
/// from the shared seed.
#[derive(Clone, Copy, Debug)]
pub struct NonceSequence {
    next: u64,
}

impl NonceSequence {
    /// Reserve `count` consecutive nonces, returning the first.
    pub fn reserve(&mut self, count: u64) -> u64 {
        let base = self.next;
        self.next += count;
        base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use scout_sim::{HeaderContext, SnapshotState};

    fn backend(pool_nonce: u64) -> MemoryBackend {
        let header = HeaderContext {
            number: 1,
            timestamp: 0,
            gas_limit: 30_000_000,
            base_fee: 0,
            coinbase: Address::ZERO,
        };
        MemoryBackend::new(header, SnapshotState::new())
            .with_pool_nonce(Address::repeat_byte(0xaa), pool_nonce)
    }

    #[tokio::test]
    async fn reservations_within_one_analysis_are_consecutive() {
        let backend = backend(5);
        let allocator = NonceAllocator::new(Address::repeat_byte(0xaa));

        let mut sequence = allocator.sequence(&backend).await.unwrap();
        assert_eq!(sequence.reserve(1), 5);
        assert_eq!(sequence.reserve(2), 6);
        assert_eq!(sequence.reserve(1), 8);
    }

    #[tokio::test]
    async fn every_analysis_restarts_from_the_seed() {
        let backend = backend(5);
        let allocator = NonceAllocator::new(Address::repeat_byte(0xaa));

        let mut first = allocator.sequence(&backend).await.unwrap();
        assert_eq!(first.reserve(2), 5);

        // Nothing was broadcast, so the next sandbox sees the same
        // account nonce and the next sequence must start over.
        let mut second = allocator.sequence(&backend).await.unwrap();
        assert_eq!(second.reserve(1), 5);

        // The pool was consulted exactly once.
        assert_eq!(backend.nonce_query_count(), 1);
    }
}
