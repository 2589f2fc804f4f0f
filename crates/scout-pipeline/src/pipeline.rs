//! The per-transaction analysis flow and its bounded dispatch loop.
//!
//! Each observed pending transaction gets at most one analysis task.
//! Tasks run under a semaphore sized by the configured concurrency; when
//! every permit is taken, new arrivals are dropped and counted rather
//! than queued, since a stale mempool observation is worthless by the
//! time a backlog would drain.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use alloy::primitives::{Address, B256};
use lru::LruCache;
use tokio::sync::{mpsc, Semaphore};

use scout_core::{AnalysisError, Evidence, PendingTransaction, ScoutConfig};
use scout_detect::{
    decide, FilterDecision, ProfitHeuristic, ShadowCodeCache, ThresholdTransferHeuristic, TxForger,
};
use scout_sim::{Sandbox, SandboxTx};

use crate::backend::ChainBackend;
use crate::nonce::NonceAllocator;

/// Front-run opportunity scout over a stream of pending transactions.
pub struct Pipeline {
    cfg: ScoutConfig,
    backend: Arc<dyn ChainBackend>,
    forger: TxForger,
    shadow_cache: ShadowCodeCache,
    heuristics: Vec<Box<dyn ProfitHeuristic>>,
    nonces: NonceAllocator,
    permits: Arc<Semaphore>,
    seen: Mutex<LruCache<B256, ()>>,
    dropped: AtomicU64,
}

impl Pipeline {
    /// Build a pipeline over `backend` with the default threshold
    /// heuristic.
    ///
    /// # Errors
    /// Returns an error when the configured private key does not parse.
    pub fn new(cfg: ScoutConfig, backend: Arc<dyn ChainBackend>) -> eyre::Result<Self> {
        let forger = TxForger::new(&cfg)?;
        let identity = forger.identity();
        let threshold: Box<dyn ProfitHeuristic> = Box::new(ThresholdTransferHeuristic::new(&cfg));
        let seen_capacity =
            NonZeroUsize::new(cfg.seen_cache_capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Ok(Self {
            shadow_cache: ShadowCodeCache::new(cfg.shadow_cache_capacity),
            nonces: NonceAllocator::new(identity),
            permits: Arc::new(Semaphore::new(cfg.max_concurrency)),
            heuristics: vec![threshold],
            seen: Mutex::new(LruCache::new(seen_capacity)),
            dropped: AtomicU64::new(0),
            cfg,
            backend,
            forger,
        })
    }

    /// Append an additional profitability heuristic.
    ///
    /// Heuristics run in insertion order; the first piece of evidence
    /// any of them produces is reported.
    pub fn with_heuristic(mut self, heuristic: Box<dyn ProfitHeuristic>) -> Self {
        self.heuristics.push(heuristic);
        self
    }

    /// The impersonating identity forged transactions are signed with.
    pub fn identity(&self) -> Address {
        self.forger.identity()
    }

    /// The shadow cache of observed contract-creation code.
    pub fn shadow_cache(&self) -> &ShadowCodeCache {
        &self.shadow_cache
    }

    /// How many transactions were dropped for lack of capacity.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Consume batches of observed transactions until the sender closes.
    pub async fn run(self: Arc<Self>, mut batches: mpsc::Receiver<Vec<PendingTransaction>>) {
        while let Some(batch) = batches.recv().await {
            for tx in batch {
                self.dispatch(tx);
            }
        }
    }

    /// Spawn one analysis task for `tx`, or drop it.
    ///
    /// Re-observations from overlapping pool snapshots are ignored. The
    /// dedupe cache is capacity-bounded, so a hash can come back after
    /// enough distinct traffic has evicted it.
    pub fn dispatch(self: &Arc<Self>, tx: PendingTransaction) {
        if self.seen_lock().put(tx.hash, ()).is_some() {
            tracing::trace!(tx_hash = %tx.hash, "already analyzed, skipping");
            return;
        }

        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(tx_hash = %tx.hash, "analysis capacity exhausted, dropping");
            return;
        };

        let pipeline = Arc::clone(self);
        tokio::spawn(async move {
            pipeline.analyze_logged(&tx).await;
            drop(permit);
        });
    }

    /// Run one analysis and report its outcome through tracing.
    pub async fn analyze_logged(&self, tx: &PendingTransaction) {
        let started = Instant::now();
        let outcome = self.analyze_transaction(tx).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Some(evidence)) => tracing::info!(
                tx_hash = %tx.hash,
                token = %evidence.token,
                amount = %evidence.amount,
                heuristic = evidence.heuristic,
                elapsed_ms,
                "front-run opportunity"
            ),
            Ok(None) => tracing::debug!(tx_hash = %tx.hash, elapsed_ms, "no opportunity"),
            Err(AnalysisError::CacheMiss(address)) => tracing::debug!(
                tx_hash = %tx.hash,
                %address,
                elapsed_ms,
                "failing target has no cached creation code"
            ),
            Err(err) => {
                tracing::warn!(tx_hash = %tx.hash, %err, elapsed_ms, "analysis abandoned");
            }
        }
    }

    /// Analyze one pending transaction end to end.
    ///
    /// Filters, replays the original against a fresh head snapshot,
    /// forges a rewritten variant under our identity, and falls back to
    /// a shadow redeploy of the target when the forged replay fails.
    /// Returns the first piece of evidence any heuristic produces.
    ///
    /// # Errors
    /// [`AnalysisError`] when the analysis could not be completed;
    /// an unprofitable or unreplayable transaction is `Ok(None)`.
    pub async fn analyze_transaction(
        &self,
        tx: &PendingTransaction,
    ) -> Result<Option<Evidence>, AnalysisError> {
        let target = match decide(&self.cfg, tx) {
            FilterDecision::Skip(reason) => {
                tracing::trace!(tx_hash = %tx.hash, ?reason, "filtered out");
                return Ok(None);
            }
            FilterDecision::CacheCreation => {
                self.shadow_cache.record_creation(tx);
                return Ok(None);
            }
            FilterDecision::Proceed => match tx.to {
                Some(to) => to,
                None => return Ok(None),
            },
        };

        let head = self
            .backend
            .current_head_number()
            .await
            .map_err(AnalysisError::StateUnavailable)?;
        let (snapshot, header) = self
            .backend
            .state_and_header_at(head)
            .await
            .map_err(AnalysisError::StateUnavailable)?;
        let mut sandbox = Sandbox::new(snapshot, &header);

        // Baseline: the original transaction as observed. If it cannot
        // succeed against current state there is nothing to imitate.
        let baseline = sandbox
            .execute(&SandboxTx::from_observed(tx))
            .map_err(|err| AnalysisError::Simulation(err.to_string()))?;
        if !baseline.success {
            tracing::debug!(tx_hash = %tx.hash, "original replay failed, abandoning");
            return Ok(None);
        }

        let rewritten = self.forger.rewrite_payload(&tx.input, tx.sender)?;
        let mut nonces = self.nonces.sequence(self.backend.as_ref()).await?;
        let nonce = nonces.reserve(1);
        let forged = self
            .forger
            .forge_call(tx, nonce, target, rewritten.clone())?;
        let receipt = sandbox
            .execute(&forged.sandbox_tx())
            .map_err(|err| AnalysisError::Simulation(err.to_string()))?;

        if receipt.success {
            return Ok(self.judge(tx, &receipt.logs));
        }

        // The forged replay failed where the original succeeded: the
        // target may discriminate on caller, or may not exist yet. If we
        // observed its creation, redeploy it under our identity and retry.
        tracing::debug!(tx_hash = %tx.hash, %target, "forged replay failed, trying shadow redeploy");
        let init_code = self
            .shadow_cache
            .get(target)
            .ok_or(AnalysisError::CacheMiss(target))?;
        let shadow_init = self.forger.rewrite_payload(&init_code, tx.sender)?;

        // The failed forged call still consumed its nonce in the
        // sandbox, so the redeploy continues from the next reservation.
        let base = nonces.reserve(2);
        let create = self.forger.forge_create(tx, base, shadow_init)?;
        let create_receipt = sandbox
            .execute(&create.sandbox_tx())
            .map_err(|err| AnalysisError::Simulation(err.to_string()))?;
        if !create_receipt.success {
            tracing::debug!(tx_hash = %tx.hash, "shadow redeploy failed");
            return Ok(None);
        }
        let Some(shadow_target) = create_receipt.created else {
            return Err(AnalysisError::Simulation(
                "successful creation produced no contract address".to_string(),
            ));
        };

        let retry = self.forger.forge_call(tx, base + 1, shadow_target, rewritten)?;
        let retry_receipt = sandbox
            .execute(&retry.sandbox_tx())
            .map_err(|err| AnalysisError::Simulation(err.to_string()))?;
        if !retry_receipt.success {
            return Ok(None);
        }

        Ok(self.judge(tx, &retry_receipt.logs))
    }

    fn judge(&self, source: &PendingTransaction, logs: &[revm::primitives::Log]) -> Option<Evidence> {
        let beneficiary = self.forger.identity();
        for heuristic in &self.heuristics {
            if let Some(evidence) = heuristic
                .evaluate(source, logs, beneficiary)
                .into_iter()
                .next()
            {
                return Some(evidence);
            }
        }
        None
    }

    fn seen_lock(&self) -> std::sync::MutexGuard<'_, LruCache<B256, ()>> {
        self.seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use alloy::primitives::{address, Bytes, B256, U256};
    use scout_sim::{HeaderContext, SnapshotState};

    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDR: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

    fn backend() -> Arc<MemoryBackend> {
        let header = HeaderContext {
            number: 1,
            timestamp: 1_708_617_600,
            gas_limit: 30_000_000,
            base_fee: 0,
            coinbase: Address::ZERO,
        };
        Arc::new(MemoryBackend::new(header, SnapshotState::new()))
    }

    fn pipeline(max_concurrency: usize) -> Arc<Pipeline> {
        let mut cfg = ScoutConfig::new(TEST_ADDR, TEST_KEY);
        cfg.max_concurrency = max_concurrency;
        Arc::new(Pipeline::new(cfg, backend()).expect("valid key"))
    }

    fn tx(hash: u8) -> PendingTransaction {
        PendingTransaction {
            hash: B256::repeat_byte(hash),
            sender: Address::repeat_byte(0x11),
            to: Some(Address::repeat_byte(0x22)),
            value: U256::ZERO,
            gas_limit: 100_000,
            gas_price: 0,
            nonce: 0,
            input: Bytes::from_static(&[0xab]),
            chain_id: 56,
        }
    }

    #[tokio::test]
    async fn exhausted_capacity_drops_instead_of_queueing() {
        let pipeline = pipeline(0);
        pipeline.dispatch(tx(0x01));
        pipeline.dispatch(tx(0x02));
        assert_eq!(pipeline.dropped_count(), 2);
    }

    #[tokio::test]
    async fn reobserved_hash_is_not_dispatched_twice() {
        let pipeline = pipeline(0);
        pipeline.dispatch(tx(0x01));
        // Same hash again: deduplicated before the capacity check, so
        // the drop counter does not move.
        pipeline.dispatch(tx(0x01));
        assert_eq!(pipeline.dropped_count(), 1);
    }

    #[tokio::test]
    async fn dedupe_cache_is_capacity_bounded() {
        let mut cfg = ScoutConfig::new(TEST_ADDR, TEST_KEY);
        cfg.max_concurrency = 0;
        cfg.seen_cache_capacity = 2;
        let pipeline = Arc::new(Pipeline::new(cfg, backend()).expect("valid key"));

        pipeline.dispatch(tx(0x01));
        pipeline.dispatch(tx(0x02));
        // A third distinct hash evicts the oldest entry, so the first
        // hash dispatches again instead of accumulating forever.
        pipeline.dispatch(tx(0x03));
        pipeline.dispatch(tx(0x01));
        assert_eq!(pipeline.dropped_count(), 4);
    }

    #[tokio::test]
    async fn creation_is_cached_without_simulation() {
        let pipeline = pipeline(4);
        let mut creation = tx(0x01);
        creation.to = None;
        creation.input = Bytes::from_static(&[0x60, 0x00]);

        let outcome = pipeline
            .analyze_transaction(&creation)
            .await
            .expect("creation analysis cannot fail");
        assert!(outcome.is_none());
        assert_eq!(pipeline.shadow_cache().len(), 1);
        assert!(pipeline
            .shadow_cache()
            .get(creation.sender.create(creation.nonce))
            .is_some());
    }

    #[tokio::test]
    async fn filtered_transaction_is_none_without_state_access() {
        let pipeline = pipeline(4);
        let mut empty = tx(0x01);
        empty.input = Bytes::new();

        let outcome = pipeline
            .analyze_transaction(&empty)
            .await
            .expect("skip is not an error");
        assert!(outcome.is_none());
    }
}
