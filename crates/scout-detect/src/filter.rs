//! Cheap pre-simulation checks.
//!
//! Runs before any state access and decides whether a pending
//! transaction is worth a sandbox. Contract creations are routed to the
//! shadow cache instead of being analyzed directly.

use scout_core::{PendingTransaction, ScoutConfig};

/// Why a transaction was skipped without simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Sent by the impersonating identity itself.
    SelfTarget,
    /// Carries value; the scout only models zero-value calls.
    NonZeroValue,
    /// Recipient is blacklisted.
    Blacklisted,
    /// Empty payload: a plain transfer, nothing to replay.
    EmptyPayload,
}

/// Outcome of the pre-simulation filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterDecision {
    /// Worth simulating.
    Proceed,
    /// Not worth simulating.
    Skip(SkipReason),
    /// Contract creation: cache the init code, never simulate for profit.
    CacheCreation,
}

/// Decide whether to simulate `tx`. No side effects beyond logging.
pub fn decide(cfg: &ScoutConfig, tx: &PendingTransaction) -> FilterDecision {
    if tx.sender == cfg.identity {
        return FilterDecision::Skip(SkipReason::SelfTarget);
    }

    let Some(to) = tx.to else {
        tracing::debug!(tx_hash = %tx.hash, "creation transaction routed to shadow cache");
        return FilterDecision::CacheCreation;
    };

    if !tx.value.is_zero() {
        return FilterDecision::Skip(SkipReason::NonZeroValue);
    }
    if cfg.blacklist.contains(&to) {
        return FilterDecision::Skip(SkipReason::Blacklisted);
    }
    if tx.input.is_empty() {
        return FilterDecision::Skip(SkipReason::EmptyPayload);
    }

    FilterDecision::Proceed
}
