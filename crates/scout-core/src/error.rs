//! Abandon taxonomy for a single analysis task.
//!
//! Every variant is terminal for the task that produced it and is never
//! surfaced past the dispatch loop; the pipeline logs the reason and
//! moves on.

use alloy::primitives::Address;
use thiserror::Error;

/// Why one analysis task stopped early.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// State snapshot or header fetch failed.
    #[error("state unavailable: {0}")]
    StateUnavailable(eyre::Report),

    /// Pending-pool nonce fetch failed for the impersonating identity.
    #[error("pool nonce unavailable: {0}")]
    NonceUnavailable(eyre::Report),

    /// Hex substitution produced bytes that do not decode.
    #[error("payload rewrite produced undecodable hex: {0}")]
    PayloadRewrite(String),

    /// Signing the forged transaction failed.
    #[error("signing failed: {0}")]
    Signing(eyre::Report),

    /// Execution-engine-level failure, distinct from a reverted call.
    #[error("simulation failed: {0}")]
    Simulation(String),

    /// No shadow code cached for the target; the fallback is impossible.
    #[error("no shadow code cached for {0}")]
    CacheMiss(Address),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_target_on_cache_miss() {
        let err = AnalysisError::CacheMiss(Address::repeat_byte(0x42));
        assert!(err.to_string().contains("0x4242"));
    }
}
