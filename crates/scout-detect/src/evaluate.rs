//! Profitability heuristics over sandbox logs.
//!
//! A heuristic scans the logs of a successful forged replay and decides
//! whether a token transfer credited the impersonating identity. These
//! are net-worth proxies, not accounting: gas cost and price impact are
//! deliberately ignored.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use revm::primitives::Log;

use scout_core::{Evidence, PendingTransaction, ScoutConfig, TRANSFER_EVENT_TOPIC};

/// A decoded ERC-20 transfer event.
#[derive(Clone, Copy, Debug)]
struct Transfer {
    from: Address,
    to: Address,
    amount: U256,
}

/// Decode a log as an ERC-20 Transfer.
///
/// Requires exactly three topics with the transfer signature first.
/// Returns `None` for non-transfer events and for malformed data, which
/// callers skip without aborting the scan.
fn decode_transfer(log: &Log) -> Option<Transfer> {
    let topics = log.topics();
    if topics.len() != 3 || topics[0] != TRANSFER_EVENT_TOPIC {
        return None;
    }
    // Amounts longer than one word are malformed, not truncatable.
    if log.data.data.len() > 32 {
        return None;
    }

    Some(Transfer {
        from: Address::from_slice(&topics[1][12..]),
        to: Address::from_slice(&topics[2][12..]),
        amount: U256::from_be_slice(&log.data.data),
    })
}

/// One way of judging a sandbox run profitable.
///
/// Implementations are selected and combined by the pipeline; each
/// returns every qualifying transfer it finds.
pub trait ProfitHeuristic: Send + Sync {
    /// Stable name used in evidence records and logs.
    fn name(&self) -> &'static str;

    /// Scan `logs` for transfers benefiting `beneficiary`.
    fn evaluate(
        &self,
        source: &PendingTransaction,
        logs: &[Log],
        beneficiary: Address,
    ) -> Vec<Evidence>;
}

/// Per-token threshold heuristic.
///
/// A transfer qualifies when it credits the beneficiary from a third
/// party and strictly exceeds the configured threshold for its token.
/// Tokens without a configured threshold never qualify.
pub struct ThresholdTransferHeuristic {
    thresholds: HashMap<Address, U256>,
}

impl ThresholdTransferHeuristic {
    /// Build from the configured per-token thresholds.
    pub fn new(cfg: &ScoutConfig) -> Self {
        Self {
            thresholds: cfg.thresholds.clone(),
        }
    }
}

impl ProfitHeuristic for ThresholdTransferHeuristic {
    fn name(&self) -> &'static str {
        "threshold-transfer"
    }

    fn evaluate(
        &self,
        source: &PendingTransaction,
        logs: &[Log],
        beneficiary: Address,
    ) -> Vec<Evidence> {
        let mut evidence = Vec::new();
        for log in logs {
            let Some(transfer) = decode_transfer(log) else {
                continue;
            };
            if transfer.from == transfer.to || transfer.to != beneficiary {
                continue;
            }
            let Some(threshold) = self.thresholds.get(&log.address) else {
                continue;
            };
            if transfer.amount > *threshold {
                tracing::debug!(
                    tx_hash = %source.hash,
                    token = %log.address,
                    amount = %transfer.amount,
                    "qualifying transfer above threshold"
                );
                evidence.push(Evidence {
                    source_tx: source.hash,
                    token: log.address,
                    amount: transfer.amount,
                    recipient: transfer.to,
                    heuristic: self.name(),
                });
            }
        }
        evidence
    }
}

/// Loose diagnostic heuristic: any positive third-party credit counts.
///
/// No thresholds and no token allowlist; useful for surveying what a
/// replay would yield. Off by default.
pub struct AnyCreditHeuristic;

impl ProfitHeuristic for AnyCreditHeuristic {
    fn name(&self) -> &'static str {
        "any-credit"
    }

    fn evaluate(
        &self,
        source: &PendingTransaction,
        logs: &[Log],
        beneficiary: Address,
    ) -> Vec<Evidence> {
        logs.iter()
            .filter_map(decode_transfer_from_ref)
            .filter(|(_, transfer)| {
                transfer.to == beneficiary
                    && transfer.from != beneficiary
                    && transfer.amount > U256::ZERO
            })
            .map(|(token, transfer)| Evidence {
                source_tx: source.hash,
                token,
                amount: transfer.amount,
                recipient: transfer.to,
                heuristic: self.name(),
            })
            .collect()
    }
}

fn decode_transfer_from_ref(log: &Log) -> Option<(Address, Transfer)> {
    decode_transfer(log).map(|transfer| (log.address, transfer))
}
