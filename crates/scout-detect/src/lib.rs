//! scout-detect: opportunity detection building blocks.
//!
//! Hosts the cheap pre-simulation filter, the transaction forger, the
//! shadow cache of not-yet-deployed contract code, and the profitability
//! heuristics that inspect sandbox logs.

pub mod evaluate;
pub mod filter;
pub mod forge;
pub mod shadow_cache;

pub use evaluate::{AnyCreditHeuristic, ProfitHeuristic, ThresholdTransferHeuristic};
pub use filter::{decide, FilterDecision, SkipReason};
pub use forge::{ForgedTransaction, TxForger};
pub use shadow_cache::ShadowCodeCache;
