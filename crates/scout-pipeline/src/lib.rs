//! scout-pipeline: the per-transaction opportunity decision flow.
//!
//! Wires the filter, sandbox executor, forger, shadow cache, and
//! profitability heuristics into one analysis task per observed pending
//! transaction, dispatched from a bounded worker loop. Nothing here is
//! fatal: a malformed or adversarial transaction can only abandon its
//! own analysis.

pub mod backend;
pub mod nonce;
pub mod pipeline;

pub use backend::{ChainBackend, MemoryBackend};
pub use nonce::{NonceAllocator, NonceSequence};
pub use pipeline::Pipeline;
