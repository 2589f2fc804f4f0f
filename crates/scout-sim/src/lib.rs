//! scout-sim: disposable REVM sandboxes for pending-transaction replay.
//!
//! A sandbox is a copy-on-write layer over a state snapshot plus a block
//! header context. Transactions execute sequentially inside one sandbox;
//! nothing escapes it, and two sandboxes derived from the same snapshot
//! are fully independent.

pub mod sandbox;
pub mod snapshot;

pub use sandbox::{Sandbox, SandboxReceipt, SandboxTx, SimulationError};
pub use snapshot::{HeaderContext, SnapshotState};
