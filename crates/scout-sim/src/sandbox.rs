//! One-shot transaction execution against an isolated state copy.
//!
//! A [`Sandbox`] owns a `CacheDB` layered over a [`SnapshotState`] clone
//! plus the block environment for the current head. The original replay,
//! the forged replay, and any shadow redeploy all run sequentially in the
//! same sandbox, so later transactions observe earlier effects — exactly
//! one pipeline task owns a sandbox, and it is dropped when the task ends.
//!
//! A reverted call is a valid receipt (`success = false`); only
//! engine-level rejections (nonce/balance/gas-pool) are errors.

use alloy::primitives::{Address, Bytes, U256};
use revm::db::CacheDB;
use revm::primitives::{EVMError, ExecutionResult, Log, Output, TransactTo, TxEnv};
use revm::Evm;
use thiserror::Error;

use scout_core::PendingTransaction;

use crate::snapshot::{HeaderContext, SnapshotState};

/// Execution-engine-level failure; distinct from a reverted call.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The sandbox gas pool cannot cover the transaction's gas limit.
    #[error("gas pool exhausted: need {needed}, remaining {remaining}")]
    GasPoolExhausted { needed: u64, remaining: u64 },

    /// The transaction was rejected before execution (nonce, balance, fee).
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Any other engine failure.
    #[error("execution engine: {0}")]
    Engine(String),
}

/// Transaction description a sandbox can execute, original or forged.
#[derive(Clone, Debug)]
pub struct SandboxTx {
    /// Executing caller.
    pub caller: Address,
    /// Call target; `None` triggers contract creation.
    pub to: Option<Address>,
    /// Value in Wei.
    pub value: U256,
    /// Gas limit.
    pub gas_limit: u64,
    /// Gas price in Wei.
    pub gas_price: u128,
    /// Caller nonce.
    pub nonce: u64,
    /// Call data or init code.
    pub data: Bytes,
}

impl SandboxTx {
    /// Replay description of an observed pending transaction.
    pub fn from_observed(tx: &PendingTransaction) -> Self {
        Self {
            caller: tx.sender,
            to: tx.to,
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
            nonce: tx.nonce,
            data: tx.input.clone(),
        }
    }
}

/// Receipt of one sandbox execution.
#[derive(Clone, Debug)]
pub struct SandboxReceipt {
    /// True when execution completed without reverting or halting.
    pub success: bool,
    /// Gas consumed.
    pub gas_used: u64,
    /// Logs emitted during execution (empty on failure).
    pub logs: Vec<Log>,
    /// Address of the created contract, for creation transactions.
    pub created: Option<Address>,
}

/// Disposable execution environment for one analysis attempt.
pub struct Sandbox {
    db: CacheDB<SnapshotState>,
    block_env: revm::primitives::BlockEnv,
    gas_pool: u64,
}

impl Sandbox {
    /// Build a sandbox over a snapshot for the given header.
    ///
    /// The gas pool is effectively unbounded, as the scout replays single
    /// transactions rather than packing blocks.
    pub fn new(snapshot: SnapshotState, header: &HeaderContext) -> Self {
        Self {
            db: CacheDB::new(snapshot),
            block_env: header.to_block_env(),
            gas_pool: u64::MAX,
        }
    }

    /// Remaining gas pool.
    pub fn gas_pool(&self) -> u64 {
        self.gas_pool
    }

    /// Execute one transaction, committing its effects to this sandbox.
    ///
    /// # Errors
    /// Returns [`SimulationError`] on engine-level rejection. A reverted
    /// or halted call is not an error; it produces `success = false`.
    pub fn execute(&mut self, tx: &SandboxTx) -> Result<SandboxReceipt, SimulationError> {
        if tx.gas_limit > self.gas_pool {
            return Err(SimulationError::GasPoolExhausted {
                needed: tx.gas_limit,
                remaining: self.gas_pool,
            });
        }

        let tx_env = TxEnv {
            caller: tx.caller,
            transact_to: tx.to.map_or(TransactTo::Create, TransactTo::Call),
            value: tx.value,
            data: tx.data.clone(),
            gas_limit: tx.gas_limit,
            gas_price: U256::from(tx.gas_price),
            gas_priority_fee: None,
            nonce: Some(tx.nonce),
            access_list: Vec::new(),
            chain_id: None,
            blob_hashes: Vec::new(),
            max_fee_per_blob_gas: None,
            authorization_list: None,
        };

        let block_env = self.block_env.clone();
        let mut evm = Evm::builder()
            .with_db(&mut self.db)
            .modify_block_env(|env| *env = block_env)
            .modify_tx_env(|env| *env = tx_env)
            .build();

        let result = evm.transact_commit().map_err(|err| match err {
            EVMError::Transaction(invalid) => SimulationError::Rejected(format!("{invalid:?}")),
            EVMError::Header(invalid) => SimulationError::Engine(format!("{invalid:?}")),
            EVMError::Database(_) => SimulationError::Engine("database".to_string()),
            EVMError::Custom(msg) | EVMError::Precompile(msg) => SimulationError::Engine(msg),
        })?;
        drop(evm);

        let receipt = match result {
            ExecutionResult::Success {
                gas_used,
                logs,
                output,
                ..
            } => SandboxReceipt {
                success: true,
                gas_used,
                logs,
                created: match output {
                    Output::Create(_, address) => address,
                    Output::Call(_) => None,
                },
            },
            ExecutionResult::Revert { gas_used, .. } => SandboxReceipt {
                success: false,
                gas_used,
                logs: Vec::new(),
                created: None,
            },
            ExecutionResult::Halt { gas_used, .. } => SandboxReceipt {
                success: false,
                gas_used,
                logs: Vec::new(),
                created: None,
            },
        };

        self.gas_pool = self.gas_pool.saturating_sub(receipt.gas_used);
        tracing::trace!(
            caller = %tx.caller,
            success = receipt.success,
            gas_used = receipt.gas_used,
            "sandbox execution"
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> HeaderContext {
        HeaderContext {
            number: 100,
            timestamp: 1_708_617_600,
            gas_limit: 30_000_000,
            base_fee: 0,
            coinbase: Address::repeat_byte(0xcc),
        }
    }

    fn funded(state: &mut SnapshotState, address: Address, nonce: u64) {
        state.insert_eoa(address, U256::from(10).pow(U256::from(21)), nonce);
    }

    #[test]
    fn plain_transfer_succeeds() {
        let sender = Address::repeat_byte(0x01);
        let mut state = SnapshotState::new();
        funded(&mut state, sender, 0);

        let mut sandbox = Sandbox::new(state, &header());
        let receipt = sandbox
            .execute(&SandboxTx {
                caller: sender,
                to: Some(Address::repeat_byte(0x02)),
                value: U256::from(100),
                gas_limit: 21_000,
                gas_price: 0,
                nonce: 0,
                data: Bytes::new(),
            })
            .expect("transfer executes");

        assert!(receipt.success);
        assert_eq!(receipt.gas_used, 21_000);
    }

    #[test]
    fn reverting_call_is_a_receipt_not_an_error() {
        let sender = Address::repeat_byte(0x01);
        let target = Address::repeat_byte(0x02);
        let mut state = SnapshotState::new();
        funded(&mut state, sender, 0);
        // PUSH1 0 PUSH1 0 REVERT
        state.insert_contract(target, Bytes::from_static(&[0x60, 0x00, 0x60, 0x00, 0xfd]));

        let mut sandbox = Sandbox::new(state, &header());
        let receipt = sandbox
            .execute(&SandboxTx {
                caller: sender,
                to: Some(target),
                value: U256::ZERO,
                gas_limit: 100_000,
                gas_price: 0,
                nonce: 0,
                data: Bytes::from_static(&[0xde, 0xad]),
            })
            .expect("revert is not an engine error");

        assert!(!receipt.success);
        assert!(receipt.logs.is_empty());
    }

    #[test]
    fn nonce_mismatch_is_rejected() {
        let sender = Address::repeat_byte(0x01);
        let mut state = SnapshotState::new();
        funded(&mut state, sender, 5);

        let mut sandbox = Sandbox::new(state, &header());
        let err = sandbox
            .execute(&SandboxTx {
                caller: sender,
                to: Some(Address::repeat_byte(0x02)),
                value: U256::ZERO,
                gas_limit: 21_000,
                gas_price: 0,
                nonce: 0,
                data: Bytes::new(),
            })
            .expect_err("stale nonce must be rejected");

        assert!(matches!(err, SimulationError::Rejected(_)));
    }

    #[test]
    fn sandboxes_from_one_snapshot_are_independent() {
        let sender = Address::repeat_byte(0x01);
        let mut state = SnapshotState::new();
        funded(&mut state, sender, 0);

        let mut first = Sandbox::new(state.clone(), &header());
        let mut second = Sandbox::new(state, &header());

        let tx = SandboxTx {
            caller: sender,
            to: Some(Address::repeat_byte(0x02)),
            value: U256::from(1),
            gas_limit: 21_000,
            gas_price: 0,
            nonce: 0,
            data: Bytes::new(),
        };

        first.execute(&tx).expect("first sandbox executes");
        // The same nonce is still fresh in the second sandbox: the first
        // sandbox's nonce bump did not leak.
        let receipt = second.execute(&tx).expect("second sandbox unaffected");
        assert!(receipt.success);
    }

    #[test]
    fn exhausted_gas_pool_errors() {
        let sender = Address::repeat_byte(0x01);
        let mut state = SnapshotState::new();
        funded(&mut state, sender, 0);

        let mut sandbox = Sandbox::new(state, &header());
        sandbox.gas_pool = 10_000;

        let err = sandbox
            .execute(&SandboxTx {
                caller: sender,
                to: Some(Address::repeat_byte(0x02)),
                value: U256::ZERO,
                gas_limit: 21_000,
                gas_price: 0,
                nonce: 0,
                data: Bytes::new(),
            })
            .expect_err("gas pool too small");

        assert!(matches!(err, SimulationError::GasPoolExhausted { .. }));
    }
}
