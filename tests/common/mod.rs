//! Shared fixtures: hand-assembled EVM bytecode and builders.
//!
//! The token contracts below are minimal runtimes written opcode by
//! opcode. Both emit a three-topic Transfer event crediting the caller
//! with a fixed amount; the gated variant first checks the caller
//! against an address baked into its code and reverts on mismatch, so
//! only the baked-in caller can trigger the credit.

use alloy::primitives::{address, Address, Bytes, B256, U256};
use scout_core::{PendingTransaction, ScoutConfig, TRANSFER_EVENT_TOPIC};
use scout_sim::HeaderContext;

/// First well-known anvil developer key; test-only.
pub const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
/// Address derived from [`TEST_KEY`].
pub const IDENTITY: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

/// Amount every crediting runtime transfers (2 ether in wei).
pub const CREDIT_AMOUNT_WEI: u64 = 2_000_000_000_000_000_000;

/// Runtime that logs `Transfer(address(this), caller, 2 ether)` and stops.
///
/// ```text
/// PUSH8 amount  PUSH1 0  MSTORE        store the amount word at 0
/// CALLER  ADDRESS  PUSH32 topic        topics in LOG3 pop order
/// PUSH1 0x20  PUSH1 0  LOG3  STOP
/// ```
pub fn crediting_runtime() -> Vec<u8> {
    let mut code = Vec::new();
    code.push(0x67);
    code.extend_from_slice(&CREDIT_AMOUNT_WEI.to_be_bytes());
    code.extend_from_slice(&[0x60, 0x00, 0x52]);
    code.push(0x33);
    code.push(0x30);
    code.push(0x7f);
    code.extend_from_slice(TRANSFER_EVENT_TOPIC.as_slice());
    code.extend_from_slice(&[0x60, 0x20, 0x60, 0x00, 0xa3, 0x00]);
    code
}

/// Crediting runtime prefixed with a caller gate.
///
/// Reverts unless the caller equals `allowed`, whose bytes are embedded
/// literally in the code. The JUMPDEST for the happy path sits at
/// offset 0x1f, right after the revert block.
pub fn gated_runtime(allowed: Address) -> Vec<u8> {
    let mut code = Vec::new();
    code.push(0x73);
    code.extend_from_slice(allowed.as_slice());
    code.extend_from_slice(&[0x33, 0x14]);
    code.extend_from_slice(&[0x60, 0x1f, 0x57]);
    code.extend_from_slice(&[0x60, 0x00, 0x60, 0x00, 0xfd]);
    code.push(0x5b);
    code.extend(crediting_runtime());
    code
}

/// Wrap a runtime in init code that copies it to memory and returns it.
///
/// The copy source offset is the fixed 12-byte length of the init
/// prefix itself.
pub fn deploy_init(runtime: &[u8]) -> Bytes {
    assert!(runtime.len() <= 0xff, "runtime too long for PUSH1 length");
    let len = runtime.len() as u8;
    let mut code = vec![
        0x60, len, 0x60, 0x0c, 0x60, 0x00, 0x39, 0x60, len, 0x60, 0x00, 0xf3,
    ];
    code.extend_from_slice(runtime);
    Bytes::from(code)
}

pub fn test_config() -> ScoutConfig {
    ScoutConfig::new(IDENTITY, TEST_KEY)
}

pub fn head_header() -> HeaderContext {
    HeaderContext {
        number: 1,
        timestamp: 1_708_617_600,
        gas_limit: 30_000_000,
        base_fee: 0,
        coinbase: Address::ZERO,
    }
}

/// Observed call transaction with the sender's address embedded in the
/// payload, so the forged variant differs from the original.
pub fn observed_call(sender: Address, nonce: u64, to: Address) -> PendingTransaction {
    let mut payload = vec![0xa9, 0x05, 0x9c, 0xbb];
    payload.extend_from_slice(sender.as_slice());

    PendingTransaction {
        hash: B256::repeat_byte(sender.as_slice()[0].wrapping_add(nonce as u8 + 1)),
        sender,
        to: Some(to),
        value: U256::ZERO,
        gas_limit: 200_000,
        gas_price: 0,
        nonce,
        input: Bytes::from(payload),
        chain_id: 56,
    }
}

/// Observed contract-creation transaction carrying `init_code`.
pub fn observed_creation(sender: Address, nonce: u64, init_code: Bytes) -> PendingTransaction {
    PendingTransaction {
        hash: B256::repeat_byte(0xc0 + nonce as u8),
        sender,
        to: None,
        value: U256::ZERO,
        gas_limit: 3_000_000,
        gas_price: 0,
        nonce,
        input: init_code,
        chain_id: 56,
    }
}
