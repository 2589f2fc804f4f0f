//! Transaction forgery: replaying an observed call under our identity.
//!
//! The payload rewrite is a deliberate heuristic: every hex occurrence of
//! the observed sender's address in the call data is replaced with the
//! impersonating identity's address. This covers the common case where a
//! contract call embeds the caller's address literally (router calls,
//! self-referential init code) and makes no attempt to interpret the
//! calldata semantically.

use alloy::consensus::{SignableTransaction, Signed, TxLegacy};
use alloy::primitives::{hex, Address, Bytes, TxKind, B256, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use eyre::eyre;

use scout_core::{AnalysisError, PendingTransaction, ScoutConfig, CONTRACT_CREATE_GAS_LIMIT};
use scout_sim::SandboxTx;

/// A signed replacement transaction authored by the impersonating identity.
///
/// Always carries value zero; ephemeral, never reused across attempts.
#[derive(Clone, Debug)]
pub struct ForgedTransaction {
    /// The signed legacy transaction.
    pub signed: Signed<TxLegacy>,
    /// The identity that signed it.
    pub caller: Address,
}

impl ForgedTransaction {
    /// Transaction hash of the forged transaction.
    pub fn hash(&self) -> B256 {
        *self.signed.hash()
    }

    /// Describe the forged transaction for sandbox execution.
    pub fn sandbox_tx(&self) -> SandboxTx {
        let tx = self.signed.tx();
        SandboxTx {
            caller: self.caller,
            to: match tx.to {
                TxKind::Call(address) => Some(address),
                TxKind::Create => None,
            },
            value: tx.value,
            gas_limit: tx.gas_limit,
            gas_price: tx.gas_price,
            nonce: tx.nonce,
            data: tx.input.clone(),
        }
    }
}

/// Replace every hex occurrence of `from` in `payload` with `to`.
///
/// Needle and haystack are compared as lowercase hex with the address
/// prefix stripped, so mixed-case occurrences match. Self-inverse for
/// addresses of equal byte length: substituting A→B and then B→A
/// recovers the original payload.
///
/// # Errors
/// [`AnalysisError::PayloadRewrite`] when the rewritten hex does not
/// decode back to bytes.
pub fn substitute_address(
    payload: &[u8],
    from: Address,
    to: Address,
) -> Result<Bytes, AnalysisError> {
    let encoded = hex::encode(payload);
    let needle = hex::encode(from.as_slice());
    let replacement = hex::encode(to.as_slice());

    let rewritten = encoded.replace(&needle, &replacement);
    let bytes =
        hex::decode(&rewritten).map_err(|err| AnalysisError::PayloadRewrite(err.to_string()))?;
    Ok(Bytes::from(bytes))
}

/// Builds and signs forged transactions for one impersonating identity.
pub struct TxForger {
    signer: PrivateKeySigner,
}

impl TxForger {
    /// Build a forger from the configured private key.
    ///
    /// # Errors
    /// Returns an error when the key does not parse. A configured
    /// identity address that disagrees with the key is logged and
    /// overridden by the key's address.
    pub fn new(cfg: &ScoutConfig) -> eyre::Result<Self> {
        let signer = cfg
            .private_key
            .parse::<PrivateKeySigner>()
            .map_err(|err| eyre!("invalid private key: {err}"))?;
        if signer.address() != cfg.identity {
            tracing::warn!(
                configured = %cfg.identity,
                derived = %signer.address(),
                "configured identity does not match private key; using derived address"
            );
        }
        Ok(Self { signer })
    }

    /// The impersonating identity's address.
    pub fn identity(&self) -> Address {
        self.signer.address()
    }

    /// Replace every hex occurrence of `observed_sender` in `payload`
    /// with the impersonating identity.
    ///
    /// Both needle and haystack are compared as lowercase hex with the
    /// address prefix stripped, so mixed-case occurrences match.
    ///
    /// # Errors
    /// [`AnalysisError::PayloadRewrite`] when the rewritten hex does not
    /// decode back to bytes.
    pub fn rewrite_payload(
        &self,
        payload: &[u8],
        observed_sender: Address,
    ) -> Result<Bytes, AnalysisError> {
        substitute_address(payload, observed_sender, self.identity())
    }

    /// Forge a call into `to` mimicking `observed`, with rewritten data.
    pub fn forge_call(
        &self,
        observed: &PendingTransaction,
        nonce: u64,
        to: Address,
        data: Bytes,
    ) -> Result<ForgedTransaction, AnalysisError> {
        self.sign(TxLegacy {
            chain_id: Some(observed.chain_id),
            nonce,
            gas_price: observed.gas_price,
            gas_limit: observed.gas_limit,
            to: TxKind::Call(to),
            value: U256::ZERO,
            input: data,
        })
    }

    /// Forge a shadow contract creation carrying rewritten init code.
    pub fn forge_create(
        &self,
        observed: &PendingTransaction,
        nonce: u64,
        init_code: Bytes,
    ) -> Result<ForgedTransaction, AnalysisError> {
        self.sign(TxLegacy {
            chain_id: Some(observed.chain_id),
            nonce,
            gas_price: observed.gas_price,
            gas_limit: CONTRACT_CREATE_GAS_LIMIT,
            to: TxKind::Create,
            value: U256::ZERO,
            input: init_code,
        })
    }

    fn sign(&self, tx: TxLegacy) -> Result<ForgedTransaction, AnalysisError> {
        let signature = self
            .signer
            .sign_hash_sync(&tx.signature_hash())
            .map_err(|err| AnalysisError::Signing(eyre!(err)))?;
        Ok(ForgedTransaction {
            caller: self.signer.address(),
            signed: tx.into_signed(signature),
        })
    }
}
