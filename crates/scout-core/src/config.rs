//! Runtime configuration for the scout.
//!
//! Built once at startup and passed by reference into every component.
//! The impersonating identity comes from the environment; blacklist and
//! thresholds default to the well-known BSC contracts the scout was
//! originally tuned for and can be overridden from a JSON file.

use std::collections::{HashMap, HashSet};

use alloy::primitives::{address, Address, U256};
use eyre::{Context, Result};
use serde::Deserialize;

use crate::ETHER;

/// Wrapped BNB.
pub const WBNB: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");
/// Tether USD (BSC).
pub const USDT: Address = address!("55d398326f99059fF775485246999027B3197955");
/// Binance USD.
pub const BUSD: Address = address!("e9e7CEA3DedcA5984780Bafc599bD69ADd087D56");
/// USD Coin (BSC).
pub const USDC: Address = address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d");

/// Environment variable holding the impersonating identity's address.
pub const ENV_ADDRESS: &str = "SCOUT_ADDRESS";
/// Environment variable holding the impersonating identity's private key (hex).
pub const ENV_PRIVATE_KEY: &str = "SCOUT_PRIVATE_KEY";

fn default_max_concurrency() -> usize {
    64
}

fn default_shadow_cache_capacity() -> usize {
    10_000
}

fn default_seen_cache_capacity() -> usize {
    65_536
}

/// Immutable scout configuration.
#[derive(Clone, Deserialize)]
pub struct ScoutConfig {
    /// Address of the impersonating identity.
    pub identity: Address,
    /// Private key of the impersonating identity (hex, no 0x prefix required).
    pub private_key: String,
    /// Contract addresses excluded from analysis.
    #[serde(default = "ScoutConfig::default_blacklist")]
    pub blacklist: HashSet<Address>,
    /// Minimum credited amount per token for a transfer to qualify
    /// (strict comparison). Tokens absent from the map never qualify.
    #[serde(default = "ScoutConfig::default_thresholds")]
    pub thresholds: HashMap<Address, U256>,
    /// Upper bound on concurrently running analysis tasks.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Shadow code cache capacity (entries).
    #[serde(default = "default_shadow_cache_capacity")]
    pub shadow_cache_capacity: usize,
    /// Capacity of the recently-analyzed transaction hash cache.
    #[serde(default = "default_seen_cache_capacity")]
    pub seen_cache_capacity: usize,
}

impl ScoutConfig {
    /// Build a configuration from the environment.
    ///
    /// # Errors
    /// Returns an error when either identity variable is missing or the
    /// address does not parse.
    pub fn from_env() -> Result<Self> {
        let identity = std::env::var(ENV_ADDRESS)
            .wrap_err_with(|| format!("{ENV_ADDRESS} not set"))?
            .parse::<Address>()
            .wrap_err_with(|| format!("{ENV_ADDRESS} is not a valid address"))?;
        let private_key = std::env::var(ENV_PRIVATE_KEY)
            .wrap_err_with(|| format!("{ENV_PRIVATE_KEY} not set"))?;

        Ok(Self::new(identity, private_key))
    }

    /// Build a configuration with default blacklist and thresholds.
    pub fn new(identity: Address, private_key: impl Into<String>) -> Self {
        Self {
            identity,
            private_key: private_key.into(),
            blacklist: Self::default_blacklist(),
            thresholds: Self::default_thresholds(),
            max_concurrency: default_max_concurrency(),
            shadow_cache_capacity: default_shadow_cache_capacity(),
            seen_cache_capacity: default_seen_cache_capacity(),
        }
    }

    /// Router and utility contracts that are never worth replaying.
    pub fn default_blacklist() -> HashSet<Address> {
        HashSet::from([
            address!("10ed43c718714eb63d5aa57b78b54704e256024e"), // PancakeRouter
            address!("6cd71a07e72c514f5d511651f6808c6395353968"),
            address!("45c54210128a065de780c4b0df3d16664f7f859e"),
            address!("1a1ec25dc08e98e5e93f1104b5e5cdd298707d31"),
            address!("3a6d8ca21d1cf76f653a67577fa0d27453350dd8"),
            address!("0000000000004946c0e9f43f4dee607b0ef1fa1c"), // CHI gas token
        ])
    }

    /// Per-token qualification thresholds.
    ///
    /// Wrapped native is low unit value, so a much larger amount is
    /// required than for the stable tokens.
    pub fn default_thresholds() -> HashMap<Address, U256> {
        let hundredth = ETHER / U256::from(100);
        HashMap::from([
            (WBNB, hundredth),
            (USDT, ETHER),
            (BUSD, ETHER),
            (USDC, ETHER),
        ])
    }
}

impl std::fmt::Debug for ScoutConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoutConfig")
            .field("identity", &self.identity)
            .field("private_key", &"<redacted>")
            .field("blacklist", &self.blacklist.len())
            .field("thresholds", &self.thresholds.len())
            .field("max_concurrency", &self.max_concurrency)
            .field("shadow_cache_capacity", &self.shadow_cache_capacity)
            .field("seen_cache_capacity", &self.seen_cache_capacity)
            .finish()
    }
}
