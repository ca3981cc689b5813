//! Node configuration schema.

use crate::serde_helpers::{
	deserialize_u256, deserialize_u256_map, serialize_u256, serialize_u256_map,
};
use relay_storage::StorageBackend;
use relay_types::{Address, HubParams, WalletKind, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
	pub node: NodeConfig,
	pub hub: HubConfig,
	#[serde(default)]
	pub factory: FactoryConfig,
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
	#[serde(default)]
	pub verifiers: Vec<VerifierConfig>,
	#[serde(default)]
	pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
	pub chain_id: u64,
	/// Account that deploys every genesis component.
	pub deployer: Address,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Seconds per block.
	#[serde(default = "default_block_time")]
	pub block_time: u64,
	#[serde(default)]
	pub storage: StorageBackend,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_block_time() -> u64 {
	30
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
	pub max_worker_count: u64,
	#[serde(deserialize_with = "deserialize_u256", serialize_with = "serialize_u256")]
	pub minimum_entry_deposit: U256,
	/// In blocks.
	pub minimum_unstake_delay: u64,
	#[serde(deserialize_with = "deserialize_u256", serialize_with = "serialize_u256")]
	pub minimum_stake: U256,
}

impl From<&HubConfig> for HubParams {
	fn from(config: &HubConfig) -> Self {
		HubParams {
			max_worker_count: config.max_worker_count,
			minimum_entry_deposit: config.minimum_entry_deposit,
			minimum_unstake_delay: config.minimum_unstake_delay,
			minimum_stake: config.minimum_stake,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
	#[serde(default = "default_wallet_kind")]
	pub kind: WalletKind,
}

fn default_wallet_kind() -> WalletKind {
	WalletKind::Standard
}

impl Default for FactoryConfig {
	fn default() -> Self {
		Self {
			kind: default_wallet_kind(),
		}
	}
}

/// Fee token minted at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
	pub symbol: String,
	#[serde(default = "default_decimals")]
	pub decimals: u8,
}

fn default_decimals() -> u8 {
	18
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerifierKind {
	Deploy,
	Relay,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierConfig {
	pub name: String,
	pub scope: VerifierKind,
	/// Accepted fee token symbols. Enables the token handler when present.
	#[serde(default)]
	pub tokens: Option<Vec<String>>,
	/// Accepted destinations. Enables the contract handler when present.
	#[serde(default)]
	pub contracts: Option<Vec<Address>>,
	#[serde(default)]
	pub accepts_native: bool,
}

/// Genesis balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountConfig {
	pub address: Address,
	#[serde(
		default,
		deserialize_with = "deserialize_u256",
		serialize_with = "serialize_u256"
	)]
	pub balance: U256,
	/// Token symbol to amount.
	#[serde(
		default,
		deserialize_with = "deserialize_u256_map",
		serialize_with = "serialize_u256_map"
	)]
	pub tokens: BTreeMap<String, U256>,
}
