//! State records owned by on-ledger components.
//!
//! These are plain data. The crates implementing each component hold the
//! rules for mutating them; the ledger only stores and snapshots them.

use crate::errors::RelayError;
use alloy_primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Economic parameters fixed when a hub is deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubParams {
	pub max_worker_count: u64,
	pub minimum_entry_deposit: U256,
	/// In blocks.
	pub minimum_unstake_delay: u64,
	pub minimum_stake: U256,
}

impl HubParams {
	pub fn validate(&self) -> Result<(), RelayError> {
		if self.max_worker_count == 0
			|| self.minimum_entry_deposit.is_zero()
			|| self.minimum_unstake_delay == 0
			|| self.minimum_stake.is_zero()
		{
			return Err(RelayError::BadInitParams);
		}
		Ok(())
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeInfo {
	pub stake: U256,
	pub owner: Address,
	/// In blocks. Never decreases.
	pub unstake_delay: u64,
	/// Block from which the stake may be withdrawn, once unlocked.
	pub withdraw_block: Option<u64>,
}

impl StakeInfo {
	pub fn is_unlocked(&self) -> bool {
		self.withdraw_block.is_some()
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerEntry {
	pub manager: Address,
	pub enabled: bool,
}

/// Query view of a relay manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayManagerData {
	pub manager: Address,
	pub url: Option<String>,
	pub currently_staked: bool,
	pub registered: bool,
	pub workers_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubState {
	pub params: HubParams,
	pub penalizer: Address,
	pub stakes: BTreeMap<Address, StakeInfo>,
	pub workers: BTreeMap<Address, WorkerEntry>,
	pub worker_counts: BTreeMap<Address, u64>,
	pub relay_urls: BTreeMap<Address, String>,
}

impl HubState {
	pub fn new(params: HubParams, penalizer: Address) -> Self {
		Self {
			params,
			penalizer,
			stakes: BTreeMap::new(),
			workers: BTreeMap::new(),
			worker_counts: BTreeMap::new(),
			relay_urls: BTreeMap::new(),
		}
	}
}

/// Closed set of SmartWallet variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WalletKind {
	Standard,
	Custom,
	NativeHolder,
	Minimal,
}

impl fmt::Display for WalletKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			WalletKind::Standard => "standard",
			WalletKind::Custom => "custom",
			WalletKind::NativeHolder => "native-holder",
			WalletKind::Minimal => "minimal",
		};
		f.write_str(name)
	}
}

impl FromStr for WalletKind {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"standard" => Ok(WalletKind::Standard),
			"custom" => Ok(WalletKind::Custom),
			"native-holder" => Ok(WalletKind::NativeHolder),
			"minimal" => Ok(WalletKind::Minimal),
			other => Err(format!("Unknown wallet kind: {}", other)),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletState {
	pub kind: WalletKind,
	/// Template the wallet was created from.
	pub template: Address,
	pub owner_hash: B256,
	pub nonce: U256,
	pub domain_separator: Option<B256>,
	pub initialized: bool,
	/// Custom logic the wallet delegates to; zero when none.
	pub logic: Address,
	/// Slots written by delegated logic.
	pub storage: BTreeMap<B256, B256>,
}

impl WalletState {
	pub fn uninitialized(kind: WalletKind, template: Address) -> Self {
		Self {
			kind,
			template,
			owner_hash: B256::ZERO,
			nonce: U256::ZERO,
			domain_separator: None,
			initialized: false,
			logic: Address::ZERO,
			storage: BTreeMap::new(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryState {
	pub kind: WalletKind,
	pub template: Address,
	/// Per-owner relayed deployment counter.
	pub nonces: BTreeMap<Address, U256>,
}

/// Ordered list with O(1) membership and swap-and-pop removal by index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
	items: Vec<Address>,
	members: BTreeSet<Address>,
}

impl AllowList {
	pub fn contains(&self, item: &Address) -> bool {
		self.members.contains(item)
	}

	pub fn items(&self) -> &[Address] {
		&self.items
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn get(&self, index: usize) -> Option<&Address> {
		self.items.get(index)
	}

	/// Returns false when already present.
	pub fn insert(&mut self, item: Address) -> bool {
		if !self.members.insert(item) {
			return false;
		}
		self.items.push(item);
		true
	}

	/// Removes the item at `index`, moving the last item into its place.
	pub fn swap_remove(&mut self, index: usize) -> Option<Address> {
		if index >= self.items.len() {
			return None;
		}
		let removed = self.items.swap_remove(index);
		self.members.remove(&removed);
		Some(removed)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum VerifierScope {
	Deploy { factory: Address },
	Relay { factory: Address },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifierState {
	pub owner: Address,
	pub scope: VerifierScope,
	/// Fee-token policy, when enabled.
	pub tokens: Option<AllowList>,
	/// Destination-contract policy, when enabled.
	pub contracts: Option<AllowList>,
	pub accepts_native: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenalizerState {
	pub penalized: BTreeSet<B256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenState {
	pub symbol: String,
	pub decimals: u8,
	pub total_supply: U256,
	pub balances: BTreeMap<Address, U256>,
	pub allowances: BTreeMap<Address, BTreeMap<Address, U256>>,
}

impl TokenState {
	pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
		Self {
			symbol: symbol.into(),
			decimals,
			..Default::default()
		}
	}

	pub fn balance_of(&self, holder: &Address) -> U256 {
		self.balances.get(holder).copied().unwrap_or_default()
	}

	pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
		self.allowances
			.get(owner)
			.and_then(|spenders| spenders.get(spender))
			.copied()
			.unwrap_or_default()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	#[test]
	fn test_hub_params_must_be_positive() {
		let params = HubParams {
			max_worker_count: 10,
			minimum_entry_deposit: U256::from(1),
			minimum_unstake_delay: 10,
			minimum_stake: U256::from(1),
		};
		assert!(params.validate().is_ok());

		for broken in [
			HubParams {
				max_worker_count: 0,
				..params.clone()
			},
			HubParams {
				minimum_entry_deposit: U256::ZERO,
				..params.clone()
			},
			HubParams {
				minimum_unstake_delay: 0,
				..params.clone()
			},
			HubParams {
				minimum_stake: U256::ZERO,
				..params.clone()
			},
		] {
			assert_eq!(broken.validate(), Err(RelayError::BadInitParams));
		}
	}

	#[test]
	fn test_allow_list_swap_and_pop() {
		let a = address!("00000000000000000000000000000000000000aa");
		let b = address!("00000000000000000000000000000000000000bb");
		let c = address!("00000000000000000000000000000000000000cc");

		let mut list = AllowList::default();
		assert!(list.insert(a));
		assert!(list.insert(b));
		assert!(list.insert(c));
		assert!(!list.insert(b));

		assert_eq!(list.swap_remove(0), Some(a));
		assert_eq!(list.items(), &[c, b]);
		assert!(!list.contains(&a));
		assert_eq!(list.swap_remove(5), None);
	}

	#[test]
	fn test_wallet_kind_parsing() {
		assert_eq!("native-holder".parse::<WalletKind>(), Ok(WalletKind::NativeHolder));
		assert_eq!(WalletKind::Custom.to_string(), "custom");
		assert!("proxy".parse::<WalletKind>().is_err());
	}
}
