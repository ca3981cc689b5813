//! World state: everything a transition may read or write.

use relay_types::{
	Address, FactoryState, HubState, Log, PenalizerState, RelayError, RelayEvent, Result,
	TokenState, VerifierState, WalletKind, WalletState, B256, U256,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Code installed at an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contract {
	Token(TokenState),
	/// Master copy SmartWallets are cloned from.
	Template(WalletKind),
	Wallet(WalletState),
	Factory(FactoryState),
	Hub(HubState),
	Penalizer(PenalizerState),
	Verifier(VerifierState),
	/// Behaviour registered at runtime; its slots live here.
	External {
		label: String,
		storage: BTreeMap<B256, B256>,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CodeKind {
	Token,
	External,
	Protocol,
}

impl Contract {
	pub(crate) fn code_kind(&self) -> CodeKind {
		match self {
			Contract::Token(_) => CodeKind::Token,
			Contract::External { .. } => CodeKind::External,
			_ => CodeKind::Protocol,
		}
	}
}

macro_rules! contract_accessors {
	($get:ident, $get_mut:ident, $variant:ident, $ty:ty, $label:literal) => {
		pub fn $get(&self, address: &Address) -> Result<&$ty> {
			match self.contracts.get(address) {
				Some(Contract::$variant(state)) => Ok(state),
				_ => Err(RelayError::NotFound(format!("{} at {}", $label, address))),
			}
		}

		pub fn $get_mut(&mut self, address: &Address) -> Result<&mut $ty> {
			match self.contracts.get_mut(address) {
				Some(Contract::$variant(state)) => Ok(state),
				_ => Err(RelayError::NotFound(format!("{} at {}", $label, address))),
			}
		}
	};
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct World {
	pub chain_id: u64,
	pub block_number: u64,
	pub timestamp: u64,
	/// Seconds added to `timestamp` per block.
	pub block_time: u64,
	balances: BTreeMap<Address, U256>,
	nonces: BTreeMap<Address, u64>,
	contracts: BTreeMap<Address, Contract>,
	logs: Vec<Log>,
}

impl World {
	pub fn new(chain_id: u64, timestamp: u64, block_time: u64) -> Self {
		Self {
			chain_id,
			block_number: 0,
			timestamp,
			block_time,
			balances: BTreeMap::new(),
			nonces: BTreeMap::new(),
			contracts: BTreeMap::new(),
			logs: Vec::new(),
		}
	}

	pub fn advance_blocks(&mut self, blocks: u64) {
		self.block_number = self.block_number.saturating_add(blocks);
		self.timestamp = self
			.timestamp
			.saturating_add(blocks.saturating_mul(self.block_time));
	}

	pub fn balance_of(&self, account: &Address) -> U256 {
		self.balances.get(account).copied().unwrap_or_default()
	}

	pub fn credit(&mut self, account: Address, amount: U256) {
		let balance = self.balances.entry(account).or_default();
		*balance = balance.saturating_add(amount);
	}

	pub fn debit(&mut self, account: Address, amount: U256) -> Result<()> {
		let balance = self.balance_of(&account);
		if balance < amount {
			return Err(RelayError::InsufficientBalance);
		}
		self.balances.insert(account, balance - amount);
		Ok(())
	}

	/// Moves native currency. A self-transfer still requires the balance.
	pub fn transfer_native(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
		self.debit(from, amount)?;
		self.credit(to, amount);
		Ok(())
	}

	pub fn contract(&self, address: &Address) -> Option<&Contract> {
		self.contracts.get(address)
	}

	pub fn has_code(&self, address: &Address) -> bool {
		self.contracts.contains_key(address)
	}

	pub fn contracts(&self) -> impl Iterator<Item = (&Address, &Contract)> {
		self.contracts.iter()
	}

	/// Installs code at a fresh address. Fails if code is already there.
	pub fn install(&mut self, address: Address, contract: Contract) -> Result<()> {
		if self.has_code(&address) {
			return Err(RelayError::Rejected(format!(
				"Address {} already has code",
				address
			)));
		}
		self.contracts.insert(address, contract);
		Ok(())
	}

	/// Derives the next CREATE address for `deployer` and installs `contract` there.
	pub fn create(&mut self, deployer: Address, contract: Contract) -> Result<Address> {
		let nonce = self.nonces.entry(deployer).or_default();
		let address = deployer.create(*nonce);
		*nonce += 1;
		self.install(address, contract)?;
		Ok(address)
	}

	contract_accessors!(token, token_mut, Token, TokenState, "token");
	contract_accessors!(wallet, wallet_mut, Wallet, WalletState, "smart wallet");
	contract_accessors!(factory, factory_mut, Factory, FactoryState, "factory");
	contract_accessors!(hub, hub_mut, Hub, HubState, "relay hub");
	contract_accessors!(penalizer, penalizer_mut, Penalizer, PenalizerState, "penalizer");
	contract_accessors!(verifier, verifier_mut, Verifier, VerifierState, "verifier");

	pub fn template(&self, address: &Address) -> Result<WalletKind> {
		match self.contracts.get(address) {
			Some(Contract::Template(kind)) => Ok(*kind),
			_ => Err(RelayError::NotFound(format!("template at {}", address))),
		}
	}

	fn slots(&self, address: &Address) -> Option<&BTreeMap<B256, B256>> {
		match self.contracts.get(address) {
			Some(Contract::External { storage, .. }) => Some(storage),
			Some(Contract::Wallet(wallet)) => Some(&wallet.storage),
			_ => None,
		}
	}

	pub fn storage_get(&self, address: &Address, key: &B256) -> B256 {
		self.slots(address)
			.and_then(|slots| slots.get(key))
			.copied()
			.unwrap_or_default()
	}

	pub fn storage_set(&mut self, address: &Address, key: B256, value: B256) -> Result<()> {
		let slots = match self.contracts.get_mut(address) {
			Some(Contract::External { storage, .. }) => storage,
			Some(Contract::Wallet(wallet)) => &mut wallet.storage,
			_ => {
				return Err(RelayError::Unsupported(format!(
					"No writable storage at {}",
					address
				)))
			}
		};
		slots.insert(key, value);
		Ok(())
	}

	pub fn emit(&mut self, emitter: Address, event: RelayEvent) {
		self.logs.push(Log {
			emitter,
			block_number: self.block_number,
			event,
		});
	}

	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	pub(crate) fn take_logs(&mut self) -> Vec<Log> {
		std::mem::take(&mut self.logs)
	}

	/// Puts `history` back in front of the logs emitted since [`World::take_logs`].
	pub(crate) fn restore_logs(&mut self, mut history: Vec<Log>) {
		history.append(&mut self.logs);
		self.logs = history;
	}
}
