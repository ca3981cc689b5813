//! Execution substrate for the relay protocol.
//!
//! The [`Ledger`] is the single gateway to world state. Every state change
//! goes through [`Ledger::transact`], which runs against a copy of the world
//! and commits only when the closure returns `Ok`, so a failing entry point
//! never leaves partial effects behind.

pub mod token;
pub mod tx;
pub mod world;

pub use tx::{
	CallContext, CallTarget, Targets, Tx, TxEnv, DEFAULT_GAS_LIMIT, EXTERNAL_CALL_GAS,
	INTRINSIC_GAS, TOKEN_CALL_GAS, VALUE_TRANSFER_GAS,
};
pub use world::{Contract, World};

use relay_storage::{StorageError, StorageService};
use relay_types::{Address, Result, TokenState, U256};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

const SNAPSHOT_NAMESPACE: &str = "ledger";
const SNAPSHOT_ID: &str = "world";
pub const DEFAULT_BLOCK_TIME: u64 = 30;

pub struct Ledger {
	world: World,
	targets: Targets,
}

impl Ledger {
	pub fn new(chain_id: u64) -> Self {
		Self::from_world(World::new(chain_id, 0, DEFAULT_BLOCK_TIME))
	}

	pub fn from_world(world: World) -> Self {
		Self {
			world,
			targets: Targets::new(),
		}
	}

	pub fn world(&self) -> &World {
		&self.world
	}

	pub fn chain_id(&self) -> u64 {
		self.world.chain_id
	}

	pub fn block_number(&self) -> u64 {
		self.world.block_number
	}

	pub fn timestamp(&self) -> u64 {
		self.world.timestamp
	}

	pub fn balance_of(&self, account: &Address) -> U256 {
		self.world.balance_of(account)
	}

	pub fn token_balance(&self, token: &Address, holder: &Address) -> U256 {
		token::balance_of(&self.world, token, holder)
	}

	pub fn advance_blocks(&mut self, blocks: u64) {
		self.world.advance_blocks(blocks);
		debug!(
			block_number = self.world.block_number,
			timestamp = self.world.timestamp,
			"Advanced ledger"
		);
	}

	/// Credits native currency out of thin air. Genesis and test setup only.
	pub fn fund(&mut self, account: Address, amount: U256) {
		self.world.credit(account, amount);
	}

	pub fn deploy_token(&mut self, deployer: Address, symbol: &str, decimals: u8) -> Result<Address> {
		let address = self
			.world
			.create(deployer, Contract::Token(TokenState::new(symbol, decimals)))?;
		info!(token = %address, symbol, "Deployed token");
		Ok(address)
	}

	pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<()> {
		self.transact_raw(|world| token::mint(world, token, to, amount))
	}

	/// Installs `target` as external code at a fresh address of `deployer`.
	pub fn register_target(
		&mut self,
		deployer: Address,
		label: &str,
		target: Arc<dyn CallTarget>,
	) -> Result<Address> {
		let address = self.world.create(
			deployer,
			Contract::External {
				label: label.to_string(),
				storage: BTreeMap::new(),
			},
		)?;
		self.targets.insert(address, target);
		debug!(target = %address, label, "Registered call target");
		Ok(address)
	}

	/// Re-binds behaviour to an existing external address, e.g. after [`Ledger::load`].
	pub fn attach_target(&mut self, address: Address, target: Arc<dyn CallTarget>) {
		self.targets.insert(address, target);
	}

	/// Runs one transaction atomically.
	pub fn transact<T, F>(&mut self, env: TxEnv, f: F) -> Result<T>
	where
		F: FnOnce(&mut Tx<'_>, &CallContext) -> Result<T>,
	{
		let outcome = self.on_working_copy(|working, targets| {
			let mut tx = Tx::new(working, targets, &env);
			tx.begin(&env).and_then(|ctx| f(&mut tx, &ctx))
		});

		match outcome {
			Ok(value) => {
				debug!(origin = %env.origin, to = %env.to, "Transaction committed");
				Ok(value)
			}
			Err(e) => {
				debug!(origin = %env.origin, to = %env.to, error = %e, "Transaction reverted");
				Err(e)
			}
		}
	}

	fn transact_raw<T>(&mut self, f: impl FnOnce(&mut World) -> Result<T>) -> Result<T> {
		self.on_working_copy(|working, _| f(working))
	}

	/// Runs `f` on a copy of the world and swaps it in on `Ok`. The event
	/// history stays out of the copy; only logs emitted by `f` are appended.
	fn on_working_copy<T>(
		&mut self,
		f: impl FnOnce(&mut World, &Targets) -> Result<T>,
	) -> Result<T> {
		let history = self.world.take_logs();
		let mut working = self.world.clone();
		match f(&mut working, &self.targets) {
			Ok(value) => {
				working.restore_logs(history);
				self.world = working;
				Ok(value)
			}
			Err(e) => {
				self.world.restore_logs(history);
				Err(e)
			}
		}
	}

	pub async fn save(&self, storage: &StorageService) -> std::result::Result<(), StorageError> {
		storage
			.store(SNAPSHOT_NAMESPACE, SNAPSHOT_ID, &self.world)
			.await?;
		info!(block_number = self.world.block_number, "Saved ledger snapshot");
		Ok(())
	}

	/// Restores the world. External behaviour must be re-attached by the caller.
	pub async fn load(storage: &StorageService) -> std::result::Result<Self, StorageError> {
		let world: World = storage.retrieve(SNAPSHOT_NAMESPACE, SNAPSHOT_ID).await?;
		info!(block_number = world.block_number, "Loaded ledger snapshot");
		Ok(Self::from_world(world))
	}
}
