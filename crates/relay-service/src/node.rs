//! Relay node: genesis wiring and the transaction entry points.
//!
//! A node owns one [`Ledger`] and the addresses of the components deployed
//! at genesis. Every state-changing method submits exactly one ledger
//! transaction, so a failure never leaves partial effects.

use relay_config::{RelayConfig, VerifierKind};
use relay_factory::Factory;
use relay_forwarder::{Forwarder, SmartWallet};
use relay_hub::RelayHub;
use relay_ledger::{Ledger, TxEnv, World};
use relay_penalizer::Penalizer;
use relay_storage::{StorageError, StorageService};
use relay_types::{
	Address, Bytes, DeployRequest, HubParams, RelayError, RelayManagerData, RelayRequest, Result,
	StakeInfo, VerifierScope, U256,
};
use relay_verifier::{Policies, Verifier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

const DEPLOYMENT_NAMESPACE: &str = "deployment";
const DEPLOYMENT_ID: &str = "current";

#[derive(Debug, Error)]
pub enum NodeError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error(transparent)]
	Relay(#[from] RelayError),
	#[error(transparent)]
	Storage(#[from] StorageError),
}

/// Addresses of the components deployed at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
	pub chain_id: u64,
	pub deployer: Address,
	pub penalizer: Address,
	pub hub: Address,
	pub factory: Address,
	pub tokens: BTreeMap<String, Address>,
	pub verifiers: BTreeMap<String, Address>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ManagerStatus {
	#[serde(flatten)]
	pub relay: RelayManagerData,
	pub stake: StakeInfo,
	pub workers: Vec<Address>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
	pub chain_id: u64,
	pub block_number: u64,
	pub timestamp: u64,
	pub hub: Address,
	pub params: HubParams,
	pub managers: Vec<ManagerStatus>,
}

#[derive(Default)]
pub struct RelayNodeBuilder {
	config: Option<RelayConfig>,
	genesis_timestamp: u64,
}

impl RelayNodeBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(mut self, config: RelayConfig) -> Self {
		self.config = Some(config);
		self
	}

	pub fn with_genesis_timestamp(mut self, timestamp: u64) -> Self {
		self.genesis_timestamp = timestamp;
		self
	}

	/// Builds the genesis world: tokens and balances, then penalizer, hub,
	/// factory and verifiers, all created by the configured deployer.
	pub fn build(self) -> std::result::Result<RelayNode, NodeError> {
		let config = self
			.config
			.ok_or_else(|| NodeError::Config("No configuration provided".to_string()))?;
		let deployer = config.node.deployer;
		let mut ledger = Ledger::from_world(World::new(
			config.node.chain_id,
			self.genesis_timestamp,
			config.node.block_time,
		));

		let mut tokens = BTreeMap::new();
		for token in &config.tokens {
			let address = ledger.deploy_token(deployer, &token.symbol, token.decimals)?;
			tokens.insert(token.symbol.clone(), address);
		}
		for account in &config.accounts {
			ledger.fund(account.address, account.balance);
			for (symbol, amount) in &account.tokens {
				let token = tokens.get(symbol).ok_or_else(|| {
					NodeError::Config(format!("Unknown token '{}' for {}", symbol, account.address))
				})?;
				ledger.mint(*token, account.address, *amount)?;
			}
		}

		let params = HubParams::from(&config.hub);
		let deployment = ledger.transact(TxEnv::new(deployer, Address::ZERO), |tx, ctx| {
			let penalizer = Penalizer::deploy(tx, deployer)?;
			let hub = RelayHub::deploy(tx, deployer, params, penalizer.address())?;
			let factory = Factory::deploy(tx, deployer, config.factory.kind)?;

			let mut verifiers = BTreeMap::new();
			for entry in &config.verifiers {
				let scope = match entry.scope {
					VerifierKind::Deploy => VerifierScope::Deploy {
						factory: factory.address(),
					},
					VerifierKind::Relay => VerifierScope::Relay {
						factory: factory.address(),
					},
				};
				let policies = Policies {
					tokens: entry.tokens.is_some(),
					contracts: entry.contracts.is_some(),
					accepts_native: entry.accepts_native,
				};
				let verifier = Verifier::deploy(tx, deployer, scope, policies)?;
				for symbol in entry.tokens.iter().flatten() {
					let token = tokens
						.get(symbol)
						.copied()
						.ok_or_else(|| RelayError::NotFound(format!("token {}", symbol)))?;
					verifier.accept_token(tx, ctx, token)?;
				}
				for contract in entry.contracts.iter().flatten() {
					verifier.accept_contract(tx, ctx, *contract)?;
				}
				verifiers.insert(entry.name.clone(), verifier.address());
			}

			Ok(Deployment {
				chain_id: tx.chain_id(),
				deployer,
				penalizer: penalizer.address(),
				hub: hub.address(),
				factory: factory.address(),
				tokens: tokens.clone(),
				verifiers,
			})
		})?;

		info!(
			chain_id = deployment.chain_id,
			hub = %deployment.hub,
			factory = %deployment.factory,
			verifiers = deployment.verifiers.len(),
			"Genesis built"
		);
		Ok(RelayNode::from_parts(ledger, deployment))
	}
}

pub struct RelayNode {
	ledger: Ledger,
	deployment: Deployment,
	hub: RelayHub,
	factory: Factory,
	penalizer: Penalizer,
}

impl RelayNode {
	fn from_parts(ledger: Ledger, deployment: Deployment) -> Self {
		Self {
			hub: RelayHub::at(deployment.hub),
			factory: Factory::at(deployment.factory),
			penalizer: Penalizer::at(deployment.penalizer),
			ledger,
			deployment,
		}
	}

	pub fn ledger(&self) -> &Ledger {
		&self.ledger
	}

	/// Direct ledger access for setup that has no protocol entry point.
	pub fn ledger_mut(&mut self) -> &mut Ledger {
		&mut self.ledger
	}

	pub fn deployment(&self) -> &Deployment {
		&self.deployment
	}

	pub fn hub(&self) -> RelayHub {
		self.hub
	}

	pub fn factory(&self) -> Factory {
		self.factory
	}

	pub fn penalizer(&self) -> &Penalizer {
		&self.penalizer
	}

	pub fn verifier(&self, name: &str) -> Option<Verifier> {
		self.deployment.verifiers.get(name).copied().map(Verifier::at)
	}

	pub fn token(&self, symbol: &str) -> Option<Address> {
		self.deployment.tokens.get(symbol).copied()
	}

	pub fn advance_blocks(&mut self, blocks: u64) {
		self.ledger.advance_blocks(blocks);
	}

	pub fn stake_for_address(
		&mut self,
		owner: Address,
		manager: Address,
		amount: U256,
		unstake_delay: u64,
	) -> Result<()> {
		let hub = self.hub;
		let env = TxEnv::new(owner, hub.address()).with_value(amount);
		self.ledger.transact(env, |tx, ctx| {
			hub.stake_for_address(tx, ctx, manager, unstake_delay)
		})
	}

	pub fn unlock_stake(&mut self, owner: Address, manager: Address) -> Result<()> {
		let hub = self.hub;
		self.ledger
			.transact(TxEnv::new(owner, hub.address()), |tx, ctx| {
				hub.unlock_stake(tx, ctx, manager)
			})
	}

	pub fn withdraw_stake(&mut self, owner: Address, manager: Address) -> Result<()> {
		let hub = self.hub;
		self.ledger
			.transact(TxEnv::new(owner, hub.address()), |tx, ctx| {
				hub.withdraw_stake(tx, ctx, manager)
			})
	}

	pub fn add_relay_workers(&mut self, manager: Address, workers: &[Address]) -> Result<()> {
		let hub = self.hub;
		self.ledger
			.transact(TxEnv::new(manager, hub.address()), |tx, ctx| {
				hub.add_relay_workers(tx, ctx, workers)
			})
	}

	pub fn disable_relay_workers(&mut self, manager: Address, workers: &[Address]) -> Result<()> {
		let hub = self.hub;
		self.ledger
			.transact(TxEnv::new(manager, hub.address()), |tx, ctx| {
				hub.disable_relay_workers(tx, ctx, workers)
			})
	}

	pub fn register_relay_server(&mut self, manager: Address, url: &str) -> Result<()> {
		let hub = self.hub;
		self.ledger
			.transact(TxEnv::new(manager, hub.address()), |tx, ctx| {
				hub.register_relay_server(tx, ctx, url)
			})
	}

	/// Submits `request` as `worker`, offering `gas_price`.
	pub fn relay_call(
		&mut self,
		worker: Address,
		gas_price: U256,
		request: &RelayRequest,
		signature: &[u8],
	) -> Result<Bytes> {
		let hub = self.hub;
		let env = TxEnv::new(worker, hub.address()).with_gas_price(gas_price);
		self.ledger
			.transact(env, |tx, ctx| hub.relay_call(tx, ctx, request, signature))
	}

	pub fn deploy_call(
		&mut self,
		worker: Address,
		gas_price: U256,
		request: &DeployRequest,
		signature: &[u8],
	) -> Result<Address> {
		let hub = self.hub;
		let env = TxEnv::new(worker, hub.address()).with_gas_price(gas_price);
		self.ledger
			.transact(env, |tx, ctx| hub.deploy_call(tx, ctx, request, signature))
	}

	/// Reports two same-nonce transactions; `reporter` receives the reward.
	pub fn penalize_repeated_nonce(
		&mut self,
		reporter: Address,
		unsigned_tx1: &[u8],
		signature1: &[u8],
		unsigned_tx2: &[u8],
		signature2: &[u8],
	) -> Result<()> {
		let hub = self.hub;
		let penalizer = self.penalizer.clone();
		self.ledger
			.transact(TxEnv::new(reporter, penalizer.address()), |tx, ctx| {
				penalizer.penalize_repeated_nonce(
					tx,
					ctx,
					unsigned_tx1,
					signature1,
					unsigned_tx2,
					signature2,
					&hub,
				)
			})
	}

	pub fn smart_wallet_address(
		&self,
		owner: Address,
		recoverer: Address,
		logic: Address,
		init_params: &[u8],
		index: U256,
	) -> Result<Address> {
		let world = self.ledger.world();
		let seed = self
			.factory
			.seed(world, owner, recoverer, logic, init_params, index)?;
		self.factory.get_smart_wallet_address(world, &seed)
	}

	pub fn wallet_nonce(&self, wallet: Address) -> Result<U256> {
		let world = self.ledger.world();
		SmartWallet::at(world, wallet)?.nonce(world)
	}

	pub fn status(&self) -> Result<NodeStatus> {
		let world = self.ledger.world();
		let state = world.hub(&self.hub.address())?;

		let mut workers: BTreeMap<Address, Vec<Address>> = BTreeMap::new();
		for (worker, entry) in &state.workers {
			if entry.enabled {
				workers.entry(entry.manager).or_default().push(*worker);
			}
		}

		let managers = state
			.stakes
			.iter()
			.map(|(manager, stake)| {
				Ok(ManagerStatus {
					relay: self.hub.relay_info(world, manager)?,
					stake: stake.clone(),
					workers: workers.remove(manager).unwrap_or_default(),
				})
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(NodeStatus {
			chain_id: world.chain_id,
			block_number: world.block_number,
			timestamp: world.timestamp,
			hub: self.hub.address(),
			params: state.params.clone(),
			managers,
		})
	}

	pub async fn save(&self, storage: &StorageService) -> std::result::Result<(), NodeError> {
		self.ledger.save(storage).await?;
		storage
			.store(DEPLOYMENT_NAMESPACE, DEPLOYMENT_ID, &self.deployment)
			.await?;
		Ok(())
	}

	/// Whether a deployment has been persisted to `storage`.
	pub async fn exists(storage: &StorageService) -> std::result::Result<bool, NodeError> {
		Ok(storage.contains(DEPLOYMENT_NAMESPACE, DEPLOYMENT_ID).await?)
	}

	pub async fn load(storage: &StorageService) -> std::result::Result<Self, NodeError> {
		let ledger = Ledger::load(storage).await?;
		let deployment: Deployment = storage.retrieve(DEPLOYMENT_NAMESPACE, DEPLOYMENT_ID).await?;
		if deployment.chain_id != ledger.chain_id() {
			return Err(NodeError::Config(format!(
				"Snapshot chain {} does not match deployment chain {}",
				ledger.chain_id(),
				deployment.chain_id
			)));
		}
		Ok(Self::from_parts(ledger, deployment))
	}
}
