//! RelayHub: the coordinator every relayed request passes through.
//!
//! Holds the stake ledger and worker registry, admits requests from enabled
//! workers of staked managers, consults the request's verifier and hands
//! the request to its SmartWallet or factory.

mod stake;
mod workers;

use relay_factory::Factory;
use relay_forwarder::{Forwarder, SmartWallet};
use relay_ledger::{CallContext, Contract, Tx, World};
use relay_types::{
	keccak256, Address, Bytes, DeployRequest, HubParams, HubState, RelayError, RelayEvent,
	RelayManagerData, RelayRequest, Result, StakeInfo, B256, U256,
};
use relay_verifier::Verifier;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayHub {
	address: Address,
}

impl RelayHub {
	pub fn at(address: Address) -> Self {
		Self { address }
	}

	/// Deploys a hub bound to `penalizer`. Every parameter must be positive.
	pub fn deploy(
		tx: &mut Tx<'_>,
		deployer: Address,
		params: HubParams,
		penalizer: Address,
	) -> Result<Self> {
		params.validate()?;
		let address = tx
			.world_mut()
			.create(deployer, Contract::Hub(HubState::new(params, penalizer)))?;
		info!(hub = %address, penalizer = %penalizer, "Deployed relay hub");
		Ok(Self { address })
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn params(&self, world: &World) -> Result<HubParams> {
		Ok(world.hub(&self.address)?.params.clone())
	}

	pub fn penalizer(&self, world: &World) -> Result<Address> {
		Ok(world.hub(&self.address)?.penalizer)
	}

	pub fn stake_info(&self, world: &World, manager: &Address) -> Result<StakeInfo> {
		Ok(world
			.hub(&self.address)?
			.stakes
			.get(manager)
			.cloned()
			.unwrap_or_default())
	}

	pub fn is_relay_manager_staked(&self, world: &World, manager: &Address) -> Result<bool> {
		Ok(stake::is_staked(world.hub(&self.address)?, manager))
	}

	/// Manager a worker is bound to, enabled or not.
	pub fn worker_to_manager(&self, world: &World, worker: &Address) -> Result<Option<Address>> {
		Ok(world
			.hub(&self.address)?
			.workers
			.get(worker)
			.map(|entry| entry.manager))
	}

	pub fn worker_count(&self, world: &World, manager: &Address) -> Result<u64> {
		Ok(world
			.hub(&self.address)?
			.worker_counts
			.get(manager)
			.copied()
			.unwrap_or_default())
	}

	pub fn relay_info(&self, world: &World, manager: &Address) -> Result<RelayManagerData> {
		let state = world.hub(&self.address)?;
		let url = state.relay_urls.get(manager).cloned();
		Ok(RelayManagerData {
			manager: *manager,
			registered: url.is_some(),
			url,
			currently_staked: stake::is_staked(state, manager),
			workers_count: state.worker_counts.get(manager).copied().unwrap_or_default(),
		})
	}

	/// Relays `request` into its SmartWallet. The caller is the worker.
	pub fn relay_call(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		request: &RelayRequest,
		signature: &[u8],
	) -> Result<Bytes> {
		let worker = ctx.caller;
		let manager = self.admit(tx, worker, &request.relay_data.gas_price)?;
		Verifier::at(request.relay_data.call_verifier).verify_relay(tx.world(), request)?;

		let forwarder = request.relay_data.call_forwarder;
		let wallet = SmartWallet::at(tx.world(), forwarder)?;
		let inner = self.frame(tx, forwarder);
		let output = wallet.execute(
			tx,
			&inner,
			&request.suffix_data(),
			&request.request,
			request.relay_data.fees_receiver,
			signature,
		)?;

		self.relayed(tx, manager, worker, signature, output.clone());
		info!(manager = %manager, worker = %worker, wallet = %forwarder, nonce = %request.request.nonce, "Relayed call");
		Ok(output)
	}

	/// Relays a wallet creation into the request's factory.
	pub fn deploy_call(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		request: &DeployRequest,
		signature: &[u8],
	) -> Result<Address> {
		let worker = ctx.caller;
		let manager = self.admit(tx, worker, &request.relay_data.gas_price)?;
		Verifier::at(request.relay_data.call_verifier).verify_deploy(tx.world(), request)?;

		let factory = Factory::at(request.relay_data.call_forwarder);
		let inner = self.frame(tx, factory.address());
		let wallet = factory.relayed_user_smart_wallet_creation(
			tx,
			&inner,
			&request.request,
			&request.suffix_data(),
			request.relay_data.fees_receiver,
			signature,
		)?;

		let output = Bytes::copy_from_slice(wallet.into_word().as_slice());
		self.relayed(tx, manager, worker, signature, output);
		info!(manager = %manager, worker = %worker, wallet = %wallet, "Relayed deployment");
		Ok(wallet)
	}

	/// Slashes the manager of `worker`. Only the bound penalizer may call.
	///
	/// Half of the stake goes to `beneficiary`, the rest is burned.
	pub fn penalize(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		worker: Address,
		beneficiary: Address,
	) -> Result<()> {
		let state = tx.world_mut().hub_mut(&self.address)?;
		if ctx.caller != state.penalizer {
			return Err(RelayError::Unauthorized("Not penalizer".into()));
		}
		let manager = state
			.workers
			.get(&worker)
			.map(|entry| entry.manager)
			.ok_or(RelayError::UnknownManager)?;
		if !stake::is_staked(state, &manager) {
			return Err(RelayError::UnknownManager);
		}

		let info = state
			.stakes
			.get_mut(&manager)
			.ok_or(RelayError::UnknownManager)?;
		let amount = info.stake;
		info.stake = Default::default();

		let reward = amount / U256::from(2);
		tx.transfer_native(self.address, beneficiary, reward)?;
		tx.transfer_native(self.address, Address::ZERO, amount - reward)?;

		tx.emit(
			self.address,
			RelayEvent::StakePenalized {
				relay_manager: manager,
				beneficiary,
				reward,
			},
		);
		warn!(manager = %manager, worker = %worker, beneficiary = %beneficiary, reward = %reward, "Relay manager penalized");
		Ok(())
	}

	/// Worker, manager and gas price checks shared by both entry points.
	fn admit(&self, tx: &Tx<'_>, worker: Address, gas_price: &U256) -> Result<Address> {
		if worker != tx.origin() {
			return Err(RelayError::Unauthorized("RelayWorker cannot be a contract".into()));
		}
		let state = tx.world().hub(&self.address)?;
		let manager = match state.workers.get(&worker) {
			Some(entry) if entry.enabled => entry.manager,
			_ => return Err(RelayError::Unauthorized("Not an enabled worker".into())),
		};
		if !stake::is_staked(state, &manager) {
			return Err(RelayError::NotStaked);
		}
		if *gas_price > tx.gas_price() {
			return Err(RelayError::Rejected("Invalid gas price".into()));
		}
		Ok(manager)
	}

	fn frame(&self, tx: &Tx<'_>, this: Address) -> CallContext {
		CallContext {
			this,
			caller: self.address,
			value: Default::default(),
			gas: tx.gas_left(),
		}
	}

	fn relayed(
		&self,
		tx: &mut Tx<'_>,
		manager: Address,
		worker: Address,
		signature: &[u8],
		output: Bytes,
	) {
		let relay_request_sig_hash: B256 = keccak256(signature);
		tx.emit(
			self.address,
			RelayEvent::TransactionRelayed {
				relay_manager: manager,
				relay_worker: worker,
				relay_request_sig_hash,
				relayed_call_return_value: output,
			},
		);
	}
}
