//! SmartWallet factory.
//!
//! Wallet addresses are a pure function of the factory, its template and a
//! [`WalletSeed`]; creation installs a wallet at that address when absent
//! and initializes it.

pub mod address;

pub use address::{derive_wallet_address, init_code, init_code_hash, CustomLogic, WalletSeed};

use relay_forwarder::{Forwarder, InitParams, SmartWallet};
use relay_ledger::{CallContext, Contract, Tx, World};
use relay_types::eip712::{domain_separator, personal_digest, recover_signer, request_digest};
use relay_types::{
	keccak256, Address, Bytes, DeployRequestBody, EnvelopingRequest, FactoryState, RelayError,
	RelayEvent, Result, WalletKind, WalletState, U256,
};
use std::collections::BTreeMap;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Factory {
	address: Address,
}

impl Factory {
	pub fn at(address: Address) -> Self {
		Self { address }
	}

	/// Creates a template of `kind` and a factory cloning it, both from `deployer`.
	pub fn deploy(tx: &mut Tx<'_>, deployer: Address, kind: WalletKind) -> Result<Self> {
		let template = tx.world_mut().create(deployer, Contract::Template(kind))?;
		let address = tx.world_mut().create(
			deployer,
			Contract::Factory(FactoryState {
				kind,
				template,
				nonces: BTreeMap::new(),
			}),
		)?;
		info!(factory = %address, template = %template, kind = %kind, "Deployed factory");
		Ok(Self { address })
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn kind(&self, world: &World) -> Result<WalletKind> {
		Ok(world.factory(&self.address)?.kind)
	}

	pub fn template(&self, world: &World) -> Result<Address> {
		Ok(world.factory(&self.address)?.template)
	}

	/// Relayed-deployment counter of `owner`.
	pub fn nonce(&self, world: &World, owner: &Address) -> Result<U256> {
		Ok(world
			.factory(&self.address)?
			.nonces
			.get(owner)
			.copied()
			.unwrap_or_default())
	}

	/// Seed for this factory. Logic is only part of the identity for
	/// custom-logic factories.
	pub fn seed(
		&self,
		world: &World,
		owner: Address,
		recoverer: Address,
		logic: Address,
		init_params: &[u8],
		index: U256,
	) -> Result<WalletSeed> {
		let seed = WalletSeed::new(owner, recoverer, index);
		Ok(match self.kind(world)? {
			WalletKind::Custom => seed.with_logic(logic, init_params),
			_ => seed,
		})
	}

	pub fn seed_for_request(&self, world: &World, request: &DeployRequestBody) -> Result<WalletSeed> {
		self.seed(
			world,
			request.from,
			request.recoverer,
			request.to,
			&request.data,
			request.index,
		)
	}

	pub fn get_smart_wallet_address(&self, world: &World, seed: &WalletSeed) -> Result<Address> {
		Ok(derive_wallet_address(
			self.address,
			self.template(world)?,
			seed,
		))
	}

	/// Packed message the owner personally signs to create a wallet directly:
	/// `factory ‖ owner ‖ recoverer ‖ index`, or
	/// `factory ‖ owner ‖ recoverer ‖ logic ‖ index ‖ initParams` with custom logic.
	pub fn creation_message(&self, seed: &WalletSeed, init_params: &[u8]) -> Vec<u8> {
		let mut packed = Vec::new();
		packed.extend_from_slice(self.address.as_slice());
		packed.extend_from_slice(seed.owner.as_slice());
		packed.extend_from_slice(seed.recoverer.as_slice());
		match &seed.logic {
			Some(custom) => {
				packed.extend_from_slice(custom.logic.as_slice());
				packed.extend_from_slice(&seed.index.to_be_bytes::<32>());
				packed.extend_from_slice(init_params);
			}
			None => packed.extend_from_slice(&seed.index.to_be_bytes::<32>()),
		}
		packed
	}

	/// Owner-signed creation with no fee.
	pub fn create_user_smart_wallet(
		&self,
		tx: &mut Tx<'_>,
		seed: &WalletSeed,
		init_params: &Bytes,
		signature: &[u8],
	) -> Result<Address> {
		let digest = personal_digest(keccak256(self.creation_message(seed, init_params)));
		let signer = recover_signer(digest, signature)
			.map_err(|_| RelayError::SignatureMismatch("Invalid signature".into()))?;
		if signer != seed.owner {
			return Err(RelayError::SignatureMismatch("Invalid signature".into()));
		}

		self.deploy_and_initialize(
			tx,
			seed,
			InitParams {
				owner: seed.owner,
				logic: seed.logic.map(|custom| custom.logic).unwrap_or_default(),
				init_params: init_params.clone(),
				..Default::default()
			},
		)
	}

	/// Creation paid through the relay. `ctx.caller` must be the request's hub.
	pub fn relayed_user_smart_wallet_creation(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		request: &DeployRequestBody,
		suffix_data: &[u8],
		fees_receiver: Address,
		signature: &[u8],
	) -> Result<Address> {
		if ctx.caller != request.relay_hub {
			return Err(RelayError::Unauthorized("Invalid caller".into()));
		}
		if request.is_expired(tx.timestamp()) {
			return Err(RelayError::Expired);
		}
		if request.nonce != self.nonce(tx.world(), &request.from)? {
			return Err(RelayError::NonceMismatch("nonce mismatch".into()));
		}

		let separator = domain_separator(tx.chain_id(), self.address);
		let digest = request_digest(separator, request, suffix_data);
		let signer = recover_signer(digest, signature)
			.map_err(|_| RelayError::SignatureMismatch("Signature mismatch".into()))?;
		if signer != request.from {
			return Err(RelayError::SignatureMismatch("Signature mismatch".into()));
		}

		let nonces = &mut tx.world_mut().factory_mut(&self.address)?.nonces;
		let nonce = nonces.entry(request.from).or_default();
		*nonce += U256::from(1);

		let seed = self.seed_for_request(tx.world(), request)?;
		self.deploy_and_initialize(
			tx,
			&seed,
			InitParams {
				owner: request.from,
				fee_token: request.token_contract,
				fee_receiver: fees_receiver,
				fee_amount: request.token_amount,
				fee_gas: request.token_gas,
				logic: seed.logic.map(|custom| custom.logic).unwrap_or_default(),
				init_params: request.data.clone(),
			},
		)
	}

	fn deploy_and_initialize(
		&self,
		tx: &mut Tx<'_>,
		seed: &WalletSeed,
		params: InitParams,
	) -> Result<Address> {
		let kind = self.kind(tx.world())?;
		let template = self.template(tx.world())?;
		let address = derive_wallet_address(self.address, template, seed);

		if !tx.world().has_code(&address) {
			tx.world_mut().install(
				address,
				Contract::Wallet(WalletState::uninitialized(kind, template)),
			)?;
		}
		SmartWallet::new(kind, address).initialize(tx, &params)?;

		let salt = seed.salt();
		tx.emit(self.address, RelayEvent::Deployed { address, salt });
		info!(factory = %self.address, wallet = %address, owner = %seed.owner, "Deployed smart wallet");
		Ok(address)
	}
}
