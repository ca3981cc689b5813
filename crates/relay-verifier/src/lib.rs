//! Admission policies consulted by the hub before forwarding.
//!
//! A verifier is scoped to either deploy or relay requests of one factory
//! and may combine a fee-token allow-list with a destination allow-list.

mod handlers;

pub use handlers::Handler;

use relay_factory::Factory;
use relay_ledger::{CallContext, Contract, Tx, World};
use relay_types::{
	Address, AllowList, DeployRequest, EnvelopingRequest, RelayError, RelayRequest, Result,
	VerifierScope, VerifierState,
};
use tracing::info;

/// Which handlers a verifier is deployed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policies {
	pub tokens: bool,
	pub contracts: bool,
	/// Zero-address fee token with a non-zero amount.
	pub accepts_native: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verifier {
	address: Address,
}

impl Verifier {
	pub fn at(address: Address) -> Self {
		Self { address }
	}

	pub fn deploy(
		tx: &mut Tx<'_>,
		owner: Address,
		scope: VerifierScope,
		policies: Policies,
	) -> Result<Self> {
		let address = tx.world_mut().create(
			owner,
			Contract::Verifier(VerifierState {
				owner,
				scope,
				tokens: policies.tokens.then(AllowList::default),
				contracts: policies.contracts.then(AllowList::default),
				accepts_native: policies.accepts_native,
			}),
		)?;
		info!(verifier = %address, owner = %owner, scope = ?scope, "Deployed verifier");
		Ok(Self { address })
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn accept_token(&self, tx: &mut Tx<'_>, ctx: &CallContext, token: Address) -> Result<()> {
		handlers::accept(tx, &self.frame(ctx), Handler::Token, token)
	}

	pub fn remove_token(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		token: Address,
		index: usize,
	) -> Result<()> {
		handlers::remove(tx, &self.frame(ctx), Handler::Token, token, index)
	}

	pub fn accept_contract(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		contract: Address,
	) -> Result<()> {
		handlers::accept(tx, &self.frame(ctx), Handler::Contract, contract)
	}

	pub fn remove_contract(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		contract: Address,
		index: usize,
	) -> Result<()> {
		handlers::remove(tx, &self.frame(ctx), Handler::Contract, contract, index)
	}

	pub fn get_accepted_tokens(&self, world: &World) -> Result<Vec<Address>> {
		Ok(Handler::Token.list(world.verifier(&self.address)?)?.items().to_vec())
	}

	pub fn get_accepted_contracts(&self, world: &World) -> Result<Vec<Address>> {
		Ok(Handler::Contract
			.list(world.verifier(&self.address)?)?
			.items()
			.to_vec())
	}

	pub fn accepts_token(&self, world: &World, token: &Address) -> Result<bool> {
		Ok(Handler::Token.list(world.verifier(&self.address)?)?.contains(token))
	}

	pub fn accepts_contract(&self, world: &World, contract: &Address) -> Result<bool> {
		Ok(Handler::Contract
			.list(world.verifier(&self.address)?)?
			.contains(contract))
	}

	/// Admission check for a relay request.
	pub fn verify_relay(&self, world: &World, request: &RelayRequest) -> Result<()> {
		let state = world.verifier(&self.address)?;
		let factory = match state.scope {
			VerifierScope::Relay { factory } => factory,
			VerifierScope::Deploy { .. } => {
				return Err(RelayError::Rejected("Verifier only accepts deploy requests".into()))
			}
		};

		let template = Factory::at(factory).template(world)?;
		match world.wallet(&request.relay_data.call_forwarder) {
			Ok(wallet) if wallet.template == template => {}
			_ => return Err(RelayError::Rejected("SW different to template".into())),
		}

		check_fee(state, &request.request)?;
		check_destination(state, request.request.to, false)
	}

	/// Admission check for a deploy request.
	pub fn verify_deploy(&self, world: &World, request: &DeployRequest) -> Result<()> {
		let state = world.verifier(&self.address)?;
		let factory = match state.scope {
			VerifierScope::Deploy { factory } => Factory::at(factory),
			VerifierScope::Relay { .. } => {
				return Err(RelayError::Rejected("Verifier only accepts relay requests".into()))
			}
		};
		if request.relay_data.call_forwarder != factory.address() {
			return Err(RelayError::Rejected("Invalid factory".into()));
		}

		let seed = factory.seed_for_request(world, &request.request)?;
		let wallet = factory.get_smart_wallet_address(world, &seed)?;
		if world.has_code(&wallet) {
			return Err(RelayError::Rejected("Address already created!".into()));
		}

		check_fee(state, &request.request)?;
		check_destination(state, request.request.to, true)
	}

	fn frame(&self, ctx: &CallContext) -> CallContext {
		CallContext {
			this: self.address,
			..*ctx
		}
	}
}

fn check_fee(state: &VerifierState, request: &impl EnvelopingRequest) -> Result<()> {
	let Some(tokens) = &state.tokens else {
		return Ok(());
	};
	let token = request.token_contract();
	let admitted = if token.is_zero() {
		request.token_amount().is_zero() || state.accepts_native
	} else {
		tokens.contains(&token)
	};
	if !admitted {
		return Err(RelayError::Rejected("Token contract not allowed".into()));
	}
	Ok(())
}

/// Deploy requests name their custom logic in `to`; none is always fine.
fn check_destination(state: &VerifierState, to: Address, optional: bool) -> Result<()> {
	let Some(contracts) = &state.contracts else {
		return Ok(());
	};
	if (optional && to.is_zero()) || contracts.contains(&to) {
		return Ok(());
	}
	Err(RelayError::Rejected("Destination contract not allowed".into()))
}
