//! Routines shared by every wallet variant.

use alloy_sol_types::{SolCall, SolValue};
use relay_ledger::{CallContext, Tx, World};
use relay_types::abi::IERC20;
use relay_types::eip712::{domain_separator, owner_hash, recover_signer, request_digest};
use relay_types::{
	as_gas, Address, Bytes, EnvelopingRequest, ForwardRequest, RelayError, Result, U256,
};
use tracing::{debug, info};

use crate::InitParams;

/// Gas that must remain on top of `request.gas` before the target call.
pub const GAS_MARGIN: u64 = 10_000;

/// How a variant settles fees and which cached values it keeps.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Policy {
	pub token_fees: bool,
	pub caches_domain: bool,
}

pub(crate) fn initialize(
	tx: &mut Tx<'_>,
	this: Address,
	policy: Policy,
	params: &InitParams,
) -> Result<()> {
	if tx.world().wallet(&this)?.initialized {
		return Err(RelayError::AlreadyInitialized);
	}

	pay_fee(
		tx,
		this,
		policy,
		params.fee_token,
		params.fee_receiver,
		params.fee_amount,
		params.fee_gas,
	)
	.map_err(|e| payment_failure(e, "Unable to pay for deployment"))?;

	let chain_id = tx.chain_id();
	let wallet = tx.world_mut().wallet_mut(&this)?;
	wallet.owner_hash = owner_hash(params.owner);
	wallet.domain_separator = policy
		.caches_domain
		.then(|| domain_separator(chain_id, this));
	wallet.initialized = true;

	info!(wallet = %this, owner = %params.owner, "Initialized smart wallet");
	Ok(())
}

pub(crate) fn verify(
	world: &World,
	this: Address,
	suffix_data: &[u8],
	request: &ForwardRequest,
	signature: &[u8],
) -> Result<()> {
	let wallet = world.wallet(&this)?;
	if !wallet.initialized {
		return Err(RelayError::Unauthorized("SmartWallet not initialized".into()));
	}
	if request.is_expired(world.timestamp) {
		return Err(RelayError::Expired);
	}
	if owner_hash(request.from) != wallet.owner_hash {
		return Err(RelayError::Unauthorized(
			"Not the owner of the SmartWallet".into(),
		));
	}
	if request.nonce != wallet.nonce {
		return Err(RelayError::NonceMismatch("nonce mismatch".into()));
	}

	let separator = wallet
		.domain_separator
		.unwrap_or_else(|| domain_separator(world.chain_id, this));
	let digest = request_digest(separator, request, suffix_data);
	let signer = recover_signer(digest, signature)
		.map_err(|_| RelayError::SignatureMismatch("Signature mismatch".into()))?;
	if owner_hash(signer) != wallet.owner_hash {
		return Err(RelayError::SignatureMismatch("Signature mismatch".into()));
	}
	Ok(())
}

/// Authenticates and consumes a relayed request, leaving the target call
/// to the caller. Returns the gas budget for that call.
pub(crate) fn prepare_execution(
	tx: &mut Tx<'_>,
	ctx: &CallContext,
	policy: Policy,
	suffix_data: &[u8],
	request: &ForwardRequest,
	fees_receiver: Address,
	signature: &[u8],
) -> Result<u64> {
	let this = ctx.this;
	if ctx.caller != request.relay_hub {
		return Err(RelayError::Unauthorized("Invalid caller".into()));
	}
	verify(tx.world(), this, suffix_data, request, signature)?;

	let gas = as_gas(request.gas);
	if tx.gas_left() < gas.saturating_add(GAS_MARGIN) {
		return Err(RelayError::execution("Not enough gas left"));
	}

	let wallet = tx.world_mut().wallet_mut(&this)?;
	wallet.nonce += U256::from(1);
	let nonce = wallet.nonce;

	pay_fee(
		tx,
		this,
		policy,
		request.token_contract,
		fees_receiver,
		request.token_amount,
		request.token_gas,
	)
	.map_err(|e| payment_failure(e, "Unable to pay for relay"))?;

	debug!(wallet = %this, from = %request.from, nonce = %nonce, "Relayed request authenticated");
	Ok(gas)
}

/// Runs the target call and wraps its revert.
pub(crate) fn call_target(
	tx: &mut Tx<'_>,
	this: Address,
	request: &ForwardRequest,
	gas: u64,
) -> Result<Bytes> {
	tx.call(this, request.to, request.value, gas, &request.data)
		.map_err(|e| unable_to_execute(&e))
}

pub(crate) fn unable_to_execute(e: &RelayError) -> RelayError {
	RelayError::ExecutionFailure {
		reason: "Unable to execute".into(),
		revert: e.revert_reason(),
	}
}

pub(crate) fn ensure_owner(world: &World, this: Address, caller: Address) -> Result<()> {
	if owner_hash(caller) != world.wallet(&this)?.owner_hash {
		return Err(RelayError::Unauthorized("Not the owner of the SmartWallet".into()));
	}
	Ok(())
}

/// Sends whatever native balance the wallet holds to `owner`.
pub(crate) fn sweep(tx: &mut Tx<'_>, this: Address, owner: Address) -> Result<()> {
	let balance = tx.world().balance_of(&this);
	if !balance.is_zero() {
		tx.transfer_native(this, owner, balance)?;
		debug!(wallet = %this, owner = %owner, amount = %balance, "Swept wallet balance");
	}
	Ok(())
}

/// Pays `amount` of `token` (zero address = native) from the wallet.
fn pay_fee(
	tx: &mut Tx<'_>,
	this: Address,
	policy: Policy,
	token: Address,
	receiver: Address,
	amount: U256,
	token_gas: U256,
) -> Result<()> {
	if amount.is_zero() {
		return Ok(());
	}

	if token.is_zero() {
		let gas = tx.gas_left();
		tx.call(this, receiver, amount, gas, &[])?;
		return Ok(());
	}

	if !policy.token_fees {
		return Err(RelayError::PaymentFailure(
			"Token payment not supported".into(),
		));
	}

	let data = IERC20::transferCall {
		to: receiver,
		amount,
	}
	.abi_encode();
	let output = tx.call(this, token, U256::ZERO, as_gas(token_gas), &data)?;
	let success = bool::abi_decode(&output)
		.map_err(|e| RelayError::Decode(format!("transfer result: {}", e)))?;
	if !success {
		return Err(RelayError::revert("token transfer returned false"));
	}
	Ok(())
}

fn payment_failure(e: RelayError, reason: &str) -> RelayError {
	match e {
		RelayError::PaymentFailure(_) => e,
		_ => RelayError::PaymentFailure(reason.to_string()),
	}
}
