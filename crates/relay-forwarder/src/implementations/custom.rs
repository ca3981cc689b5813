use crate::common::{self, Policy};
use crate::{Forwarder, InitParams};
use alloy_sol_types::SolCall;
use relay_ledger::{CallContext, Tx, World};
use relay_types::abi::IWalletCustomLogic;
use relay_types::{Address, Bytes, ForwardRequest, RelayError, Result, WalletKind};
use tracing::debug;

const POLICY: Policy = Policy {
	token_fees: true,
	caches_domain: true,
};

/// Wallet that hands execution to a custom logic contract when one was
/// bound at initialization. The logic runs against the wallet's own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomWallet {
	address: Address,
}

impl CustomWallet {
	pub fn new(address: Address) -> Self {
		Self { address }
	}

	pub fn logic(&self, world: &World) -> Result<Address> {
		Ok(world.wallet(&self.address)?.logic)
	}
}

impl Forwarder for CustomWallet {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> WalletKind {
		WalletKind::Custom
	}

	fn initialize(&self, tx: &mut Tx<'_>, params: &InitParams) -> Result<()> {
		common::initialize(tx, self.address, POLICY, params)?;
		if params.logic.is_zero() {
			return Ok(());
		}

		tx.world_mut().wallet_mut(&self.address)?.logic = params.logic;
		let data = IWalletCustomLogic::initializeCall {
			initParams: params.init_params.clone(),
		}
		.abi_encode();
		let gas = tx.gas_left();
		tx.delegate_call(self.address, self.address, params.logic, gas, &data)
			.map_err(|e| RelayError::ExecutionFailure {
				reason: "Unable to initialize SW".into(),
				revert: e.revert_reason(),
			})?;
		debug!(wallet = %self.address, logic = %params.logic, "Bound custom logic");
		Ok(())
	}

	fn verify(
		&self,
		world: &World,
		suffix_data: &[u8],
		request: &ForwardRequest,
		signature: &[u8],
	) -> Result<()> {
		common::verify(world, self.address, suffix_data, request, signature)
	}

	fn execute(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		suffix_data: &[u8],
		request: &ForwardRequest,
		fees_receiver: Address,
		signature: &[u8],
	) -> Result<Bytes> {
		let gas = common::prepare_execution(
			tx,
			ctx,
			POLICY,
			suffix_data,
			request,
			fees_receiver,
			signature,
		)?;

		let logic = self.logic(tx.world())?;
		if logic.is_zero() {
			return common::call_target(tx, self.address, request, gas);
		}

		let data = IWalletCustomLogic::executeCall {
			to: request.to,
			value: request.value,
			data: request.data.clone(),
		}
		.abi_encode();
		tx.delegate_call(self.address, ctx.caller, logic, gas, &data)
			.map_err(|e| common::unable_to_execute(&e))
	}

	fn direct_execute(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		to: Address,
		data: &[u8],
	) -> Result<Bytes> {
		common::ensure_owner(tx.world(), self.address, ctx.caller)?;
		let logic = self.logic(tx.world())?;
		let gas = tx.gas_left();

		let output = if logic.is_zero() {
			tx.call(self.address, to, ctx.value, gas, data)
		} else {
			let call = IWalletCustomLogic::directExecuteCall {
				to,
				data: Bytes::copy_from_slice(data),
			}
			.abi_encode();
			tx.delegate_call(self.address, ctx.caller, logic, gas, &call)
		}
		.map_err(|e| common::unable_to_execute(&e))?;

		common::sweep(tx, self.address, ctx.caller)?;
		Ok(output)
	}
}
