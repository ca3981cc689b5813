use crate::common::{self, Policy};
use crate::{Forwarder, InitParams};
use relay_ledger::{CallContext, Tx, World};
use relay_types::{Address, Bytes, ForwardRequest, Result, WalletKind};

const POLICY: Policy = Policy {
	token_fees: false,
	caches_domain: true,
};

/// Wallet that keeps native currency: fees are native only and direct
/// calls do not sweep the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeHolderWallet {
	address: Address,
}

impl NativeHolderWallet {
	pub fn new(address: Address) -> Self {
		Self { address }
	}
}

impl Forwarder for NativeHolderWallet {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> WalletKind {
		WalletKind::NativeHolder
	}

	fn initialize(&self, tx: &mut Tx<'_>, params: &InitParams) -> Result<()> {
		common::initialize(tx, self.address, POLICY, params)
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
		common::call_target(tx, self.address, request, gas)
	}

	fn direct_execute(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		to: Address,
		data: &[u8],
	) -> Result<Bytes> {
		common::ensure_owner(tx.world(), self.address, ctx.caller)?;
		let gas = tx.gas_left();
		tx.call(self.address, to, ctx.value, gas, data)
			.map_err(|e| common::unable_to_execute(&e))
	}
}
