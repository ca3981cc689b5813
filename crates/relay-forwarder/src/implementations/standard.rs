use crate::common::{self, Policy};
use crate::{Forwarder, InitParams};
use relay_ledger::{CallContext, Tx, World};
use relay_types::{Address, Bytes, ForwardRequest, Result, WalletKind};

const POLICY: Policy = Policy {
	token_fees: true,
	caches_domain: true,
};

/// Default wallet: token or native fees, owner calls sweep leftovers back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardWallet {
	address: Address,
}

impl StandardWallet {
	pub fn new(address: Address) -> Self {
		Self { address }
	}
}

impl Forwarder for StandardWallet {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> WalletKind {
		WalletKind::Standard
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
		let output = tx
			.call(self.address, to, ctx.value, gas, data)
			.map_err(|e| common::unable_to_execute(&e))?;
		common::sweep(tx, self.address, ctx.caller)?;
		Ok(output)
	}
}
