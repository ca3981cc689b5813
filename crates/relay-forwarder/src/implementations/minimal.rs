use crate::common::{self, Policy};
use crate::{Forwarder, InitParams};
use relay_ledger::{CallContext, Tx, World};
use relay_types::{Address, Bytes, ForwardRequest, RelayError, Result, WalletKind};

const POLICY: Policy = Policy {
	token_fees: true,
	caches_domain: false,
};

/// Relay-only wallet. The signing domain is rebuilt on every verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinimalWallet {
	address: Address,
}

impl MinimalWallet {
	pub fn new(address: Address) -> Self {
		Self { address }
	}
}

impl Forwarder for MinimalWallet {
	fn address(&self) -> Address {
		self.address
	}

	fn kind(&self) -> WalletKind {
		WalletKind::Minimal
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
		_tx: &mut Tx<'_>,
		_ctx: &CallContext,
		_to: Address,
		_data: &[u8],
	) -> Result<Bytes> {
		Err(RelayError::Unsupported(
			"directExecute not supported by minimal wallet".into(),
		))
	}
}
