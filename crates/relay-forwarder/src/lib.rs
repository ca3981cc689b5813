//! SmartWallet family.
//!
//! Every variant authenticates a relayed request against its owner and
//! nonce, pays the relay fee and performs the call. They differ in how fees
//! may be paid, whether the owner can call directly, whether custom logic
//! is delegated to and whether the signing domain is cached.

mod common;
pub mod implementations;

pub use common::GAS_MARGIN;
pub use implementations::{CustomWallet, MinimalWallet, NativeHolderWallet, StandardWallet};

use relay_ledger::{CallContext, Tx, World};
use relay_types::{Address, Bytes, ForwardRequest, Result, WalletKind, U256};

/// Arguments of the one-time wallet initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitParams {
	pub owner: Address,
	/// Zero address pays in native currency.
	pub fee_token: Address,
	pub fee_receiver: Address,
	pub fee_amount: U256,
	pub fee_gas: U256,
	/// Custom logic; ignored by variants without delegation.
	pub logic: Address,
	pub init_params: Bytes,
}

pub trait Forwarder {
	fn address(&self) -> Address;

	fn kind(&self) -> WalletKind;

	/// One-shot. Pays the deployment fee before marking the wallet initialized.
	fn initialize(&self, tx: &mut Tx<'_>, params: &InitParams) -> Result<()>;

	/// Checks expiry, owner, nonce and signature without side effects.
	fn verify(
		&self,
		world: &World,
		suffix_data: &[u8],
		request: &ForwardRequest,
		signature: &[u8],
	) -> Result<()>;

	/// Runs a relayed request. `ctx.caller` must be the request's hub.
	fn execute(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		suffix_data: &[u8],
		request: &ForwardRequest,
		fees_receiver: Address,
		signature: &[u8],
	) -> Result<Bytes>;

	/// Owner-initiated call that bypasses the relay path.
	fn direct_execute(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		to: Address,
		data: &[u8],
	) -> Result<Bytes>;

	fn nonce(&self, world: &World) -> Result<U256> {
		Ok(world.wallet(&self.address())?.nonce)
	}
}

/// Wallet bound to its variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartWallet {
	Standard(StandardWallet),
	Custom(CustomWallet),
	NativeHolder(NativeHolderWallet),
	Minimal(MinimalWallet),
}

impl SmartWallet {
	pub fn new(kind: WalletKind, address: Address) -> Self {
		match kind {
			WalletKind::Standard => SmartWallet::Standard(StandardWallet::new(address)),
			WalletKind::Custom => SmartWallet::Custom(CustomWallet::new(address)),
			WalletKind::NativeHolder => SmartWallet::NativeHolder(NativeHolderWallet::new(address)),
			WalletKind::Minimal => SmartWallet::Minimal(MinimalWallet::new(address)),
		}
	}

	/// Loads the wallet deployed at `address`.
	pub fn at(world: &World, address: Address) -> Result<Self> {
		Ok(Self::new(world.wallet(&address)?.kind, address))
	}
}

impl Forwarder for SmartWallet {
	fn address(&self) -> Address {
		match self {
			SmartWallet::Standard(wallet) => wallet.address(),
			SmartWallet::Custom(wallet) => wallet.address(),
			SmartWallet::NativeHolder(wallet) => wallet.address(),
			SmartWallet::Minimal(wallet) => wallet.address(),
		}
	}

	fn kind(&self) -> WalletKind {
		match self {
			SmartWallet::Standard(wallet) => wallet.kind(),
			SmartWallet::Custom(wallet) => wallet.kind(),
			SmartWallet::NativeHolder(wallet) => wallet.kind(),
			SmartWallet::Minimal(wallet) => wallet.kind(),
		}
	}

	fn initialize(&self, tx: &mut Tx<'_>, params: &InitParams) -> Result<()> {
		match self {
			SmartWallet::Standard(wallet) => wallet.initialize(tx, params),
			SmartWallet::Custom(wallet) => wallet.initialize(tx, params),
			SmartWallet::NativeHolder(wallet) => wallet.initialize(tx, params),
			SmartWallet::Minimal(wallet) => wallet.initialize(tx, params),
		}
	}

	fn verify(
		&self,
		world: &World,
		suffix_data: &[u8],
		request: &ForwardRequest,
		signature: &[u8],
	) -> Result<()> {
		match self {
			SmartWallet::Standard(wallet) => wallet.verify(world, suffix_data, request, signature),
			SmartWallet::Custom(wallet) => wallet.verify(world, suffix_data, request, signature),
			SmartWallet::NativeHolder(wallet) => {
				wallet.verify(world, suffix_data, request, signature)
			}
			SmartWallet::Minimal(wallet) => wallet.verify(world, suffix_data, request, signature),
		}
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
		match self {
			SmartWallet::Standard(wallet) => {
				wallet.execute(tx, ctx, suffix_data, request, fees_receiver, signature)
			}
			SmartWallet::Custom(wallet) => {
				wallet.execute(tx, ctx, suffix_data, request, fees_receiver, signature)
			}
			SmartWallet::NativeHolder(wallet) => {
				wallet.execute(tx, ctx, suffix_data, request, fees_receiver, signature)
			}
			SmartWallet::Minimal(wallet) => {
				wallet.execute(tx, ctx, suffix_data, request, fees_receiver, signature)
			}
		}
	}

	fn direct_execute(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		to: Address,
		data: &[u8],
	) -> Result<Bytes> {
		match self {
			SmartWallet::Standard(wallet) => wallet.direct_execute(tx, ctx, to, data),
			SmartWallet::Custom(wallet) => wallet.direct_execute(tx, ctx, to, data),
			SmartWallet::NativeHolder(wallet) => wallet.direct_execute(tx, ctx, to, data),
			SmartWallet::Minimal(wallet) => wallet.direct_execute(tx, ctx, to, data),
		}
	}
}
