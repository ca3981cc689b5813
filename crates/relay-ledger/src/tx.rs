//! Execution context for a single transition.

use crate::token;
use crate::world::{CodeKind, World};
use relay_types::{Address, Bytes, RelayError, RelayEvent, Result, B256, U256};
use std::collections::HashMap;
use std::sync::Arc;

/// Gas charged before the transaction body runs.
pub const INTRINSIC_GAS: u64 = 21_000;
/// Cost of a fungible-token call.
pub const TOKEN_CALL_GAS: u64 = 30_000;
/// Cost of a plain value transfer to an account without callable code.
pub const VALUE_TRANSFER_GAS: u64 = 2_300;
/// Default cost of a call into registered external code.
pub const EXTERNAL_CALL_GAS: u64 = 20_000;
pub const DEFAULT_GAS_LIMIT: u64 = 6_800_000;

/// Envelope of a submitted transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxEnv {
	pub origin: Address,
	pub to: Address,
	pub value: U256,
	pub gas_limit: u64,
	pub gas_price: U256,
}

impl TxEnv {
	pub fn new(origin: Address, to: Address) -> Self {
		Self {
			origin,
			to,
			value: U256::ZERO,
			gas_limit: DEFAULT_GAS_LIMIT,
			gas_price: U256::ZERO,
		}
	}

	pub fn with_value(mut self, value: U256) -> Self {
		self.value = value;
		self
	}

	pub fn with_gas_limit(mut self, gas_limit: u64) -> Self {
		self.gas_limit = gas_limit;
		self
	}

	pub fn with_gas_price(mut self, gas_price: U256) -> Self {
		self.gas_price = gas_price;
		self
	}
}

/// Frame seen by the code being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
	/// Account whose state the code acts on.
	pub this: Address,
	pub caller: Address,
	pub value: U256,
	pub gas: u64,
}

impl CallContext {
	/// Frame for a nested protocol call made by `self.this`.
	pub fn nested(&self, this: Address, gas: u64) -> Self {
		Self {
			this,
			caller: self.this,
			value: U256::ZERO,
			gas,
		}
	}
}

/// Behaviour installed at an `External` address.
///
/// Implementations read and write their own slots through [`Tx`] using
/// `ctx.this`, so the same code can also run delegated in a wallet's context.
pub trait CallTarget: Send + Sync {
	fn gas_cost(&self, _data: &[u8]) -> u64 {
		EXTERNAL_CALL_GAS
	}

	fn call(&self, tx: &mut Tx<'_>, ctx: &CallContext, data: &[u8]) -> Result<Bytes>;
}

pub type Targets = HashMap<Address, Arc<dyn CallTarget>>;

pub struct Tx<'a> {
	world: &'a mut World,
	targets: &'a Targets,
	origin: Address,
	gas_price: U256,
	gas_left: u64,
}

impl<'a> Tx<'a> {
	pub(crate) fn new(world: &'a mut World, targets: &'a Targets, env: &TxEnv) -> Self {
		Self {
			world,
			targets,
			origin: env.origin,
			gas_price: env.gas_price,
			gas_left: env.gas_limit,
		}
	}

	/// Charges intrinsic gas and moves the attached value.
	pub(crate) fn begin(&mut self, env: &TxEnv) -> Result<CallContext> {
		self.consume_gas(INTRINSIC_GAS)?;
		if !env.value.is_zero() {
			self.world.transfer_native(env.origin, env.to, env.value)?;
		}
		Ok(CallContext {
			this: env.to,
			caller: env.origin,
			value: env.value,
			gas: self.gas_left,
		})
	}

	pub fn world(&self) -> &World {
		&*self.world
	}

	pub fn world_mut(&mut self) -> &mut World {
		&mut *self.world
	}

	pub fn origin(&self) -> Address {
		self.origin
	}

	pub fn gas_price(&self) -> U256 {
		self.gas_price
	}

	pub fn gas_left(&self) -> u64 {
		self.gas_left
	}

	pub fn chain_id(&self) -> u64 {
		self.world.chain_id
	}

	pub fn block_number(&self) -> u64 {
		self.world.block_number
	}

	pub fn timestamp(&self) -> u64 {
		self.world.timestamp
	}

	pub fn consume_gas(&mut self, amount: u64) -> Result<()> {
		if amount > self.gas_left {
			self.gas_left = 0;
			return Err(RelayError::OutOfGas);
		}
		self.gas_left -= amount;
		Ok(())
	}

	fn charge(&mut self, cost: u64, budget: u64) -> Result<()> {
		if cost > budget {
			return Err(RelayError::OutOfGas);
		}
		self.consume_gas(cost)
	}

	pub fn transfer_native(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
		self.world.transfer_native(from, to, amount)
	}

	pub fn emit(&mut self, emitter: Address, event: RelayEvent) {
		self.world.emit(emitter, event);
	}

	pub fn storage(&self, this: &Address, key: &B256) -> B256 {
		self.world.storage_get(this, key)
	}

	pub fn set_storage(&mut self, this: &Address, key: B256, value: B256) -> Result<()> {
		self.world.storage_set(this, key, value)
	}

	/// Message call from `caller` into `to`, bounded by `gas`.
	///
	/// Tokens and external code are dispatched on `data`; any other account
	/// only accepts value with empty calldata.
	pub fn call(
		&mut self,
		caller: Address,
		to: Address,
		value: U256,
		gas: u64,
		data: &[u8],
	) -> Result<Bytes> {
		let gas = gas.min(self.gas_left);
		if !value.is_zero() {
			self.world.transfer_native(caller, to, value)?;
		}

		match self.world.contract(&to).map(|code| code.code_kind()) {
			Some(CodeKind::Token) => {
				self.charge(TOKEN_CALL_GAS, gas)?;
				token::dispatch(self.world, to, caller, data)
			}
			Some(CodeKind::External) => {
				let target = self.target(&to)?;
				self.charge(target.gas_cost(data), gas)?;
				let ctx = CallContext {
					this: to,
					caller,
					value,
					gas: gas.min(self.gas_left),
				};
				target.call(self, &ctx, data)
			}
			Some(CodeKind::Protocol) if !data.is_empty() => Err(RelayError::Unsupported(format!(
				"Raw calldata into protocol contract {}",
				to
			))),
			Some(CodeKind::Protocol) | None => {
				self.charge(VALUE_TRANSFER_GAS, gas)?;
				Ok(Bytes::new())
			}
		}
	}

	/// Runs the code at `logic` against the state of `this`.
	pub fn delegate_call(
		&mut self,
		this: Address,
		caller: Address,
		logic: Address,
		gas: u64,
		data: &[u8],
	) -> Result<Bytes> {
		let gas = gas.min(self.gas_left);
		let target = self.target(&logic)?;
		self.charge(target.gas_cost(data), gas)?;
		let ctx = CallContext {
			this,
			caller,
			value: U256::ZERO,
			gas: gas.min(self.gas_left),
		};
		target.call(self, &ctx, data)
	}

	fn target(&self, address: &Address) -> Result<Arc<dyn CallTarget>> {
		self.targets
			.get(address)
			.cloned()
			.ok_or_else(|| RelayError::revert(format!("no code at {}", address)))
	}
}
