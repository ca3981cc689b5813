//! Counterfactual SmartWallet addresses.
//!
//! A wallet lives at `CREATE2(factory, salt, keccak(initCode))` where the
//! init code is a minimal proxy pointing at the factory's template.

use alloy_primitives::hex;
use relay_types::{keccak256, Address, B256, U256};

pub const PROXY_PREFIX: [u8; 20] = hex!("602D3D8160093D39F3363D3D373D3D3D3D363D73");
pub const PROXY_SUFFIX: [u8; 14] = hex!("5AF43D923D90803E602B57FD5BF3");

pub fn init_code(template: Address) -> Vec<u8> {
	let mut code = Vec::with_capacity(PROXY_PREFIX.len() + 20 + PROXY_SUFFIX.len());
	code.extend_from_slice(&PROXY_PREFIX);
	code.extend_from_slice(template.as_slice());
	code.extend_from_slice(&PROXY_SUFFIX);
	code
}

pub fn init_code_hash(template: Address) -> B256 {
	keccak256(init_code(template))
}

/// Logic binding of custom-logic wallets, part of their identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomLogic {
	pub logic: Address,
	pub init_params_hash: B256,
}

/// Inputs that determine a wallet address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletSeed {
	pub owner: Address,
	pub recoverer: Address,
	pub index: U256,
	pub logic: Option<CustomLogic>,
}

impl WalletSeed {
	pub fn new(owner: Address, recoverer: Address, index: U256) -> Self {
		Self {
			owner,
			recoverer,
			index,
			logic: None,
		}
	}

	pub fn with_logic(mut self, logic: Address, init_params: &[u8]) -> Self {
		self.logic = Some(CustomLogic {
			logic,
			init_params_hash: keccak256(init_params),
		});
		self
	}

	/// `keccak256(owner ‖ recoverer [‖ logic ‖ initParamsHash] ‖ index)`, packed.
	pub fn salt(&self) -> B256 {
		let mut packed = Vec::with_capacity(124);
		packed.extend_from_slice(self.owner.as_slice());
		packed.extend_from_slice(self.recoverer.as_slice());
		if let Some(custom) = &self.logic {
			packed.extend_from_slice(custom.logic.as_slice());
			packed.extend_from_slice(custom.init_params_hash.as_slice());
		}
		packed.extend_from_slice(&self.index.to_be_bytes::<32>());
		keccak256(packed)
	}
}

pub fn derive_wallet_address(factory: Address, template: Address, seed: &WalletSeed) -> Address {
	factory.create2(seed.salt().0, init_code_hash(template).0)
}
