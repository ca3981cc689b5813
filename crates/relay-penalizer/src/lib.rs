//! Penalizer: slashes relay managers whose workers sign two different
//! transactions under the same nonce.

pub mod codec;

use std::sync::Arc;

use relay_hub::RelayHub;
use relay_ledger::{CallContext, Contract, Tx, World};
use relay_types::{keccak256, Address, PenalizerState, RelayError, Result, B256};
use tracing::{info, warn};

pub use codec::{DecodedTransaction, LegacyTransactionCodec, TransactionCodec};

#[derive(Clone)]
pub struct Penalizer {
	address: Address,
	codec: Arc<dyn TransactionCodec>,
}

impl std::fmt::Debug for Penalizer {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Penalizer")
			.field("address", &self.address)
			.finish()
	}
}

/// Identity of a submitted transaction: `keccak256(raw || signature)`.
pub fn transaction_hash(raw: &[u8], signature: &[u8]) -> B256 {
	let mut packed = Vec::with_capacity(raw.len() + signature.len());
	packed.extend_from_slice(raw);
	packed.extend_from_slice(signature);
	keccak256(packed)
}

impl Penalizer {
	pub fn at(address: Address) -> Self {
		Self {
			address,
			codec: Arc::new(LegacyTransactionCodec),
		}
	}

	pub fn with_codec(mut self, codec: Arc<dyn TransactionCodec>) -> Self {
		self.codec = codec;
		self
	}

	pub fn deploy(tx: &mut Tx<'_>, deployer: Address) -> Result<Self> {
		let address = tx
			.world_mut()
			.create(deployer, Contract::Penalizer(PenalizerState::default()))?;
		info!(penalizer = %address, "Deployed penalizer");
		Ok(Self::at(address))
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn is_penalized(&self, world: &World, hash: &B256) -> Result<bool> {
		Ok(world.penalizer(&self.address)?.penalized.contains(hash))
	}

	/// Proves equivocation by a relay worker and slashes its manager in
	/// `hub`. The caller receives the reward.
	#[allow(clippy::too_many_arguments)]
	pub fn penalize_repeated_nonce(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		unsigned_tx1: &[u8],
		signature1: &[u8],
		unsigned_tx2: &[u8],
		signature2: &[u8],
		hub: &RelayHub,
	) -> Result<()> {
		let signer = self.codec.recover_signer(unsigned_tx1, signature1)?;
		if signer != self.codec.recover_signer(unsigned_tx2, signature2)? {
			return Err(RelayError::SignerMismatch);
		}
		if unsigned_tx1 == unsigned_tx2 {
			return Err(RelayError::Rejected("Equal transaction".into()));
		}
		let first = self.codec.decode(unsigned_tx1)?;
		let second = self.codec.decode(unsigned_tx2)?;
		if first.nonce != second.nonce {
			return Err(RelayError::Rejected("Different nonce".into()));
		}

		let hash1 = transaction_hash(unsigned_tx1, signature1);
		let hash2 = transaction_hash(unsigned_tx2, signature2);
		let penalized = &tx.world().penalizer(&self.address)?.penalized;
		if penalized.contains(&hash1) || penalized.contains(&hash2) {
			return Err(RelayError::AlreadyPenalized);
		}

		let manager = hub
			.worker_to_manager(tx.world(), &signer)?
			.ok_or(RelayError::UnknownManager)?;
		if !hub.is_relay_manager_staked(tx.world(), &manager)? {
			return Err(RelayError::UnknownManager);
		}

		let state = tx.world_mut().penalizer_mut(&self.address)?;
		state.penalized.insert(hash1);
		state.penalized.insert(hash2);

		let inner = ctx.nested(hub.address(), tx.gas_left());
		hub.penalize(tx, &inner, signer, ctx.caller)?;
		warn!(worker = %signer, manager = %manager, nonce = first.nonce, reporter = %ctx.caller, "Repeated nonce penalized");
		Ok(())
	}
}
