//! Signing capability for relay participants.
//!
//! Users sign typed requests and deployment authorizations; relay workers
//! sign the raw transactions the penalizer later inspects.

use alloy::consensus::TxLegacy;
use async_trait::async_trait;
use relay_types::{Address, Bytes, B256};
use thiserror::Error;

pub mod implementations {
	pub mod local;
}

pub use implementations::local::{create_account, LocalWallet};

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Signing failed: {0}")]
	SigningFailed(String),
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Raw transaction as submitted on-ledger, split from its signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRawTransaction {
	/// RLP payload the signature commits to.
	pub raw: Bytes,
	/// 65 bytes, `r || s || v`.
	pub signature: Bytes,
}

#[async_trait]
pub trait AccountInterface: Send + Sync {
	async fn address(&self) -> Result<Address, AccountError>;

	async fn sign_transaction(&self, tx: &TxLegacy) -> Result<SignedRawTransaction, AccountError>;

	/// EIP-191 personal signature over `message`.
	async fn sign_message(&self, message: &[u8]) -> Result<Bytes, AccountError>;

	/// Signature over an already-computed digest.
	async fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError>;
}

pub struct AccountService {
	provider: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(provider: Box<dyn AccountInterface>) -> Self {
		Self { provider }
	}

	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.provider.address().await
	}

	pub async fn sign(&self, tx: &TxLegacy) -> Result<SignedRawTransaction, AccountError> {
		self.provider.sign_transaction(tx).await
	}

	pub async fn sign_digest(&self, hash: &B256) -> Result<Bytes, AccountError> {
		self.provider.sign_hash(hash).await
	}
}
