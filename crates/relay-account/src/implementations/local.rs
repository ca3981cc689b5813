//! Local private key wallet.

use crate::{AccountError, AccountInterface, SignedRawTransaction};
use alloy::consensus::{SignableTransaction, TxLegacy};
use alloy::signers::local::PrivateKeySigner;
use alloy::primitives::Signature;
use alloy::signers::SignerSync;
use async_trait::async_trait;
use relay_types::eip712::personal_digest;
use relay_types::{keccak256, Address, Bytes, DeployRequest, RelayRequest, B256};

/// Wallet backed by an in-memory secp256k1 key.
///
/// The synchronous helpers are what tests and the CLI use directly; the
/// [`AccountInterface`] impl wraps the same operations.
#[derive(Clone)]
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Parses a hex private key, with or without `0x`.
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		let key = private_key_hex
			.strip_prefix("0x")
			.unwrap_or(private_key_hex);
		if key.len() != 64 || hex::decode(key).is_err() {
			return Err(AccountError::InvalidKey(
				"Private key must be 64 hex characters (32 bytes)".to_string(),
			));
		}
		let signer = key
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;
		Ok(Self { signer })
	}

	pub fn random() -> Self {
		Self {
			signer: PrivateKeySigner::random(),
		}
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	pub fn sign_hash_sync(&self, hash: &B256) -> Result<Bytes, AccountError> {
		let signature = self
			.signer
			.sign_hash_sync(hash)
			.map_err(|e| AccountError::SigningFailed(format!("Failed to sign hash: {}", e)))?;
		Ok(encode_signature(&signature))
	}

	pub fn sign_message_sync(&self, message: &[u8]) -> Result<Bytes, AccountError> {
		let signature = self
			.signer
			.sign_message_sync(message)
			.map_err(|e| AccountError::SigningFailed(format!("Failed to sign message: {}", e)))?;
		Ok(encode_signature(&signature))
	}

	/// Typed-data signature over `request` for the wallet it targets.
	pub fn sign_relay_request(
		&self,
		request: &RelayRequest,
		chain_id: u64,
	) -> Result<Bytes, AccountError> {
		self.sign_hash_sync(&request.signing_hash(chain_id))
	}

	/// Typed-data signature over `request` for the factory it targets.
	pub fn sign_deploy_request(
		&self,
		request: &DeployRequest,
		chain_id: u64,
	) -> Result<Bytes, AccountError> {
		self.sign_hash_sync(&request.signing_hash(chain_id))
	}

	/// Personal signature over `keccak256(packed)`, as expected by direct
	/// wallet creation.
	pub fn sign_packed(&self, packed: &[u8]) -> Result<Bytes, AccountError> {
		self.sign_hash_sync(&personal_digest(keccak256(packed)))
	}

	pub fn sign_transaction_sync(&self, tx: &TxLegacy) -> Result<SignedRawTransaction, AccountError> {
		let signature = self.signer.sign_hash_sync(&tx.signature_hash()).map_err(|e| {
			AccountError::SigningFailed(format!("Failed to sign transaction: {}", e))
		})?;
		Ok(SignedRawTransaction {
			raw: Bytes::from(tx.encoded_for_signing()),
			signature: encode_signature(&signature),
		})
	}
}

fn encode_signature(signature: &Signature) -> Bytes {
	Bytes::copy_from_slice(&signature.as_bytes())
}

#[async_trait]
impl AccountInterface for LocalWallet {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_transaction(&self, tx: &TxLegacy) -> Result<SignedRawTransaction, AccountError> {
		self.sign_transaction_sync(tx)
	}

	async fn sign_message(&self, message: &[u8]) -> Result<Bytes, AccountError> {
		self.sign_message_sync(message)
	}

	async fn sign_hash(&self, hash: &B256) -> Result<Bytes, AccountError> {
		self.sign_hash_sync(hash)
	}
}

/// Builds an account provider from a `private_key` table entry.
pub fn create_account(config: &toml::Value) -> Result<Box<dyn AccountInterface>, AccountError> {
	let private_key = config
		.get("private_key")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AccountError::InvalidKey("private_key is required".to_string()))?;
	Ok(Box::new(LocalWallet::new(private_key)?))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{TxKind, U256};
	use relay_types::eip712::recover_signer;

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	#[test]
	fn test_rejects_malformed_keys() {
		assert!(LocalWallet::new("0x1234").is_err());
		assert!(LocalWallet::new(&"zz".repeat(32)).is_err());
		assert!(LocalWallet::new(KEY).is_ok());
	}

	#[test]
	fn test_relay_request_signature_recovers_owner() {
		let wallet = LocalWallet::new(KEY).unwrap();
		let request = RelayRequest::default();
		let signature = wallet.sign_relay_request(&request, 33).unwrap();
		let signer = recover_signer(request.signing_hash(33), &signature).unwrap();
		assert_eq!(signer, wallet.address());
	}

	#[test]
	fn test_raw_transaction_signature_covers_payload() {
		let wallet = LocalWallet::random();
		let tx = TxLegacy {
			chain_id: Some(33),
			nonce: 7,
			gas_price: 60_000_000,
			gas_limit: 21_000,
			to: TxKind::Call(Address::ZERO),
			value: U256::from(1),
			input: Bytes::new(),
		};
		let signed = wallet.sign_transaction_sync(&tx).unwrap();
		assert_eq!(signed.signature.len(), 65);
		let signer = recover_signer(keccak256(&signed.raw), &signed.signature).unwrap();
		assert_eq!(signer, wallet.address());
	}

	#[tokio::test]
	async fn test_account_service_from_config() {
		let table: toml::Table = toml::from_str(&format!("private_key = \"{}\"", KEY)).unwrap();
		let config = toml::Value::Table(table);
		let service = crate::AccountService::new(create_account(&config).unwrap());
		let expected = LocalWallet::new(KEY).unwrap().address();
		assert_eq!(service.get_address().await.unwrap(), expected);

		let missing: toml::Table = toml::from_str("other = 1").unwrap();
		assert!(create_account(&toml::Value::Table(missing)).is_err());
	}
}
