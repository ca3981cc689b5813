//! Raw transaction decoding and signer recovery.
//!
//! The penalizer only needs the nonce and the signer of a submitted
//! transaction, so both sit behind [`TransactionCodec`] and new encodings
//! can be added without touching equivocation detection.

use alloy::rlp::{Decodable, Header};
use relay_types::eip712::recover_signer;
use relay_types::{keccak256, Address, Bytes, RelayError, Result, U256};

/// Fields of a decoded unsigned transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTransaction {
	pub nonce: u64,
	pub gas_price: u128,
	pub gas_limit: u64,
	/// `None` for contract creation.
	pub to: Option<Address>,
	pub value: U256,
	pub data: Bytes,
	/// Present for replay-protected payloads.
	pub chain_id: Option<u64>,
}

pub trait TransactionCodec: Send + Sync {
	/// Decodes an unsigned transaction payload.
	fn decode(&self, raw: &[u8]) -> Result<DecodedTransaction>;

	/// Address that produced `signature` over `raw`.
	fn recover_signer(&self, raw: &[u8], signature: &[u8]) -> Result<Address>;
}

/// Legacy RLP payloads: `[nonce, gasPrice, gasLimit, to, value, data]`,
/// optionally followed by `[chainId, 0, 0]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegacyTransactionCodec;

fn rlp_error(e: alloy::rlp::Error) -> RelayError {
	RelayError::Decode(format!("Invalid legacy transaction: {}", e))
}

impl TransactionCodec for LegacyTransactionCodec {
	fn decode(&self, raw: &[u8]) -> Result<DecodedTransaction> {
		let mut buf = raw;
		let header = Header::decode(&mut buf).map_err(rlp_error)?;
		if !header.list {
			return Err(RelayError::Decode("Transaction is not an RLP list".into()));
		}
		if header.payload_length != buf.len() {
			return Err(RelayError::Decode("Trailing bytes after transaction".into()));
		}

		let nonce = u64::decode(&mut buf).map_err(rlp_error)?;
		let gas_price = u128::decode(&mut buf).map_err(rlp_error)?;
		let gas_limit = u64::decode(&mut buf).map_err(rlp_error)?;
		let to = match Bytes::decode(&mut buf).map_err(rlp_error)? {
			to if to.is_empty() => None,
			to if to.len() == 20 => Some(Address::from_slice(&to)),
			to => {
				return Err(RelayError::Decode(format!(
					"Invalid destination length: {}",
					to.len()
				)))
			}
		};
		let value = U256::decode(&mut buf).map_err(rlp_error)?;
		let data = Bytes::decode(&mut buf).map_err(rlp_error)?;

		let chain_id = if buf.is_empty() {
			None
		} else {
			let chain_id = u64::decode(&mut buf).map_err(rlp_error)?;
			let r = u8::decode(&mut buf).map_err(rlp_error)?;
			let s = u8::decode(&mut buf).map_err(rlp_error)?;
			if r != 0 || s != 0 || !buf.is_empty() {
				return Err(RelayError::Decode("Malformed replay protection".into()));
			}
			Some(chain_id)
		};

		Ok(DecodedTransaction {
			nonce,
			gas_price,
			gas_limit,
			to,
			value,
			data,
			chain_id,
		})
	}

	fn recover_signer(&self, raw: &[u8], signature: &[u8]) -> Result<Address> {
		recover_signer(keccak256(raw), signature)
	}
}
