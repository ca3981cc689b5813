//! Typed request codec.
//!
//! Requests are hashed following EIP-712 under the domain
//! `{ name, version, chainId, verifyingContract }`. The forwarder does not
//! receive the signed `relayData` sub-object; it receives `suffixData`, the
//! encoded words that follow the request's own fields, and rebuilds the
//! struct hash as `keccak256(typeHash || encode(fields) || suffixData)`.

use crate::{
	errors::RelayError,
	request::{DeployRequest, DeployRequestBody, ForwardRequest, RelayData, RelayRequest},
};
use alloy_primitives::{eip191_hash_message, keccak256, Address, Bytes, Signature, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct, SolValue};
use std::borrow::Cow;

/// Domain name bound into every signature.
pub const DOMAIN_NAME: &str = "RSK Enveloping Transaction";
/// Domain version bound into every signature.
pub const DOMAIN_VERSION: &str = "2";

mod typed {
	alloy_sol_types::sol! {
		struct RelayData {
			uint256 gasPrice;
			address feesReceiver;
			address callForwarder;
			address callVerifier;
		}

		struct RelayRequest {
			address relayHub;
			address from;
			address to;
			address tokenContract;
			uint256 value;
			uint256 gas;
			uint256 nonce;
			uint256 tokenAmount;
			uint256 tokenGas;
			uint256 validUntilTime;
			bytes data;
			RelayData relayData;
		}

		struct DeployRequest {
			address relayHub;
			address from;
			address to;
			address tokenContract;
			address recoverer;
			uint256 value;
			uint256 nonce;
			uint256 tokenAmount;
			uint256 tokenGas;
			uint256 validUntilTime;
			uint256 index;
			bytes data;
			RelayData relayData;
		}
	}
}

impl From<&RelayData> for typed::RelayData {
	fn from(data: &RelayData) -> Self {
		Self {
			gasPrice: data.gas_price,
			feesReceiver: data.fees_receiver,
			callForwarder: data.call_forwarder,
			callVerifier: data.call_verifier,
		}
	}
}

impl From<&RelayRequest> for typed::RelayRequest {
	fn from(envelope: &RelayRequest) -> Self {
		let req = &envelope.request;
		Self {
			relayHub: req.relay_hub,
			from: req.from,
			to: req.to,
			tokenContract: req.token_contract,
			value: req.value,
			gas: req.gas,
			nonce: req.nonce,
			tokenAmount: req.token_amount,
			tokenGas: req.token_gas,
			validUntilTime: req.valid_until_time,
			data: req.data.clone(),
			relayData: (&envelope.relay_data).into(),
		}
	}
}

impl From<&DeployRequest> for typed::DeployRequest {
	fn from(envelope: &DeployRequest) -> Self {
		let req = &envelope.request;
		Self {
			relayHub: req.relay_hub,
			from: req.from,
			to: req.to,
			tokenContract: req.token_contract,
			recoverer: req.recoverer,
			value: req.value,
			nonce: req.nonce,
			tokenAmount: req.token_amount,
			tokenGas: req.token_gas,
			validUntilTime: req.valid_until_time,
			index: req.index,
			data: req.data.clone(),
			relayData: (&envelope.relay_data).into(),
		}
	}
}

/// Builds the signing domain for a forwarder (wallet or factory).
pub fn domain(chain_id: u64, verifying_contract: Address) -> Eip712Domain {
	Eip712Domain::new(
		Some(Cow::Borrowed(DOMAIN_NAME)),
		Some(Cow::Borrowed(DOMAIN_VERSION)),
		Some(U256::from(chain_id)),
		Some(verifying_contract),
		None,
	)
}

pub fn domain_separator(chain_id: u64, verifying_contract: Address) -> B256 {
	domain(chain_id, verifying_contract).separator()
}

/// A request whose fixed fields can be encoded without its envelope.
pub trait TypedRequest {
	/// Number of top-level words preceding `suffixData`.
	const FIELD_COUNT: usize;

	fn type_hash() -> B256;

	/// `FIELD_COUNT` ABI words; dynamic `data` is replaced by its hash.
	fn encode_fields(&self) -> Vec<u8>;
}

impl TypedRequest for ForwardRequest {
	const FIELD_COUNT: usize = 11;

	fn type_hash() -> B256 {
		keccak256(typed::RelayRequest::eip712_encode_type().as_bytes())
	}

	fn encode_fields(&self) -> Vec<u8> {
		(
			self.relay_hub,
			self.from,
			self.to,
			self.token_contract,
			self.value,
			self.gas,
			self.nonce,
			self.token_amount,
			self.token_gas,
			self.valid_until_time,
			keccak256(&self.data),
		)
			.abi_encode()
	}
}

impl TypedRequest for DeployRequestBody {
	const FIELD_COUNT: usize = 12;

	fn type_hash() -> B256 {
		keccak256(typed::DeployRequest::eip712_encode_type().as_bytes())
	}

	fn encode_fields(&self) -> Vec<u8> {
		(
			self.relay_hub,
			self.from,
			self.to,
			self.token_contract,
			self.recoverer,
			self.value,
			self.nonce,
			self.token_amount,
			self.token_gas,
			self.valid_until_time,
			self.index,
			keccak256(&self.data),
		)
			.abi_encode()
	}
}

/// Encoded words following the request fields: `abi.encode(hashStruct(relayData))`.
pub fn suffix_data(relay_data: &RelayData) -> Bytes {
	let hash = typed::RelayData::from(relay_data).eip712_hash_struct();
	Bytes::copy_from_slice(hash.as_slice())
}

/// Struct hash rebuilt from the request's own fields plus `suffix_data`.
pub fn struct_hash<R: TypedRequest>(request: &R, suffix_data: &[u8]) -> B256 {
	let fields = request.encode_fields();
	let mut encoded = Vec::with_capacity(32 + fields.len() + suffix_data.len());
	encoded.extend_from_slice(R::type_hash().as_slice());
	encoded.extend_from_slice(&fields);
	encoded.extend_from_slice(suffix_data);
	keccak256(encoded)
}

/// `keccak256("\x19\x01" || domainSeparator || structHash)`.
pub fn signing_digest(domain_separator: B256, struct_hash: B256) -> B256 {
	let mut preimage = [0u8; 66];
	preimage[0] = 0x19;
	preimage[1] = 0x01;
	preimage[2..34].copy_from_slice(domain_separator.as_slice());
	preimage[34..].copy_from_slice(struct_hash.as_slice());
	keccak256(preimage)
}

/// Digest a forwarder checks a signature against.
pub fn request_digest<R: TypedRequest>(
	domain_separator: B256,
	request: &R,
	suffix_data: &[u8],
) -> B256 {
	signing_digest(domain_separator, struct_hash(request, suffix_data))
}

impl RelayRequest {
	/// Digest the user signs, computed from the full typed struct.
	pub fn signing_hash(&self, chain_id: u64) -> B256 {
		typed::RelayRequest::from(self)
			.eip712_signing_hash(&domain(chain_id, self.relay_data.call_forwarder))
	}

	pub fn suffix_data(&self) -> Bytes {
		suffix_data(&self.relay_data)
	}
}

impl DeployRequest {
	pub fn signing_hash(&self, chain_id: u64) -> B256 {
		typed::DeployRequest::from(self)
			.eip712_signing_hash(&domain(chain_id, self.relay_data.call_forwarder))
	}

	pub fn suffix_data(&self) -> Bytes {
		suffix_data(&self.relay_data)
	}
}

/// One-way owner identity stored by wallets instead of the plain address.
pub fn owner_hash(owner: Address) -> B256 {
	keccak256(owner)
}

/// EIP-191 personal-message digest of a 32-byte hash.
pub fn personal_digest(message_hash: B256) -> B256 {
	eip191_hash_message(message_hash)
}

/// Recovers the signer of a 65-byte `(r, s, v)` signature over `digest`.
pub fn recover_signer(digest: B256, signature: &[u8]) -> Result<Address, RelayError> {
	let signature = Signature::from_raw(signature)
		.map_err(|e| RelayError::SignatureMismatch(format!("Invalid signature: {}", e)))?;
	signature
		.recover_address_from_prehash(&digest)
		.map_err(|e| RelayError::SignatureMismatch(format!("Invalid signature: {}", e)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::signers::{local::PrivateKeySigner, SignerSync};
	use alloy_primitives::address;

	fn sample_request() -> RelayRequest {
		RelayRequest {
			request: ForwardRequest {
				relay_hub: address!("1000000000000000000000000000000000000001"),
				from: address!("2000000000000000000000000000000000000002"),
				to: address!("3000000000000000000000000000000000000003"),
				token_contract: address!("4000000000000000000000000000000000000004"),
				value: U256::ZERO,
				gas: U256::from(100_000),
				nonce: U256::from(7),
				token_amount: U256::from(500),
				token_gas: U256::from(50_000),
				valid_until_time: U256::ZERO,
				data: Bytes::from(vec![0xde, 0xad, 0xbe, 0xef]),
			},
			relay_data: RelayData {
				gas_price: U256::from(60_000_000u64),
				fees_receiver: address!("5000000000000000000000000000000000000005"),
				call_forwarder: address!("6000000000000000000000000000000000000006"),
				call_verifier: address!("7000000000000000000000000000000000000007"),
			},
		}
	}

	#[test]
	fn test_suffix_rebuild_matches_full_struct_hash() {
		let request = sample_request();
		let full = typed::RelayRequest::from(&request).eip712_hash_struct();
		let rebuilt = struct_hash(&request.request, &request.suffix_data());
		assert_eq!(full, rebuilt);
	}

	#[test]
	fn test_suffix_is_tail_of_encoded_data() {
		let request = sample_request();
		let encoded = typed::RelayRequest::from(&request).eip712_encode_data();
		let split = ForwardRequest::FIELD_COUNT * 32;
		assert_eq!(&encoded[..split], request.request.encode_fields().as_slice());
		assert_eq!(&encoded[split..], request.suffix_data().as_ref());
	}

	#[test]
	fn test_deploy_digest_matches_signing_hash() {
		let request = DeployRequest {
			request: DeployRequestBody {
				relay_hub: address!("1000000000000000000000000000000000000001"),
				from: address!("2000000000000000000000000000000000000002"),
				recoverer: address!("8000000000000000000000000000000000000008"),
				index: U256::from(3),
				..Default::default()
			},
			relay_data: sample_request().relay_data,
		};
		let separator = domain_separator(33, request.relay_data.call_forwarder);
		let digest = request_digest(separator, &request.request, &request.suffix_data());
		assert_eq!(digest, request.signing_hash(33));
	}

	#[test]
	fn test_chain_id_changes_digest() {
		let request = sample_request();
		assert_ne!(request.signing_hash(31), request.signing_hash(33));
	}

	#[test]
	fn test_recover_signer_round_trip() {
		let signer = PrivateKeySigner::random();
		let request = sample_request();
		let digest = request.signing_hash(33);
		let signature = signer.sign_hash_sync(&digest).unwrap();

		let recovered = recover_signer(digest, &signature.as_bytes()).unwrap();
		assert_eq!(recovered, signer.address());
	}

	#[test]
	fn test_recover_rejects_malformed_signature() {
		let result = recover_signer(B256::ZERO, &[1u8; 10]);
		assert!(matches!(result, Err(RelayError::SignatureMismatch(_))));
	}
}
