//! Meta-transaction request model.
//!
//! Requests are created and signed off-chain; the ledger only ever sees them
//! as arguments to `relayCall`/`deployCall`. Field order here mirrors the
//! declared order of the typed-data structs in [`crate::eip712`].

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// Request executed by an existing SmartWallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
	pub relay_hub: Address,
	pub from: Address,
	pub to: Address,
	pub token_contract: Address,
	pub value: U256,
	pub gas: U256,
	pub nonce: U256,
	pub token_amount: U256,
	pub token_gas: U256,
	pub valid_until_time: U256,
	pub data: Bytes,
}

/// Request that creates (and initializes) a SmartWallet through a factory.
///
/// `to` carries the custom logic address and `data` its initialization
/// parameters; both are ignored by factories whose template has no logic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequestBody {
	pub relay_hub: Address,
	pub from: Address,
	pub to: Address,
	pub token_contract: Address,
	pub recoverer: Address,
	pub value: U256,
	pub nonce: U256,
	pub token_amount: U256,
	pub token_gas: U256,
	pub valid_until_time: U256,
	pub index: U256,
	pub data: Bytes,
}

/// Envelope data signed together with every request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayData {
	pub gas_price: U256,
	pub fees_receiver: Address,
	/// SmartWallet for relay requests, factory for deploy requests.
	pub call_forwarder: Address,
	pub call_verifier: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayRequest {
	pub request: ForwardRequest,
	pub relay_data: RelayData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployRequest {
	pub request: DeployRequestBody,
	pub relay_data: RelayData,
}

/// Fields shared by both request shapes.
///
/// Admission policies and the hub only need this common view.
pub trait EnvelopingRequest {
	fn relay_hub(&self) -> Address;
	fn from(&self) -> Address;
	fn to(&self) -> Address;
	fn token_contract(&self) -> Address;
	fn value(&self) -> U256;
	fn nonce(&self) -> U256;
	fn token_amount(&self) -> U256;
	fn token_gas(&self) -> U256;
	fn valid_until_time(&self) -> U256;
	fn data(&self) -> &Bytes;

	/// True once `timestamp` has reached `validUntilTime`. Zero never expires.
	fn is_expired(&self, timestamp: u64) -> bool {
		let valid_until = self.valid_until_time();
		!valid_until.is_zero() && U256::from(timestamp) >= valid_until
	}
}

macro_rules! impl_enveloping_request {
	($ty:ty) => {
		impl EnvelopingRequest for $ty {
			fn relay_hub(&self) -> Address {
				self.relay_hub
			}
			fn from(&self) -> Address {
				self.from
			}
			fn to(&self) -> Address {
				self.to
			}
			fn token_contract(&self) -> Address {
				self.token_contract
			}
			fn value(&self) -> U256 {
				self.value
			}
			fn nonce(&self) -> U256 {
				self.nonce
			}
			fn token_amount(&self) -> U256 {
				self.token_amount
			}
			fn token_gas(&self) -> U256 {
				self.token_gas
			}
			fn valid_until_time(&self) -> U256 {
				self.valid_until_time
			}
			fn data(&self) -> &Bytes {
				&self.data
			}
		}
	};
}

impl_enveloping_request!(ForwardRequest);
impl_enveloping_request!(DeployRequestBody);
