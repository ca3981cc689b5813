//! Shared types for the relay protocol.
//!
//! Everything that crosses a crate boundary lives here: the request model
//! and its typed-data codec, the error taxonomy, emitted events, and the
//! state records kept by each on-ledger component.

pub mod abi;
pub mod eip712;
pub mod errors;
pub mod events;
pub mod request;
pub mod state;

pub use alloy_primitives::{address, b256, keccak256, Address, Bytes, B256, U256};

pub use errors::{RelayError, Result};
pub use events::{Log, RelayEvent};
pub use request::{DeployRequest, DeployRequestBody, EnvelopingRequest, ForwardRequest, RelayData, RelayRequest};
pub use state::*;

/// Converts a `uint256` gas quantity into the ledger's native gas unit,
/// saturating at `u64::MAX`.
pub fn as_gas(value: U256) -> u64 {
	u64::try_from(value).unwrap_or(u64::MAX)
}
