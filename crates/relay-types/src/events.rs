use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Entry appended to the ledger log when a transition commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
	pub emitter: Address,
	pub block_number: u64,
	pub event: RelayEvent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelayEvent {
	StakeAdded {
		relay_manager: Address,
		owner: Address,
		stake: U256,
		unstake_delay: u64,
	},
	StakeUnlocked {
		relay_manager: Address,
		owner: Address,
		withdraw_block: u64,
	},
	StakeWithdrawn {
		relay_manager: Address,
		owner: Address,
		amount: U256,
	},
	StakePenalized {
		relay_manager: Address,
		beneficiary: Address,
		reward: U256,
	},
	RelayWorkersAdded {
		relay_manager: Address,
		new_relay_workers: Vec<Address>,
		workers_count: u64,
	},
	RelayWorkersDisabled {
		relay_manager: Address,
		relay_workers: Vec<Address>,
		workers_count: u64,
	},
	RelayServerRegistered {
		relay_manager: Address,
		relay_url: String,
	},
	TransactionRelayed {
		relay_manager: Address,
		relay_worker: Address,
		relay_request_sig_hash: B256,
		relayed_call_return_value: Bytes,
	},
	Deployed {
		address: Address,
		salt: B256,
	},
	Transfer {
		from: Address,
		to: Address,
		amount: U256,
	},
	TokenAccepted {
		token: Address,
	},
	TokenRemoved {
		token: Address,
	},
	ContractAccepted {
		contract: Address,
	},
	ContractRemoved {
		contract: Address,
	},
}
