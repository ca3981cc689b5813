//! Error taxonomy for the relay protocol.
//!
//! Every variant aborts the atomic transition that raised it. The display
//! string is the short, stable reason surfaced to whoever invoked the entry
//! point.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
	#[error("invalid hub init params")]
	BadInitParams,

	#[error("{0}")]
	Unauthorized(String),

	#[error("{0}")]
	SignatureMismatch(String),

	#[error("{0}")]
	NonceMismatch(String),

	#[error("Already initialized")]
	AlreadyInitialized,

	#[error("{0}")]
	InsufficientStake(String),

	#[error("RelayManager not staked")]
	NotStaked,

	#[error("this worker has a manager")]
	WorkerAlreadyBound,

	#[error("too many workers")]
	TooManyWorkers,

	#[error("{0}")]
	PaymentFailure(String),

	#[error("{}", execution_message(.reason, .revert))]
	ExecutionFailure {
		reason: String,
		revert: Option<String>,
	},

	#[error("Withdrawal is not due")]
	WithdrawalNotDue,

	#[error("Withdrawal is not scheduled")]
	WithdrawalNotScheduled,

	#[error("Transactions already penalized")]
	AlreadyPenalized,

	#[error("Unknown relay manager")]
	UnknownManager,

	#[error("Different signers")]
	SignerMismatch,

	#[error("SW: request expired")]
	Expired,

	#[error("{0}")]
	Rejected(String),

	#[error("{0}")]
	Unsupported(String),

	/// Revert raised by a downstream call, with its reason when it gave one.
	#[error("{}", .0.as_deref().unwrap_or("execution reverted"))]
	Reverted(Option<String>),

	#[error("Insufficient balance")]
	InsufficientBalance,

	#[error("Out of gas")]
	OutOfGas,

	#[error("Decode error: {0}")]
	Decode(String),

	#[error("Not found: {0}")]
	NotFound(String),
}

fn execution_message(reason: &str, revert: &Option<String>) -> String {
	match revert {
		Some(revert) => format!("{}: {}", reason, revert),
		None => reason.to_string(),
	}
}

impl RelayError {
	/// Short stable reason string.
	pub fn reason(&self) -> String {
		self.to_string()
	}

	/// Taxonomy kind, independent of the reason text.
	pub fn kind(&self) -> &'static str {
		match self {
			RelayError::BadInitParams => "BadInitParams",
			RelayError::Unauthorized(_) => "Unauthorized",
			RelayError::SignatureMismatch(_) => "SignatureMismatch",
			RelayError::NonceMismatch(_) => "NonceMismatch",
			RelayError::AlreadyInitialized => "AlreadyInitialized",
			RelayError::InsufficientStake(_) => "InsufficientStake",
			RelayError::NotStaked => "NotStaked",
			RelayError::WorkerAlreadyBound => "WorkerAlreadyBound",
			RelayError::TooManyWorkers => "TooManyWorkers",
			RelayError::PaymentFailure(_) => "PaymentFailure",
			RelayError::ExecutionFailure { .. } => "ExecutionFailure",
			RelayError::WithdrawalNotDue => "WithdrawalNotDue",
			RelayError::WithdrawalNotScheduled => "WithdrawalNotScheduled",
			RelayError::AlreadyPenalized => "AlreadyPenalized",
			RelayError::UnknownManager => "UnknownManager",
			RelayError::SignerMismatch => "SignerMismatch",
			RelayError::Expired => "Expired",
			RelayError::Rejected(_) => "Rejected",
			RelayError::Unsupported(_) => "Unsupported",
			RelayError::Reverted(_) => "Reverted",
			RelayError::InsufficientBalance => "InsufficientBalance",
			RelayError::OutOfGas => "OutOfGas",
			RelayError::Decode(_) => "Decode",
			RelayError::NotFound(_) => "NotFound",
		}
	}

	/// Reason to forward when this error bubbles out of a downstream call.
	pub fn revert_reason(&self) -> Option<String> {
		match self {
			RelayError::Reverted(reason) => reason.clone(),
			other => Some(other.to_string()),
		}
	}

	pub fn execution(reason: impl Into<String>) -> Self {
		RelayError::ExecutionFailure {
			reason: reason.into(),
			revert: None,
		}
	}

	pub fn revert(reason: impl Into<String>) -> Self {
		RelayError::Reverted(Some(reason.into()))
	}
}
