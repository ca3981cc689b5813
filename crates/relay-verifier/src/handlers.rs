//! Owner-managed allow-lists.

use relay_ledger::{CallContext, Tx};
use relay_types::{Address, AllowList, RelayError, RelayEvent, Result, VerifierState};
use tracing::info;

/// Which list a mutation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
	Token,
	Contract,
}

impl Handler {
	fn noun(self) -> &'static str {
		match self {
			Handler::Token => "Token",
			Handler::Contract => "Contract",
		}
	}

	pub(crate) fn list(self, state: &VerifierState) -> Result<&AllowList> {
		let list = match self {
			Handler::Token => state.tokens.as_ref(),
			Handler::Contract => state.contracts.as_ref(),
		};
		list.ok_or_else(|| self.disabled())
	}

	fn list_mut(self, state: &mut VerifierState) -> Result<&mut AllowList> {
		let list = match self {
			Handler::Token => state.tokens.as_mut(),
			Handler::Contract => state.contracts.as_mut(),
		};
		list.ok_or_else(|| self.disabled())
	}

	fn disabled(self) -> RelayError {
		RelayError::Unsupported(format!("{} handler not enabled", self.noun()))
	}

	fn accepted_event(self, item: Address) -> RelayEvent {
		match self {
			Handler::Token => RelayEvent::TokenAccepted { token: item },
			Handler::Contract => RelayEvent::ContractAccepted { contract: item },
		}
	}

	fn removed_event(self, item: Address) -> RelayEvent {
		match self {
			Handler::Token => RelayEvent::TokenRemoved { token: item },
			Handler::Contract => RelayEvent::ContractRemoved { contract: item },
		}
	}
}

fn owned_state<'w>(
	tx: &'w mut Tx<'_>,
	ctx: &CallContext,
) -> Result<&'w mut VerifierState> {
	let state = tx.world_mut().verifier_mut(&ctx.this)?;
	if state.owner != ctx.caller {
		return Err(RelayError::Unauthorized("Caller is not the owner".into()));
	}
	Ok(state)
}

pub(crate) fn accept(tx: &mut Tx<'_>, ctx: &CallContext, handler: Handler, item: Address) -> Result<()> {
	let noun = handler.noun();
	let list = handler.list_mut(owned_state(tx, ctx)?)?;
	if item.is_zero() {
		return Err(RelayError::Rejected(format!("{} cannot be zero address", noun)));
	}
	if !list.insert(item) {
		return Err(RelayError::Rejected(format!("{} is already accepted", noun)));
	}

	tx.emit(ctx.this, handler.accepted_event(item));
	info!(verifier = %ctx.this, item = %item, handler = noun, "Accepted");
	Ok(())
}

/// Swap-and-pop removal; `index` must point at `item`.
pub(crate) fn remove(
	tx: &mut Tx<'_>,
	ctx: &CallContext,
	handler: Handler,
	item: Address,
	index: usize,
) -> Result<()> {
	let noun = handler.noun();
	let list = handler.list_mut(owned_state(tx, ctx)?)?;
	if !list.contains(&item) {
		return Err(RelayError::Rejected(format!("{} is not accepted", noun)));
	}
	if list.get(index) != Some(&item) {
		return Err(RelayError::Rejected(format!(
			"Incorrect {} index",
			noun.to_lowercase()
		)));
	}
	list.swap_remove(index);

	tx.emit(ctx.this, handler.removed_event(item));
	info!(verifier = %ctx.this, item = %item, handler = noun, "Removed");
	Ok(())
}
