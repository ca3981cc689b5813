//! Stake ledger: deposits, unlocking and withdrawal.

use relay_ledger::{CallContext, Tx};
use relay_types::{Address, HubState, RelayError, RelayEvent, Result, StakeInfo};
use tracing::info;

use crate::RelayHub;

/// Staked enough, for long enough, and not on its way out.
pub(crate) fn is_staked(state: &HubState, manager: &Address) -> bool {
	state.stakes.get(manager).is_some_and(|info| {
		info.stake >= state.params.minimum_stake
			&& info.unstake_delay >= state.params.minimum_unstake_delay
			&& !info.is_unlocked()
	})
}

fn owned_stake<'s>(
	state: &'s mut HubState,
	manager: &Address,
	caller: Address,
) -> Result<&'s mut StakeInfo> {
	match state.stakes.get_mut(manager) {
		Some(info) if info.owner == caller => Ok(info),
		_ => Err(RelayError::Unauthorized("not owner".into())),
	}
}

impl RelayHub {
	/// Deposits `ctx.value` as stake for `manager`, owned by the caller.
	pub fn stake_for_address(
		&self,
		tx: &mut Tx<'_>,
		ctx: &CallContext,
		manager: Address,
		unstake_delay: u64,
	) -> Result<()> {
		let owner = ctx.caller;
		let state = tx.world_mut().hub_mut(&self.address())?;
		let params = state.params.clone();
		let info = state.stakes.entry(manager).or_default();

		if !info.owner.is_zero() && info.owner != owner {
			return Err(RelayError::Unauthorized("not owner".into()));
		}
		if manager == owner {
			return Err(RelayError::Unauthorized("caller is the relayManager".into()));
		}
		if unstake_delay < info.unstake_delay {
			return Err(RelayError::InsufficientStake(
				"unstakeDelay cannot be decreased".into(),
			));
		}
		if unstake_delay < params.minimum_unstake_delay {
			return Err(RelayError::InsufficientStake("unstakeDelay is too low".into()));
		}

		let stake = info.stake.saturating_add(ctx.value);
		if stake < params.minimum_entry_deposit {
			return Err(RelayError::InsufficientStake(
				"Insufficient initial stake".into(),
			));
		}
		if stake < params.minimum_stake {
			return Err(RelayError::InsufficientStake("Insufficient stake".into()));
		}
		info.owner = owner;
		info.stake = stake;
		info.unstake_delay = unstake_delay;

		tx.emit(
			self.address(),
			RelayEvent::StakeAdded {
				relay_manager: manager,
				owner,
				stake,
				unstake_delay,
			},
		);
		info!(manager = %manager, owner = %owner, stake = %stake, unstake_delay, "Stake added");
		Ok(())
	}

	/// Schedules withdrawal `unstakeDelay` blocks from now.
	pub fn unlock_stake(&self, tx: &mut Tx<'_>, ctx: &CallContext, manager: Address) -> Result<()> {
		let block = tx.block_number();
		let state = tx.world_mut().hub_mut(&self.address())?;
		let info = owned_stake(state, &manager, ctx.caller)?;
		if info.is_unlocked() {
			return Err(RelayError::Rejected("already pending".into()));
		}
		let withdraw_block = block.saturating_add(info.unstake_delay);
		info.withdraw_block = Some(withdraw_block);

		tx.emit(
			self.address(),
			RelayEvent::StakeUnlocked {
				relay_manager: manager,
				owner: ctx.caller,
				withdraw_block,
			},
		);
		info!(manager = %manager, withdraw_block, "Stake unlocked");
		Ok(())
	}

	/// Pays the whole stake back to its owner once the delay has passed.
	/// Owner and delay are retained.
	pub fn withdraw_stake(&self, tx: &mut Tx<'_>, ctx: &CallContext, manager: Address) -> Result<()> {
		let block = tx.block_number();
		let state = tx.world_mut().hub_mut(&self.address())?;
		let info = owned_stake(state, &manager, ctx.caller)?;
		let withdraw_block = info.withdraw_block.ok_or(RelayError::WithdrawalNotScheduled)?;
		if block < withdraw_block {
			return Err(RelayError::WithdrawalNotDue);
		}

		let amount = info.stake;
		let owner = info.owner;
		info.stake = Default::default();
		info.withdraw_block = None;
		tx.transfer_native(self.address(), owner, amount)?;

		tx.emit(
			self.address(),
			RelayEvent::StakeWithdrawn {
				relay_manager: manager,
				owner,
				amount,
			},
		);
		info!(manager = %manager, owner = %owner, amount = %amount, "Stake withdrawn");
		Ok(())
	}
}
