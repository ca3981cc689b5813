//! Minimal fungible-token ledger used for fee settlement.

use crate::world::World;
use alloy_sol_types::{SolInterface, SolValue};
use relay_types::abi::IERC20::IERC20Calls;
use relay_types::{Address, Bytes, RelayError, RelayEvent, Result, U256};

pub fn mint(world: &mut World, token: Address, to: Address, amount: U256) -> Result<()> {
	let state = world.token_mut(&token)?;
	state.total_supply = state.total_supply.saturating_add(amount);
	let balance = state.balance_of(&to);
	state.balances.insert(to, balance.saturating_add(amount));
	world.emit(
		token,
		RelayEvent::Transfer {
			from: Address::ZERO,
			to,
			amount,
		},
	);
	Ok(())
}

/// Moves `amount` from `from` to `to`. The debit is applied before the
/// credit, so a self-transfer leaves the balance unchanged.
pub fn transfer(
	world: &mut World,
	token: Address,
	from: Address,
	to: Address,
	amount: U256,
) -> Result<()> {
	let state = world.token_mut(&token)?;
	let from_balance = state.balance_of(&from);
	if from_balance < amount {
		return Err(RelayError::revert("ERC20: transfer amount exceeds balance"));
	}
	state.balances.insert(from, from_balance - amount);
	let to_balance = state.balance_of(&to);
	state.balances.insert(to, to_balance.saturating_add(amount));
	world.emit(token, RelayEvent::Transfer { from, to, amount });
	Ok(())
}

pub fn approve(
	world: &mut World,
	token: Address,
	owner: Address,
	spender: Address,
	amount: U256,
) -> Result<()> {
	let state = world.token_mut(&token)?;
	state
		.allowances
		.entry(owner)
		.or_default()
		.insert(spender, amount);
	Ok(())
}

pub fn transfer_from(
	world: &mut World,
	token: Address,
	spender: Address,
	from: Address,
	to: Address,
	amount: U256,
) -> Result<()> {
	let allowance = world.token(&token)?.allowance(&from, &spender);
	if allowance < amount {
		return Err(RelayError::revert("ERC20: insufficient allowance"));
	}
	approve(world, token, from, spender, allowance - amount)?;
	transfer(world, token, from, to, amount)
}

pub fn balance_of(world: &World, token: &Address, holder: &Address) -> U256 {
	world
		.token(token)
		.map(|state| state.balance_of(holder))
		.unwrap_or_default()
}

/// Executes ABI-encoded `IERC20` calldata sent by `caller`.
pub(crate) fn dispatch(
	world: &mut World,
	token: Address,
	caller: Address,
	data: &[u8],
) -> Result<Bytes> {
	let call = IERC20Calls::abi_decode(data)
		.map_err(|e| RelayError::Decode(format!("token call: {}", e)))?;

	let output = match call {
		IERC20Calls::transfer(call) => {
			transfer(world, token, caller, call.to, call.amount)?;
			true.abi_encode()
		}
		IERC20Calls::transferFrom(call) => {
			transfer_from(world, token, caller, call.from, call.to, call.amount)?;
			true.abi_encode()
		}
		IERC20Calls::approve(call) => {
			approve(world, token, caller, call.spender, call.amount)?;
			true.abi_encode()
		}
		IERC20Calls::balanceOf(call) => balance_of(world, &token, &call.account).abi_encode(),
		IERC20Calls::allowance(call) => world
			.token(&token)?
			.allowance(&call.owner, &call.spender)
			.abi_encode(),
	};
	Ok(Bytes::from(output))
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::world::Contract;
	use alloy_sol_types::SolCall;
	use relay_types::abi::IERC20;
	use relay_types::{address, TokenState};

	const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
	const BOB: Address = address!("0000000000000000000000000000000000000b0b");

	fn world_with_token() -> (World, Address) {
		let mut world = World::new(33, 0, 30);
		let token = world
			.create(ALICE, Contract::Token(TokenState::new("tRIF", 18)))
			.unwrap();
		mint(&mut world, token, ALICE, U256::from(1_000)).unwrap();
		(world, token)
	}

	#[test]
	fn test_self_transfer_keeps_balance() {
		let (mut world, token) = world_with_token();
		transfer(&mut world, token, ALICE, ALICE, U256::from(400)).unwrap();
		assert_eq!(balance_of(&world, &token, &ALICE), U256::from(1_000));

		let overdraw = transfer(&mut world, token, ALICE, ALICE, U256::from(1_001));
		assert!(matches!(overdraw, Err(RelayError::Reverted(_))));
	}

	#[test]
	fn test_dispatch_transfer_and_balance_query() {
		let (mut world, token) = world_with_token();
		let data = IERC20::transferCall {
			to: BOB,
			amount: U256::from(250),
		}
		.abi_encode();
		let output = dispatch(&mut world, token, ALICE, &data).unwrap();
		assert_eq!(output.as_ref(), true.abi_encode().as_slice());

		let query = IERC20::balanceOfCall { account: BOB }.abi_encode();
		let output = dispatch(&mut world, token, ALICE, &query).unwrap();
		assert_eq!(output.as_ref(), U256::from(250).abi_encode().as_slice());
	}

	#[test]
	fn test_transfer_from_spends_allowance() {
		let (mut world, token) = world_with_token();
		approve(&mut world, token, ALICE, BOB, U256::from(100)).unwrap();
		transfer_from(&mut world, token, BOB, ALICE, BOB, U256::from(60)).unwrap();
		assert_eq!(world.token(&token).unwrap().allowance(&ALICE, &BOB), U256::from(40));
		assert!(transfer_from(&mut world, token, BOB, ALICE, BOB, U256::from(41)).is_err());
	}

	#[test]
	fn test_garbage_calldata_is_a_decode_error() {
		let (mut world, token) = world_with_token();
		let result = dispatch(&mut world, token, ALICE, &[0xde, 0xad]);
		assert!(matches!(result, Err(RelayError::Decode(_))));
	}
}
