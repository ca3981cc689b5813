//! End-to-end flows through a node built from configuration.

use alloy::consensus::TxLegacy;
use alloy::primitives::TxKind;
use alloy::sol_types::SolCall;
use relay_account::LocalWallet;
use relay_config::{ConfigFormat, ConfigLoader};
use relay_penalizer::transaction_hash;
use relay_service::{RelayNode, RelayNodeBuilder};
use relay_types::abi::IERC20;
use relay_types::{
	address, Address, Bytes, DeployRequest, DeployRequestBody, ForwardRequest, RelayData,
	RelayError, RelayEvent, RelayRequest, U256,
};

const CONFIG: &str = r#"
[node]
chain_id = 33
deployer = "0x00000000000000000000000000000000000000d0"

[hub]
max_worker_count = 5
minimum_entry_deposit = "1000000000000000000"
minimum_unstake_delay = 1000
minimum_stake = "1000000000000000000"

[[tokens]]
symbol = "tRIF"

[[verifiers]]
name = "deploy"
scope = "deploy"
tokens = ["tRIF"]

[[verifiers]]
name = "relay"
scope = "relay"
tokens = ["tRIF"]

[[accounts]]
address = "0x00000000000000000000000000000000000000a0"
balance = "10000000000000000000"
"#;

const OWNER: Address = address!("00000000000000000000000000000000000000a0");
const MANAGER: Address = address!("00000000000000000000000000000000000000b0");
const WORKER: Address = address!("00000000000000000000000000000000000000c0");
const RECIPIENT: Address = address!("00000000000000000000000000000000000000e0");
const CHAIN_ID: u64 = 33;
const DELAY: u64 = 1000;
const GAS_PRICE: u64 = 1;

fn one_unit() -> U256 {
	U256::from(10u64.pow(18))
}

fn node() -> RelayNode {
	let config = ConfigLoader::parse(CONFIG, ConfigFormat::Toml).unwrap();
	RelayNodeBuilder::new()
		.with_config(config)
		.with_genesis_timestamp(1_700_000_000)
		.build()
		.unwrap()
}

fn staked_node() -> RelayNode {
	let mut node = node();
	node.stake_for_address(OWNER, MANAGER, one_unit(), DELAY)
		.unwrap();
	node.add_relay_workers(MANAGER, &[WORKER]).unwrap();
	node
}

fn deploy_request(node: &RelayNode, user: &LocalWallet, fee: u64) -> (DeployRequest, Bytes) {
	let request = DeployRequest {
		request: DeployRequestBody {
			relay_hub: node.hub().address(),
			from: user.address(),
			token_contract: node.token("tRIF").unwrap(),
			token_amount: U256::from(fee),
			token_gas: U256::from(50_000),
			nonce: node
				.factory()
				.nonce(node.ledger().world(), &user.address())
				.unwrap(),
			..Default::default()
		},
		relay_data: RelayData {
			gas_price: U256::from(GAS_PRICE),
			fees_receiver: WORKER,
			call_forwarder: node.factory().address(),
			call_verifier: node.verifier("deploy").unwrap().address(),
		},
	};
	let signature = user.sign_deploy_request(&request, CHAIN_ID).unwrap();
	(request, signature)
}

fn predicted_wallet(node: &RelayNode, user: &LocalWallet) -> Address {
	node.smart_wallet_address(user.address(), Address::ZERO, Address::ZERO, &[], U256::ZERO)
		.unwrap()
}

/// Funds the counterfactual wallet with `balance` tRIF and deploys it for
/// a 500 tRIF fee.
fn deployed_wallet(node: &mut RelayNode, user: &LocalWallet, balance: u64) -> Address {
	let wallet = predicted_wallet(node, user);
	let token = node.token("tRIF").unwrap();
	node.ledger_mut()
		.mint(token, wallet, U256::from(balance))
		.unwrap();
	let (request, signature) = deploy_request(node, user, 500);
	let created = node
		.deploy_call(WORKER, U256::from(GAS_PRICE), &request, &signature)
		.unwrap();
	assert_eq!(created, wallet);
	wallet
}

fn transfer_request(
	node: &RelayNode,
	user: &LocalWallet,
	wallet: Address,
	amount: u64,
) -> (RelayRequest, Bytes) {
	let token = node.token("tRIF").unwrap();
	let request = RelayRequest {
		request: ForwardRequest {
			relay_hub: node.hub().address(),
			from: user.address(),
			to: token,
			token_contract: token,
			gas: U256::from(100_000),
			nonce: node.wallet_nonce(wallet).unwrap(),
			token_amount: U256::from(10),
			token_gas: U256::from(50_000),
			data: IERC20::transferCall {
				to: RECIPIENT,
				amount: U256::from(amount),
			}
			.abi_encode()
			.into(),
			..Default::default()
		},
		relay_data: RelayData {
			gas_price: U256::from(GAS_PRICE),
			fees_receiver: WORKER,
			call_forwarder: wallet,
			call_verifier: node.verifier("relay").unwrap().address(),
		},
	};
	let signature = user.sign_relay_request(&request, CHAIN_ID).unwrap();
	(request, signature)
}

#[test]
fn test_staked_manager_relays_call() {
	let mut node = staked_node();
	let user = LocalWallet::random();
	let wallet = deployed_wallet(&mut node, &user, 600);
	let token = node.token("tRIF").unwrap();

	let (request, signature) = transfer_request(&node, &user, wallet, 5);
	node.relay_call(WORKER, U256::from(GAS_PRICE), &request, &signature)
		.unwrap();

	let ledger = node.ledger();
	assert_eq!(ledger.token_balance(&token, &RECIPIENT), U256::from(5));
	assert_eq!(ledger.token_balance(&token, &WORKER), U256::from(510));
	assert_eq!(ledger.token_balance(&token, &wallet), U256::from(85));
	assert_eq!(node.wallet_nonce(wallet).unwrap(), U256::from(1));
	assert!(ledger.world().logs().iter().any(|log| matches!(
		&log.event,
		RelayEvent::TransactionRelayed { relay_worker, .. } if *relay_worker == WORKER
	)));

	// Replaying the same signed request is rejected by the wallet.
	let replay = node.relay_call(WORKER, U256::from(GAS_PRICE), &request, &signature);
	assert_eq!(replay, Err(RelayError::NonceMismatch("nonce mismatch".into())));
}

#[test]
fn test_withdrawn_stake_stops_relaying() {
	let mut node = staked_node();
	let user = LocalWallet::random();
	let wallet = deployed_wallet(&mut node, &user, 600);
	let owner_before = node.ledger().balance_of(&OWNER);

	node.unlock_stake(OWNER, MANAGER).unwrap();
	node.advance_blocks(DELAY);
	node.withdraw_stake(OWNER, MANAGER).unwrap();

	let stake = node
		.hub()
		.stake_info(node.ledger().world(), &MANAGER)
		.unwrap();
	assert_eq!(stake.stake, U256::ZERO);
	assert_eq!(node.ledger().balance_of(&OWNER), owner_before + one_unit());

	let (request, signature) = transfer_request(&node, &user, wallet, 5);
	assert_eq!(
		node.relay_call(WORKER, U256::from(GAS_PRICE), &request, &signature),
		Err(RelayError::NotStaked)
	);
	assert_eq!(node.wallet_nonce(wallet).unwrap(), U256::ZERO);
}

#[test]
fn test_deploy_fee_is_paid_exactly() {
	let mut node = staked_node();
	let user = LocalWallet::random();
	let wallet = predicted_wallet(&node, &user);
	let token = node.token("tRIF").unwrap();

	node.ledger_mut()
		.mint(token, wallet, U256::from(499))
		.unwrap();
	let (request, signature) = deploy_request(&node, &user, 500);
	assert_eq!(
		node.deploy_call(WORKER, U256::from(GAS_PRICE), &request, &signature),
		Err(RelayError::PaymentFailure("Unable to pay for deployment".into()))
	);
	assert!(!node.ledger().world().has_code(&wallet));
	assert_eq!(
		node.factory()
			.nonce(node.ledger().world(), &user.address())
			.unwrap(),
		U256::ZERO
	);

	node.ledger_mut().mint(token, wallet, U256::from(1)).unwrap();
	let receiver_before = node.ledger().token_balance(&token, &WORKER);
	let created = node
		.deploy_call(WORKER, U256::from(GAS_PRICE), &request, &signature)
		.unwrap();
	assert_eq!(created, wallet);
	assert_eq!(
		node.ledger().token_balance(&token, &WORKER),
		receiver_before + U256::from(500)
	);
	assert_eq!(node.ledger().token_balance(&token, &wallet), U256::ZERO);
}

#[test]
fn test_repeated_nonce_slashes_manager() {
	let mut node = node();
	let worker = LocalWallet::random();
	let reporter = address!("00000000000000000000000000000000000000f0");
	node.stake_for_address(OWNER, MANAGER, one_unit(), DELAY)
		.unwrap();
	node.add_relay_workers(MANAGER, &[worker.address()])
		.unwrap();

	let sign = |gas_price: u128| {
		worker
			.sign_transaction_sync(&TxLegacy {
				chain_id: Some(CHAIN_ID),
				nonce: 12,
				gas_price,
				gas_limit: 200_000,
				to: TxKind::Call(RECIPIENT),
				value: U256::ZERO,
				input: Bytes::new(),
			})
			.unwrap()
	};
	let first = sign(60_000_000);
	let second = sign(65_000_000);

	node.penalize_repeated_nonce(
		reporter,
		&first.raw,
		&first.signature,
		&second.raw,
		&second.signature,
	)
	.unwrap();

	let world = node.ledger().world();
	for signed in [&first, &second] {
		let hash = transaction_hash(&signed.raw, &signed.signature);
		assert!(node.penalizer().is_penalized(world, &hash).unwrap());
	}
	assert_eq!(
		node.ledger().balance_of(&reporter),
		one_unit() / U256::from(2)
	);
	assert!(!node
		.hub()
		.is_relay_manager_staked(world, &MANAGER)
		.unwrap());

	assert_eq!(
		node.penalize_repeated_nonce(
			reporter,
			&first.raw,
			&first.signature,
			&second.raw,
			&second.signature,
		),
		Err(RelayError::AlreadyPenalized)
	);
}

#[test]
fn test_status_reports_managers() {
	let mut node = staked_node();
	node.register_relay_server(MANAGER, "https://relay.example")
		.unwrap();

	let status = node.status().unwrap();
	assert_eq!(status.managers.len(), 1);
	let manager = &status.managers[0];
	assert_eq!(manager.relay.manager, MANAGER);
	assert!(manager.relay.currently_staked);
	assert_eq!(manager.relay.url.as_deref(), Some("https://relay.example"));
	assert_eq!(manager.workers, vec![WORKER]);
	assert_eq!(manager.stake.stake, one_unit());
}
