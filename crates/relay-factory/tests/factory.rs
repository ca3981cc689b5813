use relay_account::LocalWallet;
use relay_factory::{Factory, WalletSeed};
use relay_ledger::{CallContext, CallTarget, Ledger, Tx, TxEnv};
use relay_types::{
	address, b256, keccak256, Address, Bytes, DeployRequest, DeployRequestBody, RelayData,
	RelayError, RelayEvent, Result, WalletKind, B256, U256,
};
use std::sync::Arc;

const CHAIN_ID: u64 = 33;
const HUB: Address = address!("00000000000000000000000000000000000000f1");
const WORKER: Address = address!("00000000000000000000000000000000000000f2");
const DEPLOYER: Address = address!("00000000000000000000000000000000000000f3");
const RECEIVER: Address = address!("00000000000000000000000000000000000000f5");
const SETUP_SLOT: B256 = b256!("00000000000000000000000000000000000000000000000000000000000000ee");

/// Logic that records the calldata it was initialized with.
struct SetupLogic;

impl CallTarget for SetupLogic {
	fn call(&self, tx: &mut Tx<'_>, ctx: &CallContext, data: &[u8]) -> Result<Bytes> {
		tx.set_storage(&ctx.this, SETUP_SLOT, keccak256(data))?;
		Ok(Bytes::new())
	}
}

fn setup(kind: WalletKind) -> (Ledger, Factory, Address) {
	let mut ledger = Ledger::new(CHAIN_ID);
	let token = ledger.deploy_token(DEPLOYER, "tRIF", 18).unwrap();
	let factory = ledger
		.transact(TxEnv::new(DEPLOYER, Address::ZERO), |tx, _| {
			Factory::deploy(tx, DEPLOYER, kind)
		})
		.unwrap();
	(ledger, factory, token)
}

fn deploy_request(factory: &Factory, owner: Address, token: Address, amount: u64) -> DeployRequest {
	DeployRequest {
		request: DeployRequestBody {
			relay_hub: HUB,
			from: owner,
			to: Address::ZERO,
			token_contract: token,
			recoverer: Address::ZERO,
			value: U256::ZERO,
			nonce: U256::ZERO,
			token_amount: U256::from(amount),
			token_gas: U256::from(60_000),
			valid_until_time: U256::ZERO,
			index: U256::ZERO,
			data: Bytes::new(),
		},
		relay_data: RelayData {
			gas_price: U256::from(1),
			fees_receiver: RECEIVER,
			call_forwarder: factory.address(),
			call_verifier: Address::ZERO,
		},
	}
}

fn relay_deploy(
	ledger: &mut Ledger,
	factory: &Factory,
	caller: Address,
	request: &DeployRequest,
	signature: &Bytes,
) -> Result<Address> {
	let suffix = request.suffix_data();
	ledger.transact(TxEnv::new(WORKER, HUB), |tx, _| {
		let ctx = CallContext {
			this: factory.address(),
			caller,
			value: U256::ZERO,
			gas: tx.gas_left(),
		};
		factory.relayed_user_smart_wallet_creation(
			tx,
			&ctx,
			&request.request,
			&suffix,
			request.relay_data.fees_receiver,
			signature,
		)
	})
}

#[test]
fn test_predicted_address_matches_direct_creation() {
	let (mut ledger, factory, _) = setup(WalletKind::Standard);
	let owner = LocalWallet::random();
	let seed = WalletSeed::new(owner.address(), Address::ZERO, U256::from(3));
	let predicted = factory.get_smart_wallet_address(ledger.world(), &seed).unwrap();
	assert!(!ledger.world().has_code(&predicted));

	let signature = owner
		.sign_packed(&factory.creation_message(&seed, &[]))
		.unwrap();
	let created = ledger
		.transact(TxEnv::new(WORKER, factory.address()), |tx, _| {
			factory.create_user_smart_wallet(tx, &seed, &Bytes::new(), &signature)
		})
		.unwrap();
	assert_eq!(created, predicted);

	let wallet = ledger.world().wallet(&created).unwrap();
	assert!(wallet.initialized);
	assert_eq!(wallet.kind, WalletKind::Standard);
	assert!(ledger.world().logs().iter().any(|log| matches!(
		log.event,
		RelayEvent::Deployed { address, salt } if address == created && salt == seed.salt()
	)));

	let again = ledger.transact(TxEnv::new(WORKER, factory.address()), |tx, _| {
		factory.create_user_smart_wallet(tx, &seed, &Bytes::new(), &signature)
	});
	assert_eq!(again, Err(RelayError::AlreadyInitialized));
}

#[test]
fn test_direct_creation_requires_owner_signature() {
	let (mut ledger, factory, _) = setup(WalletKind::Standard);
	let owner = LocalWallet::random();
	let seed = WalletSeed::new(owner.address(), Address::ZERO, U256::ZERO);
	let forged = LocalWallet::random()
		.sign_packed(&factory.creation_message(&seed, &[]))
		.unwrap();

	let result = ledger.transact(TxEnv::new(WORKER, factory.address()), |tx, _| {
		factory.create_user_smart_wallet(tx, &seed, &Bytes::new(), &forged)
	});
	assert_eq!(
		result,
		Err(RelayError::SignatureMismatch("Invalid signature".into()))
	);
}

#[test]
fn test_relayed_creation_collects_exact_fee() {
	let (mut ledger, factory, token) = setup(WalletKind::Standard);
	let owner = LocalWallet::random();
	let request = deploy_request(&factory, owner.address(), token, 500);
	let signature = owner.sign_deploy_request(&request, CHAIN_ID).unwrap();

	let seed = factory.seed_for_request(ledger.world(), &request.request).unwrap();
	let predicted = factory.get_smart_wallet_address(ledger.world(), &seed).unwrap();
	ledger.mint(token, predicted, U256::from(499)).unwrap();

	let short = relay_deploy(&mut ledger, &factory, HUB, &request, &signature);
	assert_eq!(
		short,
		Err(RelayError::PaymentFailure("Unable to pay for deployment".into()))
	);
	assert_eq!(factory.nonce(ledger.world(), &owner.address()).unwrap(), U256::ZERO);

	ledger.mint(token, predicted, U256::from(1)).unwrap();
	let created = relay_deploy(&mut ledger, &factory, HUB, &request, &signature).unwrap();
	assert_eq!(created, predicted);
	assert_eq!(ledger.token_balance(&token, &RECEIVER), U256::from(500));
	assert_eq!(ledger.token_balance(&token, &predicted), U256::ZERO);
	assert_eq!(factory.nonce(ledger.world(), &owner.address()).unwrap(), U256::from(1));

	let replay = relay_deploy(&mut ledger, &factory, HUB, &request, &signature);
	assert_eq!(replay, Err(RelayError::NonceMismatch("nonce mismatch".into())));
}

#[test]
fn test_relayed_creation_checks_caller_and_signer() {
	let (mut ledger, factory, token) = setup(WalletKind::Standard);
	let owner = LocalWallet::random();
	let request = deploy_request(&factory, owner.address(), token, 0);
	let signature = owner.sign_deploy_request(&request, CHAIN_ID).unwrap();

	assert_eq!(
		relay_deploy(&mut ledger, &factory, WORKER, &request, &signature),
		Err(RelayError::Unauthorized("Invalid caller".into()))
	);

	let forged = LocalWallet::random()
		.sign_deploy_request(&request, CHAIN_ID)
		.unwrap();
	assert_eq!(
		relay_deploy(&mut ledger, &factory, HUB, &request, &forged),
		Err(RelayError::SignatureMismatch("Signature mismatch".into()))
	);
}

#[test]
fn test_custom_factory_binds_logic_into_address() {
	let (ledger, factory, _) = setup(WalletKind::Custom);
	let owner = address!("00000000000000000000000000000000000000cc");
	let logic = address!("00000000000000000000000000000000000000dd");

	let plain = factory
		.seed(ledger.world(), owner, Address::ZERO, Address::ZERO, &[], U256::ZERO)
		.unwrap();
	let bound = factory
		.seed(ledger.world(), owner, Address::ZERO, logic, b"init", U256::ZERO)
		.unwrap();
	assert_ne!(
		factory.get_smart_wallet_address(ledger.world(), &plain).unwrap(),
		factory.get_smart_wallet_address(ledger.world(), &bound).unwrap()
	);
}

#[test]
fn test_custom_creation_signs_index_before_init_params() {
	let (mut ledger, factory, _) = setup(WalletKind::Custom);
	let logic = ledger
		.register_target(DEPLOYER, "setup", Arc::new(SetupLogic))
		.unwrap();
	let owner = LocalWallet::random();
	let init_params = Bytes::from_static(b"params");
	let index = U256::from(7);
	let seed = factory
		.seed(ledger.world(), owner.address(), Address::ZERO, logic, &init_params, index)
		.unwrap();

	let mut packed = Vec::new();
	packed.extend_from_slice(factory.address().as_slice());
	packed.extend_from_slice(owner.address().as_slice());
	packed.extend_from_slice(Address::ZERO.as_slice());
	packed.extend_from_slice(logic.as_slice());
	packed.extend_from_slice(&index.to_be_bytes::<32>());
	packed.extend_from_slice(&init_params);
	assert_eq!(factory.creation_message(&seed, &init_params), packed);

	let mut reordered = packed[..80].to_vec();
	reordered.extend_from_slice(&init_params);
	reordered.extend_from_slice(&index.to_be_bytes::<32>());
	let misordered = owner.sign_packed(&reordered).unwrap();
	let rejected = ledger.transact(TxEnv::new(WORKER, factory.address()), |tx, _| {
		factory.create_user_smart_wallet(tx, &seed, &init_params, &misordered)
	});
	assert_eq!(
		rejected,
		Err(RelayError::SignatureMismatch("Invalid signature".into()))
	);

	let predicted = factory.get_smart_wallet_address(ledger.world(), &seed).unwrap();
	let signature = owner.sign_packed(&packed).unwrap();
	let created = ledger
		.transact(TxEnv::new(WORKER, factory.address()), |tx, _| {
			factory.create_user_smart_wallet(tx, &seed, &init_params, &signature)
		})
		.unwrap();
	assert_eq!(created, predicted);

	let world = ledger.world();
	let wallet = world.wallet(&created).unwrap();
	assert!(wallet.initialized);
	assert_eq!(wallet.logic, logic);
	assert_ne!(world.storage_get(&created, &SETUP_SLOT), B256::ZERO);
}
