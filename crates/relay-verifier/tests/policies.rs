use relay_factory::Factory;
use relay_ledger::{Contract, Ledger, TxEnv};
use relay_types::{
	address, Address, DeployRequest, DeployRequestBody, ForwardRequest, RelayData, RelayError,
	RelayRequest, Result, VerifierScope, WalletKind, WalletState, U256,
};
use relay_verifier::{Policies, Verifier};

const OWNER: Address = address!("00000000000000000000000000000000000000a0");
const DEPLOYER: Address = address!("00000000000000000000000000000000000000f3");
const USER: Address = address!("00000000000000000000000000000000000000cc");
const TARGET: Address = address!("00000000000000000000000000000000000000dd");
const WALLET: Address = address!("00000000000000000000000000000000000000aa");
const STRAY: Address = address!("00000000000000000000000000000000000000ab");

struct Fixture {
	ledger: Ledger,
	factory: Factory,
	token: Address,
}

impl Fixture {
	fn new() -> Self {
		let mut ledger = Ledger::new(33);
		let token = ledger.deploy_token(DEPLOYER, "tRIF", 18).unwrap();
		let factory = ledger
			.transact(TxEnv::new(DEPLOYER, Address::ZERO), |tx, _| {
				Factory::deploy(tx, DEPLOYER, WalletKind::Standard)
			})
			.unwrap();
		let template = factory.template(ledger.world()).unwrap();
		ledger
			.transact(TxEnv::new(DEPLOYER, Address::ZERO), |tx, _| {
				let world = tx.world_mut();
				world.install(
					WALLET,
					Contract::Wallet(WalletState::uninitialized(WalletKind::Standard, template)),
				)?;
				world.install(
					STRAY,
					Contract::Wallet(WalletState::uninitialized(WalletKind::Standard, DEPLOYER)),
				)
			})
			.unwrap();
		Self {
			ledger,
			factory,
			token,
		}
	}

	fn verifier(&mut self, scope: VerifierScope, policies: Policies) -> Verifier {
		self.ledger
			.transact(TxEnv::new(OWNER, Address::ZERO), |tx, _| {
				Verifier::deploy(tx, OWNER, scope, policies)
			})
			.unwrap()
	}

	fn as_owner<T>(
		&mut self,
		caller: Address,
		verifier: Verifier,
		f: impl FnOnce(&Verifier, &mut relay_ledger::Tx<'_>, &relay_ledger::CallContext) -> Result<T>,
	) -> Result<T> {
		self.ledger
			.transact(TxEnv::new(caller, verifier.address()), |tx, ctx| f(&verifier, tx, ctx))
	}

	fn relay_request(&self, wallet: Address, token: Address, amount: u64) -> RelayRequest {
		RelayRequest {
			request: ForwardRequest {
				from: USER,
				to: TARGET,
				token_contract: token,
				token_amount: U256::from(amount),
				..Default::default()
			},
			relay_data: RelayData {
				call_forwarder: wallet,
				..Default::default()
			},
		}
	}

	fn deploy_request(&self, token: Address, amount: u64) -> DeployRequest {
		DeployRequest {
			request: DeployRequestBody {
				from: USER,
				token_contract: token,
				token_amount: U256::from(amount),
				..Default::default()
			},
			relay_data: RelayData {
				call_forwarder: self.factory.address(),
				..Default::default()
			},
		}
	}
}

fn token_policy() -> Policies {
	Policies {
		tokens: true,
		..Default::default()
	}
}

#[test]
fn test_token_allow_list_management() {
	let mut fixture = Fixture::new();
	let scope = VerifierScope::Relay {
		factory: fixture.factory.address(),
	};
	let verifier = fixture.verifier(scope, token_policy());
	let token = fixture.token;
	let other = address!("00000000000000000000000000000000000000ee");

	let stranger = fixture.as_owner(USER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, token));
	assert_eq!(
		stranger,
		Err(RelayError::Unauthorized("Caller is not the owner".into()))
	);

	fixture
		.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, token))
		.unwrap();
	fixture
		.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, other))
		.unwrap();
	assert_eq!(
		fixture.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, token)),
		Err(RelayError::Rejected("Token is already accepted".into()))
	);
	assert_eq!(
		fixture.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, Address::ZERO)),
		Err(RelayError::Rejected("Token cannot be zero address".into()))
	);

	assert_eq!(
		fixture.as_owner(OWNER, verifier, |v, tx, ctx| v.remove_token(tx, ctx, token, 1)),
		Err(RelayError::Rejected("Incorrect token index".into()))
	);
	fixture
		.as_owner(OWNER, verifier, |v, tx, ctx| v.remove_token(tx, ctx, token, 0))
		.unwrap();
	assert_eq!(
		verifier.get_accepted_tokens(fixture.ledger.world()).unwrap(),
		vec![other]
	);
	assert!(!verifier.accepts_token(fixture.ledger.world(), &token).unwrap());
	assert_eq!(
		fixture.as_owner(OWNER, verifier, |v, tx, ctx| v.remove_token(tx, ctx, token, 0)),
		Err(RelayError::Rejected("Token is not accepted".into()))
	);
}

#[test]
fn test_relay_scope_checks_template_and_fee_token() {
	let mut fixture = Fixture::new();
	let scope = VerifierScope::Relay {
		factory: fixture.factory.address(),
	};
	let verifier = fixture.verifier(scope, token_policy());
	let token = fixture.token;
	fixture
		.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, token))
		.unwrap();
	let world = fixture.ledger.world();

	verifier
		.verify_relay(world, &fixture.relay_request(WALLET, token, 10))
		.unwrap();
	assert_eq!(
		verifier.verify_relay(world, &fixture.relay_request(STRAY, token, 10)),
		Err(RelayError::Rejected("SW different to template".into()))
	);
	assert_eq!(
		verifier.verify_relay(world, &fixture.relay_request(USER, token, 10)),
		Err(RelayError::Rejected("SW different to template".into()))
	);
	assert_eq!(
		verifier.verify_relay(world, &fixture.relay_request(WALLET, TARGET, 10)),
		Err(RelayError::Rejected("Token contract not allowed".into()))
	);

	verifier
		.verify_relay(world, &fixture.relay_request(WALLET, Address::ZERO, 0))
		.unwrap();
	assert_eq!(
		verifier.verify_relay(world, &fixture.relay_request(WALLET, Address::ZERO, 5)),
		Err(RelayError::Rejected("Token contract not allowed".into()))
	);
}

#[test]
fn test_native_fees_need_explicit_opt_in() {
	let mut fixture = Fixture::new();
	let scope = VerifierScope::Relay {
		factory: fixture.factory.address(),
	};
	let verifier = fixture.verifier(
		scope,
		Policies {
			tokens: true,
			accepts_native: true,
			..Default::default()
		},
	);
	verifier
		.verify_relay(
			fixture.ledger.world(),
			&fixture.relay_request(WALLET, Address::ZERO, 5),
		)
		.unwrap();
}

#[test]
fn test_contract_handler_filters_destination() {
	let mut fixture = Fixture::new();
	let scope = VerifierScope::Relay {
		factory: fixture.factory.address(),
	};
	let verifier = fixture.verifier(
		scope,
		Policies {
			contracts: true,
			..Default::default()
		},
	);
	let request = fixture.relay_request(WALLET, Address::ZERO, 0);
	assert_eq!(
		verifier.verify_relay(fixture.ledger.world(), &request),
		Err(RelayError::Rejected("Destination contract not allowed".into()))
	);

	fixture
		.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_contract(tx, ctx, TARGET))
		.unwrap();
	verifier
		.verify_relay(fixture.ledger.world(), &request)
		.unwrap();
	assert_eq!(
		verifier.get_accepted_contracts(fixture.ledger.world()).unwrap(),
		vec![TARGET]
	);
	assert!(verifier.get_accepted_tokens(fixture.ledger.world()).is_err());
}

#[test]
fn test_deploy_scope_checks_factory_and_fresh_address() {
	let mut fixture = Fixture::new();
	let scope = VerifierScope::Deploy {
		factory: fixture.factory.address(),
	};
	let verifier = fixture.verifier(scope, token_policy());
	let token = fixture.token;
	fixture
		.as_owner(OWNER, verifier, |v, tx, ctx| v.accept_token(tx, ctx, token))
		.unwrap();

	let request = fixture.deploy_request(token, 500);
	verifier
		.verify_deploy(fixture.ledger.world(), &request)
		.unwrap();

	let mut elsewhere = request.clone();
	elsewhere.relay_data.call_forwarder = DEPLOYER;
	assert_eq!(
		verifier.verify_deploy(fixture.ledger.world(), &elsewhere),
		Err(RelayError::Rejected("Invalid factory".into()))
	);

	let relay = fixture.relay_request(WALLET, token, 0);
	assert!(verifier.verify_relay(fixture.ledger.world(), &relay).is_err());

	let seed = fixture
		.factory
		.seed_for_request(fixture.ledger.world(), &request.request)
		.unwrap();
	let predicted = fixture
		.factory
		.get_smart_wallet_address(fixture.ledger.world(), &seed)
		.unwrap();
	let template = fixture.factory.template(fixture.ledger.world()).unwrap();
	fixture
		.ledger
		.transact(TxEnv::new(DEPLOYER, Address::ZERO), |tx, _| {
			tx.world_mut().install(
				predicted,
				Contract::Wallet(WalletState::uninitialized(WalletKind::Standard, template)),
			)
		})
		.unwrap();
	assert_eq!(
		verifier.verify_deploy(fixture.ledger.world(), &request),
		Err(RelayError::Rejected("Address already created!".into()))
	);
}
