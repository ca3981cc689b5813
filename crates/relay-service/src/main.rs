use anyhow::{Context, Result};
use clap::Parser;
use relay_account::LocalWallet;
use relay_config::{load_config, RelayConfig};
use relay_service::cli::{Args, Command, RequestKind};
use relay_service::{RelayNode, RelayNodeBuilder};
use relay_storage::StorageService;
use relay_types::{Address, DeployRequest, RelayRequest, U256};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	setup_tracing(&args.log_level)?;

	let config = load_config(args.config.as_deref()).await?;
	match args.command {
		Command::Bootstrap { force } => bootstrap(config, force).await,
		Command::Validate => validate(&config),
		Command::Status => status(&config).await,
		Command::WalletAddress {
			owner,
			recoverer,
			index,
			logic,
			init_params,
		} => wallet_address(&config, owner, recoverer, index, logic, &init_params).await,
		Command::SignRequest { request, kind, key } => {
			sign_request(&config, &request, kind, &key).await
		}
	}
}

async fn bootstrap(config: RelayConfig, force: bool) -> Result<()> {
	let storage = StorageService::from_backend(&config.node.storage);
	if !force && RelayNode::exists(&storage).await? {
		anyhow::bail!("A ledger snapshot already exists; pass --force to replace it");
	}

	let timestamp = u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default();
	let node = RelayNodeBuilder::new()
		.with_config(config)
		.with_genesis_timestamp(timestamp)
		.build()
		.context("Failed to build genesis")?;
	node.save(&storage)
		.await
		.context("Failed to persist genesis")?;

	info!("Genesis persisted");
	println!("{}", serde_json::to_string_pretty(node.deployment())?);
	Ok(())
}

fn validate(config: &RelayConfig) -> Result<()> {
	info!("Configuration is valid");
	info!("Chain id: {}", config.node.chain_id);
	info!("Deployer: {}", config.node.deployer);
	info!("Factory kind: {}", config.factory.kind);
	info!("Tokens: {}", config.tokens.len());
	for verifier in &config.verifiers {
		info!("  Verifier: {} ({:?})", verifier.name, verifier.scope);
	}
	info!("Genesis accounts: {}", config.accounts.len());
	Ok(())
}

async fn load_node(config: &RelayConfig) -> Result<RelayNode> {
	let storage = StorageService::from_backend(&config.node.storage);
	RelayNode::load(&storage)
		.await
		.context("Failed to load ledger snapshot; run `relay-node bootstrap` first")
}

async fn status(config: &RelayConfig) -> Result<()> {
	let node = load_node(config).await?;
	let status = node.status()?;

	let time = i64::try_from(status.timestamp)
		.ok()
		.and_then(|ts| chrono::DateTime::from_timestamp(ts, 0))
		.map(|dt| dt.to_rfc3339())
		.unwrap_or_default();
	info!(
		"Block {} at {} on chain {}",
		status.block_number, time, status.chain_id
	);
	println!("{}", serde_json::to_string_pretty(&status)?);
	Ok(())
}

async fn wallet_address(
	config: &RelayConfig,
	owner: Address,
	recoverer: Address,
	index: U256,
	logic: Address,
	init_params: &str,
) -> Result<()> {
	let node = load_node(config).await?;
	let init_params = hex::decode(init_params.trim_start_matches("0x"))
		.context("init params must be hex")?;
	let address = node.smart_wallet_address(owner, recoverer, logic, &init_params, index)?;
	println!("{}", address);
	Ok(())
}

async fn sign_request(
	config: &RelayConfig,
	path: &std::path::Path,
	kind: RequestKind,
	key: &str,
) -> Result<()> {
	let contents = tokio::fs::read_to_string(path)
		.await
		.with_context(|| format!("Failed to read request file: {:?}", path))?;
	let wallet = LocalWallet::new(key)?;
	let chain_id = config.node.chain_id;

	let signature = match kind {
		RequestKind::Relay => {
			let request: RelayRequest =
				serde_json::from_str(&contents).context("Failed to parse relay request")?;
			anyhow::ensure!(
				request.request.from == wallet.address(),
				"Key does not match request.from"
			);
			wallet.sign_relay_request(&request, chain_id)?
		}
		RequestKind::Deploy => {
			let request: DeployRequest =
				serde_json::from_str(&contents).context("Failed to parse deploy request")?;
			anyhow::ensure!(
				request.request.from == wallet.address(),
				"Key does not match request.from"
			);
			wallet.sign_deploy_request(&request, chain_id)?
		}
	};
	println!("{}", signature);
	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
