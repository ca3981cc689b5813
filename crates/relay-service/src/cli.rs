//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use relay_types::{Address, U256};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "relay-node")]
#[command(about = "Meta-transaction relay node", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "RELAY_CONFIG")]
	pub config: Option<PathBuf>,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, env = "RELAY_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Build the genesis ledger from the configuration and persist it
	Bootstrap {
		/// Replace an existing snapshot
		#[arg(long)]
		force: bool,
	},

	/// Validate the configuration file
	Validate,

	/// Show hub parameters, managers and workers of the persisted ledger
	Status,

	/// Print the counterfactual address of a SmartWallet
	WalletAddress {
		#[arg(long)]
		owner: Address,

		#[arg(long, default_value_t = Address::ZERO)]
		recoverer: Address,

		#[arg(long, default_value_t = U256::ZERO)]
		index: U256,

		/// Custom logic, for custom-logic factories
		#[arg(long, default_value_t = Address::ZERO)]
		logic: Address,

		/// Hex-encoded logic initialization parameters
		#[arg(long, default_value = "")]
		init_params: String,
	},

	/// Sign a JSON request with a local key and print the signature
	SignRequest {
		/// Request file
		request: PathBuf,

		#[arg(long, value_enum, default_value_t = RequestKind::Relay)]
		kind: RequestKind,

		/// Hex private key of the request signer
		#[arg(long, env = "RELAY_SIGNER_KEY", hide_env_values = true)]
		key: String,
	},
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RequestKind {
	Relay,
	Deploy,
}
