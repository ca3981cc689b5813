//! Configuration loading from files and environment.

use crate::types::RelayConfig;
use crate::ConfigError;
use anyhow::Context;
use regex::Regex;
use relay_storage::StorageBackend;
use relay_types::HubParams;
use std::collections::BTreeSet;
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
	Toml,
	Json,
	Yaml,
}

impl ConfigFormat {
	pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Ok(ConfigFormat::Toml),
			Some("json") => Ok(ConfigFormat::Json),
			Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
			_ => Err(ConfigError::ParseError(format!(
				"Unsupported config format: {:?}",
				path
			))),
		}
	}
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "RELAY_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<RelayConfig, ConfigError> {
		let path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;
		info!("Loading configuration from {:?}", path);

		let format = ConfigFormat::from_path(path)?;
		let contents = tokio::fs::read_to_string(path)
			.await
			.map_err(|e| match e.kind() {
				std::io::ErrorKind::NotFound => {
					ConfigError::FileNotFound(path.display().to_string())
				}
				_ => ConfigError::IoError(e),
			})?;

		let mut config = Self::parse(&substitute_env_vars(&contents)?, format)?;
		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;
		Ok(config)
	}

	/// Parses `contents` without substitution, overrides or validation.
	pub fn parse(contents: &str, format: ConfigFormat) -> Result<RelayConfig, ConfigError> {
		match format {
			ConfigFormat::Toml => {
				toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
			}
			ConfigFormat::Json => serde_json::from_str(contents)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
			ConfigFormat::Yaml => serde_yaml::from_str(contents)
				.map_err(|e| ConfigError::ParseError(e.to_string())),
		}
	}

	fn apply_env_overrides(&self, config: &mut RelayConfig) -> Result<(), ConfigError> {
		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			debug!("Overriding log level from environment");
			config.node.log_level = log_level;
		}

		if let Ok(chain_id) = env::var(format!("{}CHAIN_ID", self.env_prefix)) {
			debug!("Overriding chain id from environment");
			config.node.chain_id = chain_id
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid chain id: {}", e)))?;
		}

		if let Ok(path) = env::var(format!("{}STORAGE_PATH", self.env_prefix)) {
			debug!("Overriding storage path from environment");
			config.node.storage = StorageBackend::File {
				path: PathBuf::from(path),
			};
		}

		Ok(())
	}
}

/// Replaces `${VAR}` and `${VAR:-default}` with environment values.
pub fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
		.map_err(|e| ConfigError::ParseError(e.to_string()))?;

	let mut missing = None;
	let result = re.replace_all(content, |cap: &regex::Captures<'_>| {
		let var_name = &cap[1];
		match (env::var(var_name), cap.get(2)) {
			(Ok(value), _) => value,
			(Err(_), Some(default)) => default.as_str().to_string(),
			(Err(_), None) => {
				missing.get_or_insert_with(|| var_name.to_string());
				String::new()
			}
		}
	});

	match missing {
		Some(var_name) => Err(ConfigError::EnvVarNotFound(var_name)),
		None => Ok(result.into_owned()),
	}
}

pub fn validate_config(config: &RelayConfig) -> Result<(), ConfigError> {
	let invalid = |msg: String| Err(ConfigError::ValidationError(msg));

	if config.node.chain_id == 0 {
		return invalid("Chain id must be positive".to_string());
	}
	if HubParams::from(&config.hub).validate().is_err() {
		return invalid("Hub parameters must all be positive".to_string());
	}

	let mut symbols = BTreeSet::new();
	for token in &config.tokens {
		if token.symbol.is_empty() {
			return invalid("Token symbol cannot be empty".to_string());
		}
		if !symbols.insert(token.symbol.as_str()) {
			return invalid(format!("Duplicate token symbol '{}'", token.symbol));
		}
	}

	let mut names = BTreeSet::new();
	for verifier in &config.verifiers {
		if !names.insert(verifier.name.as_str()) {
			return invalid(format!("Duplicate verifier '{}'", verifier.name));
		}
		if let Some(tokens) = &verifier.tokens {
			if tokens.is_empty() {
				return invalid(format!("Verifier '{}' accepts no tokens", verifier.name));
			}
			if let Some(unknown) = tokens.iter().find(|s| !symbols.contains(s.as_str())) {
				return invalid(format!(
					"Verifier '{}' references unknown token '{}'",
					verifier.name, unknown
				));
			}
		}
		if verifier.contracts.as_ref().is_some_and(|c| c.is_empty()) {
			return invalid(format!("Verifier '{}' accepts no contracts", verifier.name));
		}
	}

	for account in &config.accounts {
		if let Some(unknown) = account.tokens.keys().find(|s| !symbols.contains(s.as_str())) {
			return invalid(format!(
				"Account {} references unknown token '{}'",
				account.address, unknown
			));
		}
	}

	Ok(())
}

/// Loads configuration from `path`, or from standard locations.
pub async fn load_config(path: Option<&Path>) -> anyhow::Result<RelayConfig> {
	// Check for config file in order:
	// 1. Explicit path
	// 2. Environment variable RELAY_CONFIG
	// 3. ./config/relay.toml, ./relay.toml
	let path = match path {
		Some(path) => path.to_path_buf(),
		None => match env::var("RELAY_CONFIG") {
			Ok(path) => PathBuf::from(path),
			Err(_) => ["./config/relay.toml", "./relay.toml"]
				.iter()
				.map(PathBuf::from)
				.find(|p| p.exists())
				.context("No configuration file found")?,
		},
	};

	ConfigLoader::new()
		.with_file(&path)
		.load()
		.await
		.with_context(|| format!("Failed to load config file: {:?}", path))
}
