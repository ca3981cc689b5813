//! Relay node configuration.
//!
//! Files may be TOML, JSON or YAML. `${VAR}` placeholders are substituted
//! before parsing and `RELAY_*` variables override selected fields.

pub mod loader;
pub mod serde_helpers;
pub mod types;

use thiserror::Error;

pub use loader::{load_config, validate_config, ConfigFormat, ConfigLoader};
pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}
