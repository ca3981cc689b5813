//! Serde helpers for configuration deserialization

use relay_types::U256;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Quantity {
	Int(u64),
	Text(String),
}

fn parse_quantity(text: &str) -> Result<U256, String> {
	let text = text.trim().replace('_', "");
	let parsed = match text.strip_prefix("0x") {
		Some(hex) => U256::from_str_radix(hex, 16),
		None => U256::from_str_radix(&text, 10),
	};
	parsed.map_err(|e| format!("Invalid quantity '{}': {}", text, e))
}

/// Accepts a TOML/JSON integer or a decimal / `0x` hex string.
pub fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
	D: Deserializer<'de>,
{
	match Quantity::deserialize(deserializer)? {
		Quantity::Int(value) => Ok(U256::from(value)),
		Quantity::Text(text) => parse_quantity(&text).map_err(serde::de::Error::custom),
	}
}

/// Writes quantities as decimal strings so they survive every format.
pub fn serialize_u256<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&value.to_string())
}

/// Same as [`deserialize_u256`] for `symbol -> amount` tables.
pub fn deserialize_u256_map<'de, D>(
	deserializer: D,
) -> Result<std::collections::BTreeMap<String, U256>, D::Error>
where
	D: Deserializer<'de>,
{
	let map = std::collections::BTreeMap::<String, Quantity>::deserialize(deserializer)?;
	map.into_iter()
		.map(|(k, v)| {
			let amount = match v {
				Quantity::Int(value) => U256::from(value),
				Quantity::Text(text) => parse_quantity(&text).map_err(serde::de::Error::custom)?,
			};
			Ok((k, amount))
		})
		.collect()
}

pub fn serialize_u256_map<S>(
	map: &std::collections::BTreeMap<String, U256>,
	serializer: S,
) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	use serde::ser::SerializeMap;
	let mut out = serializer.serialize_map(Some(map.len()))?;
	for (k, v) in map {
		out.serialize_entry(k, &v.to_string())?;
	}
	out.end()
}
