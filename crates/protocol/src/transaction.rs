//! `eth_sendTransaction` payloads.
//!
//! Quantities travel as `0x`-prefixed hex without leading zeros (`"0x5208"`),
//! data as `0x`-prefixed hex bytes (`"0x"` when empty).

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};
use crate::session::Address;

/// Transaction the wallet is asked to sign and broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
	/// Sender. Filled from the session's active account when left unset.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub from: Option<Address>,
	pub to: Address,
	#[serde(with = "hex_data", default)]
	pub data: Vec<u8>,
	#[serde(with = "quantity")]
	pub gas_price: u128,
	#[serde(with = "quantity")]
	pub gas_limit: u128,
	#[serde(with = "quantity", default)]
	pub value: u128,
}

impl TransactionRequest {
	/// Plain 21000-gas transfer of zero value to `to`.
	pub fn new(to: Address) -> Self {
		Self {
			from: None,
			to,
			data: Vec::new(),
			gas_price: 0,
			gas_limit: 21_000,
			value: 0,
		}
	}

	pub fn with_from(mut self, from: Address) -> Self {
		self.from = Some(from);
		self
	}

	pub fn with_data(mut self, data: Vec<u8>) -> Self {
		self.data = data;
		self
	}

	pub fn with_gas_price(mut self, gas_price: u128) -> Self {
		self.gas_price = gas_price;
		self
	}

	pub fn with_gas_limit(mut self, gas_limit: u128) -> Self {
		self.gas_limit = gas_limit;
		self
	}

	pub fn with_value(mut self, value: u128) -> Self {
		self.value = value;
		self
	}
}

/// Parses a quantity given either as decimal (`"21000"`) or hex (`"0x5208"`).
pub fn parse_quantity(input: &str) -> Result<u128> {
	let trimmed = input.trim();
	let parsed = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
		Some("") => Ok(0),
		Some(hex) => u128::from_str_radix(hex, 16),
		None => trimmed.parse::<u128>(),
	};
	parsed.map_err(|_| ProtocolError::InvalidQuantity(input.to_string()))
}

/// Parses `0x`-prefixed (or bare) hex bytes.
pub fn parse_hex_data(input: &str) -> Result<Vec<u8>> {
	let trimmed = input.trim();
	let digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
	hex::decode(digits).map_err(|_| ProtocolError::InvalidHex(input.to_string()))
}

mod quantity {
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format!("{value:#x}"))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
		let raw = String::deserialize(deserializer)?;
		super::parse_quantity(&raw).map_err(serde::de::Error::custom)
	}
}

mod hex_data {
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(&format!("0x{}", hex::encode(value)))
	}

	pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
		let raw = String::deserialize(deserializer)?;
		super::parse_hex_data(&raw).map_err(serde::de::Error::custom)
	}
}
