//! Session records returned by the wallet once a proposal is approved.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::{CapabilitySet, ChainId};

/// CAIP-10 account identifier, `"<chainId>:<address>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	/// Builds the account id for `address` on `chain`.
	pub fn on_chain(chain: &ChainId, address: &Address) -> Self {
		Self(format!("{chain}:{address}"))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Strips the `"<chainId>:"` prefix exactly once.
	///
	/// Returns `None` when the account does not belong to `chain` or nothing
	/// follows the prefix.
	pub fn address_on(&self, chain: &ChainId) -> Option<Address> {
		let rest = self.0.strip_prefix(chain.as_str())?.strip_prefix(':')?;
		if rest.is_empty() {
			return None;
		}
		Some(Address::new(rest))
	}
}

impl fmt::Display for AccountId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Bare account address as the wallet reports it (e.g. `0xDEAD...`).
///
/// No checksum or length validation is applied; the wallet is authoritative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for Address {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for Address {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}

/// Transaction identifier returned by the wallet, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(String);

impl TxHash {
	pub fn new(raw: impl Into<String>) -> Self {
		Self(raw.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for TxHash {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// An approved session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
	/// Opaque identifier addressing every later request and disconnect.
	pub topic: String,
	/// Accounts the wallet exposed, in wallet order.
	pub accounts: Vec<AccountId>,
	/// Chain the session's requests are bound to.
	pub chain_id: ChainId,
	/// What the wallet actually approved.
	pub capabilities: CapabilitySet,
}

/// Per-namespace entry of a wallet's settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionNamespace {
	#[serde(default, skip_serializing_if = "Vec::is_empty")]
	pub chains: Vec<ChainId>,
	#[serde(default)]
	pub accounts: Vec<AccountId>,
	#[serde(default)]
	pub methods: Vec<String>,
	#[serde(default)]
	pub events: Vec<String>,
}

/// Settlement payload a wallet sends when it approves a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettlement {
	pub topic: String,
	#[serde(default)]
	pub namespaces: BTreeMap<String, SessionNamespace>,
}

impl SessionSettlement {
	/// Narrows the settlement to the namespace that was requested.
	///
	/// Accounts are kept in wallet order and not filtered, so a record whose
	/// first account belongs to another chain stays detectable downstream.
	/// Approved chains fall back to the requested ones when the wallet omits
	/// them.
	pub fn into_record(mut self, requested: &CapabilitySet) -> SessionRecord {
		let approved = self.namespaces.remove(requested.namespace()).unwrap_or_default();

		let chains = if approved.chains.is_empty() {
			requested.chain_ids().to_vec()
		} else {
			approved.chains
		};

		let capabilities = CapabilitySet::new(chains, approved.methods, approved.events)
			.unwrap_or_else(|_| requested.clone());

		SessionRecord {
			topic: self.topic,
			accounts: approved.accounts,
			chain_id: requested.primary_chain().clone(),
			capabilities,
		}
	}
}
