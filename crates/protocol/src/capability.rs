//! Capability declarations sent with a pairing proposal.
//!
//! A [`CapabilitySet`] is what the dapp asks the wallet to permit: the chains it
//! will operate on, the RPC methods it will call, and the events it wants to
//! receive. On the wire it is a namespace map:
//!
//! ```json
//! {
//!   "eip155": {
//!     "chains": ["eip155:5"],
//!     "methods": ["eth_sendTransaction"],
//!     "events": ["connect", "disconnect"]
//!   }
//! }
//! ```
//!
//! Only a single namespace is supported per set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// CAIP-2 chain identifier, `"<namespace>:<reference>"` (e.g. `"eip155:5"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId {
	raw: String,
	/// Byte offset of the `:` separator.
	split: usize,
}

impl ChainId {
	pub fn parse(value: &str) -> Result<Self> {
		let invalid = || ProtocolError::InvalidChainId(value.to_string());
		let split = value.find(':').ok_or_else(invalid)?;
		let (namespace, reference) = (&value[..split], &value[split + 1..]);

		let namespace_ok = (3..=8).contains(&namespace.len())
			&& namespace.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');
		let reference_ok = (1..=32).contains(&reference.len())
			&& reference.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');

		if !namespace_ok || !reference_ok {
			return Err(invalid());
		}

		Ok(Self {
			raw: value.to_string(),
			split,
		})
	}

	/// Namespace part, e.g. `eip155`.
	pub fn namespace(&self) -> &str {
		&self.raw[..self.split]
	}

	pub fn as_str(&self) -> &str {
		&self.raw
	}
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.raw)
	}
}

impl FromStr for ChainId {
	type Err = ProtocolError;

	fn from_str(s: &str) -> Result<Self> {
		Self::parse(s)
	}
}

impl TryFrom<String> for ChainId {
	type Error = ProtocolError;

	fn try_from(value: String) -> Result<Self> {
		Self::parse(&value)
	}
}

impl From<ChainId> for String {
	fn from(chain: ChainId) -> Self {
		chain.raw
	}
}

/// Permissions requested for a session: chains, methods, events.
///
/// Always declares at least one chain, and every chain shares one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
	try_from = "BTreeMap<String, NamespaceRequirement>",
	into = "BTreeMap<String, NamespaceRequirement>"
)]
pub struct CapabilitySet {
	/// Declaration order, deduplicated. Never empty.
	chain_ids: Vec<ChainId>,
	methods: Vec<String>,
	events: Vec<String>,
}

impl CapabilitySet {
	pub fn new<M, E>(
		chain_ids: impl IntoIterator<Item = ChainId>,
		methods: impl IntoIterator<Item = M>,
		events: impl IntoIterator<Item = E>,
	) -> Result<Self>
	where
		M: Into<String>,
		E: Into<String>,
	{
		let chain_ids = dedup(chain_ids);
		let first = chain_ids.first().ok_or(ProtocolError::NoChains)?;

		if let Some(other) = chain_ids.iter().find(|c| c.namespace() != first.namespace()) {
			return Err(ProtocolError::MixedNamespaces {
				first: first.namespace().to_string(),
				second: other.namespace().to_string(),
			});
		}

		Ok(Self {
			chain_ids,
			methods: dedup(methods.into_iter().map(Into::into)),
			events: dedup(events.into_iter().map(Into::into)),
		})
	}

	pub fn builder() -> CapabilitySetBuilder {
		CapabilitySetBuilder::default()
	}

	pub fn chain_ids(&self) -> &[ChainId] {
		&self.chain_ids
	}

	/// First declared chain. Requests are bound to this chain.
	pub fn primary_chain(&self) -> &ChainId {
		// non-empty by construction
		&self.chain_ids[0]
	}

	pub fn namespace(&self) -> &str {
		self.primary_chain().namespace()
	}

	pub fn methods(&self) -> &[String] {
		&self.methods
	}

	pub fn events(&self) -> &[String] {
		&self.events
	}

	pub fn allows_method(&self, method: &str) -> bool {
		self.methods.iter().any(|m| m == method)
	}
}

/// Builder for [`CapabilitySet`].
#[derive(Debug, Default, Clone)]
pub struct CapabilitySetBuilder {
	chain_ids: Vec<ChainId>,
	methods: Vec<String>,
	events: Vec<String>,
}

impl CapabilitySetBuilder {
	pub fn chain(mut self, chain: ChainId) -> Self {
		self.chain_ids.push(chain);
		self
	}

	pub fn method(mut self, method: impl Into<String>) -> Self {
		self.methods.push(method.into());
		self
	}

	pub fn event(mut self, event: impl Into<String>) -> Self {
		self.events.push(event.into());
		self
	}

	pub fn build(self) -> Result<CapabilitySet> {
		CapabilitySet::new(self.chain_ids, self.methods, self.events)
	}
}

/// Per-namespace entry of the `requiredNamespaces` wire map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceRequirement {
	#[serde(default)]
	pub chains: Vec<ChainId>,
	#[serde(default)]
	pub methods: Vec<String>,
	#[serde(default)]
	pub events: Vec<String>,
}

impl TryFrom<BTreeMap<String, NamespaceRequirement>> for CapabilitySet {
	type Error = ProtocolError;

	fn try_from(map: BTreeMap<String, NamespaceRequirement>) -> Result<Self> {
		let mut entries = map.into_iter();
		let (namespace, requirement) = entries.next().ok_or(ProtocolError::NoChains)?;
		if let Some((other, _)) = entries.next() {
			return Err(ProtocolError::MixedNamespaces {
				first: namespace,
				second: other,
			});
		}

		if let Some(stray) = requirement.chains.iter().find(|c| c.namespace() != namespace) {
			return Err(ProtocolError::MixedNamespaces {
				first: namespace,
				second: stray.namespace().to_string(),
			});
		}

		Self::new(requirement.chains, requirement.methods, requirement.events)
	}
}

impl From<CapabilitySet> for BTreeMap<String, NamespaceRequirement> {
	fn from(set: CapabilitySet) -> Self {
		let namespace = set.namespace().to_string();
		let requirement = NamespaceRequirement {
			chains: set.chain_ids,
			methods: set.methods,
			events: set.events,
		};
		BTreeMap::from([(namespace, requirement)])
	}
}

fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
	let mut out = Vec::new();
	for item in items {
		if !out.contains(&item) {
			out.push(item);
		}
	}
	out
}
