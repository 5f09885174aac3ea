//! Config file and the effective settings derived from it.
//!
//! Values resolve in order: command-line flag, config file, environment
//! (project id only), built-in default.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use pairsign::{CapabilitySet, ChainId, ETH_SEND_TRANSACTION, SessionConfig};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::cli::Overrides;
use crate::error::{CliError, Result};
use crate::transport::TransportKind;

/// Schema version written to new config files.
pub const SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:8787";
pub const DEFAULT_CHAIN_ID: &str = "eip155:5";
pub const DEFAULT_EXPLORER_URL: &str = "https://goerli.etherscan.io/tx/";
pub const DEFAULT_APPROVAL_TIMEOUT_SECS: u64 = 300;
pub const PROJECT_ID_ENV: &str = "PAIRSIGN_PROJECT_ID";

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
	#[serde(default)]
	pub schema: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub relay_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub chain_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub methods: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub events: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub approval_timeout_secs: Option<u64>,
	/// Set to an empty string to disable explorer links.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub transport: Option<TransportKind>,
}

impl ConfigFile {
	/// A file with every default spelled out.
	pub fn with_defaults() -> Self {
		Self {
			schema: SCHEMA_VERSION,
			relay_url: Some(DEFAULT_RELAY_URL.to_string()),
			project_id: None,
			chain_id: Some(DEFAULT_CHAIN_ID.to_string()),
			methods: Some(vec![ETH_SEND_TRANSACTION.to_string()]),
			events: Some(default_events()),
			approval_timeout_secs: Some(DEFAULT_APPROVAL_TIMEOUT_SECS),
			explorer_url: Some(DEFAULT_EXPLORER_URL.to_string()),
			transport: Some(TransportKind::Relay),
		}
	}

	/// Reads `path`; a missing file yields an empty config.
	pub fn load(path: &Path) -> Result<Self> {
		let content = match fs::read_to_string(path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(err) => {
				return Err(anyhow::Error::new(err)
					.context(format!("failed to read config {}", path.display()))
					.into());
			}
		};

		let file: Self = serde_json::from_str(&content)
			.map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
		if file.schema > SCHEMA_VERSION {
			return Err(CliError::Config(format!(
				"{}: schema {} is newer than supported ({SCHEMA_VERSION})",
				path.display(),
				file.schema
			)));
		}
		Ok(file)
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
		}
		fs::write(path, serde_json::to_string_pretty(self)?)
			.with_context(|| format!("failed to write config {}", path.display()))?;
		Ok(())
	}
}

fn default_events() -> Vec<String> {
	vec!["connect".to_string(), "disconnect".to_string()]
}

/// `$XDG_CONFIG_HOME/pairsign/config.json`, or `./pairsign.json` without a
/// config directory.
pub fn default_config_path() -> PathBuf {
	dirs::config_dir()
		.map(|dir| dir.join("pairsign").join("config.json"))
		.unwrap_or_else(|| PathBuf::from("pairsign.json"))
}

/// Effective settings for one invocation.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	pub config_path: PathBuf,
	pub transport: TransportKind,
	pub relay_url: Url,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub project_id: Option<String>,
	pub chain_id: ChainId,
	pub methods: Vec<String>,
	pub events: Vec<String>,
	/// `None` waits indefinitely.
	pub approval_timeout_secs: Option<u64>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub explorer_url: Option<Url>,
}

impl Settings {
	/// Loads the config file and applies `overrides` and the environment.
	pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
		let path = config_path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
		let file = ConfigFile::load(&path)?;
		Self::resolve(path, file, overrides, std::env::var(PROJECT_ID_ENV).ok())
	}

	pub fn resolve(
		config_path: PathBuf,
		file: ConfigFile,
		overrides: &Overrides,
		env_project_id: Option<String>,
	) -> Result<Self> {
		let relay_url = overrides
			.relay_url
			.clone()
			.or(file.relay_url)
			.unwrap_or_else(|| DEFAULT_RELAY_URL.to_string());
		let relay_url = Url::parse(&relay_url).map_err(|e| CliError::Config(format!("relay url '{relay_url}': {e}")))?;
		if !matches!(relay_url.scheme(), "ws" | "wss") {
			return Err(CliError::Config(format!("relay url must use ws:// or wss://, got '{relay_url}'")));
		}

		let chain_id = overrides
			.chain
			.clone()
			.or(file.chain_id)
			.unwrap_or_else(|| DEFAULT_CHAIN_ID.to_string());
		let chain_id = ChainId::parse(&chain_id).map_err(|e| CliError::Config(e.to_string()))?;

		let timeout = overrides
			.approval_timeout
			.or(file.approval_timeout_secs)
			.unwrap_or(DEFAULT_APPROVAL_TIMEOUT_SECS);

		let explorer_url = match file.explorer_url.as_deref() {
			Some("") => None,
			Some(raw) => Some(Url::parse(raw).map_err(|e| CliError::Config(format!("explorer url '{raw}': {e}")))?),
			None => Some(Url::parse(DEFAULT_EXPLORER_URL).map_err(|e| CliError::Config(e.to_string()))?),
		};

		Ok(Self {
			config_path,
			transport: overrides.transport.or(file.transport).unwrap_or_default(),
			relay_url,
			project_id: overrides
				.project_id
				.clone()
				.or(file.project_id)
				.or(env_project_id)
				.filter(|id| !id.is_empty()),
			chain_id,
			methods: file.methods.unwrap_or_else(|| vec![ETH_SEND_TRANSACTION.to_string()]),
			events: file.events.unwrap_or_else(default_events),
			approval_timeout_secs: (timeout > 0).then_some(timeout),
			explorer_url,
		})
	}

	/// Capabilities requested from the wallet.
	pub fn capabilities(&self) -> Result<CapabilitySet> {
		let caps = CapabilitySet::new(vec![self.chain_id.clone()], self.methods.clone(), self.events.clone())?;
		Ok(caps)
	}

	pub fn session_config(&self) -> SessionConfig {
		SessionConfig::default().with_approval_timeout(self.approval_timeout_secs.map(Duration::from_secs))
	}
}
