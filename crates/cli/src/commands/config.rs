use std::path::Path;

use serde_json::{Value, json};

use super::report;
use crate::config::{ConfigFile, Settings};
use crate::error::{CliError, Result};
use crate::output::{OutputFormat, ResultBuilder};

/// Prints the effective settings.
pub fn show(settings: &Settings, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::new("config");
	let outcome = serde_json::to_value(settings).map_err(CliError::from);
	report(builder, outcome, format)
}

/// Writes a config file populated with defaults.
pub fn init(path: &Path, force: bool, format: OutputFormat) -> Result<()> {
	let builder = ResultBuilder::<Value>::new("config");
	let outcome = write_defaults(path, force);
	report(builder, outcome, format)
}

fn write_defaults(path: &Path, force: bool) -> Result<Value> {
	if path.exists() && !force {
		return Err(CliError::InvalidInput(format!(
			"{} already exists (pass --force to overwrite)",
			path.display()
		)));
	}
	ConfigFile::with_defaults().save(path)?;
	Ok(json!({ "path": path, "written": true }))
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn refuses_to_overwrite_without_force() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("config.json");

		write_defaults(&path, false).unwrap();
		assert!(matches!(write_defaults(&path, false), Err(CliError::InvalidInput(_))));
		assert!(write_defaults(&path, true).is_ok());
		assert_eq!(ConfigFile::load(&path).unwrap(), ConfigFile::with_defaults());
	}
}
