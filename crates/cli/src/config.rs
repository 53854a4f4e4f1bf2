//! Configuration file handling.
//!
//! The file is JSON with camelCase keys, read from `--config` or from
//! `<config dir>/rrepl/config.json`. Every key is optional; command-line
//! flags override whatever the file says.

use std::fs;
use std::path::{Path, PathBuf};

use rrepl_protocol::settings::{DEFAULT_BASE_NAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SENTINEL};
use rrepl_runtime::{ServerConfig, SessionOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::cli::SessionArgs;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("could not read {}: {source}", path.display())]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("invalid configuration in {}: {source}", path.display())]
	Parse {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
}

/// Contents of a configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileConfig {
	#[serde(default)]
	pub host: Option<String>,
	#[serde(default)]
	pub port: Option<u16>,
	#[serde(default)]
	pub loopback_only: Option<bool>,
	#[serde(default)]
	pub init_url: Option<String>,
	#[serde(default)]
	pub base_name: Option<String>,
	#[serde(default)]
	pub sentinel: Option<String>,
}

/// Effective configuration after defaults, file and flags are merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
	pub host: String,
	pub port: u16,
	pub loopback_only: bool,
	pub init_url: Option<String>,
	pub base_name: String,
	pub sentinel: String,
}

impl Settings {
	pub fn resolve(file: FileConfig, args: &SessionArgs) -> Self {
		Self {
			host: args.host.clone().or(file.host).unwrap_or_else(|| DEFAULT_HOST.to_string()),
			port: args.port.or(file.port).unwrap_or(DEFAULT_PORT),
			loopback_only: !args.allow_remote && file.loopback_only.unwrap_or(true),
			init_url: args.init_url.clone().or(file.init_url),
			base_name: args.name.clone().or(file.base_name).unwrap_or_else(|| DEFAULT_BASE_NAME.to_string()),
			sentinel: args.sentinel.clone().or(file.sentinel).unwrap_or_else(|| DEFAULT_SENTINEL.to_string()),
		}
	}

	pub fn session_options(&self) -> SessionOptions {
		SessionOptions {
			base_name: self.base_name.clone(),
			sentinel: self.sentinel.clone(),
			init_url: self.init_url.clone(),
		}
	}

	pub fn server_config(&self) -> ServerConfig {
		ServerConfig {
			host: self.host.clone(),
			port: self.port,
			loopback_only: self.loopback_only,
			session: self.session_options(),
		}
	}
}

pub fn default_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("rrepl").join("config.json"))
}

/// Loads `explicit`, which must exist, or the default file, which may not.
pub fn load(explicit: Option<&Path>) -> Result<FileConfig, ConfigError> {
	if let Some(path) = explicit {
		return read(path);
	}
	match default_path() {
		Some(path) if path.exists() => read(&path),
		_ => {
			debug!(target = "rrepl", "no configuration file, using defaults");
			Ok(FileConfig::default())
		}
	}
}

fn read(path: &Path) -> Result<FileConfig, ConfigError> {
	let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
		path: path.to_path_buf(),
		source,
	})?;
	let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
		path: path.to_path_buf(),
		source,
	})?;
	debug!(target = "rrepl", path = %path.display(), "configuration loaded");
	Ok(config)
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	fn write(dir: &TempDir, content: &str) -> PathBuf {
		let path = dir.path().join("config.json");
		fs::write(&path, content).unwrap();
		path
	}

	#[test]
	fn reads_camel_case_keys() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, r#"{"port": 5555, "loopbackOnly": false, "baseName": "shell"}"#);
		let config = load(Some(&path)).unwrap();
		assert_eq!(config.port, Some(5555));
		assert_eq!(config.loopback_only, Some(false));
		assert_eq!(config.base_name.as_deref(), Some("shell"));
		assert_eq!(config.host, None);
	}

	#[test]
	fn explicit_file_must_exist() {
		let dir = TempDir::new().unwrap();
		let err = load(Some(&dir.path().join("absent.json"))).unwrap_err();
		assert!(matches!(err, ConfigError::Read { .. }));
	}

	#[test]
	fn malformed_and_unknown_keys_are_rejected() {
		let dir = TempDir::new().unwrap();
		let path = write(&dir, "{ not json");
		assert!(matches!(load(Some(&path)), Err(ConfigError::Parse { .. })));

		let path = write(&dir, r#"{"colour": "blue"}"#);
		let err = load(Some(&path)).unwrap_err();
		assert!(err.to_string().contains("colour"), "{err}");
	}

	#[test]
	fn flags_override_file_values() {
		let file = FileConfig {
			host: Some("0.0.0.0".into()),
			port: Some(6000),
			base_name: Some("shell".into()),
			..FileConfig::default()
		};
		let args = SessionArgs {
			port: Some(7000),
			allow_remote: true,
			..SessionArgs::default()
		};
		let settings = Settings::resolve(file, &args);
		assert_eq!(settings.host, "0.0.0.0");
		assert_eq!(settings.port, 7000);
		assert!(!settings.loopback_only);
		assert_eq!(settings.base_name, "shell");
		assert_eq!(settings.sentinel, DEFAULT_SENTINEL);
	}

	#[test]
	fn defaults_match_the_listener() {
		let settings = Settings::resolve(FileConfig::default(), &SessionArgs::default());
		assert_eq!(settings.server_config(), ServerConfig::default());
		let json = serde_json::to_value(&settings).unwrap();
		assert_eq!(json["loopbackOnly"], true);
		assert_eq!(json["baseName"], "repl");
	}
}
