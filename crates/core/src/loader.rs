//! Script loading for `fetch_script` and the initialization script.

use std::path::PathBuf;

use url::Url;

use crate::error::{Error, Result};

pub trait ScriptLoader: Send + Sync {
	fn load(&self, url: &str) -> Result<String>;
}

/// Reads scripts from the local filesystem. Accepts `file://` URLs and
/// plain paths; other schemes are rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileScriptLoader;

impl ScriptLoader for FileScriptLoader {
	fn load(&self, url: &str) -> Result<String> {
		let path = resolve(url)?;
		std::fs::read_to_string(&path).map_err(|err| Error::ScriptLoad {
			url: url.to_string(),
			reason: err.to_string(),
		})
	}
}

/// Loader for sessions that were not given one.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLoader;

impl ScriptLoader for NoLoader {
	fn load(&self, url: &str) -> Result<String> {
		Err(Error::ScriptLoad {
			url: url.to_string(),
			reason: "script loading is disabled".to_string(),
		})
	}
}

fn resolve(location: &str) -> Result<PathBuf> {
	let unsupported = |reason: String| Error::ScriptLoad {
		url: location.to_string(),
		reason,
	};
	match Url::parse(location) {
		Ok(url) if url.scheme() == "file" => url
			.to_file_path()
			.map_err(|()| unsupported("not a local file path".to_string())),
		// Single-letter schemes are Windows drive letters.
		Ok(url) if url.scheme().len() > 1 => Err(unsupported(format!("unsupported scheme \"{}\"", url.scheme()))),
		_ => Ok(PathBuf::from(location)),
	}
}
