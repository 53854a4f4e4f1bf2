//! Error types for the session engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Which of a session's registration scopes a name collided in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
	Host,
	Creation,
}

impl std::fmt::Display for Place {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Place::Host => f.write_str("the scope the session is hosted in"),
			Place::Creation => f.write_str("the scope the session was created in"),
		}
	}
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("Sorry, name \"{name}\" already exists in {place}.")]
	NameTaken { name: String, place: Place },

	#[error("Could not load script {url}: {reason}")]
	ScriptLoad { url: String, reason: String },
}
