use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("could not listen on {addr}: {source}")]
	Bind {
		addr: String,
		#[source]
		source: std::io::Error,
	},

	#[error("refusing connection from non-local peer {0}")]
	Refused(SocketAddr),
}

pub type Result<T> = std::result::Result<T, Error>;
