//! The TCP listener.

use std::net::SocketAddr;

use rrepl::SessionId;
use rrepl_protocol::settings::{DEFAULT_HOST, DEFAULT_PORT};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::spawner::{SessionOptions, SessionSpawner};
use crate::table::SessionTable;
use crate::tcp::TcpTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
	pub host: String,
	pub port: u16,
	/// Refuse connections whose peer is not a loopback address.
	pub loopback_only: bool,
	pub session: SessionOptions,
}

impl Default for ServerConfig {
	fn default() -> Self {
		Self {
			host: DEFAULT_HOST.to_string(),
			port: DEFAULT_PORT,
			loopback_only: true,
			session: SessionOptions::default(),
		}
	}
}

impl ServerConfig {
	pub fn addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

/// Accepts connections and gives each one its own session.
pub struct SessionServer {
	listener: TcpListener,
	loopback_only: bool,
	spawner: SessionSpawner,
	stop: watch::Sender<bool>,
}

impl SessionServer {
	/// Binds the listening socket. `config.session` replaces the spawner's
	/// session options.
	pub async fn bind(config: &ServerConfig, spawner: SessionSpawner) -> Result<Self> {
		let addr = config.addr();
		let listener = TcpListener::bind(&addr)
			.await
			.map_err(|source| Error::Bind { addr: addr.clone(), source })?;
		let (stop, _) = watch::channel(false);
		Ok(Self {
			listener,
			loopback_only: config.loopback_only,
			spawner: spawner.with_options(config.session.clone()),
			stop,
		})
	}

	pub fn local_addr(&self) -> Result<SocketAddr> {
		Ok(self.listener.local_addr()?)
	}

	pub fn sessions(&self) -> &SessionTable {
		self.spawner.sessions()
	}

	/// Accepts connections until [`shutdown`](Self::shutdown) is called.
	pub async fn serve(&self) -> Result<()> {
		let mut stop = self.stop.subscribe();
		info!(target = "rrepl.server", addr = %self.local_addr()?, "listening");
		while !*stop.borrow_and_update() {
			tokio::select! {
				accepted = self.listener.accept() => match accepted {
					Ok((stream, peer)) => {
						if let Err(err) = self.admit(stream, peer) {
							warn!(target = "rrepl.server", %peer, %err, "connection refused");
						}
					}
					Err(err) => warn!(target = "rrepl.server", %err, "accept failed"),
				},
				_ = stop.changed() => {}
			}
		}
		info!(target = "rrepl.server", "listener stopped");
		Ok(())
	}

	/// Stops accepting and asks every live session to quit.
	pub fn shutdown(&self) {
		self.stop.send_replace(true);
		self.spawner.sessions().shutdown_all();
	}

	fn admit(&self, stream: TcpStream, peer: SocketAddr) -> Result<SessionId> {
		check_peer(self.loopback_only, peer)?;
		let id = self.spawner.spawn(Box::new(TcpTransport::new(stream, peer)));
		info!(target = "rrepl.server", session = %id, %peer, "accepted");
		Ok(id)
	}
}

/// Rejects non-loopback peers when `loopback_only` is set.
pub fn check_peer(loopback_only: bool, peer: SocketAddr) -> Result<()> {
	if loopback_only && !peer.ip().is_loopback() {
		return Err(Error::Refused(peer));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remote_peers_need_permission() {
		let remote: SocketAddr = "192.0.2.7:5000".parse().unwrap();
		let local: SocketAddr = "127.0.0.1:5000".parse().unwrap();
		assert!(matches!(check_peer(true, remote), Err(Error::Refused(peer)) if peer == remote));
		assert!(check_peer(true, local).is_ok());
		assert!(check_peer(false, remote).is_ok());
	}

	#[test]
	fn default_config_listens_on_loopback() {
		let config = ServerConfig::default();
		assert_eq!(config.addr(), "127.0.0.1:4242");
		assert!(config.loopback_only);
	}
}
