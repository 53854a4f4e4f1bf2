use std::sync::Arc;

use anyhow::{Context, Result};
use rrepl_runtime::{SessionServer, SessionSpawner};
use rrepl_sandbox::{Desktop, Interpreter};
use tracing::info;

use crate::config::Settings;

pub async fn run(settings: &Settings) -> Result<()> {
	let desktop = Desktop::new();
	let spawner = SessionSpawner::new(desktop.clone(), Arc::new(Interpreter::new(desktop)));
	let config = settings.server_config();
	let server = SessionServer::bind(&config, spawner)
		.await
		.with_context(|| format!("failed to start listener on {}", config.addr()))?;
	let server = Arc::new(server);
	let addr = server.local_addr()?;
	eprintln!("rrepl listening on {addr}");

	let mut serving = tokio::spawn({
		let server = Arc::clone(&server);
		async move { server.serve().await }
	});

	tokio::select! {
		result = &mut serving => {
			result.context("listener task failed")??;
		}
		signal = tokio::signal::ctrl_c() => {
			signal.context("failed to wait for Ctrl-C")?;
			info!(target = "rrepl.server", "interrupted, shutting down");
			server.shutdown();
			serving.await.context("listener task failed")??;
		}
	}
	Ok(())
}
