//! The per-session actor.
//!
//! A session is not thread-safe and evaluation blocks, so each one lives on
//! its own blocking thread and reacts to [`SessionEvent`]s one at a time.

use rrepl::{Repl, Session, SessionBuilder};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::event::SessionEvent;

/// Builds the session on a blocking thread and drives it until it closes.
pub fn spawn(builder: SessionBuilder, events: UnboundedReceiver<SessionEvent>) -> JoinHandle<()> {
	tokio::task::spawn_blocking(move || run(builder.build(), events))
}

/// Applies events to `session` until it is closed or every sender is gone.
pub fn run(mut session: Session, mut events: UnboundedReceiver<SessionEvent>) {
	let id = session.handle().id;
	while !session.is_closed() {
		let Some(event) = events.blocking_recv() else {
			debug!(target = "rrepl.session", session = %id, "event channel closed");
			session.quit();
			break;
		};
		match event {
			SessionEvent::Input(chunk) => session.feed(&chunk),
			SessionEvent::HostTeardown(scope) => session.on_host_teardown(scope),
			SessionEvent::PeerClosed | SessionEvent::Shutdown => {
				debug!(target = "rrepl.session", session = %id, ?event, "closing");
				session.quit();
			}
		}
	}
	debug!(target = "rrepl.session", session = %id, "actor finished");
}
