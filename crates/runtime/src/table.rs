//! Live sessions of one listener.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rrepl::{SessionId, SessionOwner};
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::event::SessionEvent;

/// Maps each live session to its actor's event channel.
///
/// Cloning shares the table. A session removes itself through
/// [`SessionOwner::release`] when it quits.
#[derive(Clone, Default)]
pub struct SessionTable {
	inner: Arc<Mutex<HashMap<SessionId, UnboundedSender<SessionEvent>>>>,
}

impl SessionTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, id: SessionId, events: UnboundedSender<SessionEvent>) {
		self.inner.lock().insert(id, events);
	}

	pub fn contains(&self, id: SessionId) -> bool {
		self.inner.lock().contains_key(&id)
	}

	pub fn len(&self) -> usize {
		self.inner.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn ids(&self) -> Vec<SessionId> {
		let mut ids: Vec<SessionId> = self.inner.lock().keys().copied().collect();
		ids.sort();
		ids
	}

	/// Posts `event` to one session. Returns false when the session is gone.
	pub fn send(&self, id: SessionId, event: SessionEvent) -> bool {
		match self.inner.lock().get(&id) {
			Some(events) => events.send(event).is_ok(),
			None => false,
		}
	}

	/// Asks every live session to quit.
	pub fn shutdown_all(&self) {
		let senders: Vec<_> = self.inner.lock().values().cloned().collect();
		debug!(target = "rrepl.server", sessions = senders.len(), "shutting down sessions");
		for events in senders {
			let _ = events.send(SessionEvent::Shutdown);
		}
	}
}

impl SessionOwner for SessionTable {
	fn release(&self, id: SessionId) {
		if self.inner.lock().remove(&id).is_some() {
			debug!(target = "rrepl.server", session = %id, "session released");
		}
	}
}

#[cfg(test)]
mod tests {
	use tokio::sync::mpsc;

	use super::*;

	#[test]
	fn release_forgets_the_session() {
		let table = SessionTable::new();
		let (tx, _rx) = mpsc::unbounded_channel();
		table.insert(SessionId(1), tx);
		assert!(table.contains(SessionId(1)));

		table.release(SessionId(1));
		assert!(table.is_empty());
		table.release(SessionId(1));
	}

	#[test]
	fn shutdown_reaches_every_session() {
		let table = SessionTable::new();
		let (tx1, mut rx1) = mpsc::unbounded_channel();
		let (tx2, mut rx2) = mpsc::unbounded_channel();
		table.insert(SessionId(1), tx1);
		table.insert(SessionId(2), tx2);

		table.shutdown_all();
		assert_eq!(rx1.try_recv().ok(), Some(SessionEvent::Shutdown));
		assert_eq!(rx2.try_recv().ok(), Some(SessionEvent::Shutdown));
		assert_eq!(table.ids(), vec![SessionId(1), SessionId(2)]);
	}

	#[test]
	fn send_to_unknown_session_fails() {
		let table = SessionTable::new();
		assert!(!table.send(SessionId(9), SessionEvent::Shutdown));
	}
}
