//! In-memory transport for driving session actors without sockets.
//!
//! # Example
//!
//! ```ignore
//! let (transport, controller) = FakeTransportBuilder::new().build();
//! spawner.spawn(Box::new(transport));
//!
//! controller.read_until("repl> ").await;
//! controller.send("1 + 1\n");
//! assert_eq!(controller.read_until("repl> ").await, "2\nrepl> ");
//! ```

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use rrepl::{InputSource, OutputSink};
use tokio::sync::Notify;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::SessionEvent;
use crate::transport::{Endpoints, Transport};

const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for creating fake transport instances.
#[derive(Debug, Default)]
pub struct FakeTransportBuilder {
	read_timeout: Option<Duration>,
}

impl FakeTransportBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	/// How long [`FakeTransportController::read_until`] waits before giving
	/// up.
	pub fn read_timeout(mut self, timeout: Duration) -> Self {
		self.read_timeout = Some(timeout);
		self
	}

	/// Returns the transport to hand to a session and a controller for
	/// playing the client.
	pub fn build(self) -> (FakeTransport, FakeTransportController) {
		let shared = Arc::new(Shared::default());
		let transport = FakeTransport {
			shared: Arc::clone(&shared),
		};
		let controller = FakeTransportController {
			shared,
			read_timeout: self.read_timeout.unwrap_or(READ_TIMEOUT),
		};
		(transport, controller)
	}
}

#[derive(Default)]
struct Shared {
	events: Mutex<Option<UnboundedSender<SessionEvent>>>,
	output: Mutex<String>,
	written: Notify,
	input_closed: AtomicBool,
	output_closed: AtomicBool,
}

pub struct FakeTransport {
	shared: Arc<Shared>,
}

impl Transport for FakeTransport {
	fn attach(self: Box<Self>, events: UnboundedSender<SessionEvent>) -> Endpoints {
		*self.shared.events.lock() = Some(events);
		Endpoints {
			input: Box::new(FakeInput {
				shared: Arc::clone(&self.shared),
			}),
			output: Box::new(FakeOutput { shared: self.shared }),
		}
	}
}

struct FakeInput {
	shared: Arc<Shared>,
}

impl InputSource for FakeInput {
	fn close(&mut self) {
		self.shared.input_closed.store(true, Ordering::SeqCst);
	}
}

struct FakeOutput {
	shared: Arc<Shared>,
}

impl OutputSink for FakeOutput {
	fn write(&mut self, text: &str) -> io::Result<()> {
		if self.shared.output_closed.load(Ordering::SeqCst) {
			return Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed"));
		}
		self.shared.output.lock().push_str(text);
		self.shared.written.notify_one();
		Ok(())
	}

	fn close(&mut self) {
		self.shared.output_closed.store(true, Ordering::SeqCst);
		self.shared.written.notify_one();
	}
}

/// The client side of a [`FakeTransport`].
pub struct FakeTransportController {
	shared: Arc<Shared>,
	read_timeout: Duration,
}

impl FakeTransportController {
	/// Delivers `chunk` as client input. Returns false before the transport
	/// is attached or after the session stopped listening.
	pub fn send(&self, chunk: &str) -> bool {
		self.post(SessionEvent::Input(chunk.to_string()))
	}

	/// Simulates the client hanging up.
	pub fn close(&self) -> bool {
		self.post(SessionEvent::PeerClosed)
	}

	fn post(&self, event: SessionEvent) -> bool {
		match self.shared.events.lock().as_ref() {
			Some(events) => events.send(event).is_ok(),
			None => false,
		}
	}

	/// Takes everything written so far.
	pub fn take_output(&self) -> String {
		std::mem::take(&mut *self.shared.output.lock())
	}

	/// Waits until the written text ends with `suffix` or the output is
	/// closed, then takes it. Gives back whatever arrived if the read
	/// timeout passes first.
	pub async fn read_until(&self, suffix: &str) -> String {
		let deadline = tokio::time::Instant::now() + self.read_timeout;
		loop {
			if self.shared.output.lock().ends_with(suffix) || self.is_output_closed() {
				return self.take_output();
			}
			if tokio::time::timeout_at(deadline, self.shared.written.notified()).await.is_err() {
				return self.take_output();
			}
		}
	}

	pub fn is_input_closed(&self) -> bool {
		self.shared.input_closed.load(Ordering::SeqCst)
	}

	pub fn is_output_closed(&self) -> bool {
		self.shared.output_closed.load(Ordering::SeqCst)
	}
}
