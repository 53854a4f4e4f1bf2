//! Transport endpoints and the listener callback, as seen by a session.

use std::io::Write;

use crate::scope::SessionId;

/// Write half of a session's transport.
pub trait OutputSink: Send {
	fn write(&mut self, text: &str) -> std::io::Result<()>;

	fn close(&mut self) {}
}

/// Read half of a session's transport. Data arrives as events, so the
/// session only ever closes it.
pub trait InputSource: Send {
	fn close(&mut self);
}

/// The listener that owns a session and must forget it on quit.
pub trait SessionOwner: Send + Sync {
	fn release(&self, id: SessionId);
}

/// Owner for sessions nobody tracks.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unowned;

impl SessionOwner for Unowned {
	fn release(&self, _id: SessionId) {}
}

/// Input source with nothing to close.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInput;

impl InputSource for NoInput {
	fn close(&mut self) {}
}

/// Sink over any [`Write`], flushed after every write.
#[derive(Debug)]
pub struct WriterSink<W> {
	inner: W,
}

impl<W: Write + Send> WriterSink<W> {
	pub fn new(inner: W) -> Self {
		Self { inner }
	}

	pub fn into_inner(self) -> W {
		self.inner
	}
}

impl<W: Write + Send> OutputSink for WriterSink<W> {
	fn write(&mut self, text: &str) -> std::io::Result<()> {
		self.inner.write_all(text.as_bytes())?;
		self.inner.flush()
	}

	fn close(&mut self) {
		let _ = self.inner.flush();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn writer_sink_passes_text_through() {
		let mut sink = WriterSink::new(Vec::new());
		sink.write("repl> ").unwrap();
		sink.write("2\n").unwrap();
		assert_eq!(sink.into_inner(), b"repl> 2\n");
	}
}
