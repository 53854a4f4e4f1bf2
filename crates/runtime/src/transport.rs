//! Byte stream plumbing between a client and its session actor.

use rrepl::{InputSource, OutputSink};
use tokio::sync::mpsc::UnboundedSender;

use crate::event::SessionEvent;

/// The two halves a session is built with.
pub struct Endpoints {
	pub input: Box<dyn InputSource>,
	pub output: Box<dyn OutputSink>,
}

/// A client connection that can be wired to a session actor.
///
/// `attach` starts whatever reading the transport needs and posts each
/// decoded chunk to `events` as [`SessionEvent::Input`], followed by a
/// single [`SessionEvent::PeerClosed`] when the client goes away. It must
/// be called from within a tokio runtime.
pub trait Transport: Send {
	fn attach(self: Box<Self>, events: UnboundedSender<SessionEvent>) -> Endpoints;
}
