use rrepl::ScopeId;

/// Everything that can happen to a session, delivered to its actor in
/// arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// A decoded chunk of client input.
	Input(String),
	/// The client closed its side of the stream or the read failed.
	PeerClosed,
	/// The host destroyed a scope the session may be anchored to.
	HostTeardown(ScopeId),
	/// The listener is shutting down.
	Shutdown,
}
