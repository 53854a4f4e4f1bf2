//! Capability interface onto host-owned scopes.
//!
//! The session engine never sees the host's object graph directly. It asks a
//! scope the handful of questions it needs (is it top-level, is a name taken,
//! what does it contain) and binds or unbinds its own handle by name. Hosts
//! that fire "about to go away" notifications expose them through teardown
//! listeners.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use downcast_rs::{DowncastSync, impl_downcast};

/// Identity of a scope, stable for the scope's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u64);

impl ScopeId {
	/// Allocates a process-unique id.
	pub fn next() -> Self {
		static NEXT: AtomicU64 = AtomicU64::new(1);
		Self(NEXT.fetch_add(1, Ordering::Relaxed))
	}
}

impl std::fmt::Display for ScopeId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "scope#{}", self.0)
	}
}

/// Identity of a session within its listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "session#{}", self.0)
	}
}

/// What a session binds into scopes under its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
	pub id: SessionId,
}

impl SessionHandle {
	pub fn new(id: SessionId) -> Self {
		Self { id }
	}
}

/// Registration token returned by [`Scope::add_teardown_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Called with the id of a scope that is about to be destroyed.
pub type TeardownListener = Arc<dyn Fn(ScopeId) + Send + Sync>;

/// Shared handle to a host scope.
pub type ScopeRef = Arc<dyn Scope>;

/// Shallow description of one member of a scope.
#[derive(Clone)]
pub struct Member {
	pub name: String,
	pub kind: MemberKind,
	/// Documentation attached to the member, if the host has any.
	pub doc: Option<String>,
	/// The member itself as a scope, when it can be descended into.
	pub child: Option<ScopeRef>,
}

impl std::fmt::Debug for Member {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Member")
			.field("name", &self.name)
			.field("kind", &self.kind)
			.field("doc", &self.doc)
			.field("child", &self.child.as_ref().map(|c| c.id()))
			.finish()
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberKind {
	/// A nested object; `len` is set for array-like objects.
	Object { len: Option<usize> },
	Function,
	/// A session handle bound by name.
	Session,
	/// A primitive, already rendered.
	Value(String),
}

/// An evaluation environment owned by the host.
///
/// Implementations must be safe to call from any session's actor; binding
/// and unbinding are serialized by the caller's name registry.
pub trait Scope: DowncastSync {
	fn id(&self) -> ScopeId;

	/// Whether this is a root-like scope (a window rather than something
	/// nested inside one).
	fn is_top_level(&self) -> bool;

	fn contains(&self, name: &str) -> bool;

	fn bind(&self, name: &str, handle: SessionHandle);

	fn unbind(&self, name: &str);

	/// One-line description shown by `whereAmI`.
	fn label(&self) -> String;

	fn members(&self) -> Vec<Member>;

	/// Registers a listener fired before the scope is destroyed. Returns
	/// `None` when the scope has no lifecycle notifications.
	fn add_teardown_listener(&self, _listener: TeardownListener) -> Option<ListenerId> {
		None
	}

	fn remove_teardown_listener(&self, _id: ListenerId) {}
}
impl_downcast!(sync Scope);

/// Supplies the scope new sessions are created in.
pub trait Host: Send + Sync {
	fn creation_scope(&self) -> ScopeRef;
}

/// Compares two scope handles by identity.
pub fn same_scope(a: &ScopeRef, b: &ScopeRef) -> bool {
	a.id() == b.id()
}
