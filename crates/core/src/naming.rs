//! Session names inside shared host scopes.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{Error, Place, Result};
use crate::scope::{ScopeRef, SessionHandle, same_scope};

/// First free name of the form `base`, `base1`, `base2`, ... in `scope`.
pub fn choose_name(base: &str, scope: &ScopeRef) -> String {
	if !scope.contains(base) {
		return base.to_string();
	}
	(1u64..)
		.map(|n| format!("{base}{n}"))
		.find(|candidate| !scope.contains(candidate))
		.unwrap_or_else(|| base.to_string())
}

/// Serializes every bind and unbind a group of sessions performs on shared
/// scopes.
///
/// Clones share one lock, so a listener hands a clone to each session it
/// creates and two sessions can never settle on the same free name.
#[derive(Clone, Default)]
pub struct NameRegistry {
	guard: Arc<Mutex<()>>,
}

impl NameRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Picks a free name in `scope` and binds `handle` under it.
	pub fn register(&self, base: &str, scope: &ScopeRef, handle: SessionHandle) -> String {
		let _held = self.guard.lock();
		let name = choose_name(base, scope);
		scope.bind(&name, handle);
		debug!(target = "rrepl.session", session = %handle.id, name = %name, scope = %scope.id(), "registered");
		name
	}

	/// Moves `handle` from `old` to `new` in both scopes. Nothing changes
	/// when `new` is already taken in either.
	pub fn rename(
		&self,
		old: &str,
		new: &str,
		host: &ScopeRef,
		creation: &ScopeRef,
		handle: SessionHandle,
	) -> Result<()> {
		let _held = self.guard.lock();
		if host.contains(new) {
			return Err(Error::NameTaken {
				name: new.to_string(),
				place: Place::Host,
			});
		}
		if creation.contains(new) {
			return Err(Error::NameTaken {
				name: new.to_string(),
				place: Place::Creation,
			});
		}
		creation.unbind(old);
		host.unbind(old);
		creation.bind(new, handle);
		host.bind(new, handle);
		Ok(())
	}

	/// Re-anchors `name` from the `from` host to the `to` host. The
	/// creation-scope binding is left in place.
	pub fn rebind(&self, name: &str, from: &ScopeRef, to: &ScopeRef, creation: &ScopeRef, handle: SessionHandle) {
		let _held = self.guard.lock();
		if !same_scope(from, creation) {
			from.unbind(name);
		}
		if to.contains(name) && !same_scope(to, creation) {
			warn!(target = "rrepl.session", session = %handle.id, name, scope = %to.id(), "overwriting existing binding");
		}
		to.bind(name, handle);
	}

	/// Drops `name` from both anchor scopes.
	pub fn release(&self, name: &str, host: &ScopeRef, creation: &ScopeRef) {
		let _held = self.guard.lock();
		host.unbind(name);
		if !same_scope(host, creation) {
			creation.unbind(name);
		}
	}
}
