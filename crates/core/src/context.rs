//! Navigation between host scopes.

use crate::scope::{ScopeRef, same_scope};

/// Result of a navigation step.
#[derive(Clone)]
pub struct Move {
	/// The new work scope.
	pub scope: ScopeRef,
	/// The session must re-anchor onto `scope` before using it.
	pub migrate: bool,
}

/// A session's work scope, the history behind it, and the two scopes it is
/// anchored to.
///
/// The stack only decides *whether* a move crosses into a different
/// top-level scope. Re-anchoring itself touches shared scopes and is done
/// by the session through its name registry, followed by [`set_host`].
///
/// [`set_host`]: ContextStack::set_host
pub struct ContextStack {
	creation: ScopeRef,
	host: ScopeRef,
	work: ScopeRef,
	history: Vec<ScopeRef>,
}

impl ContextStack {
	pub fn new(creation: ScopeRef) -> Self {
		Self {
			host: creation.clone(),
			work: creation.clone(),
			creation,
			history: Vec::new(),
		}
	}

	pub fn creation(&self) -> &ScopeRef {
		&self.creation
	}

	pub fn host(&self) -> &ScopeRef {
		&self.host
	}

	pub fn work(&self) -> &ScopeRef {
		&self.work
	}

	pub fn depth(&self) -> usize {
		self.history.len()
	}

	/// Makes `scope` the work scope and remembers the current one, even when
	/// they are the same, so that [`back`](Self::back) always undoes it.
	pub fn enter(&mut self, scope: ScopeRef) -> Move {
		let previous = std::mem::replace(&mut self.work, scope.clone());
		self.history.push(previous);
		Move {
			migrate: self.needs_migration(&scope),
			scope,
		}
	}

	/// Pops the history. `None` when there is nowhere to go back to.
	pub fn back(&mut self) -> Option<Move> {
		let scope = self.history.pop()?;
		self.work = scope.clone();
		Some(Move {
			migrate: self.needs_migration(&scope),
			scope,
		})
	}

	pub fn home(&mut self) -> Move {
		self.enter(self.creation.clone())
	}

	/// Whether anchoring to `scope` means leaving the current host.
	pub fn needs_migration(&self, scope: &ScopeRef) -> bool {
		scope.is_top_level() && !same_scope(scope, &self.host)
	}

	/// Replaces the host scope, returning the old one.
	pub fn set_host(&mut self, scope: ScopeRef) -> ScopeRef {
		std::mem::replace(&mut self.host, scope)
	}
}
