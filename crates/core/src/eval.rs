//! The evaluator seam and the session API handed to it.

use rrepl_protocol::Diagnostic;
use serde_json::Value;

use crate::error::Result;
use crate::scope::{ScopeRef, SessionId};

/// Where a unit of code runs.
#[derive(Clone)]
pub enum Target {
	/// A host scope, normally the session's work scope.
	Scope(ScopeRef),
	/// The session object itself. Used for the initialization script so
	/// that it can call session operations unqualified.
	Session,
}

impl std::fmt::Debug for Target {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Target::Scope(scope) => f.debug_tuple("Scope").field(&scope.id()).finish(),
			Target::Session => f.write_str("Session"),
		}
	}
}

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
	/// Ran to completion. `None` is the "no value" result and prints
	/// nothing.
	Completed(Option<String>),
	/// The text is a valid but unterminated prefix. The diagnostic is
	/// only shown when evaluation was forced.
	Incomplete(Diagnostic),
	Failed(Diagnostic),
}

impl Evaluation {
	pub fn is_incomplete(&self) -> bool {
		matches!(self, Evaluation::Incomplete(_))
	}

	pub fn is_failed(&self) -> bool {
		matches!(self, Evaluation::Failed(_))
	}
}

/// Runs code on behalf of a session.
///
/// Evaluation is synchronous. The evaluator may call back into the session
/// through `repl` while it runs, which is how navigation commands, `print`
/// and settings reach the session.
pub trait Evaluator: Send + Sync {
	fn evaluate(&self, code: &str, target: Target, repl: &mut dyn Repl) -> Evaluation;

	/// Whether [`Evaluation::Incomplete`] is ever reported. When false the
	/// session frames `syntax` input line by line instead.
	fn detects_incomplete(&self) -> bool {
		true
	}
}

/// Operations a session exposes to the code it evaluates.
pub trait Repl {
	fn id(&self) -> SessionId;

	fn name(&self) -> &str;

	fn work_scope(&self) -> ScopeRef;

	fn host_scope(&self) -> ScopeRef;

	fn creation_scope(&self) -> ScopeRef;

	/// Writes `text`, followed by a newline unless `newline` is false.
	fn print(&mut self, text: &str, newline: bool);

	fn setenv(&mut self, name: &str, value: Value) -> Value;

	fn getenv(&self, name: &str) -> Option<Value>;

	fn pushenv(&mut self, names: &[&str]) -> Option<Value>;

	fn popenv(&mut self, names: &[&str]) -> Option<Value>;

	/// Makes `scope` the work scope, remembering the current one.
	fn enter(&mut self, scope: ScopeRef) -> ScopeRef;

	/// Returns to the previous work scope. `None` when there is no history.
	fn back(&mut self) -> Option<ScopeRef>;

	/// Enters the creation scope.
	fn home(&mut self) -> ScopeRef;

	/// Returns whether the rename happened. Collisions are reported to the
	/// client.
	fn rename(&mut self, name: &str) -> bool;

	fn quit(&mut self);

	fn look(&mut self);

	fn inspect(&mut self, scope: &ScopeRef, max_depth: usize, name: &str);

	fn where_am_i(&mut self);

	/// Prints member names equal to `criteria`, or matching it as a regular
	/// expression when written `/pattern/`. Searches the work scope unless
	/// another is given.
	fn search(&mut self, criteria: &str, scope: Option<&ScopeRef>);

	fn doc(&mut self, topic: &str);

	/// Fetches script source for the evaluator to run.
	fn fetch_script(&self, url: &str) -> Result<String>;
}
