//! Test doubles for the session engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;
use rrepl_protocol::Diagnostic;
use serde_json::Value;

use crate::eval::{Evaluation, Evaluator, Repl, Target};
use crate::io::{InputSource, OutputSink, SessionOwner};
use crate::scope::{ListenerId, Member, MemberKind, Scope, ScopeId, ScopeRef, SessionHandle, SessionId, TeardownListener};

struct Entry {
	name: String,
	kind: MemberKind,
	doc: Option<String>,
	child: Option<ScopeRef>,
	session: Option<SessionHandle>,
}

/// Scope backed by an ordered member list.
pub struct MemoryScope {
	id: ScopeId,
	top_level: bool,
	label: String,
	entries: Mutex<Vec<Entry>>,
	listeners: Mutex<Vec<(ListenerId, TeardownListener)>>,
	next_listener: AtomicU64,
}

impl MemoryScope {
	fn build(label: &str, top_level: bool) -> Arc<Self> {
		Arc::new(Self {
			id: ScopeId::next(),
			top_level,
			label: label.to_string(),
			entries: Mutex::new(Vec::new()),
			listeners: Mutex::new(Vec::new()),
			next_listener: AtomicU64::new(1),
		})
	}

	pub fn top_level(label: &str) -> Arc<Self> {
		Self::build(label, true)
	}

	pub fn nested(label: &str) -> Arc<Self> {
		Self::build(label, false)
	}

	pub fn define(&self, name: &str, kind: MemberKind) {
		self.push(name, kind, None, None);
	}

	pub fn define_documented(&self, name: &str, kind: MemberKind, doc: &str) {
		self.push(name, kind, Some(doc.to_string()), None);
	}

	pub fn define_child(&self, name: &str, child: Arc<MemoryScope>, len: Option<usize>) {
		self.push(name, MemberKind::Object { len }, None, Some(child as ScopeRef));
	}

	fn push(&self, name: &str, kind: MemberKind, doc: Option<String>, child: Option<ScopeRef>) {
		self.entries.lock().push(Entry {
			name: name.to_string(),
			kind,
			doc,
			child,
			session: None,
		});
	}

	pub fn session_bound(&self, name: &str) -> Option<SessionHandle> {
		self.entries
			.lock()
			.iter()
			.find(|entry| entry.name == name)
			.and_then(|entry| entry.session)
	}

	pub fn listener_count(&self) -> usize {
		self.listeners.lock().len()
	}

	/// Fires every teardown listener, as the host would before destroying
	/// the scope.
	pub fn teardown(&self) {
		let listeners: Vec<TeardownListener> = self.listeners.lock().iter().map(|(_, l)| l.clone()).collect();
		for listener in listeners {
			listener(self.id);
		}
	}
}

impl Scope for MemoryScope {
	fn id(&self) -> ScopeId {
		self.id
	}

	fn is_top_level(&self) -> bool {
		self.top_level
	}

	fn contains(&self, name: &str) -> bool {
		self.entries.lock().iter().any(|entry| entry.name == name)
	}

	fn bind(&self, name: &str, handle: SessionHandle) {
		let mut entries = self.entries.lock();
		entries.retain(|entry| entry.name != name);
		entries.push(Entry {
			name: name.to_string(),
			kind: MemberKind::Session,
			doc: None,
			child: None,
			session: Some(handle),
		});
	}

	fn unbind(&self, name: &str) {
		self.entries.lock().retain(|entry| entry.name != name);
	}

	fn label(&self) -> String {
		format!("[scope {}]", self.label)
	}

	fn members(&self) -> Vec<Member> {
		self.entries
			.lock()
			.iter()
			.map(|entry| Member {
				name: entry.name.clone(),
				kind: entry.kind.clone(),
				doc: entry.doc.clone(),
				child: entry.child.clone(),
			})
			.collect()
	}

	fn add_teardown_listener(&self, listener: TeardownListener) -> Option<ListenerId> {
		if !self.top_level {
			return None;
		}
		let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
		self.listeners.lock().push((id, listener));
		Some(id)
	}

	fn remove_teardown_listener(&self, id: ListenerId) {
		self.listeners.lock().retain(|(existing, _)| *existing != id);
	}
}

/// Output sink that records everything written to it.
#[derive(Clone, Default)]
pub struct RecordingSink {
	text: Arc<Mutex<String>>,
	closed: Arc<AtomicBool>,
}

impl RecordingSink {
	pub fn text(&self) -> String {
		self.text.lock().clone()
	}

	/// Returns and forgets the output so far.
	pub fn take(&self) -> String {
		std::mem::take(&mut *self.text.lock())
	}

	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}
}

impl OutputSink for RecordingSink {
	fn write(&mut self, text: &str) -> std::io::Result<()> {
		self.text.lock().push_str(text);
		Ok(())
	}

	fn close(&mut self) {
		self.closed.store(true, Ordering::SeqCst);
	}
}

#[derive(Clone, Default)]
pub struct RecordingInput {
	closed: Arc<AtomicBool>,
}

impl RecordingInput {
	pub fn is_closed(&self) -> bool {
		self.closed.load(Ordering::SeqCst)
	}
}

impl InputSource for RecordingInput {
	fn close(&mut self) {
		self.closed.store(true, Ordering::SeqCst);
	}
}

#[derive(Clone, Default)]
pub struct RecordingOwner {
	released: Arc<Mutex<Vec<SessionId>>>,
}

impl RecordingOwner {
	pub fn released(&self) -> Vec<SessionId> {
		self.released.lock().clone()
	}
}

impl SessionOwner for RecordingOwner {
	fn release(&self, id: SessionId) {
		self.released.lock().push(id);
	}
}

/// Evaluator with a fixed command vocabulary.
///
/// * `a + b` on integers evaluates to the sum
/// * more `(` than `)` is incomplete
/// * `fail <msg>` fails with a ReferenceError carrying a stack
/// * `nothing` and empty code produce no value
/// * `print <text>`, `setenv <k> <json>`, `enter <child>`, `back`,
///   `home`, `rename <name>`, `quit`, `look`, `whereAmI`, `search <c>`,
///   `doc <topic>` and `load <url>` call the session
/// * anything else is echoed back
#[derive(Clone, Default)]
pub struct ScriptedEvaluator {
	seen: Arc<Mutex<Vec<(String, bool)>>>,
	line_only: bool,
}

impl ScriptedEvaluator {
	/// An evaluator that cannot tell incomplete input apart.
	pub fn line_only() -> Self {
		Self {
			line_only: true,
			..Self::default()
		}
	}

	/// Code evaluated so far, paired with whether it targeted the session.
	pub fn seen(&self) -> Vec<(String, bool)> {
		self.seen.lock().clone()
	}

	/// Code evaluated against scopes so far.
	pub fn evaluated(&self) -> Vec<String> {
		self.seen().into_iter().filter(|(_, session)| !session).map(|(code, _)| code).collect()
	}
}

impl Evaluator for ScriptedEvaluator {
	fn evaluate(&self, code: &str, target: Target, repl: &mut dyn Repl) -> Evaluation {
		self.seen.lock().push((code.to_string(), matches!(target, Target::Session)));
		if code.matches('(').count() > code.matches(')').count() {
			return Evaluation::Incomplete(Diagnostic::new("SyntaxError", "missing ) after argument list"));
		}
		let mut last = Evaluation::Completed(None);
		for statement in code.lines().map(str::trim).filter(|s| !s.is_empty()) {
			last = self.statement(statement, repl);
			if !matches!(last, Evaluation::Completed(_)) {
				break;
			}
		}
		last
	}

	fn detects_incomplete(&self) -> bool {
		!self.line_only
	}
}

impl ScriptedEvaluator {
	fn statement(&self, code: &str, repl: &mut dyn Repl) -> Evaluation {
		let (word, rest) = code.split_once(' ').unwrap_or((code, ""));
		match word {
			"nothing" => Evaluation::Completed(None),
			"fail" => Evaluation::Failed(
				Diagnostic::new("ReferenceError", format!("{rest} is not defined")).with_stack("@<input>:1\n"),
			),
			"print" => {
				repl.print(rest, true);
				Evaluation::Completed(None)
			}
			"setenv" => {
				let (key, raw) = rest.split_once(' ').unwrap_or((rest, "null"));
				let value = serde_json::from_str(raw).unwrap_or(Value::String(raw.to_string()));
				Evaluation::Completed(Some(repl.setenv(key, value).to_string()))
			}
			"enter" => match find_child(&repl.work_scope(), rest) {
				Some(scope) => {
					repl.enter(scope);
					Evaluation::Completed(None)
				}
				None => Evaluation::Failed(Diagnostic::new("TypeError", format!("{rest} is not a scope"))),
			},
			"back" => {
				repl.back();
				Evaluation::Completed(None)
			}
			"home" => {
				repl.home();
				Evaluation::Completed(None)
			}
			"rename" => Evaluation::Completed(Some(repl.rename(rest).to_string())),
			"quit" => {
				repl.quit();
				Evaluation::Completed(None)
			}
			"look" => {
				repl.look();
				Evaluation::Completed(None)
			}
			"whereAmI" => {
				repl.where_am_i();
				Evaluation::Completed(None)
			}
			"search" => {
				repl.search(rest, None);
				Evaluation::Completed(None)
			}
			"doc" => {
				repl.doc(rest);
				Evaluation::Completed(None)
			}
			"load" => match repl.fetch_script(rest) {
				Ok(source) => Evaluation::Completed(Some(source)),
				Err(err) => Evaluation::Failed(Diagnostic::new("Error", err.to_string())),
			},
			_ => match sum(code) {
				Some(total) => Evaluation::Completed(Some(total.to_string())),
				None => Evaluation::Completed(Some(code.to_string())),
			},
		}
	}
}

fn find_child(scope: &ScopeRef, name: &str) -> Option<ScopeRef> {
	scope.members().into_iter().find(|m| m.name == name).and_then(|m| m.child)
}

fn sum(code: &str) -> Option<i64> {
	let (a, b) = code.split_once('+')?;
	Some(a.trim().parse::<i64>().ok()? + b.trim().parse::<i64>().ok()?)
}
