//! The session controller.
//!
//! A [`Session`] owns everything one connected client sees: its name in the
//! host scopes, its navigation stack, its settings and its input buffer.
//! Transports call [`Session::feed`] for every chunk that arrives and
//! [`Session::quit`] when the stream closes; host teardown notifications
//! arrive through [`Session::on_host_teardown`]. None of these may run
//! concurrently for one session. The runtime guarantees that by driving each
//! session from a single actor.

use std::sync::Arc;

use rrepl_protocol::settings::{DEFAULT_BASE_NAME, DEFAULT_SENTINEL};
use rrepl_protocol::{InputMode, continuation_prompt, prompt};
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use crate::context::{ContextStack, Move};
use crate::docs::{BuiltinDocs, DocLookup};
use crate::env::Environment;
use crate::error::Result;
use crate::eval::{Evaluation, Evaluator, Repl, Target};
use crate::framer::{InputFramer, SyntaxStep};
use crate::inspect::{self, Criteria};
use crate::io::{InputSource, NoInput, OutputSink, SessionOwner, Unowned};
use crate::loader::{NoLoader, ScriptLoader};
use crate::naming::NameRegistry;
use crate::scope::{ListenerId, ScopeId, ScopeRef, SessionHandle, SessionId, TeardownListener};


/// Configures and creates a [`Session`].
pub struct SessionBuilder {
	id: SessionId,
	creation: ScopeRef,
	evaluator: Arc<dyn Evaluator>,
	output: Box<dyn OutputSink>,
	input: Box<dyn InputSource>,
	owner: Arc<dyn SessionOwner>,
	loader: Arc<dyn ScriptLoader>,
	docs: Arc<dyn DocLookup>,
	registry: NameRegistry,
	base_name: String,
	sentinel: String,
	init_url: Option<String>,
	teardown: Option<TeardownListener>,
}

impl SessionBuilder {
	pub fn new(id: SessionId, creation: ScopeRef, evaluator: Arc<dyn Evaluator>, output: Box<dyn OutputSink>) -> Self {
		Self {
			id,
			creation,
			evaluator,
			output,
			input: Box::new(NoInput),
			owner: Arc::new(Unowned),
			loader: Arc::new(NoLoader),
			docs: Arc::new(BuiltinDocs::default()),
			registry: NameRegistry::default(),
			base_name: DEFAULT_BASE_NAME.to_string(),
			sentinel: DEFAULT_SENTINEL.to_string(),
			init_url: None,
			teardown: None,
		}
	}

	pub fn input(mut self, input: Box<dyn InputSource>) -> Self {
		self.input = input;
		self
	}

	pub fn owner(mut self, owner: Arc<dyn SessionOwner>) -> Self {
		self.owner = owner;
		self
	}

	pub fn loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
		self.loader = loader;
		self
	}

	pub fn docs(mut self, docs: Arc<dyn DocLookup>) -> Self {
		self.docs = docs;
		self
	}

	/// Registry shared with the other sessions living in the same scopes.
	pub fn registry(mut self, registry: NameRegistry) -> Self {
		self.registry = registry;
		self
	}

	pub fn base_name(mut self, base: impl Into<String>) -> Self {
		self.base_name = base.into();
		self
	}

	pub fn sentinel(mut self, sentinel: impl Into<String>) -> Self {
		self.sentinel = sentinel.into();
		self
	}

	pub fn init_url(mut self, url: Option<String>) -> Self {
		self.init_url = url;
		self
	}

	/// Listener attached to every top-level scope the session anchors to.
	/// It must hand the scope id back to [`Session::on_host_teardown`] on
	/// the session's own thread.
	pub fn on_teardown(mut self, listener: TeardownListener) -> Self {
		self.teardown = Some(listener);
		self
	}

	/// Registers the session, runs the initialization script and greets the
	/// client.
	pub fn build(self) -> Session {
		let handle = SessionHandle::new(self.id);
		let name = self.registry.register(&self.base_name, &self.creation, handle);

		let mut session = Session {
			id: self.id,
			handle,
			name,
			context: ContextStack::new(self.creation.clone()),
			framer: InputFramer::new(self.sentinel),
			env: Environment::with_defaults(),
			registry: self.registry,
			evaluator: self.evaluator,
			loader: self.loader,
			docs: self.docs,
			owner: self.owner,
			output: self.output,
			input: self.input,
			teardown: self.teardown,
			anchored: None,
			degraded: false,
			closed: false,
		};
		info!(target = "rrepl.session", session = %session.id, name = %session.name, "session created");

		if self.creation.is_top_level() {
			session.attach_teardown(&self.creation);
		}
		if let Some(url) = self.init_url {
			session.load_init(&url);
		}
		session.greet(&self.base_name);
		session.prompt();
		session
	}
}

pub struct Session {
	id: SessionId,
	handle: SessionHandle,
	name: String,
	context: ContextStack,
	framer: InputFramer,
	env: Environment,
	registry: NameRegistry,
	evaluator: Arc<dyn Evaluator>,
	loader: Arc<dyn ScriptLoader>,
	docs: Arc<dyn DocLookup>,
	owner: Arc<dyn SessionOwner>,
	output: Box<dyn OutputSink>,
	input: Box<dyn InputSource>,
	teardown: Option<TeardownListener>,
	/// Scope the teardown listener is currently attached to.
	anchored: Option<(ScopeRef, ListenerId)>,
	/// The client was told `syntax` mode is unavailable.
	degraded: bool,
	closed: bool,
}

impl Session {
	pub fn builder(
		id: SessionId,
		creation: ScopeRef,
		evaluator: Arc<dyn Evaluator>,
		output: Box<dyn OutputSink>,
	) -> SessionBuilder {
		SessionBuilder::new(id, creation, evaluator, output)
	}

	pub fn handle(&self) -> SessionHandle {
		self.handle
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}

	/// Text received but not yet evaluated.
	pub fn pending_input(&self) -> &str {
		self.framer.buffer()
	}

	pub fn history_depth(&self) -> usize {
		self.context.depth()
	}

	pub fn env(&self) -> &Environment {
		&self.env
	}

	/// Handles one chunk of client input.
	pub fn feed(&mut self, chunk: &str) {
		if self.closed {
			return;
		}
		trace!(target = "rrepl.session", session = %self.id, bytes = chunk.len(), "input");
		if self.framer.is_idle(chunk) {
			self.prompt();
			return;
		}
		match self.framing_mode() {
			InputMode::Syntax => self.feed_syntax(chunk),
			mode => {
				self.framer.append(chunk);
				self.drain_units(mode);
			}
		}
	}

	/// Reacts to the host destroying `scope`. Ignored unless `scope` is the
	/// current host scope.
	pub fn on_host_teardown(&mut self, scope: ScopeId) {
		if self.closed || scope != self.context.host().id() {
			debug!(target = "rrepl.session", session = %self.id, %scope, "ignoring stale teardown");
			return;
		}
		self.detach_teardown();
		if scope == self.context.creation().id() {
			info!(target = "rrepl.session", session = %self.id, "creation scope unloading, closing session");
			self.print("Creation context unloading! Closing session.", true);
			self.quit();
			return;
		}
		self.print("Host context unloading! Going back to creation context.", true);
		self.home();
		if self.context.host().id() == scope {
			// The creation scope is nested, so going home did not re-anchor.
			let creation = self.context.creation().clone();
			self.migrate(creation);
		}
		self.prompt();
	}

	fn framing_mode(&mut self) -> InputMode {
		let mode = self.env.input_mode();
		if mode != InputMode::Syntax || self.evaluator.detects_incomplete() {
			return mode;
		}
		if !self.degraded {
			self.degraded = true;
			warn!(target = "rrepl.session", session = %self.id, "evaluator cannot detect incomplete input");
			self.print(
				"This evaluator cannot tell incomplete statements apart; \"syntax\" mode falls back to \"line\".",
				true,
			);
		}
		InputMode::Line
	}

	fn drain_units(&mut self, mode: InputMode) {
		while let Some(unit) = self.framer.next_unit(mode) {
			if unit.trim().is_empty() {
				self.prompt();
			} else {
				let outcome = self.evaluate(&unit);
				self.report(outcome);
			}
			if self.closed || self.framing_mode() != mode {
				break;
			}
		}
	}

	fn feed_syntax(&mut self, chunk: &str) {
		match self.framer.syntax_step(chunk) {
			SyntaxStep::Forced(code) => {
				let outcome = self.evaluate(&code);
				self.report(outcome);
			}
			SyntaxStep::Attempt(code) => {
				let outcome = self.evaluate(&code);
				if self.framer.settle(&outcome) {
					self.continuation_prompt();
				} else {
					self.report(outcome);
				}
			}
		}
	}

	fn evaluate(&mut self, code: &str) -> Evaluation {
		let evaluator = Arc::clone(&self.evaluator);
		let target = Target::Scope(self.context.work().clone());
		let outcome = evaluator.evaluate(code, target, self);
		debug!(
			target = "rrepl.session",
			session = %self.id,
			complete = !outcome.is_incomplete(),
			failed = outcome.is_failed(),
			"evaluated"
		);
		outcome
	}

	fn report(&mut self, outcome: Evaluation) {
		match outcome {
			Evaluation::Completed(Some(text)) => self.print(&text, true),
			Evaluation::Completed(None) => {}
			Evaluation::Incomplete(diagnostic) | Evaluation::Failed(diagnostic) => {
				self.print(&diagnostic.report(), true);
			}
		}
		self.prompt();
	}

	fn prompt(&mut self) {
		if self.env.print_prompt() {
			let text = prompt(&self.name);
			self.write(&text);
		}
	}

	fn continuation_prompt(&mut self) {
		if self.env.print_prompt() {
			let text = continuation_prompt(&self.name);
			self.write(&text);
		}
	}

	fn write(&mut self, text: &str) {
		if self.closed {
			return;
		}
		if let Err(err) = self.output.write(text) {
			warn!(target = "rrepl.session", session = %self.id, %err, "write failed");
		}
	}

	fn load_init(&mut self, url: &str) {
		self.print(&format!("Loading {url}..."), true);
		let source = match self.loader.load(url) {
			Ok(source) => source,
			Err(err) => {
				warn!(target = "rrepl.session", session = %self.id, %url, %err, "initialization script not loaded");
				self.print(&format!("Could not load initialization script {url}: {err}"), true);
				return;
			}
		};
		let evaluator = Arc::clone(&self.evaluator);
		match evaluator.evaluate(&source, Target::Session, self) {
			Evaluation::Completed(_) => {}
			Evaluation::Incomplete(diagnostic) | Evaluation::Failed(diagnostic) => {
				self.print(&format!("Could not load initialization script {url}: {diagnostic}"), true);
			}
		}
	}

	fn greet(&mut self, base: &str) {
		let mode = self.env.input_mode();
		self.print(&format!("Current input mode is: {mode}"), true);
		self.print("", true);
		self.print(
			"If you get stuck at the \"...>\" prompt, enter a semicolon (;) on a line by itself to force evaluation.",
			true,
		);
		self.print("", true);
		if self.name != base {
			self.print(&format!("Another session named \"{base}\" is already running here."), true);
			self.print(&format!("To avoid conflicts, yours will be named \"{}\".", self.name), true);
		}
	}

	fn apply(&mut self, step: Move) -> ScopeRef {
		if step.migrate {
			self.migrate(step.scope.clone());
		}
		step.scope
	}

	/// Re-anchors the session's lifecycle registration onto `to`.
	fn migrate(&mut self, to: ScopeRef) {
		self.detach_teardown();
		let from = self.context.set_host(to.clone());
		self.registry.rebind(&self.name, &from, &to, self.context.creation(), self.handle);
		debug!(target = "rrepl.session", session = %self.id, from = %from.id(), to = %to.id(), "migrated");
		self.attach_teardown(&to);
	}

	fn attach_teardown(&mut self, scope: &ScopeRef) {
		let Some(listener) = self.teardown.clone() else {
			return;
		};
		if let Some(id) = scope.add_teardown_listener(listener) {
			self.anchored = Some((scope.clone(), id));
		}
	}

	fn detach_teardown(&mut self) {
		if let Some((scope, id)) = self.anchored.take() {
			scope.remove_teardown_listener(id);
		}
	}
}

impl Repl for Session {
	fn id(&self) -> SessionId {
		self.id
	}

	fn name(&self) -> &str {
		&self.name
	}

	fn work_scope(&self) -> ScopeRef {
		self.context.work().clone()
	}

	fn host_scope(&self) -> ScopeRef {
		self.context.host().clone()
	}

	fn creation_scope(&self) -> ScopeRef {
		self.context.creation().clone()
	}

	fn print(&mut self, text: &str, newline: bool) {
		if newline {
			self.write(&format!("{text}\n"));
		} else {
			self.write(text);
		}
	}

	fn setenv(&mut self, name: &str, value: Value) -> Value {
		self.env.set(name, value)
	}

	fn getenv(&self, name: &str) -> Option<Value> {
		self.env.get(name).cloned()
	}

	fn pushenv(&mut self, names: &[&str]) -> Option<Value> {
		self.env.push(names)
	}

	fn popenv(&mut self, names: &[&str]) -> Option<Value> {
		self.env.pop(names)
	}

	fn enter(&mut self, scope: ScopeRef) -> ScopeRef {
		let step = self.context.enter(scope);
		self.apply(step)
	}

	fn back(&mut self) -> Option<ScopeRef> {
		let step = self.context.back()?;
		Some(self.apply(step))
	}

	fn home(&mut self) -> ScopeRef {
		let step = self.context.home();
		self.apply(step)
	}

	fn rename(&mut self, name: &str) -> bool {
		let result = self.registry.rename(
			&self.name,
			name,
			self.context.host(),
			self.context.creation(),
			self.handle,
		);
		match result {
			Ok(()) => {
				info!(target = "rrepl.session", session = %self.id, from = %self.name, to = name, "renamed");
				self.name = name.to_string();
				true
			}
			Err(err) => {
				self.print(&err.to_string(), true);
				false
			}
		}
	}

	/// Deregisters the session and closes its endpoints. Calling it again
	/// does nothing.
	fn quit(&mut self) {
		if self.closed {
			return;
		}
		self.detach_teardown();
		self.registry.release(&self.name, self.context.host(), self.context.creation());
		self.closed = true;
		self.input.close();
		self.output.close();
		self.owner.release(self.id);
		info!(target = "rrepl.session", session = %self.id, name = %self.name, "session closed");
	}

	fn look(&mut self) {
		let work = self.context.work().clone();
		self.inspect(&work, 0, "this");
	}

	fn inspect(&mut self, scope: &ScopeRef, max_depth: usize, name: &str) {
		for line in inspect::inspect(scope, max_depth, name) {
			self.print(&line, true);
		}
	}

	fn where_am_i(&mut self) {
		let label = self.context.work().label();
		self.print(&label, true);
	}

	fn search(&mut self, criteria: &str, scope: Option<&ScopeRef>) {
		let criteria = match Criteria::parse(criteria) {
			Ok(criteria) => criteria,
			Err(err) => {
				self.print(&format!("Invalid search pattern {criteria}: {err}"), true);
				return;
			}
		};
		let scope = scope.cloned().unwrap_or_else(|| self.context.work().clone());
		for name in inspect::search(&scope, &criteria) {
			self.print(&name, true);
		}
	}

	fn doc(&mut self, topic: &str) {
		match self.docs.lookup(topic) {
			Some(entry) => {
				self.print(&entry.text, true);
				if let Some(url) = entry.help_url {
					self.print(&format!("Online help: {url}"), true);
				}
			}
			None => self.print(&format!("No documentation found for \"{topic}\"."), true),
		}
	}

	fn fetch_script(&self, url: &str) -> Result<String> {
		self.loader.load(url)
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		if !self.closed {
			debug!(target = "rrepl.session", session = %self.id, "dropped without quit");
			self.quit();
		}
	}
}
