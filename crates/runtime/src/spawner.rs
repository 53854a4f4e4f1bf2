//! Creates sessions for new connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use rrepl::{
	BuiltinDocs, DocLookup, Evaluator, FileScriptLoader, Host, NameRegistry, ScopeId, ScriptLoader, Session,
	SessionId, TeardownListener,
};
use rrepl_protocol::settings::{DEFAULT_BASE_NAME, DEFAULT_SENTINEL};
use tokio::sync::mpsc;
use tracing::info;

use crate::actor;
use crate::event::SessionEvent;
use crate::table::SessionTable;
use crate::transport::Transport;

/// Per-session settings shared by every connection of a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
	pub base_name: String,
	pub sentinel: String,
	pub init_url: Option<String>,
}

impl Default for SessionOptions {
	fn default() -> Self {
		Self {
			base_name: DEFAULT_BASE_NAME.to_string(),
			sentinel: DEFAULT_SENTINEL.to_string(),
			init_url: None,
		}
	}
}

/// Wires transports to new session actors.
///
/// All sessions created here share one host, one evaluator and one naming
/// registry, so concurrent sessions in the same scope get distinct names.
pub struct SessionSpawner {
	host: Arc<dyn Host>,
	evaluator: Arc<dyn Evaluator>,
	loader: Arc<dyn ScriptLoader>,
	docs: Arc<dyn DocLookup>,
	registry: NameRegistry,
	table: SessionTable,
	options: SessionOptions,
	next_id: AtomicU64,
}

impl SessionSpawner {
	pub fn new(host: Arc<dyn Host>, evaluator: Arc<dyn Evaluator>) -> Self {
		Self {
			host,
			evaluator,
			loader: Arc::new(FileScriptLoader),
			docs: Arc::new(BuiltinDocs::default()),
			registry: NameRegistry::new(),
			table: SessionTable::new(),
			options: SessionOptions::default(),
			next_id: AtomicU64::new(1),
		}
	}

	pub fn with_loader(mut self, loader: Arc<dyn ScriptLoader>) -> Self {
		self.loader = loader;
		self
	}

	pub fn with_docs(mut self, docs: Arc<dyn DocLookup>) -> Self {
		self.docs = docs;
		self
	}

	pub fn with_options(mut self, options: SessionOptions) -> Self {
		self.options = options;
		self
	}

	pub fn sessions(&self) -> &SessionTable {
		&self.table
	}

	/// Starts a session for `transport` and returns its id. The session is
	/// in the table before its actor runs.
	pub fn spawn(&self, transport: Box<dyn Transport>) -> SessionId {
		let id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let endpoints = transport.attach(events_tx.clone());
		self.table.insert(id, events_tx.clone());

		let teardown: TeardownListener = Arc::new(move |scope: ScopeId| {
			let _ = events_tx.send(SessionEvent::HostTeardown(scope));
		});
		let builder = Session::builder(id, self.host.creation_scope(), Arc::clone(&self.evaluator), endpoints.output)
			.input(endpoints.input)
			.owner(Arc::new(self.table.clone()))
			.loader(Arc::clone(&self.loader))
			.docs(Arc::clone(&self.docs))
			.registry(self.registry.clone())
			.base_name(self.options.base_name.clone())
			.sentinel(self.options.sentinel.clone())
			.init_url(self.options.init_url.clone())
			.on_teardown(teardown);

		info!(target = "rrepl.server", session = %id, "session starting");
		actor::spawn(builder, events_rx);
		id
	}
}
