//! The desktop host: a root scope plus the windows opened on it.

use std::sync::Arc;

use rrepl::{Host, ScopeRef};
use tracing::info;

use crate::value::{Builtin, Object, Value};

/// Host object graph for sandbox sessions.
///
/// Sessions are created in the desktop root. Windows are top-level scopes
/// bound on the root by name; closing one fires its unload listeners before
/// it is removed.
#[derive(Debug)]
pub struct Desktop {
	root: Arc<Object>,
}

impl Desktop {
	pub fn new() -> Arc<Self> {
		let root = Object::window("desktop", None);
		for builtin in [Builtin::Open, Builtin::Close] {
			root.set_documented(builtin.name(), Value::Builtin(builtin), builtin.doc());
		}
		Arc::new(Self { root })
	}

	pub fn root(&self) -> Arc<Object> {
		self.root.clone()
	}

	/// Opens a window and binds it on the root as `name`, replacing (and
	/// unloading) any window already bound there.
	pub fn open(&self, name: &str, title: &str) -> Arc<Object> {
		self.close(name);
		let window = Object::window(title, Some(&self.root));
		self.root.set(name, Value::Object(window.clone()));
		info!(target = "rrepl.sandbox", name, title, "window opened");
		window
	}

	pub fn window(&self, name: &str) -> Option<Arc<Object>> {
		match self.root.get(name) {
			Some(Value::Object(object)) if object.title().is_some() => Some(object),
			_ => None,
		}
	}

	/// Unloads and removes the window bound as `name`. Returns false when
	/// there is no such window.
	pub fn close(&self, name: &str) -> bool {
		let Some(window) = self.window(name) else {
			return false;
		};
		window.unload();
		self.root.remove(name);
		info!(target = "rrepl.sandbox", name, "window closed");
		true
	}
}

impl Host for Desktop {
	fn creation_scope(&self) -> ScopeRef {
		self.root.clone()
	}
}
