//! Values and objects of the sandbox object graph.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use rrepl::{ListenerId, Member, MemberKind, Scope, ScopeId, SessionHandle, TeardownListener};
use tracing::debug;

/// Arrays nested deeper than this render as `...`.
pub const MAX_RENDER_DEPTH: usize = 128;

/// Functions provided by the desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
	Open,
	Close,
}

impl Builtin {
	pub fn name(self) -> &'static str {
		match self {
			Builtin::Open => "open",
			Builtin::Close => "close",
		}
	}

	pub fn doc(self) -> &'static str {
		match self {
			Builtin::Open => "open(name, title) opens a new top-level window bound as `name` on the desktop.",
			Builtin::Close => "close(name) unloads the window bound as `name` and removes it from the desktop.",
		}
	}
}

/// Operations of a session reachable as `repl.<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMethod {
	Print,
	Setenv,
	Getenv,
	Pushenv,
	Popenv,
	Load,
	Enter,
	Back,
	Home,
	Quit,
	Rename,
	Inspect,
	Look,
	WhereAmI,
	Search,
	Doc,
}

impl SessionMethod {
	pub const ALL: [SessionMethod; 16] = [
		SessionMethod::Print,
		SessionMethod::Setenv,
		SessionMethod::Getenv,
		SessionMethod::Pushenv,
		SessionMethod::Popenv,
		SessionMethod::Load,
		SessionMethod::Enter,
		SessionMethod::Back,
		SessionMethod::Home,
		SessionMethod::Quit,
		SessionMethod::Rename,
		SessionMethod::Inspect,
		SessionMethod::Look,
		SessionMethod::WhereAmI,
		SessionMethod::Search,
		SessionMethod::Doc,
	];

	pub fn name(self) -> &'static str {
		match self {
			SessionMethod::Print => "print",
			SessionMethod::Setenv => "setenv",
			SessionMethod::Getenv => "getenv",
			SessionMethod::Pushenv => "pushenv",
			SessionMethod::Popenv => "popenv",
			SessionMethod::Load => "load",
			SessionMethod::Enter => "enter",
			SessionMethod::Back => "back",
			SessionMethod::Home => "home",
			SessionMethod::Quit => "quit",
			SessionMethod::Rename => "rename",
			SessionMethod::Inspect => "inspect",
			SessionMethod::Look => "look",
			SessionMethod::WhereAmI => "whereAmI",
			SessionMethod::Search => "search",
			SessionMethod::Doc => "doc",
		}
	}

	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|method| method.name() == name)
	}
}

#[derive(Debug, Clone)]
pub enum Value {
	Undefined,
	Null,
	Bool(bool),
	Number(f64),
	Str(String),
	Object(Arc<Object>),
	Session(SessionHandle),
	Method(SessionHandle, SessionMethod),
	Builtin(Builtin),
}

impl Value {
	pub fn type_name(&self) -> &'static str {
		match self {
			Value::Undefined => "undefined",
			Value::Null => "null",
			Value::Bool(_) => "boolean",
			Value::Number(_) => "number",
			Value::Str(_) => "string",
			Value::Object(_) | Value::Session(_) => "object",
			Value::Method(..) | Value::Builtin(_) => "function",
		}
	}

	pub fn truthy(&self) -> bool {
		match self {
			Value::Undefined | Value::Null => false,
			Value::Bool(b) => *b,
			Value::Number(n) => *n != 0.0 && !n.is_nan(),
			Value::Str(s) => !s.is_empty(),
			_ => true,
		}
	}

	/// Text shown for the value by `print` and as an evaluation result.
	pub fn render(&self) -> String {
		self.render_within(&mut Vec::new())
	}

	/// `open` holds the arrays currently being rendered, outermost first.
	fn render_within(&self, open: &mut Vec<ScopeId>) -> String {
		match self {
			Value::Undefined => "undefined".to_string(),
			Value::Null => "null".to_string(),
			Value::Bool(b) => b.to_string(),
			Value::Number(n) => render_number(*n),
			Value::Str(s) => s.clone(),
			Value::Object(object) => object.render_within(open),
			Value::Session(handle) => format!("[object Session {}]", handle.id),
			Value::Method(_, method) => format!("function {}() {{ [session code] }}", method.name()),
			Value::Builtin(builtin) => format!("function {}() {{ [native code] }}", builtin.name()),
		}
	}

	/// Loose equality: numbers, strings and booleans by value, everything
	/// else by identity.
	pub fn equals(&self, other: &Value) -> bool {
		match (self, other) {
			(Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Number(a), Value::Number(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
			(Value::Session(a), Value::Session(b)) => a == b,
			(Value::Method(a, m), Value::Method(b, n)) => a == b && m == n,
			(Value::Builtin(a), Value::Builtin(b)) => a == b,
			_ => false,
		}
	}

	pub fn to_json(&self) -> serde_json::Value {
		match self {
			Value::Undefined | Value::Null => serde_json::Value::Null,
			Value::Bool(b) => serde_json::Value::Bool(*b),
			Value::Number(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => serde_json::Value::from(*n as i64),
			Value::Number(n) => serde_json::Number::from_f64(*n)
				.map(serde_json::Value::Number)
				.unwrap_or(serde_json::Value::Null),
			Value::Str(s) => serde_json::Value::String(s.clone()),
			other => serde_json::Value::String(other.render()),
		}
	}

	pub fn from_json(value: &serde_json::Value) -> Value {
		match value {
			serde_json::Value::Null => Value::Null,
			serde_json::Value::Bool(b) => Value::Bool(*b),
			serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
			serde_json::Value::String(s) => Value::Str(s.clone()),
			serde_json::Value::Array(items) => {
				Value::Object(Object::array(items.iter().map(Value::from_json).collect(), None))
			}
			serde_json::Value::Object(map) => {
				let object = Object::new("Object", None);
				for (key, item) in map {
					object.set(key, Value::from_json(item));
				}
				Value::Object(object)
			}
		}
	}
}

fn render_number(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_string()
	} else if n.is_infinite() {
		(if n > 0.0 { "Infinity" } else { "-Infinity" }).to_string()
	} else if n.fract() == 0.0 && n.abs() < 1e21 {
		format!("{}", n as i64)
	} else {
		n.to_string()
	}
}

struct Property {
	name: String,
	value: Value,
	doc: Option<String>,
}

/// A node of the object graph, usable as a session scope.
///
/// Properties keep insertion order. Lookups that miss fall back to the
/// parent chain, so code running inside a window still sees the desktop's
/// builtins.
pub struct Object {
	id: ScopeId,
	class: &'static str,
	title: Option<String>,
	top_level: bool,
	array: bool,
	parent: Option<Weak<Object>>,
	properties: RwLock<Vec<Property>>,
	listeners: Mutex<Vec<(ListenerId, TeardownListener)>>,
	next_listener: AtomicU64,
}

impl std::fmt::Debug for Object {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Object")
			.field("id", &self.id)
			.field("class", &self.class)
			.field("title", &self.title)
			.finish_non_exhaustive()
	}
}

impl Object {
	fn build(
		class: &'static str,
		title: Option<String>,
		top_level: bool,
		array: bool,
		parent: Option<&Arc<Object>>,
	) -> Arc<Self> {
		Arc::new(Self {
			id: ScopeId::next(),
			class,
			title,
			top_level,
			array,
			parent: parent.map(Arc::downgrade),
			properties: RwLock::new(Vec::new()),
			listeners: Mutex::new(Vec::new()),
			next_listener: AtomicU64::new(1),
		})
	}

	pub fn new(class: &'static str, parent: Option<&Arc<Object>>) -> Arc<Self> {
		Self::build(class, None, false, false, parent)
	}

	/// A top-level scope with unload notifications.
	pub fn window(title: &str, parent: Option<&Arc<Object>>) -> Arc<Self> {
		Self::build("Window", Some(title.to_string()), true, false, parent)
	}

	pub fn array(items: Vec<Value>, parent: Option<&Arc<Object>>) -> Arc<Self> {
		let array = Self::build("Array", None, false, true, parent);
		{
			let mut properties = array.properties.write();
			for (index, value) in items.into_iter().enumerate() {
				properties.push(Property {
					name: index.to_string(),
					value,
					doc: None,
				});
			}
		}
		array
	}

	pub fn title(&self) -> Option<&str> {
		self.title.as_deref()
	}

	pub fn is_array(&self) -> bool {
		self.array
	}

	pub fn len(&self) -> usize {
		self.properties.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn parent(&self) -> Option<Arc<Object>> {
		self.parent.as_ref().and_then(Weak::upgrade)
	}

	/// Own property only.
	pub fn get(&self, name: &str) -> Option<Value> {
		self.properties
			.read()
			.iter()
			.find(|property| property.name == name)
			.map(|property| property.value.clone())
	}

	/// Own property, then the parent chain.
	pub fn lookup(&self, name: &str) -> Option<Value> {
		if let Some(value) = self.get(name) {
			return Some(value);
		}
		let mut next = self.parent();
		while let Some(object) = next {
			if let Some(value) = object.get(name) {
				return Some(value);
			}
			next = object.parent();
		}
		None
	}

	pub fn set(&self, name: &str, value: Value) {
		self.define(name, value, None);
	}

	pub fn set_documented(&self, name: &str, value: Value, doc: &str) {
		self.define(name, value, Some(doc.to_string()));
	}

	fn define(&self, name: &str, value: Value, doc: Option<String>) {
		let mut properties = self.properties.write();
		match properties.iter_mut().find(|property| property.name == name) {
			Some(property) => {
				property.value = value;
				if doc.is_some() {
					property.doc = doc;
				}
			}
			None => properties.push(Property {
				name: name.to_string(),
				value,
				doc,
			}),
		}
	}

	pub fn remove(&self, name: &str) -> Option<Value> {
		let mut properties = self.properties.write();
		let index = properties.iter().position(|property| property.name == name)?;
		Some(properties.remove(index).value)
	}

	pub fn keys(&self) -> Vec<String> {
		self.properties.read().iter().map(|property| property.name.clone()).collect()
	}

	/// Notifies every teardown listener that this object is going away.
	pub fn unload(&self) {
		let listeners: Vec<TeardownListener> =
			self.listeners.lock().iter().map(|(_, listener)| listener.clone()).collect();
		debug!(target = "rrepl.sandbox", scope = %self.id, listeners = listeners.len(), "unloading");
		for listener in listeners {
			listener(self.id);
		}
	}

	pub fn render(&self) -> String {
		self.render_within(&mut Vec::new())
	}

	/// Arrays join their elements with `,`. An array already being rendered
	/// further out renders as nothing, and nesting past
	/// [`MAX_RENDER_DEPTH`] is cut to `...`.
	fn render_within(&self, open: &mut Vec<ScopeId>) -> String {
		if !self.array {
			return format!("[object {}]", self.class);
		}
		if open.contains(&self.id) {
			return String::new();
		}
		if open.len() >= MAX_RENDER_DEPTH {
			return "...".to_string();
		}
		let values: Vec<Value> = self.properties.read().iter().map(|property| property.value.clone()).collect();
		open.push(self.id);
		let text = values
			.iter()
			.map(|value| match value {
				Value::Undefined | Value::Null => String::new(),
				value => value.render_within(open),
			})
			.collect::<Vec<_>>()
			.join(",");
		open.pop();
		text
	}
}

impl Scope for Object {
	fn id(&self) -> ScopeId {
		self.id
	}

	fn is_top_level(&self) -> bool {
		self.top_level
	}

	fn contains(&self, name: &str) -> bool {
		self.properties.read().iter().any(|property| property.name == name)
	}

	fn bind(&self, name: &str, handle: SessionHandle) {
		self.set(name, Value::Session(handle));
	}

	fn unbind(&self, name: &str) {
		self.remove(name);
	}

	fn label(&self) -> String {
		match &self.title {
			Some(title) => format!("[object {}] - Document title: \"{title}\"", self.class),
			None => format!("[object {}]", self.class),
		}
	}

	fn members(&self) -> Vec<Member> {
		self.properties
			.read()
			.iter()
			.map(|property| {
				let (kind, child) = match &property.value {
					Value::Object(object) => {
						let len = object.is_array().then(|| object.len());
						(MemberKind::Object { len }, Some(object.clone() as rrepl::ScopeRef))
					}
					Value::Method(..) | Value::Builtin(_) => (MemberKind::Function, None),
					Value::Session(_) => (MemberKind::Session, None),
					primitive => (MemberKind::Value(primitive.render()), None),
				};
				Member {
					name: property.name.clone(),
					kind,
					doc: property.doc.clone(),
					child,
				}
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
