//! Per-session settings with a save/restore area.

use std::collections::HashMap;

use rrepl_protocol::InputMode;
use rrepl_protocol::settings::{DEFAULT_INPUT_MODE, DEFAULT_PRINT_PROMPT, INPUT_MODE, PRINT_PROMPT};
use serde_json::Value;
use tracing::warn;

/// Session settings store.
///
/// `push` snapshots the current value of each name (including "absent") and
/// `pop` puts it back. There is one saved slot per name, so pushing twice
/// overwrites the first snapshot.
#[derive(Debug, Clone, Default)]
pub struct Environment {
	values: HashMap<String, Value>,
	saved: HashMap<String, Option<Value>>,
}

impl Environment {
	/// Store with `printPrompt` and `inputMode` at their session defaults.
	pub fn with_defaults() -> Self {
		let mut env = Self::default();
		env.set(PRINT_PROMPT, Value::Bool(DEFAULT_PRINT_PROMPT));
		env.set(INPUT_MODE, Value::String(DEFAULT_INPUT_MODE.as_str().to_string()));
		env
	}

	pub fn set(&mut self, name: &str, value: Value) -> Value {
		self.values.insert(name.to_string(), value.clone());
		value
	}

	pub fn get(&self, name: &str) -> Option<&Value> {
		self.values.get(name)
	}

	/// Saves the current value of every name. Returns the value of the last
	/// name given.
	pub fn push(&mut self, names: &[&str]) -> Option<Value> {
		for name in names {
			self.saved.insert(name.to_string(), self.values.get(*name).cloned());
		}
		names.last().and_then(|name| self.values.get(*name).cloned())
	}

	/// Restores every name that has a saved value and forgets the snapshot.
	/// Names never pushed are left alone. Returns the value of the last name
	/// given.
	pub fn pop(&mut self, names: &[&str]) -> Option<Value> {
		for name in names {
			match self.saved.remove(*name) {
				Some(Some(value)) => {
					self.values.insert(name.to_string(), value);
				}
				Some(None) => {
					self.values.remove(*name);
				}
				None => {}
			}
		}
		names.last().and_then(|name| self.values.get(*name).cloned())
	}

	pub fn is_saved(&self, name: &str) -> bool {
		self.saved.contains_key(name)
	}

	/// `printPrompt`, using JSON truthiness. Absent means the default.
	pub fn print_prompt(&self) -> bool {
		self.get(PRINT_PROMPT).map(truthy).unwrap_or(DEFAULT_PRINT_PROMPT)
	}

	/// `inputMode`; unknown values fall back to the default mode.
	pub fn input_mode(&self) -> InputMode {
		match self.get(INPUT_MODE) {
			Some(Value::String(raw)) => raw.parse().unwrap_or_else(|err| {
				warn!(target = "rrepl.session", %err, "falling back to default input mode");
				DEFAULT_INPUT_MODE
			}),
			Some(other) => {
				warn!(target = "rrepl.session", value = %other, "inputMode is not a string");
				DEFAULT_INPUT_MODE
			}
			None => DEFAULT_INPUT_MODE,
		}
	}
}

fn truthy(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::Bool(b) => *b,
		Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
		Value::String(s) => !s.is_empty(),
		Value::Array(_) | Value::Object(_) => true,
	}
}
