//! Documentation lookup for `doc(topic)`.

use std::collections::BTreeMap;

/// What `doc` prints for a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocEntry {
	pub text: String,
	pub help_url: Option<String>,
}

pub trait DocLookup: Send + Sync {
	fn lookup(&self, topic: &str) -> Option<DocEntry>;
}

const SESSION_DOCS: &[(&str, &str)] = &[
	(
		"setenv",
		"Takes a name and a value and stores them so that they can be later retrieved via getenv(). \
		 Some, such as \"printPrompt\"/boolean and \"inputMode\", affect the way the session works.",
	),
	("getenv", "Given a name, returns a value previously stored via setenv()."),
	(
		"pushenv",
		"Takes one or more names of values previously stored via setenv(), and stores them so that \
		 they can be later restored via popenv().",
	),
	(
		"popenv",
		"Takes one or more names of values previously pushed via pushenv() and restores them, \
		 overwriting the current ones.",
	),
	(
		"print",
		"Converts a value to a string and prints it. Appends a newline unless false is given as \
		 second parameter.",
	),
	(
		"load",
		"Loads a file:// script into the current scope, or optionally into an arbitrary scope passed \
		 as a second parameter.",
	),
	(
		"enter",
		"Makes a new scope the current one. After this, new definitions will be members of the new \
		 scope. Remembers the previous scope, so that you can get back to it with back().",
	),
	("back", "Returns to the previous scope."),
	("home", "Returns to the scope where the session was created."),
	("quit", "Ends the session."),
	("rename", "Renames the session."),
	("inspect", "Lists members of a given object."),
	("look", "Lists objects in the current scope."),
	("whereAmI", "Returns a string representation of the current scope."),
	(
		"search",
		"Searches for a member in the current scope, or optionally in an arbitrary one given as a \
		 second parameter. Write the criteria as /pattern/ to match by regular expression.",
	),
	("doc", "Looks up documentation for a given topic."),
];

/// Doc strings for the session operations, plus any topics the host adds.
#[derive(Debug, Clone)]
pub struct BuiltinDocs {
	entries: BTreeMap<String, DocEntry>,
}

impl Default for BuiltinDocs {
	fn default() -> Self {
		let entries = SESSION_DOCS
			.iter()
			.map(|(topic, text)| {
				let entry = DocEntry {
					text: format!("TYPE: function\n\n{text}"),
					help_url: None,
				};
				(topic.to_string(), entry)
			})
			.collect();
		Self { entries }
	}
}

impl BuiltinDocs {
	pub fn with_topic(mut self, topic: impl Into<String>, text: impl Into<String>, help_url: Option<String>) -> Self {
		self.entries.insert(
			topic.into(),
			DocEntry {
				text: text.into(),
				help_url,
			},
		);
		self
	}

	pub fn topics(&self) -> impl Iterator<Item = &str> {
		self.entries.keys().map(String::as_str)
	}
}

impl DocLookup for BuiltinDocs {
	fn lookup(&self, topic: &str) -> Option<DocEntry> {
		// `repl.look` and `look` name the same operation.
		let bare = topic.rsplit('.').next().unwrap_or(topic);
		self.entries.get(topic).or_else(|| self.entries.get(bare)).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn session_operations_are_documented() {
		let docs = BuiltinDocs::default();
		let entry = docs.lookup("home").unwrap();
		assert!(entry.text.ends_with("Returns to the scope where the session was created."));
		assert!(entry.help_url.is_none());
		assert_eq!(docs.lookup("repl.home"), Some(entry));
	}

	#[test]
	fn host_topics_carry_help_urls() {
		let docs = BuiltinDocs::default().with_topic("window", "A top-level scope.", Some("https://help.invalid/window".into()));
		let entry = docs.lookup("window").unwrap();
		assert_eq!(entry.help_url.as_deref(), Some("https://help.invalid/window"));
		assert!(docs.lookup("nothing").is_none());
	}
}
