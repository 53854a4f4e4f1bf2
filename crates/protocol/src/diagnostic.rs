//! Failure reports written back to the client.
//!
//! A failed evaluation is reported as the evaluator's stack trace (when it
//! supplies one), one tab-indented frame per line, followed by the error
//! itself behind a `!!!` marker:
//!
//! ```text
//! 	lookup@<input>:1
//! !!! ReferenceError: nope is not defined
//! ```

use serde::{Deserialize, Serialize};

/// Frames longer than this are cut and marked with [`TRUNCATION_MARKER`].
pub const MAX_FRAME_LEN: usize = 200;

pub const TRUNCATION_MARKER: &str = "[...]";

/// Prefix of the error line in a failure report.
pub const ERROR_MARKER: &str = "!!!";

/// Evaluation failure as supplied by the evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
	/// Error class name (e.g. "SyntaxError", "TypeError")
	#[serde(skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Human readable message
	pub message: String,
	/// Newline-separated stack frames, innermost first
	#[serde(skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

impl Diagnostic {
	pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			name: Some(name.into()),
			message: message.into(),
			stack: None,
		}
	}

	/// A diagnostic without an error class.
	pub fn message(message: impl Into<String>) -> Self {
		Self {
			name: None,
			message: message.into(),
			stack: None,
		}
	}

	pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
		self.stack = Some(stack.into());
		self
	}

	/// Renders the full client-facing report: formatted stack, then the
	/// `!!!` line. The result ends with a newline.
	pub fn report(&self) -> String {
		let mut out = self.stack.as_deref().map(format_stack_trace).unwrap_or_default();
		out.push_str(ERROR_MARKER);
		out.push(' ');
		out.push_str(&self.to_string());
		out.push('\n');
		out
	}
}

impl std::fmt::Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.name {
			Some(name) => write!(f, "{name}: {}", self.message),
			None => f.write_str(&self.message),
		}
	}
}

/// Formats a raw stack for display.
///
/// Empty frames are dropped, escaped `\n` sequences inside a frame are
/// expanded, frames longer than [`MAX_FRAME_LEN`] characters are cut, and
/// every resulting line is indented with a tab.
pub fn format_stack_trace(stack: &str) -> String {
	let mut trace = String::new();
	for frame in stack.split('\n').filter(|frame| !frame.is_empty()) {
		let mut frame = frame.replace("\\n", "\n");
		if frame.chars().count() > MAX_FRAME_LEN {
			frame = frame.chars().take(MAX_FRAME_LEN).collect();
			frame.push_str(TRUNCATION_MARKER);
		}
		for line in frame.split('\n') {
			trace.push('\t');
			trace.push_str(line);
			trace.push('\n');
		}
	}
	trace
}
