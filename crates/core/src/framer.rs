//! Input framing: deciding when buffered text is a complete unit of code.
//!
//! `line` and `multiline` cut units at a fixed terminator and are driven with
//! [`InputFramer::append`] plus repeated [`InputFramer::next_unit`] calls.
//! `syntax` has no terminator: every chunk produces an evaluation attempt of
//! the whole buffer ([`InputFramer::syntax_step`]) and the evaluator's verdict
//! decides whether the buffer is kept ([`InputFramer::settle`]).

use rrepl_protocol::InputMode;

use crate::eval::Evaluation;

/// What to evaluate next in `syntax` mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxStep {
	/// The client sent the force marker. The buffer has already been
	/// cleared; evaluate this text and report whatever comes back.
	Forced(String),
	/// Evaluate the whole buffer, then call [`InputFramer::settle`].
	Attempt(String),
}

#[derive(Debug, Clone)]
pub struct InputFramer {
	buffer: String,
	sentinel: String,
}

impl InputFramer {
	pub fn new(sentinel: impl Into<String>) -> Self {
		Self {
			buffer: String::new(),
			sentinel: sentinel.into(),
		}
	}

	pub fn buffer(&self) -> &str {
		&self.buffer
	}

	pub fn sentinel(&self) -> &str {
		&self.sentinel
	}

	/// True when neither the chunk nor the buffer holds anything but
	/// whitespace. Such input only earns a fresh prompt.
	pub fn is_idle(&self, chunk: &str) -> bool {
		chunk.trim().is_empty() && self.buffer.trim().is_empty()
	}

	pub fn append(&mut self, chunk: &str) {
		self.buffer.push_str(chunk);
	}

	/// Drops everything buffered and returns it.
	pub fn take(&mut self) -> String {
		std::mem::take(&mut self.buffer)
	}

	/// Cuts the next complete unit for a delimited mode, keeping the
	/// remainder buffered. Returns `None` once no terminator is left, and
	/// always for [`InputMode::Syntax`].
	pub fn next_unit(&mut self, mode: InputMode) -> Option<String> {
		match mode {
			InputMode::Line => self.cut_line(),
			InputMode::Multiline => self.cut_block(),
			InputMode::Syntax => None,
		}
	}

	pub fn syntax_step(&mut self, chunk: &str) -> SyntaxStep {
		if is_force_marker(chunk) {
			return SyntaxStep::Forced(self.take());
		}
		self.buffer.push_str(chunk);
		SyntaxStep::Attempt(self.buffer.clone())
	}

	/// Applies the evaluator's verdict on the last [`SyntaxStep::Attempt`].
	/// Returns true when the buffer is kept because the statement is
	/// incomplete.
	pub fn settle(&mut self, outcome: &Evaluation) -> bool {
		if outcome.is_incomplete() {
			true
		} else {
			self.buffer.clear();
			false
		}
	}

	fn cut_line(&mut self) -> Option<String> {
		let end = self.buffer.find('\n')?;
		let unit = strip_cr(&self.buffer[..end]).to_string();
		self.buffer.drain(..=end);
		Some(unit)
	}

	fn cut_block(&mut self) -> Option<String> {
		let mut start = 0;
		while let Some(offset) = self.buffer[start..].find('\n') {
			let end = start + offset;
			if strip_cr(&self.buffer[start..end]) == self.sentinel {
				let body = self.buffer[..start].strip_suffix('\n').unwrap_or(&self.buffer[..start]);
				let unit = strip_cr(body).to_string();
				self.buffer.drain(..=end);
				return Some(unit);
			}
			start = end + 1;
		}
		None
	}
}

/// `;` alone on a line, surrounded by nothing but whitespace.
pub fn is_force_marker(chunk: &str) -> bool {
	chunk.trim() == ";"
}

fn strip_cr(line: &str) -> &str {
	line.strip_suffix('\r').unwrap_or(line)
}

#[cfg(test)]
mod tests {
	use rrepl_protocol::Diagnostic;
	use rrepl_protocol::settings::DEFAULT_SENTINEL;

	use super::*;

	fn framer() -> InputFramer {
		InputFramer::new(DEFAULT_SENTINEL)
	}

	fn drain(framer: &mut InputFramer, mode: InputMode) -> Vec<String> {
		std::iter::from_fn(|| framer.next_unit(mode)).collect()
	}

	#[test]
	fn line_mode_cuts_every_line_in_order() {
		let mut f = framer();
		f.append("a\nb\nc");
		assert_eq!(drain(&mut f, InputMode::Line), vec!["a", "b"]);
		assert_eq!(f.buffer(), "c");

		f.append("\n");
		assert_eq!(drain(&mut f, InputMode::Line), vec!["c"]);
		assert_eq!(f.buffer(), "");
	}

	#[test]
	fn line_mode_units_never_contain_terminators() {
		let mut f = framer();
		for chunk in ["x = 1", "\ny", " = 2\r\nz\n", "\n"] {
			f.append(chunk);
		}
		let units = drain(&mut f, InputMode::Line);
		assert_eq!(units, vec!["x = 1", "y = 2", "z", ""]);
		assert!(units.iter().all(|u| !u.contains('\n') && !u.contains('\r')));
	}

	#[test]
	fn multiline_without_sentinel_buffers_everything() {
		let mut f = framer();
		f.append("first\nsecond\n");
		assert!(f.next_unit(InputMode::Multiline).is_none());
		assert_eq!(f.buffer(), "first\nsecond\n");
	}

	#[test]
	fn multiline_cuts_at_sentinel_and_keeps_remainder() {
		let mut f = framer();
		f.append("first\nsecond\n--end-remote-input\nthird\n");
		assert_eq!(drain(&mut f, InputMode::Multiline), vec!["first\nsecond"]);
		assert_eq!(f.buffer(), "third\n");
	}

	#[test]
	fn multiline_sentinel_must_be_a_whole_line() {
		let mut f = framer();
		f.append("x --end-remote-input\n--end-remote-input y\n");
		assert!(f.next_unit(InputMode::Multiline).is_none());

		f.append("--end-remote-input\r\n");
		assert_eq!(
			f.next_unit(InputMode::Multiline).as_deref(),
			Some("x --end-remote-input\n--end-remote-input y")
		);
	}

	#[test]
	fn multiline_sentinel_at_start_yields_empty_unit() {
		let mut f = framer();
		f.append("--end-remote-input\nrest");
		assert_eq!(f.next_unit(InputMode::Multiline).as_deref(), Some(""));
		assert_eq!(f.buffer(), "rest");
	}

	#[test]
	fn custom_sentinel_is_honoured() {
		let mut f = InputFramer::new("EOF");
		f.append("body\nEOF\n");
		assert_eq!(f.next_unit(InputMode::Multiline).as_deref(), Some("body"));
	}

	#[test]
	fn syntax_attempt_accumulates_until_settled() {
		let mut f = framer();
		assert_eq!(f.syntax_step("f(1,"), SyntaxStep::Attempt("f(1,".into()));
		assert!(f.settle(&Evaluation::Incomplete(Diagnostic::new("SyntaxError", "eof"))));
		assert_eq!(f.syntax_step(" 2)"), SyntaxStep::Attempt("f(1, 2)".into()));
		assert!(!f.settle(&Evaluation::Completed(Some("3".into()))));
		assert_eq!(f.buffer(), "");
	}

	#[test]
	fn failure_clears_syntax_buffer() {
		let mut f = framer();
		f.syntax_step("1 +* 2");
		assert!(!f.settle(&Evaluation::Failed(Diagnostic::message("bad"))));
		assert_eq!(f.buffer(), "");
	}

	#[test]
	fn force_marker_hands_over_buffer_and_clears_it() {
		let mut f = framer();
		f.syntax_step("{ a: 1");
		f.settle(&Evaluation::Incomplete(Diagnostic::message("eof")));
		assert_eq!(f.syntax_step("  ;  \n"), SyntaxStep::Forced("{ a: 1".into()));
		assert_eq!(f.buffer(), "");
	}

	#[test]
	fn idle_detection_requires_blank_chunk_and_buffer() {
		let mut f = framer();
		assert!(f.is_idle(" \n"));
		f.append("pending");
		assert!(!f.is_idle("\n"));
		assert!(!framer().is_idle("1"));
	}

	#[test]
	fn force_marker_shapes() {
		assert!(is_force_marker(";"));
		assert!(is_force_marker("\t;\r\n"));
		assert!(!is_force_marker(";;"));
		assert!(!is_force_marker("a;"));
	}
}
