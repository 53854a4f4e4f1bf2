//! Prompt rendering.

/// Appended to the session name to form a prompt.
pub const PROMPT_SUFFIX: &str = "> ";

/// Replaces alphabetic characters of the name in continuation prompts.
pub const CONTINUATION_FILLER: char = '.';

/// Renders the normal prompt, e.g. `repl> `.
pub fn prompt(name: &str) -> String {
	format!("{name}{PROMPT_SUFFIX}")
}

/// Renders the prompt shown while an incomplete statement is buffered,
/// e.g. `....> ` for `repl` and `....2> ` for `repl2`.
pub fn continuation_prompt(name: &str) -> String {
	let filled: String = name
		.chars()
		.map(|c| if c.is_alphabetic() { CONTINUATION_FILLER } else { c })
		.collect();
	format!("{filled}{PROMPT_SUFFIX}")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn prompt_has_no_leading_separator() {
		assert_eq!(prompt("repl"), "repl> ");
	}

	#[test]
	fn continuation_keeps_digits() {
		assert_eq!(continuation_prompt("repl"), "....> ");
		assert_eq!(continuation_prompt("repl2"), "....2> ");
	}
}
