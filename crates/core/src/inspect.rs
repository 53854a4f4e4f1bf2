//! Shallow reflection over scopes: `look`, `inspect` and `search`.

use regex::Regex;

use crate::scope::{Member, MemberKind, ScopeRef};

/// Doc lines longer than this are cut and end in `...`.
pub const DOC_WIDTH: usize = 70;

/// Renders the member dump printed by `inspect`.
///
/// Each member yields `name.prop=summary`, followed by its cropped doc
/// string when it has one. Nested objects are descended into until
/// `max_depth` levels below `scope` have been listed.
pub fn inspect(scope: &ScopeRef, max_depth: usize, name: &str) -> Vec<String> {
	let mut lines = Vec::new();
	dump(&mut lines, scope, max_depth, name, 0);
	lines
}

fn dump(lines: &mut Vec<String>, scope: &ScopeRef, max_depth: usize, name: &str, depth: usize) {
	if depth > max_depth {
		return;
	}
	let members = scope.members();
	if members.is_empty() {
		lines.push(format!("{name} is empty"));
		return;
	}
	for member in members {
		let path = format!("{name}.{}", member.name);
		lines.push(format!("{path}={}", summary(&member)));
		if let Some(doc) = &member.doc {
			lines.push(format!("    {}", crop(doc, DOC_WIDTH)));
		}
		if let (MemberKind::Object { .. }, Some(child)) = (&member.kind, &member.child) {
			dump(lines, child, max_depth, &path, depth + 1);
		}
	}
}

fn summary(member: &Member) -> String {
	match &member.kind {
		MemberKind::Object { len: Some(len) } => format!("[array, length {len}]"),
		MemberKind::Object { len: None } => "[object]".to_string(),
		MemberKind::Function => "[function]".to_string(),
		MemberKind::Session => "[session]".to_string(),
		MemberKind::Value(rendered) => rendered.clone(),
	}
}

/// First line of `text`, cut to `max` characters including the `...`.
pub fn crop(text: &str, max: usize) -> String {
	let line = text.lines().next().unwrap_or_default();
	if line.chars().count() > max.saturating_sub(3) {
		let mut cut: String = line.chars().take(max.saturating_sub(3)).collect();
		cut.push_str("...");
		cut
	} else {
		line.to_string()
	}
}

/// How `search` matches member names.
#[derive(Debug, Clone)]
pub enum Criteria {
	Exact(String),
	Pattern(Regex),
}

impl Criteria {
	/// `/pattern/` is a regular expression, anything else an exact name.
	pub fn parse(raw: &str) -> Result<Self, regex::Error> {
		match raw.strip_prefix('/').and_then(|rest| rest.strip_suffix('/')) {
			Some(pattern) if raw.len() >= 2 => Regex::new(pattern).map(Criteria::Pattern),
			_ => Ok(Criteria::Exact(raw.to_string())),
		}
	}

	pub fn matches(&self, name: &str) -> bool {
		match self {
			Criteria::Exact(exact) => exact == name,
			Criteria::Pattern(regex) => regex.is_match(name),
		}
	}
}

/// Names of the members of `scope` that satisfy `criteria`.
pub fn search(scope: &ScopeRef, criteria: &Criteria) -> Vec<String> {
	scope
		.members()
		.into_iter()
		.filter(|member| criteria.matches(&member.name))
		.map(|member| member.name)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::MemoryScope;

	fn sample() -> ScopeRef {
		let inner = MemoryScope::nested("inner");
		inner.define("depth", MemberKind::Value("2".into()));
		let root = MemoryScope::top_level("root");
		root.define("title", MemberKind::Value("Start".into()));
		root.define_documented("open", MemberKind::Function, "Opens a window.\nSecond line.");
		root.define_child("inner", inner, None);
		root.define("items", MemberKind::Object { len: Some(3) });
		root
	}

	#[test]
	fn shallow_inspect_lists_members_with_summaries() {
		let lines = inspect(&sample(), 0, "this");
		assert_eq!(
			lines,
			vec![
				"this.title=Start",
				"this.open=[function]",
				"    Opens a window.",
				"this.inner=[object]",
				"this.items=[array, length 3]",
			]
		);
	}

	#[test]
	fn deeper_inspect_descends_into_children() {
		let lines = inspect(&sample(), 1, "this");
		assert!(lines.contains(&"this.inner.depth=2".to_string()));
	}

	#[test]
	fn empty_scope_says_so() {
		let empty: ScopeRef = MemoryScope::nested("void");
		assert_eq!(inspect(&empty, 0, "this"), vec!["this is empty"]);
	}

	#[test]
	fn crop_keeps_first_line_within_width() {
		assert_eq!(crop("short\nignored", DOC_WIDTH), "short");
		let long = "y".repeat(100);
		let cropped = crop(&long, DOC_WIDTH);
		assert_eq!(cropped.chars().count(), DOC_WIDTH);
		assert!(cropped.ends_with("..."));
	}

	#[test]
	fn search_matches_exact_names_and_patterns() {
		let scope = sample();
		let exact = Criteria::parse("title").unwrap();
		assert_eq!(search(&scope, &exact), vec!["title"]);

		let pattern = Criteria::parse("/^i/").unwrap();
		assert_eq!(search(&scope, &pattern), vec!["inner", "items"]);

		assert!(Criteria::parse("/(/").is_err());
		assert!(matches!(Criteria::parse("/").unwrap(), Criteria::Exact(_)));
	}
}
