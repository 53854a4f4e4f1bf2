use serde::{Deserialize, Serialize};

/// How a session decides that buffered input forms a complete unit of code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
	/// Every line is a unit.
	Line,
	/// Lines accumulate until the sentinel line arrives.
	Multiline,
	/// The evaluator decides: incomplete input keeps buffering.
	#[default]
	#[serde(alias = "syntax-incremental")]
	Syntax,
}

impl InputMode {
	pub fn as_str(self) -> &'static str {
		match self {
			InputMode::Line => "line",
			InputMode::Multiline => "multiline",
			InputMode::Syntax => "syntax",
		}
	}

	/// Returns true for the modes framed by a fixed terminator.
	pub fn is_delimited(self) -> bool {
		matches!(self, InputMode::Line | InputMode::Multiline)
	}
}

impl std::str::FromStr for InputMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_lowercase().as_str() {
			"line" => Ok(InputMode::Line),
			"multiline" => Ok(InputMode::Multiline),
			"syntax" | "syntax-incremental" => Ok(InputMode::Syntax),
			_ => Err(format!("unknown input mode: {s}")),
		}
	}
}

impl std::fmt::Display for InputMode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_known_modes_and_alias() {
		assert_eq!("line".parse::<InputMode>(), Ok(InputMode::Line));
		assert_eq!("Multiline".parse::<InputMode>(), Ok(InputMode::Multiline));
		assert_eq!("syntax".parse::<InputMode>(), Ok(InputMode::Syntax));
		assert_eq!("syntax-incremental".parse::<InputMode>(), Ok(InputMode::Syntax));
		assert!("block".parse::<InputMode>().is_err());
	}

	#[test]
	fn serde_uses_lowercase_names() {
		assert_eq!(serde_json::to_value(InputMode::Multiline).unwrap(), "multiline");
		let mode: InputMode = serde_json::from_value(serde_json::json!("syntax-incremental")).unwrap();
		assert_eq!(mode, InputMode::Syntax);
	}
}
