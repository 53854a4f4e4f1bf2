//! Setting keys read by the session and the defaults it starts with.

use crate::InputMode;

/// Boolean; prompts are suppressed when false.
pub const PRINT_PROMPT: &str = "printPrompt";

/// One of the [`InputMode`] names.
pub const INPUT_MODE: &str = "inputMode";

pub const DEFAULT_PRINT_PROMPT: bool = true;
pub const DEFAULT_INPUT_MODE: InputMode = InputMode::Syntax;

/// Name a session asks for before collision probing.
pub const DEFAULT_BASE_NAME: &str = "repl";

/// Line that closes a block in multiline mode.
pub const DEFAULT_SENTINEL: &str = "--end-remote-input";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 4242;
