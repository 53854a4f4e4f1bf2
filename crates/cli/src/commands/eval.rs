use std::io;
use std::sync::Arc;

use rrepl::{FileScriptLoader, Repl, Session, SessionId, WriterSink};
use rrepl_protocol::InputMode;
use rrepl_protocol::settings::INPUT_MODE;
use rrepl_sandbox::{Desktop, Interpreter};
use serde_json::json;
use tracing::debug;

use crate::config::Settings;

/// Feeds each chunk to a fresh local session writing to stdout. Chunks
/// without a trailing newline get one.
pub fn run(settings: &Settings, mode: Option<InputMode>, code: &[String]) {
	let desktop = Desktop::new();
	let evaluator = Arc::new(Interpreter::new(desktop.clone()));
	let mut session = Session::builder(SessionId(1), desktop.root(), evaluator, Box::new(WriterSink::new(io::stdout())))
		.loader(Arc::new(FileScriptLoader))
		.base_name(settings.base_name.clone())
		.sentinel(settings.sentinel.clone())
		.init_url(settings.init_url.clone())
		.build();

	if let Some(mode) = mode {
		session.setenv(INPUT_MODE, json!(mode.as_str()));
	}
	for chunk in code {
		if session.is_closed() {
			debug!(target = "rrepl", "session quit, ignoring remaining input");
			break;
		}
		if chunk.ends_with('\n') {
			session.feed(chunk);
		} else {
			session.feed(&format!("{chunk}\n"));
		}
	}
	session.quit();
	println!();
}
