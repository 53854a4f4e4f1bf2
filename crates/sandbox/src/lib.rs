//! An in-memory host for rrepl sessions.
//!
//! [`Desktop`] exposes a small object graph of windows and plain objects,
//! and [`Interpreter`] evaluates a compact expression language against it.
//! Together they give the session engine something real to drive without
//! embedding a full language runtime: assignments, property access, array
//! and object literals, arithmetic, and calls into the session itself
//! (`repl.enter(win)`, `repl.setenv("inputMode", "line")`, ...).

pub mod desktop;
pub mod interp;
pub mod lexer;
pub mod parser;
pub mod value;

pub use desktop::Desktop;
pub use interp::Interpreter;
pub use parser::ParseError;
pub use value::{Builtin, Object, SessionMethod, Value};
