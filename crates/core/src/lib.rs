//! Session engine for remote evaluation REPLs.
//!
//! A client connected over a byte stream sends source text; the session
//! decides when the text forms a complete unit, hands it to an
//! [`Evaluator`] against the scope the session is currently working in,
//! writes back the result or a diagnostic, and prompts for more. Sessions
//! navigate between scopes exposed by a host and keep a unique name in the
//! scopes they are registered into.
//!
//! The host object graph, the evaluator, script loading and documentation
//! lookup are all reached through traits, so this crate has no opinion on
//! what language is being evaluated or what the scopes contain.

pub mod context;
pub mod docs;
pub mod env;
pub mod error;
pub mod eval;
pub mod framer;
pub mod inspect;
pub mod io;
pub mod loader;
pub mod naming;
pub mod scope;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use context::ContextStack;
pub use docs::{BuiltinDocs, DocEntry, DocLookup};
pub use env::Environment;
pub use error::{Error, Place, Result};
pub use eval::{Evaluation, Evaluator, Repl, Target};
pub use framer::{InputFramer, SyntaxStep};
pub use io::{InputSource, NoInput, OutputSink, SessionOwner, Unowned, WriterSink};
pub use loader::{FileScriptLoader, NoLoader, ScriptLoader};
pub use naming::{NameRegistry, choose_name};
pub use scope::{
	Host, ListenerId, Member, MemberKind, Scope, ScopeId, ScopeRef, SessionHandle, SessionId, TeardownListener,
	same_scope,
};
pub use session::{Session, SessionBuilder};

pub use rrepl_protocol::{Diagnostic, InputMode};
