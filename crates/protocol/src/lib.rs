//! Wire-level shapes for rrepl sessions.
//!
//! An rrepl session does not speak a structured protocol: the client sends
//! raw source text and the server answers with plain text followed by a
//! prompt. This crate pins down the few shapes both ends agree on:
//!
//! * the input modes a session can frame input with ([`InputMode`])
//! * how prompts and continuation prompts are rendered ([`prompt`])
//! * how evaluation failures are reported ([`Diagnostic`])
//! * the setting keys and defaults a session starts with ([`settings`])
//!
//! Types in this crate are pure data and text formatting. Behavior lives in
//! `rrepl-core`.

pub mod diagnostic;
pub mod mode;
pub mod prompt;
pub mod settings;

pub use diagnostic::*;
pub use mode::*;
pub use prompt::*;
