//! The editing side of the engine: live autoformatting of typed text, the
//! cancellable autosave timer, and the editor session state machine.
//!
//! The session is deliberately free of I/O and clocks. Hosts pass
//! `Instant`s in, receive [`session::SaveRequest`] values out, run them
//! against a [`NoteStore`](crate::store::NoteStore), and feed the result
//! back through [`session::EditorSession::complete_save`]. That keeps every
//! timing and failure path deterministic under test.

pub mod autoformat;
pub mod session;
pub mod timer;

pub use autoformat::Rewrite;
pub use session::{EditorSession, Mode, Notice, SaveOutcome, SaveReport, SaveRequest, SaveStatus};
pub use timer::AutosaveTimer;
