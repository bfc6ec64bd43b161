pub mod editor;
pub mod markup;
pub mod models;
pub mod store;

// Re-export key types for easier usage
pub use editor::{autoformat, session::*, timer::AutosaveTimer};
pub use markup::{preview_line, render};
pub use models::note::*;
pub use store::{JsonStore, MemoryStore, NoteStore, StoreError, apply_save};
