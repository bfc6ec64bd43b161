//! Note persistence: the [`NoteStore`] operations the editor saves through,
//! with an in-memory implementation and a JSON-file-backed one.
//!
//! Every query and mutation is scoped to the store's signed-in user; a note
//! owned by someone else behaves exactly like a missing one.

mod json;
mod memory;

pub use json::JsonStore;
pub use memory::MemoryStore;

use crate::editor::{SaveOutcome, SaveRequest};
use crate::models::{Note, NoteId};

/// Failures surfaced by note persistence operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No signed-in user; every mutation requires one.
    #[error("not authenticated")]
    Unauthenticated,
    /// Titles must contain at least one non-whitespace character.
    #[error("note title is empty")]
    EmptyTitle,
    /// Unknown id, or a note owned by a different user.
    #[error("note not found: {0}")]
    NotFound(NoteId),
    /// Underlying file I/O failed (file-backed stores only).
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),
    /// The on-disk store document could not be encoded or decoded.
    #[error("store encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// The operations a note backend exposes to the application.
pub trait NoteStore {
    /// Insert a new note and return its identifier.
    fn create(&mut self, title: &str, content: &str) -> Result<NoteId, StoreError>;

    /// Patch title and/or content of an owned note.
    fn update(
        &mut self,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Fetch one note; `None` when the id is unknown or owned by someone
    /// else.
    fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError>;

    /// All of the user's notes, newest first. `show_archived` selects the
    /// archived set instead of the active one. An unauthenticated store
    /// lists nothing rather than failing.
    fn list(&self, show_archived: bool) -> Result<Vec<Note>, StoreError>;

    fn archive(&mut self, id: NoteId) -> Result<(), StoreError>;

    fn restore(&mut self, id: NoteId) -> Result<(), StoreError>;

    /// Permanently remove a note.
    fn delete(&mut self, id: NoteId) -> Result<(), StoreError>;

    /// Copy a note under a "<title> (Copy)" title; the copy is never
    /// archived regardless of the source.
    fn duplicate(&mut self, id: NoteId) -> Result<NoteId, StoreError>;
}

/// Run an editor [`SaveRequest`] against a store and map the result into the
/// [`SaveOutcome`] the session expects back.
pub fn apply_save(
    store: &mut dyn NoteStore,
    request: &SaveRequest,
) -> Result<SaveOutcome, StoreError> {
    match request {
        SaveRequest::Create { title, content } => {
            store.create(title, content).map(SaveOutcome::Created)
        }
        SaveRequest::Update { id, title, content } => store
            .update(*id, Some(title), Some(content))
            .map(|()| SaveOutcome::Updated),
    }
}
