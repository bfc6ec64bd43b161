use crate::models::{Note, NoteId, UserId};
use crate::store::{NoteStore, StoreError};

/// In-memory note store scoped to a single signed-in user.
///
/// Creation order is tracked with a monotonic sequence rather than wall
/// clock time, which keeps newest-first listings stable and deterministic.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    user: Option<UserId>,
    notes: Vec<Note>,
    next_seq: u64,
}

impl MemoryStore {
    /// Store with a freshly generated user.
    pub fn new() -> Self {
        Self::for_user(UserId::new())
    }

    pub fn for_user(user: UserId) -> Self {
        Self {
            user: Some(user),
            notes: Vec::new(),
            next_seq: 1,
        }
    }

    /// Store with nobody signed in; mutations fail with
    /// [`StoreError::Unauthenticated`] and listings come back empty.
    pub fn signed_out() -> Self {
        Self {
            user: None,
            notes: Vec::new(),
            next_seq: 1,
        }
    }

    pub(crate) fn from_parts(user: Option<UserId>, notes: Vec<Note>, next_seq: u64) -> Self {
        Self {
            user,
            notes,
            next_seq,
        }
    }

    pub(crate) fn parts(&self) -> (Option<UserId>, &[Note], u64) {
        (self.user, &self.notes, self.next_seq)
    }

    pub fn user(&self) -> Option<UserId> {
        self.user
    }

    fn require_user(&self) -> Result<UserId, StoreError> {
        self.user.ok_or(StoreError::Unauthenticated)
    }

    /// Look up an owned note; foreign and unknown ids fold into `NotFound`.
    fn owned(&self, user: UserId, id: NoteId) -> Result<&Note, StoreError> {
        self.notes
            .iter()
            .find(|note| note.id == id && note.author == user)
            .ok_or(StoreError::NotFound(id))
    }

    fn owned_mut(&mut self, user: UserId, id: NoteId) -> Result<&mut Note, StoreError> {
        self.notes
            .iter_mut()
            .find(|note| note.id == id && note.author == user)
            .ok_or(StoreError::NotFound(id))
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteStore for MemoryStore {
    fn create(&mut self, title: &str, content: &str) -> Result<NoteId, StoreError> {
        let user = self.require_user()?;
        if title.trim().is_empty() {
            return Err(StoreError::EmptyTitle);
        }
        let note = Note {
            id: NoteId::new(),
            author: user,
            title: title.to_string(),
            content: content.to_string(),
            archived: false,
            created_at: self.next_seq(),
        };
        let id = note.id;
        tracing::debug!(%id, "note created");
        self.notes.push(note);
        Ok(id)
    }

    fn update(
        &mut self,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<(), StoreError> {
        let user = self.require_user()?;
        let note = self.owned_mut(user, id)?;
        if let Some(title) = title {
            note.title = title.to_string();
        }
        if let Some(content) = content {
            note.content = content.to_string();
        }
        tracing::debug!(%id, "note updated");
        Ok(())
    }

    fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        let Some(user) = self.user else {
            return Ok(None);
        };
        Ok(self.owned(user, id).ok().cloned())
    }

    fn list(&self, show_archived: bool) -> Result<Vec<Note>, StoreError> {
        let Some(user) = self.user else {
            return Ok(Vec::new());
        };
        let mut notes: Vec<Note> = self
            .notes
            .iter()
            .filter(|note| note.author == user && note.archived == show_archived)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    fn archive(&mut self, id: NoteId) -> Result<(), StoreError> {
        let user = self.require_user()?;
        self.owned_mut(user, id)?.archived = true;
        Ok(())
    }

    fn restore(&mut self, id: NoteId) -> Result<(), StoreError> {
        let user = self.require_user()?;
        self.owned_mut(user, id)?.archived = false;
        Ok(())
    }

    fn delete(&mut self, id: NoteId) -> Result<(), StoreError> {
        let user = self.require_user()?;
        self.owned(user, id)?;
        self.notes.retain(|note| note.id != id);
        tracing::debug!(%id, "note deleted");
        Ok(())
    }

    fn duplicate(&mut self, id: NoteId) -> Result<NoteId, StoreError> {
        let user = self.require_user()?;
        let source = self.owned(user, id)?.clone();
        let copy = Note {
            id: NoteId::new(),
            author: user,
            title: format!("{} (Copy)", source.title),
            content: source.content,
            archived: false,
            created_at: self.next_seq(),
        };
        let copy_id = copy.id;
        tracing::debug!(source = %id, copy = %copy_id, "note duplicated");
        self.notes.push(copy);
        Ok(copy_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_get_roundtrip() {
        let mut store = MemoryStore::new();
        let id = store.create("Groceries", "• milk").unwrap();

        let note = store.get(id).unwrap().unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.content, "• milk");
        assert!(!note.archived);
    }

    #[test]
    fn create_rejects_blank_titles() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.create("", "x"), Err(StoreError::EmptyTitle)));
        assert!(matches!(
            store.create("   ", "x"),
            Err(StoreError::EmptyTitle)
        ));
    }

    #[test]
    fn unauthenticated_mutations_fail() {
        let mut store = MemoryStore::signed_out();
        assert!(matches!(
            store.create("t", "c"),
            Err(StoreError::Unauthenticated)
        ));
        assert!(matches!(
            store.archive(NoteId::new()),
            Err(StoreError::Unauthenticated)
        ));
    }

    #[test]
    fn unauthenticated_listing_is_empty_not_an_error() {
        let store = MemoryStore::signed_out();
        assert!(store.list(false).unwrap().is_empty());
        assert_eq!(store.get(NoteId::new()).unwrap(), None);
    }

    #[test]
    fn update_patches_only_provided_fields() {
        let mut store = MemoryStore::new();
        let id = store.create("Title", "body").unwrap();

        store.update(id, None, Some("new body")).unwrap();
        let note = store.get(id).unwrap().unwrap();
        assert_eq!(note.title, "Title");
        assert_eq!(note.content, "new body");

        store.update(id, Some("New Title"), None).unwrap();
        assert_eq!(store.get(id).unwrap().unwrap().title, "New Title");
    }

    #[test]
    fn update_of_unknown_id_is_not_found() {
        let mut store = MemoryStore::new();
        let missing = NoteId::new();
        assert!(matches!(
            store.update(missing, Some("t"), None),
            Err(StoreError::NotFound(id)) if id == missing
        ));
    }

    #[test]
    fn foreign_notes_are_invisible() {
        let mut theirs = MemoryStore::new();
        let id = theirs.create("Secret", "hidden").unwrap();

        // Same underlying notes, different signed-in user.
        let (_, notes, seq) = theirs.parts();
        let mine = MemoryStore::from_parts(Some(UserId::new()), notes.to_vec(), seq);

        assert_eq!(mine.get(id).unwrap(), None);
        assert!(mine.list(false).unwrap().is_empty());

        let mut mine = mine;
        assert!(matches!(
            mine.update(id, Some("stolen"), None),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(mine.delete(id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn list_is_newest_first_and_split_by_archived() {
        let mut store = MemoryStore::new();
        let first = store.create("first", "").unwrap();
        let second = store.create("second", "").unwrap();
        let third = store.create("third", "").unwrap();
        store.archive(second).unwrap();

        let active: Vec<NoteId> = store.list(false).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(active, vec![third, first]);

        let archived: Vec<NoteId> = store.list(true).unwrap().iter().map(|n| n.id).collect();
        assert_eq!(archived, vec![second]);
    }

    #[test]
    fn restore_returns_note_to_active_list() {
        let mut store = MemoryStore::new();
        let id = store.create("note", "").unwrap();
        store.archive(id).unwrap();
        store.restore(id).unwrap();

        assert!(store.list(true).unwrap().is_empty());
        assert_eq!(store.list(false).unwrap()[0].id, id);
    }

    #[test]
    fn delete_removes_permanently() {
        let mut store = MemoryStore::new();
        let id = store.create("gone", "").unwrap();
        store.delete(id).unwrap();

        assert_eq!(store.get(id).unwrap(), None);
        assert!(matches!(store.delete(id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn duplicate_copies_content_under_copy_title() {
        let mut store = MemoryStore::new();
        let id = store.create("Plan", "step one").unwrap();
        store.archive(id).unwrap();

        let copy_id = store.duplicate(id).unwrap();
        let copy = store.get(copy_id).unwrap().unwrap();
        assert_ne!(copy_id, id);
        assert_eq!(copy.title, "Plan (Copy)");
        assert_eq!(copy.content, "step one");
        // Copies always land in the active list, even from an archived source.
        assert!(!copy.archived);
    }
}
