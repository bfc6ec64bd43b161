use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::{Note, NoteId, UserId};
use crate::store::{MemoryStore, NoteStore, StoreError};

/// On-disk shape of the store document.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    user: Option<UserId>,
    notes: Vec<Note>,
    next_seq: u64,
}

/// Notes persisted as a single JSON document on disk.
///
/// The whole document loads at open and every mutation writes through, so
/// the on-disk state is current even if the process dies. Plenty for a
/// per-user notes file; an [`MemoryStore`] does the actual bookkeeping.
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Open the store at `path`, creating a fresh one (with a newly
    /// generated user) when no file exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let inner = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            let file: StoreFile = serde_json::from_str(&raw)?;
            MemoryStore::from_parts(file.user, file.notes, file.next_seq)
        } else {
            tracing::debug!(path = %path.display(), "starting empty note store");
            MemoryStore::new()
        };
        Ok(Self { path, inner })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn user(&self) -> Option<UserId> {
        self.inner.user()
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let (user, notes, next_seq) = self.inner.parts();
        let file = StoreFile {
            user,
            notes: notes.to_vec(),
            next_seq,
        };
        fs::write(&self.path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn write_through<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        let value = result?;
        self.flush()?;
        Ok(value)
    }
}

impl NoteStore for JsonStore {
    fn create(&mut self, title: &str, content: &str) -> Result<NoteId, StoreError> {
        let result = self.inner.create(title, content);
        self.write_through(result)
    }

    fn update(
        &mut self,
        id: NoteId,
        title: Option<&str>,
        content: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = self.inner.update(id, title, content);
        self.write_through(result)
    }

    fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        self.inner.get(id)
    }

    fn list(&self, show_archived: bool) -> Result<Vec<Note>, StoreError> {
        self.inner.list(show_archived)
    }

    fn archive(&mut self, id: NoteId) -> Result<(), StoreError> {
        let result = self.inner.archive(id);
        self.write_through(result)
    }

    fn restore(&mut self, id: NoteId) -> Result<(), StoreError> {
        let result = self.inner.restore(id);
        self.write_through(result)
    }

    fn delete(&mut self, id: NoteId) -> Result<(), StoreError> {
        let result = self.inner.delete(id);
        self.write_through(result)
    }

    fn duplicate(&mut self, id: NoteId) -> Result<NoteId, StoreError> {
        let result = self.inner.duplicate(id);
        self.write_through(result)
    }
}
