use std::time::{Duration, Instant};

use crate::editor::{autoformat, timer::AutosaveTimer};
use crate::models::{Note, NoteId};
use crate::store::StoreError;

/// Which side of the editor lifecycle the session is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Viewing,
    Editing,
}

/// Persistence status surfaced to the host's save indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Saving,
    Error,
}

/// A persistence call the host must run against its note store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveRequest {
    Create { title: String, content: String },
    Update { id: NoteId, title: String, content: String },
}

/// Store outcome fed back through [`EditorSession::complete_save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(NoteId),
    Updated,
}

/// Host-facing notice produced by a completed save. Informational only; the
/// session state is already updated when this is returned, and the host
/// decides whether to show a toast for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Created,
    Updated,
    SaveFailed,
}

/// What [`EditorSession::complete_save`] leaves the session in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveReport {
    pub status: SaveStatus,
    pub mode: Mode,
    pub notice: Option<Notice>,
}

/// Bookkeeping for the request the host is currently running.
#[derive(Debug, Clone)]
struct InFlight {
    explicit: bool,
    title: String,
    content: String,
}

/// State machine for a single editing interaction over one document.
///
/// The session owns the view/edit mode, the debounced-autosave timer and
/// the save-status bookkeeping, but performs no I/O itself: [`poll`] and
/// [`save`] hand back a [`SaveRequest`] for the host to run, and the host
/// reports the result with [`complete_save`]. Time is injected through
/// `Instant` arguments so debounce behavior is deterministic under test.
///
/// Keystrokes keep mutating local state while a save is in flight; the next
/// debounce cycle picks them up once the in-flight call resolves. The
/// `is_creating` guard ensures racing debounce fires can never issue a
/// second create for the same document.
///
/// [`poll`]: Self::poll
/// [`save`]: Self::save
/// [`complete_save`]: Self::complete_save
#[derive(Debug, Clone)]
pub struct EditorSession {
    title: String,
    content: String,
    mode: Mode,
    save_status: SaveStatus,
    has_unsaved_changes: bool,
    note_id: Option<NoteId>,
    is_creating: bool,
    in_flight: Option<InFlight>,
    timer: AutosaveTimer,
    quiet: Duration,
}

impl EditorSession {
    /// Start a session for a brand-new document; opens directly in
    /// [`Mode::Editing`] with no stored identifier yet.
    pub fn new_note(quiet: Duration) -> Self {
        Self {
            title: String::new(),
            content: String::new(),
            mode: Mode::Editing,
            save_status: SaveStatus::Saved,
            has_unsaved_changes: false,
            note_id: None,
            is_creating: false,
            in_flight: None,
            timer: AutosaveTimer::new(),
            quiet,
        }
    }

    /// Start a session over an existing stored note, initially viewing.
    pub fn open(note: &Note, quiet: Duration) -> Self {
        Self {
            title: note.title.clone(),
            content: note.content.clone(),
            note_id: Some(note.id),
            mode: Mode::Viewing,
            ..Self::new_note(quiet)
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn save_status(&self) -> SaveStatus {
        self.save_status
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn note_id(&self) -> Option<NoteId> {
        self.note_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Switch from viewing into editing.
    pub fn begin_editing(&mut self) {
        self.mode = Mode::Editing;
    }

    /// Record a title keystroke and restart the debounce interval.
    pub fn edit_title(&mut self, title: impl Into<String>, now: Instant) {
        if self.mode != Mode::Editing {
            return;
        }
        self.title = title.into();
        self.mark_changed(now);
    }

    /// Record a content change. The new buffer runs through
    /// [`autoformat::transform`] and the adjusted cursor is returned so the
    /// host can reposition its caret.
    pub fn edit_content(&mut self, new_text: &str, cursor: usize, now: Instant) -> usize {
        if self.mode != Mode::Editing {
            return cursor;
        }
        let rewrite = autoformat::transform(&self.content, new_text, cursor);
        self.content = rewrite.text;
        self.mark_changed(now);
        rewrite.cursor
    }

    fn mark_changed(&mut self, now: Instant) {
        self.has_unsaved_changes = true;
        // Trailing debounce: every change replaces the pending deadline.
        // With a blank title the fire-time guard would skip anyway, so the
        // timer stays unarmed until a title exists.
        if self.title.trim().is_empty() {
            self.timer.cancel();
        } else {
            self.timer.arm(now, self.quiet);
        }
    }

    /// Drive the autosave timer. Returns the save to run once the quiet
    /// interval has elapsed, or `None` while there is nothing to do.
    pub fn poll(&mut self, now: Instant) -> Option<SaveRequest> {
        if !self.timer.is_due(now) {
            return None;
        }
        self.timer.cancel();
        if !self.has_unsaved_changes {
            return None;
        }
        self.issue_save(false)
    }

    /// Explicit user-triggered save. Cancels any pending autosave and issues
    /// the same create-or-update request, flagged so that a successful
    /// completion transitions back to viewing.
    pub fn save(&mut self, _now: Instant) -> Option<SaveRequest> {
        self.timer.cancel();
        self.issue_save(true)
    }

    fn issue_save(&mut self, explicit: bool) -> Option<SaveRequest> {
        if self.title.trim().is_empty() || self.is_creating {
            return None;
        }
        self.save_status = SaveStatus::Saving;
        let request = match self.note_id {
            Some(id) => SaveRequest::Update {
                id,
                title: self.title.clone(),
                content: self.content.clone(),
            },
            None => {
                self.is_creating = true;
                SaveRequest::Create {
                    title: self.title.clone(),
                    content: self.content.clone(),
                }
            }
        };
        self.in_flight = Some(InFlight {
            explicit,
            title: self.title.clone(),
            content: self.content.clone(),
        });
        tracing::debug!(explicit, creating = self.is_creating, "issuing save");
        Some(request)
    }

    /// Feed back the store result for the most recently issued request.
    ///
    /// On success the unsaved flag clears only if the buffer still matches
    /// what was sent, so keystrokes made while the save was in flight are
    /// captured by the next debounce cycle. On failure the changes stay
    /// unsaved and the next edit or explicit save is the retry.
    pub fn complete_save(&mut self, result: Result<SaveOutcome, StoreError>) -> SaveReport {
        let Some(in_flight) = self.in_flight.take() else {
            // Stale completion: the session was cancelled while the host's
            // call was still running.
            return SaveReport {
                status: self.save_status,
                mode: self.mode,
                notice: None,
            };
        };

        match result {
            Ok(outcome) => {
                if let SaveOutcome::Created(id) = outcome {
                    self.note_id = Some(id);
                }
                self.is_creating = false;
                self.save_status = SaveStatus::Saved;
                if self.title == in_flight.title && self.content == in_flight.content {
                    self.has_unsaved_changes = false;
                }
                let notice = if in_flight.explicit {
                    self.timer.cancel();
                    self.mode = Mode::Viewing;
                    Some(match outcome {
                        SaveOutcome::Created(_) => Notice::Created,
                        SaveOutcome::Updated => Notice::Updated,
                    })
                } else {
                    None
                };
                SaveReport {
                    status: self.save_status,
                    mode: self.mode,
                    notice,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "save failed");
                self.is_creating = false;
                self.save_status = SaveStatus::Error;
                self.has_unsaved_changes = true;
                SaveReport {
                    status: self.save_status,
                    mode: self.mode,
                    notice: Some(Notice::SaveFailed),
                }
            }
        }
    }

    /// Abandon the editing interaction (cancel button or Escape key).
    ///
    /// Clears the pending timer so no autosave can fire against a torn-down
    /// session, forgets any in-flight request, and returns to viewing.
    /// Local edits since the last successful save are simply dropped; the
    /// stored state remains authoritative.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.in_flight = None;
        self.is_creating = false;
        self.mode = Mode::Viewing;
    }

    pub fn autosave_armed(&self) -> bool {
        self.timer.is_armed()
    }
}
