//! End-to-end flows wiring the editor session to a real store, the way a
//! host UI drives them.

use std::time::{Duration, Instant};

use notemark_engine::editor::{EditorSession, Mode, Notice, SaveRequest, SaveStatus};
use notemark_engine::store::{MemoryStore, NoteStore, StoreError, apply_save};
use notemark_engine::{markup, models::NoteId};

const QUIET: Duration = Duration::from_millis(1000);

/// Drive one pending save request through the store and back, as a host
/// event loop does after `poll` or `save` hands it a request.
fn run_save(session: &mut EditorSession, store: &mut MemoryStore, request: SaveRequest) {
    let outcome = apply_save(store, &request);
    session.complete_save(outcome);
}

#[test]
fn typing_a_grocery_list_creates_one_autoformatted_note() {
    let start = Instant::now();
    let mut store = MemoryStore::new();
    let mut session = EditorSession::new_note(QUIET);

    session.edit_title("Groceries", start);
    session.edit_content("- milk", 6, start + Duration::from_millis(100));
    session.edit_content("• milk\n- eggs", 13, start + Duration::from_millis(200));

    // Nothing persists until the quiet interval has elapsed.
    assert!(session.poll(start + Duration::from_millis(900)).is_none());
    assert!(store.list(false).unwrap().is_empty());

    let request = session
        .poll(start + Duration::from_millis(200) + QUIET)
        .expect("debounce should fire once quiet");
    assert_eq!(
        request,
        SaveRequest::Create {
            title: "Groceries".to_string(),
            content: "• milk\n• eggs".to_string(),
        }
    );
    run_save(&mut session, &mut store, request);

    let notes = store.list(false).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].title, "Groceries");
    assert_eq!(notes[0].content, "• milk\n• eggs");
    assert_eq!(session.note_id(), Some(notes[0].id));
    assert_eq!(session.save_status(), SaveStatus::Saved);

    // The preview of the saved content shows two distinct list items.
    let preview = markup::render(&notes[0].content);
    assert_eq!(
        preview,
        "<li class=\"bullet\">milk</li><br><li class=\"bullet\">eggs</li>"
    );
}

#[test]
fn rendering_an_existing_note_bolds_the_marked_span() {
    let mut store = MemoryStore::new();
    let id = store.create("Note", "*important* note").unwrap();

    let note = store.get(id).unwrap().unwrap();
    assert_eq!(
        markup::render(&note.content),
        "<strong>important</strong> note"
    );
}

#[test]
fn racing_debounce_fires_create_exactly_one_document() {
    let start = Instant::now();
    let mut store = MemoryStore::new();
    let mut session = EditorSession::new_note(QUIET);

    session.edit_title("Only one", start);
    let first = session.poll(start + QUIET).expect("first fire");

    // A second quiet interval elapses before the host finishes the create;
    // the guard swallows the second fire.
    session.edit_content("late", 4, start + QUIET);
    assert!(session.poll(start + QUIET + QUIET).is_none());

    run_save(&mut session, &mut store, first);

    assert_eq!(store.list(false).unwrap().len(), 1);
    let stored_id = store.list(false).unwrap()[0].id;
    assert_eq!(session.note_id(), Some(stored_id));

    // The keystroke that landed mid-flight is still unsaved and goes out as
    // an update on the next cycle.
    session.edit_content("late!", 5, start + QUIET * 3);
    let retry = session.poll(start + QUIET * 4).expect("follow-up save");
    assert!(matches!(retry, SaveRequest::Update { id, .. } if id == stored_id));
    run_save(&mut session, &mut store, retry);
    assert_eq!(store.get(stored_id).unwrap().unwrap().content, "late!");
}

#[test]
fn explicit_save_persists_and_returns_to_viewing() {
    let start = Instant::now();
    let mut store = MemoryStore::new();
    let mut session = EditorSession::new_note(QUIET);

    session.edit_title("Shortcut", start);
    session.edit_content("body", 4, start);

    let request = session.save(start).expect("explicit save issues a request");
    let outcome = apply_save(&mut store, &request);
    let report = session.complete_save(outcome);

    assert_eq!(report.mode, Mode::Viewing);
    assert_eq!(report.notice, Some(Notice::Created));
    assert_eq!(store.list(false).unwrap()[0].title, "Shortcut");
}

#[test]
fn failed_update_is_retried_by_the_next_cycle() {
    let start = Instant::now();
    let mut store = MemoryStore::new();
    let mut session = EditorSession::new_note(QUIET);

    session.edit_title("Flaky", start);
    let request = session.poll(start + QUIET).unwrap();
    run_save(&mut session, &mut store, request);
    let id = session.note_id().unwrap();

    // The note vanishes server-side; the next autosave fails.
    store.delete(id).unwrap();
    session.edit_content("doomed edit", 11, start + QUIET * 2);
    let request = session.poll(start + QUIET * 3).unwrap();
    let report = session.complete_save(apply_save(&mut store, &request));

    assert_eq!(report.status, SaveStatus::Error);
    assert_eq!(report.notice, Some(Notice::SaveFailed));
    assert!(session.has_unsaved_changes());

    // A later edit re-arms the debounce and tries again.
    session.edit_content("recovered", 9, start + QUIET * 4);
    assert!(session.poll(start + QUIET * 5).is_some());
}

#[test]
fn save_against_missing_note_reports_not_found() {
    let mut store = MemoryStore::new();
    let missing = NoteId::new();
    let request = SaveRequest::Update {
        id: missing,
        title: "ghost".to_string(),
        content: String::new(),
    };
    assert!(matches!(
        apply_save(&mut store, &request),
        Err(StoreError::NotFound(id)) if id == missing
    ));
}

#[test]
fn cancel_abandons_local_edits() {
    let start = Instant::now();
    let mut store = MemoryStore::new();
    let id = store.create("Stable", "original").unwrap();

    let note = store.get(id).unwrap().unwrap();
    let mut session = EditorSession::open(&note, QUIET);
    session.begin_editing();
    session.edit_content("scratch work", 12, start);
    session.cancel();

    assert_eq!(session.mode(), Mode::Viewing);
    assert!(session.poll(start + QUIET * 10).is_none());
    // The store never saw the abandoned edit.
    assert_eq!(store.get(id).unwrap().unwrap().content, "original");
}
