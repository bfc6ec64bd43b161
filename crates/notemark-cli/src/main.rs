use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use notemark_config::{Config, DEFAULT_AUTOSAVE_DELAY_MS};
use notemark_engine::{
    EditorSession, JsonStore, Mode, Note, NoteStore, Notice, SaveStatus, apply_save, markup,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::{
    env,
    io::stdout,
    path::PathBuf,
    process,
    time::{Duration, Instant},
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Which input the editor currently feeds keystrokes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Title,
    Content,
}

struct Editor {
    session: EditorSession,
    focus: Focus,
    /// Caret position in the content buffer, in chars.
    cursor: usize,
}

struct App {
    store: JsonStore,
    autosave_delay: Duration,
    notes: Vec<Note>,
    list_state: ListState,
    show_archived: bool,
    editor: Option<Editor>,
    status: Option<String>,
}

impl App {
    fn new(store: JsonStore, autosave_delay: Duration) -> Result<Self> {
        let mut app = Self {
            store,
            autosave_delay,
            notes: Vec::new(),
            list_state: ListState::default(),
            show_archived: false,
            editor: None,
            status: None,
        };
        app.refresh_notes();
        if !app.notes.is_empty() {
            app.list_state.select(Some(0));
        }
        Ok(app)
    }

    fn refresh_notes(&mut self) {
        match self.store.list(self.show_archived) {
            Ok(notes) => self.notes = notes,
            Err(e) => self.status = Some(format!("Error listing notes: {e}")),
        }
        let len = self.notes.len();
        match self.list_state.selected() {
            Some(i) if len > 0 => self.list_state.select(Some(i.min(len - 1))),
            _ if len > 0 => self.list_state.select(Some(0)),
            _ => self.list_state.select(None),
        }
    }

    fn next_note(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1) % self.notes.len(),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    fn previous_note(&mut self) {
        if self.notes.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => self.notes.len() - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    fn selected_note(&self) -> Option<&Note> {
        self.list_state.selected().and_then(|i| self.notes.get(i))
    }

    fn open_new_editor(&mut self) {
        self.editor = Some(Editor {
            session: EditorSession::new_note(self.autosave_delay),
            focus: Focus::Title,
            cursor: 0,
        });
    }

    fn open_selected_editor(&mut self) {
        if let Some(note) = self.selected_note() {
            let mut session = EditorSession::open(note, self.autosave_delay);
            session.begin_editing();
            let cursor = session.content().chars().count();
            self.editor = Some(Editor {
                session,
                focus: Focus::Content,
                cursor,
            });
        }
    }

    /// Handle a key while the note list has focus. Returns `false` to quit.
    fn list_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return false,
            KeyCode::Down | KeyCode::Char('j') => self.next_note(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_note(),
            KeyCode::Char('n') => self.open_new_editor(),
            KeyCode::Enter | KeyCode::Char('e') => self.open_selected_editor(),
            KeyCode::Char('v') => {
                self.show_archived = !self.show_archived;
                self.refresh_notes();
            }
            KeyCode::Char('a') => {
                if let Some(id) = self.selected_note().map(|n| n.id) {
                    let result = if self.show_archived {
                        self.store.restore(id)
                    } else {
                        self.store.archive(id)
                    };
                    self.status = Some(match result {
                        Ok(()) if self.show_archived => "Note restored".to_string(),
                        Ok(()) => "Note archived".to_string(),
                        Err(e) => format!("Error: {e}"),
                    });
                    self.refresh_notes();
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = self.selected_note().map(|n| n.id) {
                    self.status = Some(match self.store.duplicate(id) {
                        Ok(_) => "Note duplicated".to_string(),
                        Err(e) => format!("Error: {e}"),
                    });
                    self.refresh_notes();
                }
            }
            KeyCode::Char('x') => {
                if let Some(id) = self.selected_note().map(|n| n.id) {
                    self.status = Some(match self.store.delete(id) {
                        Ok(()) => "Note deleted".to_string(),
                        Err(e) => format!("Error: {e}"),
                    });
                    self.refresh_notes();
                }
            }
            _ => {}
        }
        true
    }

    /// Handle a key while the editor overlay is open.
    fn editor_key(&mut self, key: KeyEvent) {
        let now = Instant::now();
        let Some(editor) = self.editor.as_mut() else {
            return;
        };

        if key.code == KeyCode::Esc {
            editor.session.cancel();
            self.editor = None;
            self.status = Some("Editing cancelled".to_string());
            self.refresh_notes();
            return;
        }

        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('s') {
            self.explicit_save(now);
            return;
        }

        match key.code {
            KeyCode::Tab => {
                editor.focus = match editor.focus {
                    Focus::Title => Focus::Content,
                    Focus::Content => Focus::Title,
                };
            }
            KeyCode::Left if editor.focus == Focus::Content => {
                editor.cursor = editor.cursor.saturating_sub(1);
            }
            KeyCode::Right if editor.focus == Focus::Content => {
                let len = editor.session.content().chars().count();
                editor.cursor = (editor.cursor + 1).min(len);
            }
            KeyCode::Enter => match editor.focus {
                Focus::Title => editor.focus = Focus::Content,
                Focus::Content => Self::insert_char(editor, '\n', now),
            },
            KeyCode::Backspace => match editor.focus {
                Focus::Title => {
                    let mut title = editor.session.title().to_string();
                    title.pop();
                    editor.session.edit_title(title, now);
                }
                Focus::Content => Self::delete_char_before_cursor(editor, now),
            },
            KeyCode::Char(c) => match editor.focus {
                Focus::Title => {
                    let mut title = editor.session.title().to_string();
                    title.push(c);
                    editor.session.edit_title(title, now);
                }
                Focus::Content => Self::insert_char(editor, c, now),
            },
            _ => {}
        }
    }

    fn insert_char(editor: &mut Editor, c: char, now: Instant) {
        let content = editor.session.content();
        let byte = char_to_byte(content, editor.cursor);
        let mut next = content.to_string();
        next.insert(byte, c);
        editor.cursor = editor.session.edit_content(&next, editor.cursor + 1, now);
    }

    fn delete_char_before_cursor(editor: &mut Editor, now: Instant) {
        if editor.cursor == 0 {
            return;
        }
        let content = editor.session.content();
        let start = char_to_byte(content, editor.cursor - 1);
        let end = char_to_byte(content, editor.cursor);
        let mut next = content.to_string();
        next.replace_range(start..end, "");
        editor.cursor = editor.session.edit_content(&next, editor.cursor - 1, now);
    }

    fn explicit_save(&mut self, now: Instant) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let Some(request) = editor.session.save(now) else {
            self.status = Some("A title is required before saving".to_string());
            return;
        };
        let outcome = apply_save(&mut self.store, &request);
        let report = editor.session.complete_save(outcome);
        self.status = notice_text(report.notice);
        if report.mode == Mode::Viewing {
            self.editor = None;
        }
        self.refresh_notes();
    }

    /// Fire any due autosave. Called from the event loop on every tick so
    /// the debounce elapses even without keyboard input.
    fn drain_autosave(&mut self, now: Instant) {
        let Some(editor) = self.editor.as_mut() else {
            return;
        };
        let Some(request) = editor.session.poll(now) else {
            return;
        };
        let outcome = apply_save(&mut self.store, &request);
        let report = editor.session.complete_save(outcome);
        // Successful autosaves stay silent; only failures get surfaced.
        if report.notice == Some(Notice::SaveFailed) {
            self.status = notice_text(report.notice);
        }
        self.refresh_notes();
    }
}

fn notice_text(notice: Option<Notice>) -> Option<String> {
    notice.map(|n| {
        match n {
            Notice::Created => "Note created",
            Notice::Updated => "Note updated",
            Notice::SaveFailed => "Save failed",
        }
        .to_string()
    })
}

fn char_to_byte(s: &str, idx: usize) -> usize {
    s.char_indices().nth(idx).map(|(b, _)| b).unwrap_or(s.len())
}

fn setup_logging() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    // Determine the notes file from CLI args or the config file
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let notes_path;
    let autosave_delay;

    if args.len() == 2 {
        notes_path = PathBuf::from(&args[1]);
        autosave_delay = Duration::from_millis(DEFAULT_AUTOSAVE_DELAY_MS);
    } else if args.len() == 1 {
        match Config::load() {
            Ok(Some(config)) => {
                autosave_delay = config.autosave_delay();
                notes_path = config.notes_path;
            }
            Ok(None) => {
                eprintln!("Error: No notes file provided and no config file found");
                eprintln!("Usage: {} <notes-file-path>", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <notes-file-path>", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [notes-file-path]", args[0]);
        process::exit(1);
    };

    let store = match JsonStore::open(&notes_path) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: Notes file '{}' is invalid: {e}", notes_path.display());
            process::exit(1);
        }
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app
    let mut app = App::new(store, autosave_delay)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    <B as ratatui::backend::Backend>::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Poll with a timeout so the autosave debounce can fire while the
        // keyboard is idle.
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
        {
            if app.editor.is_some() {
                app.editor_key(key);
            } else if !app.list_key(key) {
                return Ok(());
            }
        }

        app.drain_autosave(Instant::now());
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)].as_ref())
        .split(outer[0]);

    // Note list panel
    let items: Vec<ListItem> = app
        .notes
        .iter()
        .map(|note| {
            let title = if note.title.is_empty() {
                "Untitled"
            } else {
                note.title.as_str()
            };
            ListItem::new(vec![Line::from(vec![Span::raw(title.to_string())])])
        })
        .collect();

    let list_title = if app.show_archived {
        "Archived notes"
    } else {
        "Notes"
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(list_title))
        .highlight_style(Style::default().bg(Color::Yellow).fg(Color::Black));
    f.render_stateful_widget(list, chunks[0], &mut app.list_state);

    // Detail panel
    if let Some(editor) = &app.editor {
        render_editor(f, chunks[1], editor);
    } else {
        render_preview(f, chunks[1], app.selected_note());
    }

    // Status and key help
    let help = if app.editor.is_some() {
        "Tab: Switch field | Ctrl+S: Save | Esc: Cancel"
    } else {
        "q: Quit | j/k: Move | n: New | e/Enter: Edit | a: Archive/Restore | d: Duplicate | x: Delete | v: Toggle archived"
    };
    let mut footer = vec![Line::from(Span::raw(help))];
    if let Some(status) = &app.status {
        footer.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Cyan),
        )));
    }
    f.render_widget(Paragraph::new(footer), outer[1]);
}

fn render_preview(f: &mut Frame, area: ratatui::layout::Rect, note: Option<&Note>) {
    let halves = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let (source, preview, summary) = match note {
        Some(note) => (
            note.content.clone(),
            markup::render(&note.content),
            markup::preview_line(&note.content),
        ),
        None => (
            "Select a note, or press n to start one".to_string(),
            String::new(),
            String::new(),
        ),
    };

    let source_lines: Vec<Line> = source.lines().map(|l| Line::from(l.to_string())).collect();
    f.render_widget(
        Paragraph::new(source_lines)
            .block(Block::default().borders(Borders::ALL).title("Source"))
            .wrap(Wrap { trim: false }),
        halves[0],
    );

    let mut preview_lines = vec![Line::from(Span::styled(
        summary,
        Style::default().fg(Color::DarkGray),
    ))];
    preview_lines.push(Line::from(preview));
    f.render_widget(
        Paragraph::new(preview_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Preview (HTML fragment)"),
            )
            .wrap(Wrap { trim: false }),
        halves[1],
    );
}

fn render_editor(f: &mut Frame, area: ratatui::layout::Rect, editor: &Editor) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(0),
            ]
            .as_ref(),
        )
        .split(area);

    let title_style = if editor.focus == Focus::Title {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let title_text = if editor.session.title().is_empty() {
        Span::styled("Untitled", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw(editor.session.title().to_string())
    };
    f.render_widget(
        Paragraph::new(Line::from(title_text)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Title")
                .border_style(title_style),
        ),
        rows[0],
    );

    let status = match editor.session.save_status() {
        SaveStatus::Saving => Span::styled("Saving...", Style::default().fg(Color::Blue)),
        SaveStatus::Error => Span::styled("Error saving", Style::default().fg(Color::Red)),
        SaveStatus::Saved if editor.session.has_unsaved_changes() => {
            Span::styled("Unsaved changes", Style::default().fg(Color::Yellow))
        }
        SaveStatus::Saved => Span::styled("Saved", Style::default().fg(Color::Green)),
    };
    f.render_widget(Paragraph::new(Line::from(status)), rows[1]);

    // Show the caret as a marker character at the cursor position.
    let mut content = editor.session.content().to_string();
    if editor.focus == Focus::Content {
        let byte = char_to_byte(&content, editor.cursor);
        content.insert(byte, '▏');
    }
    let content_style = if editor.focus == Focus::Content {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let content_lines: Vec<Line> = content.split('\n').map(|l| Line::from(l.to_string())).collect();
    f.render_widget(
        Paragraph::new(content_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Content")
                    .border_style(content_style),
            )
            .wrap(Wrap { trim: false }),
        rows[2],
    );
}
