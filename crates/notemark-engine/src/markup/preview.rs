//! First-line summaries for note lists.
//!
//! This is a deliberately shorter pipeline than [`render`](super::render):
//! only one line is shown, so quotes, lists and headers are skipped, and
//! fenced code collapses to a placeholder instead of rendering.

use std::sync::OnceLock;

use regex::Regex;

use super::RenderBuf;
use super::passes;

/// Maximum characters of the raw first line kept in a summary.
const MAX_CHARS: usize = 100;

/// Appended when the first line was cut at [`MAX_CHARS`].
const ELLIPSIS: &str = "...";

/// Shown in place of fenced code, which has no sensible one-line rendering.
const CODE_BLOCK_PLACEHOLDER: &str = "[code block]";

/// Produce the one-line formatted summary of `content` for list display.
///
/// Takes the text up to the first newline, truncates it to 100 characters
/// (appending `...`) before any formatting so a cut can never split an
/// emitted tag, then applies the inline passes: code-block placeholder,
/// inline code, bold, italic, strikethrough.
pub fn preview_line(content: &str) -> String {
    let first_line = content.split('\n').next().unwrap_or("");
    let truncated = truncate_chars(first_line, MAX_CHARS);

    let mut buf = RenderBuf::new(&truncated);
    passes::escape(&mut buf);
    code_block_placeholder(&mut buf);
    passes::inline_code(&mut buf);
    passes::bold(&mut buf);
    passes::italic(&mut buf);
    passes::strikethrough(&mut buf);
    passes::restore_code(&mut buf);
    buf.text
}

/// Replace paired triple-backtick markers and everything between them.
fn code_block_placeholder(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"(?s)```(.*?)```").expect("invalid fence pattern"));
    buf.text = re.replace_all(&buf.text, CODE_BLOCK_PLACEHOLDER).into_owned();
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}{ELLIPSIS}", &s[..byte_idx]),
        None => s.to_string(),
    }
}
