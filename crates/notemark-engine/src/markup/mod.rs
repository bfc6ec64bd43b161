//! Rendering for the notemark markup dialect.
//!
//! The dialect is a small set of Slack-style conventions: `*bold*`,
//! `_italic_`, `~strikethrough~`, backtick code (inline and triple-backtick
//! fenced), `> ` quotes, `• `/`- ` list items and `#`–`###` headers.
//!
//! Rendering is a fixed sequence of substitution passes over the text (see
//! [`passes::PASSES`]). The order is a contract, not an implementation
//! detail: code is extracted before any inline pass so markers inside code
//! are never interpreted, headers are matched longest-prefix first, and
//! newlines are converted only after every line-anchored pass has run.
//!
//! [`render`] is total: malformed or unterminated markup stays literal text
//! and no input can make it panic or emit unbalanced tags.

pub(crate) mod passes;
mod preview;

pub use preview::preview_line;

use passes::Stashed;

/// Working state threaded through the render pipeline.
///
/// `text` is the fragment under construction. `stash` holds code segments
/// extracted by the early passes so the later ones can never rewrite their
/// contents; the restore pass splices them back in at the end.
pub(crate) struct RenderBuf {
    pub(crate) text: String,
    pub(crate) stash: Vec<Stashed>,
}

impl RenderBuf {
    pub(crate) fn new(content: &str) -> Self {
        Self {
            text: content.to_string(),
            stash: Vec::new(),
        }
    }
}

/// Render markup `content` into an HTML fragment for preview display.
///
/// Pure function: no side effects, identical output for identical input,
/// never panics. Well-formedness of the markup is not required; anything the
/// passes cannot match is left as (escaped) literal text.
pub fn render(content: &str) -> String {
    let mut buf = RenderBuf::new(content);
    for (_name, pass) in passes::PASSES {
        pass(&mut buf);
    }
    buf.text
}
