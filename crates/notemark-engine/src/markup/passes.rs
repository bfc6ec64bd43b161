//! The ordered substitution passes behind [`render`](super::render).
//!
//! Every pass has the signature `fn(&mut RenderBuf)` and runs exactly once,
//! in the order given by [`PASSES`]. Preconditions are positional: the code
//! extraction passes assume escaping has already happened, the inline passes
//! assume code has been stashed, and the restore pass assumes it runs last.

use std::sync::OnceLock;

use regex::{Captures, Regex};

use super::RenderBuf;

/// Sentinel pair reserved for stashed code segments.
///
/// The escape pass folds any occurrence of these characters in the input to
/// U+FFFD, so the restore pass only ever resolves sentinels the pipeline
/// itself emitted.
pub(crate) const STASH_OPEN: char = '\u{E000}';
pub(crate) const STASH_CLOSE: char = '\u{E001}';

/// A code segment lifted out of the text until the restore pass.
pub(crate) enum Stashed {
    /// Triple-backtick fenced block, restored as `<pre><code>`.
    Block(String),
    /// Single-backtick span, restored as `<code>`.
    Inline(String),
}

pub(crate) type Pass = (&'static str, fn(&mut RenderBuf));

/// The full rendering pipeline, applied strictly in order.
pub(crate) const PASSES: &[Pass] = &[
    ("escape", escape),
    ("code-blocks", code_blocks),
    ("inline-code", inline_code),
    ("bold", bold),
    ("italic", italic),
    ("strikethrough", strikethrough),
    ("quotes", quotes),
    ("list-items", list_items),
    ("headers", headers),
    ("line-breaks", line_breaks),
    ("restore-code", restore_code),
];

fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("invalid markup pattern"))
}

/// HTML-escape the raw input and fold foreign stash sentinels.
pub(crate) fn escape(buf: &mut RenderBuf) {
    let mut escaped = html_escape::encode_text(&buf.text).into_owned();
    if escaped.contains(STASH_OPEN) || escaped.contains(STASH_CLOSE) {
        escaped = escaped.replace([STASH_OPEN, STASH_CLOSE], "\u{FFFD}");
    }
    buf.text = escaped;
}

/// Extract triple-backtick fenced blocks (multi-line, non-greedy).
pub(crate) fn code_blocks(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"(?s)```(.*?)```");
    stash_matches(buf, re, Stashed::Block);
}

/// Extract single-backtick code spans, scoped to one line.
pub(crate) fn inline_code(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"`([^`\n]+)`");
    stash_matches(buf, re, Stashed::Inline);
}

pub(crate) fn bold(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"\*([^*]+)\*");
    buf.text = re
        .replace_all(&buf.text, "<strong>$1</strong>")
        .into_owned();
}

pub(crate) fn italic(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"_([^_]+)_");
    buf.text = re.replace_all(&buf.text, "<em>$1</em>").into_owned();
}

pub(crate) fn strikethrough(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"~([^~]+)~");
    buf.text = re.replace_all(&buf.text, "<del>$1</del>").into_owned();
}

/// Lines starting `> ` become quote blocks. The prefix is matched in its
/// escaped form because escaping runs before this pass.
fn quotes(buf: &mut RenderBuf) {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = cached(&RE, r"(?m)^&gt; (.+)$");
    buf.text = re
        .replace_all(&buf.text, "<blockquote>$1</blockquote>")
        .into_owned();
}

/// Lines starting `• ` or `- ` become list items. The two marker styles are
/// kept distinct rather than merged.
fn list_items(buf: &mut RenderBuf) {
    static BULLET: OnceLock<Regex> = OnceLock::new();
    static DASH: OnceLock<Regex> = OnceLock::new();
    let bullet = cached(&BULLET, r"(?m)^• (.+)$");
    let dash = cached(&DASH, r"(?m)^- (.+)$");
    buf.text = bullet
        .replace_all(&buf.text, "<li class=\"bullet\">$1</li>")
        .into_owned();
    buf.text = dash
        .replace_all(&buf.text, "<li class=\"dash\">$1</li>")
        .into_owned();
}

/// `#`–`###` line prefixes become headers, longest prefix first so `### ` is
/// never consumed as `# ` with leftover hashes.
fn headers(buf: &mut RenderBuf) {
    static H3: OnceLock<Regex> = OnceLock::new();
    static H2: OnceLock<Regex> = OnceLock::new();
    static H1: OnceLock<Regex> = OnceLock::new();
    let levels = [
        (cached(&H3, r"(?m)^### (.+)$"), "<h3>$1</h3>"),
        (cached(&H2, r"(?m)^## (.+)$"), "<h2>$1</h2>"),
        (cached(&H1, r"(?m)^# (.+)$"), "<h1>$1</h1>"),
    ];
    for (re, replacement) in levels {
        buf.text = re.replace_all(&buf.text, replacement).into_owned();
    }
}

fn line_breaks(buf: &mut RenderBuf) {
    buf.text = buf.text.replace('\n', "<br>");
}

/// Splice stashed code back in, wrapped in its final tags.
pub(crate) fn restore_code(buf: &mut RenderBuf) {
    if buf.stash.is_empty() {
        return;
    }
    let mut out = String::with_capacity(buf.text.len());
    let mut rest = buf.text.as_str();
    while let Some(open) = rest.find(STASH_OPEN) {
        out.push_str(&rest[..open]);
        rest = &rest[open + STASH_OPEN.len_utf8()..];
        let Some(close) = rest.find(STASH_CLOSE) else {
            out.push_str(rest);
            rest = "";
            break;
        };
        let index = rest[..close].parse::<usize>().ok();
        rest = &rest[close + STASH_CLOSE.len_utf8()..];
        match index.and_then(|i| buf.stash.get(i)) {
            Some(Stashed::Block(code)) => {
                out.push_str("<pre><code>");
                out.push_str(code);
                out.push_str("</code></pre>");
            }
            Some(Stashed::Inline(code)) => {
                out.push_str("<code>");
                out.push_str(code);
                out.push_str("</code>");
            }
            None => {}
        }
    }
    out.push_str(rest);
    buf.text = out;
}

/// Replace every match with a stash sentinel, keeping group 1 for restore.
fn stash_matches(buf: &mut RenderBuf, re: &Regex, wrap: fn(String) -> Stashed) {
    let RenderBuf { text, stash } = buf;
    *text = re
        .replace_all(text, |caps: &Captures<'_>| {
            stash.push(wrap(caps[1].to_string()));
            format!("{STASH_OPEN}{}{STASH_CLOSE}", stash.len() - 1)
        })
        .into_owned();
}
