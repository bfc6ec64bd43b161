//! Live rewriting of typed text: a `"- "` line prefix becomes a bullet
//! glyph without disturbing the caret.

/// Glyph swapped in for a typed `"- "` prefix.
pub const BULLET: &str = "•";

/// Result of an autoformat pass: the rewritten buffer and the cursor
/// position (in chars) that keeps the caret visually where the user left it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub cursor: usize,
}

/// Rewrite `new_text` after a buffer change, adjusting `cursor` (a char
/// index into `new_text`) for any width change on its own line.
///
/// Every line whose first two characters are exactly `"- "` gets that
/// prefix replaced by [`BULLET`] + space, all in a single pass. The rewrite
/// is purely additive formatting; user content after the prefix is never
/// touched. Total over all inputs: malformed or unchanged input comes back
/// as-is with the cursor unmoved (clamped to the text length).
pub fn transform(old_text: &str, new_text: &str, cursor: usize) -> Rewrite {
    transform_with_glyph(old_text, new_text, cursor, BULLET)
}

/// [`transform`] with a caller-chosen glyph, which may differ in character
/// width from the `"- "` prefix it replaces.
pub fn transform_with_glyph(old_text: &str, new_text: &str, cursor: usize, glyph: &str) -> Rewrite {
    let unchanged = |text: &str| Rewrite {
        text: text.to_string(),
        cursor: cursor.min(text.chars().count()),
    };
    if old_text == new_text {
        return unchanged(new_text);
    }

    let glyph_chars = glyph.chars().count();
    let mut out = String::with_capacity(new_text.len() + glyph.len());
    let mut new_cursor = cursor;
    let mut line_start = 0usize; // char offset of the current line in new_text
    let mut rewrote = false;

    for (i, line) in new_text.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let line_chars = line.chars().count();
        if let Some(rest) = line.strip_prefix("- ") {
            out.push_str(glyph);
            out.push(' ');
            out.push_str(rest);
            rewrote = true;
            // Only the line holding the caret shifts it; the prefix grew (or
            // shrank) by glyph width + space minus the two typed chars.
            if cursor >= line_start && cursor <= line_start + line_chars {
                let shift = glyph_chars as isize + 1 - 2;
                new_cursor = new_cursor.saturating_add_signed(shift);
            }
        } else {
            out.push_str(line);
        }
        line_start += line_chars + 1;
    }

    if !rewrote {
        return unchanged(new_text);
    }
    let total = out.chars().count();
    Rewrite {
        text: out,
        cursor: new_cursor.min(total),
    }
}
