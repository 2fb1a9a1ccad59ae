//! Punctuation fixup applied to comment text as it is written out.
//!
//! Sentences get an upper-case first letter, lines starting with a list
//! marker (`-`, `*`, `1.`, `2)`, `(3)`) are forced onto a new line, and text
//! that stops mid-sentence gets a closing period. Running the fixup over
//! its own output changes nothing.

use std::sync::LazyLock;

use regex::Regex;

use crate::output::Output;

/// Format-dependent fixup behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FixupStyle {
    /// Lines starting with `.` are formatter requests and pass unaltered.
    pub dot_commands: bool,
    /// An empty line forces a line break.
    pub blank_line_breaks: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    Period,
    Capitalise,
}

impl State {
    /// Advances over `c`, returning the character to emit.
    fn step(&mut self, c: char, capitalise: bool) -> char {
        if c == '.' {
            *self = State::Period;
        } else if c.is_ascii_whitespace() && *self == State::Period {
            *self = State::Capitalise;
        } else if c.is_ascii_alphanumeric() {
            let upper = capitalise && *self == State::Capitalise && c.is_ascii_lowercase();
            *self = State::Text;
            if upper {
                return c.to_ascii_uppercase();
            }
        }
        c
    }
}

static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\(\d+\)|\d+[.)])").expect("static regex must compile"));

/// Whether `text` starts with a numbered list marker: `1.`, `2)` or `(3)`.
pub fn is_numbered(text: &str) -> bool {
    NUMBERED.is_match(text)
}

fn is_list_marker(text: &str) -> bool {
    text.starts_with(['-', '*']) || is_numbered(text)
}

/// Writes prose through `out.character`, fixing up punctuation.
pub fn description<O: Output + ?Sized>(out: &mut O, text: &str) {
    let style = out.fixup_style();
    let mut state = State::Capitalise;
    let mut new_line = true;
    let mut dot_command = false;
    let mut last = '\n';

    for (i, c) in text.char_indices() {
        let mut c = c;
        if dot_command {
            if c == '\n' {
                dot_command = false;
            }
        } else if new_line && c == '.' && style.dot_commands {
            dot_command = true;
        } else if new_line && (is_list_marker(&text[i..]) || (style.blank_line_breaks && c == '\n')) {
            out.break_line();
            state = State::Capitalise;
        } else {
            c = state.step(c, true);
        }
        out.character(c);
        new_line = c == '\n';
        last = c;
    }

    if !dot_command && state == State::Text && last.is_ascii_alphanumeric() {
        out.character('.');
    }
}

/// Whether a returns line opens a tagged entry: a word followed by a colon
/// or a tab, e.g. `EINVAL:` or `NULL\tnothing found`.
fn is_tagged(line: &str) -> bool {
    let word_end = line
        .find(|c: char| c == ':' || c.is_ascii_whitespace())
        .unwrap_or(line.len());
    if word_end == 0 {
        return false;
    }
    for c in line[word_end..].chars() {
        if c == '\t' || c == ':' {
            return true;
        }
        if !c.is_ascii_whitespace() {
            return false;
        }
    }
    false
}

/// Writes a RETURNS body, turning tagged lines into a tag list.
pub fn returns<O: Output + ?Sized>(out: &mut O, comment: &str) {
    let style = out.fixup_style();
    let fixup = out.settings().fixup_comments;
    let mut state = State::Capitalise;
    let mut last = '\n';
    let mut list_started = false;

    for mut line in comment.lines() {
        let dot = style.dot_commands && line.starts_with('.');

        if !dot && is_tagged(line) {
            if last != '\n' {
                if state == State::Text && !last.is_ascii_punctuation() {
                    out.character('.');
                }
                out.character('\n');
                last = '\n';
            }
            if !list_started {
                out.tag_list_start();
                list_started = true;
            }

            let tag_end = line
                .find(|c: char| c == ':' || c.is_ascii_whitespace())
                .unwrap_or(line.len());
            out.tag_entry_start();
            for c in line[..tag_end].chars() {
                out.character(c);
            }
            out.tag_entry_end();

            line = line[tag_end..].trim_start_matches(|c: char| c == ':' || c.is_ascii_whitespace());
            state = State::Capitalise;
        }

        if last != '\n' {
            out.character('\n');
            last = '\n';
        }

        if dot {
            for c in line.chars() {
                out.character(c);
            }
            out.character('\n');
            continue;
        }

        for c in line.chars() {
            last = state.step(c, fixup);
            out.character(last);
        }
        if last.is_ascii_punctuation() {
            if last == '.' {
                state = State::Capitalise;
            }
            out.character('\n');
            last = '\n';
        }
    }

    if last != '\n' {
        if state == State::Text && !last.is_ascii_punctuation() && fixup {
            out.character('.');
        }
        out.character('\n');
    }
    if list_started {
        out.tag_list_end();
    }
}
