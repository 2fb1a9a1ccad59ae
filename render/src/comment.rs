//! Splitting declaration comments into the parts of a manual page.
//!
//! A comment is read line by line. A line made only of letters, digits,
//! spaces and slashes, ending in a colon or standing alone after a blank
//! line, is a section heading:
//!
//! ```text
//! strlcpy - bounded string copy.
//!
//! Copies at most size bytes.
//!
//! RETURNS:
//! The length of src.
//!
//! Notes:
//! Always terminates dst.
//! ```
//!
//! The first line is the terse description; NAME, DESCRIPTION and RETURNS
//! headings fill the fixed slots and any other heading opens a named
//! [`Section`].

/// A named section found in a comment, e.g. `NOTES`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Heading, upper-cased.
    pub name: String,
    pub text: Option<String>,
}

/// The parts of one declaration's comment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitComment {
    pub terse: Option<String>,
    pub description: Option<String>,
    pub returns: Option<String>,
    pub sections: Vec<Section>,
    /// The description came from an explicit DESCRIPTION heading.
    pub explicit_description: bool,
}

#[derive(Clone, Copy)]
enum Slot {
    Terse,
    Description,
    Returns,
    Section(usize),
}

const TERSE_HEADINGS: [&str; 4] = ["NAME", "FUNCTION", "PROCEDURE", "ROUTINE"];

/// Headings recognised even without a blank line before them.
const KEYWORD_HEADINGS: [&str; 6] = [
    "NAME",
    "FUNCTION",
    "PROCEDURE",
    "ROUTINE",
    "DESCRIPTION",
    "RETURNS",
];

fn is_heading_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b' ' || b == b'/'
}

/// Whether `heading` is `word` or an abbreviation of it, ignoring case.
fn abbreviates(heading: &str, word: &str) -> bool {
    !heading.is_empty()
        && heading.len() <= word.len()
        && word.as_bytes()[..heading.len()].eq_ignore_ascii_case(heading.as_bytes())
}

/// Shortest abbreviation accepted for a heading without a blank line
/// before it.
const MIN_KEYWORD_ABBREVIATION: usize = 3;

fn is_keyword(name: &str) -> bool {
    let name = name.trim_end();
    name.len() >= MIN_KEYWORD_ABBREVIATION && KEYWORD_HEADINGS.iter().any(|k| abbreviates(name, k))
}

/// Skips a leading `name - ` on the first line of `text[start..]`.
///
/// The dash must be surrounded by whitespace so hyphenated words stay
/// intact. Returns the offset of the text after the dash, or `start` when
/// there is no such dash or nothing follows it.
pub fn skip_dash(text: &str, start: usize) -> usize {
    let b = text.as_bytes();
    let len = b.len();
    if start >= len {
        return start;
    }
    let mut d = start + 1;
    while d < len && b[d] != b'\n' && b[d] != b'-' {
        d += 1;
    }
    let dash = d < len
        && b[d] == b'-'
        && b[d - 1].is_ascii_whitespace()
        && b.get(d + 1).is_some_and(u8::is_ascii_whitespace);
    if dash {
        d += 1;
        while d < len && b[d] != b'\n' && b[d].is_ascii_whitespace() {
            d += 1;
        }
        if d < len && b[d] != b'\n' {
            return d;
        }
    }
    start
}

/// Splits a function comment into terse, description, returns and named
/// sections.
///
/// `identifier` is the documented name: a leading heading abbreviating it
/// starts the description. With `want_terse` false (grouped output) the
/// first line belongs to the description and NAME headings open ordinary
/// sections.
pub fn split_function_comment(comment: &str, identifier: &str, want_terse: bool) -> SplitComment {
    let b = comment.as_bytes();
    let len = b.len();
    let mut out = SplitComment::default();

    let mut slot: Option<Slot> = None;
    let mut start_text: Option<usize> = None;
    let mut end_text = 0;
    let mut last_blank = true;
    let mut dash = false;
    let mut pos = 0;

    while pos < len {
        let start_line = pos;
        if b[pos] == b'\n' {
            last_blank = true;
            pos += 1;
            continue;
        }

        let mut c = start_line;
        let mut need_colon = false;
        while c < len && is_heading_char(b[c]) {
            if b[c] == b' ' {
                need_colon = true;
            }
            c += 1;
        }
        let at = b.get(c).copied();
        let shaped = (!need_colon && at == Some(b'\n'))
            || (at == Some(b':') && (!need_colon || b.get(c + 1) == Some(&b'\n')))
            || (!need_colon && at.is_none() && start_line == 0);
        let heading = shaped && (last_blank || is_keyword(&comment[start_line..c]));
        last_blank = false;

        if heading {
            store(&mut out, comment, slot, start_text, end_text, dash);
            dash = false;

            let key = comment[start_line..c].trim_end();
            let is = |k: &str| abbreviates(key, k);
            slot = Some(if start_line == 0 && !key.is_empty() && identifier.starts_with(key) {
                Slot::Description
            } else if want_terse && TERSE_HEADINGS.iter().any(|k| is(k)) {
                dash = true;
                Slot::Terse
            } else if is("DESCRIPTION") {
                out.explicit_description = true;
                Slot::Description
            } else if is("RETURNS") {
                Slot::Returns
            } else {
                out.sections.push(Section {
                    name: key.to_ascii_uppercase(),
                    text: None,
                });
                Slot::Section(out.sections.len() - 1)
            });

            start_text = None;
            if at == Some(b':') {
                c += 1;
                while c < len && b[c] != b'\n' && b[c].is_ascii_whitespace() {
                    c += 1;
                }
                if c < len && b[c] != b'\n' {
                    start_text = Some(c);
                }
            }
        } else if start_line == 0 {
            if want_terse {
                let after_dash = skip_dash(comment, 0);
                c = 0;
                while c < len && b[c] != b'\n' {
                    c += 1;
                    // a period ends the terse line only at the end of a sentence
                    if b[c - 1] == b'.' && c < len && b[c].is_ascii_whitespace() {
                        break;
                    }
                }
                let from = if after_dash < c { after_dash } else { 0 };
                out.terse = Some(comment[from..c].to_string());

                while c < len && b[c] != b'\n' && b[c].is_ascii_whitespace() {
                    c += 1;
                }
                start_text = (c < len && b[c] != b'\n').then_some(c);
            } else {
                start_text = Some(0);
            }
            slot = Some(Slot::Description);
        } else if slot.is_some() && start_text.is_none() {
            start_text = Some(start_line);
        }

        while c < len && b[c] != b'\n' {
            c += 1;
        }
        end_text = c;
        pos = if c < len { c + 1 } else { c };
    }

    store(&mut out, comment, slot, start_text, end_text, dash);
    out
}

fn store(
    out: &mut SplitComment,
    comment: &str,
    slot: Option<Slot>,
    start_text: Option<usize>,
    end_text: usize,
    dash: bool,
) {
    let (Some(slot), Some(mut start)) = (slot, start_text) else {
        return;
    };
    if dash {
        start = skip_dash(comment, start);
    }
    let text = Some(comment[start..end_text.max(start)].to_string());
    match slot {
        Slot::Terse => out.terse = text,
        Slot::Description => out.description = text,
        Slot::Returns => out.returns = text,
        Slot::Section(i) => out.sections[i].text = text,
    }
}

/// Separates a trailing `Returns:` paragraph from a description.
///
/// The first line starting with "returns" (any case) ends the description.
/// Returns `None` when there is no such line; otherwise the description
/// before it (if any) and the text after the keyword (if any).
pub fn split_returns_comment(comment: &str) -> Option<(Option<String>, Option<String>)> {
    let mut offset = 0;
    for line in comment.split_inclusive('\n') {
        let found = line
            .get(..7)
            .is_some_and(|head| head.eq_ignore_ascii_case("returns"));
        if found {
            let description = comment[..offset].trim_end();
            let rest = comment[offset + 7..]
                .trim_start_matches(|c: char| c == ':' || c.is_ascii_whitespace())
                .trim_end();
            let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
            return Some((non_empty(description), non_empty(rest)));
        }
        offset += line.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_explicit_sections() {
        let split = split_function_comment(
            "Terse line.\nDESCRIPTION:\nBody text.\nRETURNS:\nOk or error.\n",
            "f",
            true,
        );
        assert_eq!(split.terse.as_deref(), Some("Terse line."));
        assert_eq!(split.description.as_deref(), Some("Body text."));
        assert_eq!(split.returns.as_deref(), Some("Ok or error."));
        assert!(split.explicit_description);
        assert!(split.sections.is_empty());
    }

    #[test]
    fn test_split_returns_comment() {
        let (description, returns) = split_returns_comment("Does a thing.\nReturns: the count.\n").unwrap();
        assert_eq!(description.as_deref(), Some("Does a thing."));
        assert_eq!(returns.as_deref(), Some("the count."));

        assert!(split_returns_comment("Does a thing.\nNothing else.").is_none());

        let (description, returns) = split_returns_comment("RETURNS nothing").unwrap();
        assert!(description.is_none());
        assert_eq!(returns.as_deref(), Some("nothing"));
    }

    #[test]
    fn test_terse_stops_at_sentence_end() {
        let split = split_function_comment("adds two numbers. returns: the sum.", "add", true);
        assert_eq!(split.terse.as_deref(), Some("adds two numbers."));
        assert_eq!(split.description.as_deref(), Some("returns: the sum."));
        assert!(!split.explicit_description);

        let split = split_function_comment("uses v1.2 of the protocol\nMore.", "f", true);
        assert_eq!(split.terse.as_deref(), Some("uses v1.2 of the protocol"));
        assert_eq!(split.description.as_deref(), Some("More."));
    }

    #[test]
    fn test_terse_skips_name_dash() {
        let split = split_function_comment("strlcpy - bounded copy\n\nCopies bytes.", "strlcpy", true);
        assert_eq!(split.terse.as_deref(), Some("bounded copy"));
        assert_eq!(split.description.as_deref(), Some("Copies bytes."));

        let split = split_function_comment("well-known value", "v", true);
        assert_eq!(split.terse.as_deref(), Some("well-known value"));
    }

    #[test]
    fn test_named_sections_after_blank_line() {
        let comment = "Copies a string.\n\nCopies at most size bytes.\n\nNotes:\nAlways terminates.\n\nSee also/bugs:\n\nHistory\nOld.";
        let split = split_function_comment(comment, "copy", true);
        assert_eq!(split.description.as_deref(), Some("Copies at most size bytes."));
        assert_eq!(
            split.sections,
            vec![
                Section {
                    name: "NOTES".to_string(),
                    text: Some("Always terminates.".to_string()),
                },
                Section {
                    name: "SEE ALSO/BUGS".to_string(),
                    text: None,
                },
                Section {
                    name: "HISTORY".to_string(),
                    text: Some("Old.".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_heading_needs_blank_line_unless_keyword() {
        let split = split_function_comment("First.\nExample\nmore", "f", true);
        assert!(split.sections.is_empty());
        assert_eq!(split.description.as_deref(), Some("Example\nmore"));

        let split = split_function_comment("First.\nReturns:\nzero", "f", true);
        assert_eq!(split.returns.as_deref(), Some("zero"));
        assert!(split.description.is_none());
    }

    #[test]
    fn test_abbreviated_headings() {
        let split = split_function_comment("Adds numbers.\n\nReturn:\nthe sum.\n", "add", true);
        assert_eq!(split.returns.as_deref(), Some("the sum."));
        assert!(split.sections.is_empty());

        let split = split_function_comment("Func: add - adds numbers\n\nDesc:\nSums both.", "add", true);
        assert_eq!(split.terse.as_deref(), Some("adds numbers"));
        assert_eq!(split.description.as_deref(), Some("Sums both."));
        assert!(split.explicit_description);

        let split = split_function_comment("First.\nRet:\nzero", "f", true);
        assert_eq!(split.returns.as_deref(), Some("zero"));

        let split = split_function_comment("First.\nRe:\nzero", "f", true);
        assert!(split.returns.is_none());
    }

    #[test]
    fn test_abbreviated_identifier_heading() {
        let split = split_function_comment("str:\nCopies.", "strcpy", true);
        assert!(split.terse.is_none());
        assert_eq!(split.description.as_deref(), Some("Copies."));
    }

    #[test]
    fn test_heading_with_spaces_needs_colon() {
        let split = split_function_comment("First.\n\nsee also this\nBody", "f", true);
        assert!(split.sections.is_empty());

        let split = split_function_comment("First.\n\nsee also: this", "f", true);
        assert!(split.sections.is_empty());

        let split = split_function_comment("First.\n\nsee also:\nthis", "f", true);
        assert_eq!(split.sections[0].name, "SEE ALSO");
        assert_eq!(split.sections[0].text.as_deref(), Some("this"));
    }

    #[test]
    fn test_identifier_heading_starts_description() {
        let split = split_function_comment("add:\nAdds numbers.", "add", true);
        assert!(split.terse.is_none());
        assert_eq!(split.description.as_deref(), Some("Adds numbers."));
    }

    #[test]
    fn test_name_heading_fills_terse() {
        let split = split_function_comment("NAME\nadd - adds numbers\n\nDESCRIPTION\nSums.", "add", true);
        assert_eq!(split.terse.as_deref(), Some("adds numbers"));
        assert_eq!(split.description.as_deref(), Some("Sums."));

        let grouped = split_function_comment("NAME\nadd - adds numbers", "add", false);
        assert!(grouped.terse.is_none());
        assert_eq!(grouped.sections[0].name, "NAME");
    }

    #[test]
    fn test_grouped_comment_is_all_description() {
        let split = split_function_comment("Adds numbers.\nTwo of them.", "add", false);
        assert!(split.terse.is_none());
        assert_eq!(split.description.as_deref(), Some("Adds numbers.\nTwo of them."));
    }

    #[test]
    fn test_skip_dash() {
        assert_eq!(skip_dash("name - text", 0), 7);
        assert_eq!(skip_dash("name -\ntext", 0), 0);
        assert_eq!(skip_dash("x-y", 0), 0);
        assert_eq!(skip_dash("", 0), 0);
    }
}
