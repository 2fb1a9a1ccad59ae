//! Turns raw comment text into plain prose.
//!
//! Comment delimiters, box borders and the `*`/`/` gutter at the start of
//! each line are removed, leading indentation is dropped and lines made up
//! only of border characters become blank.

const GUTTER: &[char] = &['*', '/'];
const RULE: &[char] = &['*', '/', '-', '=', '#', '~', '_', '+'];

/// Cleans a `/* ... */` comment, given with its delimiters.
pub fn clean_block_comment(raw: &str) -> Option<String> {
    let body = raw.strip_prefix("/*").unwrap_or(raw);
    let body = body.strip_suffix("*/").unwrap_or(body);
    clean_lines(body.split('\n'))
}

/// Cleans a run of `//` comment lines, each given with its delimiter.
pub fn clean_line_comments<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    clean_lines(lines)
}

fn clean_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let cleaned: Vec<String> = lines.into_iter().map(clean_line).collect();

    let first = cleaned.iter().position(|l| !l.is_empty())?;
    let last = cleaned.iter().rposition(|l| !l.is_empty())?;

    Some(cleaned[first..=last].join("\n"))
}

fn clean_line(line: &str) -> String {
    let line = line.trim_end_matches('\r').trim();
    if is_rule(line) {
        return String::new();
    }

    let without_gutter = line.trim_start_matches(GUTTER);
    let had_gutter = without_gutter.len() != line.len();
    let mut text = without_gutter.trim();

    // right-hand border of a box comment
    if had_gutter {
        if let Some(stripped) = text.strip_suffix(GUTTER) {
            let stripped = stripped.trim_end_matches(GUTTER);
            if stripped.ends_with(char::is_whitespace) || stripped.is_empty() {
                text = stripped.trim_end();
            }
        }
    }

    if is_rule(text) {
        return String::new();
    }
    text.to_string()
}

/// A line drawn with border characters only, like `*****` or `------`.
fn is_rule(line: &str) -> bool {
    let line = line.trim();
    !line.is_empty()
        && line.chars().all(|c| RULE.contains(&c))
        && (line.chars().count() >= 3 || line.chars().all(|c| GUTTER.contains(&c)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_single_line() {
        assert_eq!(
            clean_block_comment("/* adds two numbers. */").as_deref(),
            Some("adds two numbers.")
        );
    }

    #[test]
    fn test_star_gutter() {
        let raw = "/*\n * Do an operating system operation\n *\n * Returns an indication:\n *\tEOK: Success\n */";
        assert_eq!(
            clean_block_comment(raw).as_deref(),
            Some("Do an operating system operation\n\nReturns an indication:\nEOK: Success")
        );
    }

    #[test]
    fn test_box_comments() {
        let c_box = "/*****************\n * C style box comment.\n *\n * Body text.\n *****************/";
        assert_eq!(
            clean_block_comment(c_box).as_deref(),
            Some("C style box comment.\n\nBody text.")
        );

        let slash_box = "/*****************\n/ Fancier box.\n/\n/ Body text.\n/*****************/";
        assert_eq!(
            clean_block_comment(slash_box).as_deref(),
            Some("Fancier box.\n\nBody text.")
        );

        let nested = "/*****************\n/*** Even fancier.\n/***\n/*** Body.\n/*****************/";
        assert_eq!(
            clean_block_comment(nested).as_deref(),
            Some("Even fancier.\n\nBody.")
        );

        let dashed = "/*--------------\n * Dashed box.\n *\n * Body.\n *--------------*/";
        assert_eq!(
            clean_block_comment(dashed).as_deref(),
            Some("Dashed box.\n\nBody.")
        );

        let framed = "/****************\n * Framed text   *\n ****************/";
        assert_eq!(clean_block_comment(framed).as_deref(), Some("Framed text"));
    }

    #[test]
    fn test_cpp_box() {
        let lines = [
            "////////////////////",
            "//// Fancier C++ box.",
            "////",
            "//// Body.",
            "////////////////////",
        ];
        assert_eq!(
            clean_line_comments(lines).as_deref(),
            Some("Fancier C++ box.\n\nBody.")
        );
    }

    #[test]
    fn test_double_star_comment_start() {
        assert_eq!(
            clean_block_comment("/*\n** function starting with a C comment\n*/").as_deref(),
            Some("function starting with a C comment")
        );
    }

    #[test]
    fn test_empty_comment() {
        assert_eq!(clean_block_comment("/**/"), None);
        assert_eq!(clean_block_comment("/*   \n *\n */"), None);
    }

    #[test]
    fn test_list_markers_survive() {
        assert_eq!(
            clean_block_comment("/* Steps:\n * - first\n * 1. second */").as_deref(),
            Some("Steps:\n- first\n1. second")
        );
    }
}
