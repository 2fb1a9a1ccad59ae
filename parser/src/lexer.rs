//! Tokenizer for C source text.
//!
//! Besides splitting the text into tokens, the lexer decides which comment
//! belongs to which token. A comment that starts on the line where the
//! previous token ended is that token's `comment_after`; any other comment
//! becomes the `comment_before` of the next token (the last one wins).
//! Preprocessor line markers (`# 12 "file.h"`, `#line 12 "file.h"`) track
//! whether tokens come from the base file; other directives are skipped.

use std::rc::Rc;

use crate::comment::{clean_block_comment, clean_line_comments};
use crate::error::{ParseError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    StringLiteral,
    CharLiteral,
    Punct,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    /// Line the token starts on.
    pub line: usize,
    /// File the token came from according to line markers.
    pub file: Option<Rc<str>>,
    pub in_base_file: bool,
    pub comment_before: Option<String>,
    pub comment_after: Option<String>,
}

impl Token {
    pub fn is(&self, text: &str) -> bool {
        self.kind != TokenKind::Eof && self.text == text
    }

    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }
}

/// Output of [`tokenize`].
#[derive(Debug, Clone, Default)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    /// First comment found in the base file.
    pub first_comment: Option<String>,
}

const PUNCTUATORS: [&str; 24] = [
    "...", "<<=", ">>=", "->", "++", "--", "<<", ">>", "<=", ">=", "==", "!=", "&&", "||", "*=",
    "/=", "%=", "+=", "-=", "&=", "^=", "|=", "##", "::",
];

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    basefile: Option<String>,
    file: Option<Rc<str>>,
    in_base_file: bool,
    /// Line on which the last token ended.
    last_token_line: Option<usize>,
    pending: Option<String>,
    first_comment: Option<String>,
    tokens: Vec<Token>,
}

/// Splits `src` into tokens.
///
/// `basefile` is the name of the file being documented; line markers naming
/// any other file switch tokens to "not in base file".
pub fn tokenize(src: &str, basefile: Option<&str>) -> Result<Lexed> {
    let mut lexer = Lexer {
        src,
        pos: 0,
        line: 1,
        basefile: basefile.map(str::to_string),
        file: basefile.map(Rc::from),
        in_base_file: true,
        last_token_line: None,
        pending: None,
        first_comment: None,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(Lexed {
        tokens: lexer.tokens,
        first_comment: lexer.first_comment,
    })
}

impl Lexer<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn file_name(&self) -> String {
        self.file.as_deref().unwrap_or("stdin").to_string()
    }

    /// Whether only whitespace precedes the current position on its line.
    fn at_line_start(&self) -> bool {
        self.src[..self.pos]
            .rsplit('\n')
            .next()
            .is_none_or(|before| before.trim().is_empty())
    }

    fn run(&mut self) -> Result<()> {
        while let Some(c) = self.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.bump();
                }
                '/' if self.peek_at(1) == Some('*') => self.block_comment()?,
                '/' if self.peek_at(1) == Some('/') => self.line_comments(),
                '#' if self.at_line_start() => self.directive(),
                c if c.is_ascii_alphabetic() || c == '_' || c == '$' => self.identifier(),
                c if c.is_ascii_digit() => self.number(),
                '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
                '"' => self.quoted('"', TokenKind::StringLiteral)?,
                '\'' => self.quoted('\'', TokenKind::CharLiteral)?,
                _ => self.punct(),
            }
        }
        let line = self.line;
        self.push(TokenKind::Eof, String::new(), line);
        Ok(())
    }

    fn push(&mut self, kind: TokenKind, text: String, line: usize) {
        self.tokens.push(Token {
            kind,
            text,
            line,
            file: self.file.clone(),
            in_base_file: self.in_base_file,
            comment_before: self.pending.take(),
            comment_after: None,
        });
        self.last_token_line = Some(self.line);
    }

    fn add_comment(&mut self, start_line: usize, comment: Option<String>) {
        let Some(comment) = comment else {
            return;
        };
        if self.in_base_file && self.first_comment.is_none() {
            self.first_comment = Some(comment.clone());
        }
        if self.last_token_line == Some(start_line)
            && let Some(last) = self.tokens.last_mut()
            && last.comment_after.is_none()
        {
            last.comment_after = Some(comment);
            return;
        }
        self.pending = Some(comment);
    }

    fn block_comment(&mut self) -> Result<()> {
        let start = self.pos;
        let start_line = self.line;
        let Some(len) = self.rest()[2..].find("*/") else {
            return Err(ParseError::UnterminatedComment {
                file: self.file_name(),
                line: start_line,
            });
        };
        let end = start + 2 + len + 2;
        while self.pos < end {
            self.bump();
        }
        let comment = clean_block_comment(&self.src[start..end]);
        self.add_comment(start_line, comment);
        Ok(())
    }

    /// Consumes `//` comments; consecutive full-line ones form one comment.
    fn line_comments(&mut self) {
        let start_line = self.line;
        let merge = self.at_line_start();
        let mut lines = Vec::new();
        loop {
            let rest = self.rest();
            let len = rest.find('\n').unwrap_or(rest.len());
            lines.push(&self.src[self.pos..self.pos + len]);
            self.pos += len;
            if !merge {
                break;
            }
            let after = &self.src[self.pos..];
            let next_line = after.strip_prefix('\n').unwrap_or(after);
            let indent = next_line.len() - next_line.trim_start_matches([' ', '\t']).len();
            if !after.starts_with('\n') || !next_line[indent..].starts_with("//") {
                break;
            }
            self.bump();
            self.pos += indent;
        }
        let comment = clean_line_comments(lines);
        self.add_comment(start_line, comment);
    }

    /// Skips a preprocessor directive, honoring line continuations and
    /// applying line markers.
    fn directive(&mut self) {
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            if c == '\\' && self.peek_at(1) == Some('\n') {
                self.bump();
                self.bump();
                continue;
            }
            if c == '/' && self.peek_at(1) == Some('*') {
                if let Some(len) = self.rest()[2..].find("*/") {
                    let end = self.pos + 2 + len + 2;
                    while self.pos < end {
                        self.bump();
                    }
                    text.push(' ');
                    continue;
                }
            }
            text.push(c);
            self.bump();
        }
        // the comment before a directive describes the directive
        self.pending = None;
        self.line_marker(&text);
    }

    fn line_marker(&mut self, directive: &str) {
        let body = directive.trim_start_matches('#').trim_start();
        let body = body.strip_prefix("line").unwrap_or(body).trim_start();
        let digits: String = body.chars().take_while(char::is_ascii_digit).collect();
        let Ok(number) = digits.parse::<usize>() else {
            return;
        };
        let rest = body[digits.len()..].trim_start();
        if let Some(quoted) = rest.strip_prefix('"')
            && let Some(end) = quoted.find('"')
        {
            let name = &quoted[..end];
            if self.basefile.is_none() {
                self.basefile = Some(name.to_string());
            }
            self.in_base_file = self.basefile.as_deref() == Some(name);
            self.file = Some(Rc::from(name));
        }
        // the marker names the line that follows it
        self.line = number.saturating_sub(1);
    }

    fn identifier(&mut self) {
        let line = self.line;
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        {
            self.bump();
        }
        let text = self.src[start..self.pos].to_string();
        self.push(TokenKind::Identifier, text, line);
    }

    fn number(&mut self) {
        let line = self.line;
        let start = self.pos;
        while let Some(c) = self.peek() {
            let exponent_sign = (c == '+' || c == '-')
                && self.src[start..self.pos].ends_with(['e', 'E', 'p', 'P'])
                && !self.src[start..self.pos].starts_with("0x");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                self.bump();
            } else {
                break;
            }
        }
        let text = self.src[start..self.pos].to_string();
        self.push(TokenKind::Number, text, line);
    }

    fn quoted(&mut self, quote: char, kind: TokenKind) -> Result<()> {
        let line = self.line;
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('\\') => {
                    self.bump();
                }
                Some(c) if c == quote => break,
                Some('\n') | None => {
                    return Err(ParseError::UnterminatedLiteral {
                        file: self.file_name(),
                        line,
                    });
                }
                Some(_) => {}
            }
        }
        let text = self.src[start..self.pos].to_string();
        self.push(kind, text, line);
        Ok(())
    }

    fn punct(&mut self) {
        let line = self.line;
        let text = match PUNCTUATORS.iter().find(|p| self.rest().starts_with(**p)) {
            Some(p) => {
                self.pos += p.len();
                (*p).to_string()
            }
            None => self.bump().map(String::from).unwrap_or_default(),
        };
        self.push(TokenKind::Punct, text, line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lexed: &Lexed) -> Vec<&str> {
        lexed.tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_basic_tokens() {
        let lexed = tokenize("int *f(char c, ...);", Some("t.h")).unwrap();
        assert_eq!(
            texts(&lexed),
            vec!["int", "*", "f", "(", "char", "c", ",", "...", ")", ";", ""]
        );
        assert_eq!(lexed.tokens.last().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_comment_before_and_after() {
        let src = "/* leading */\nint x; /* trailing */\nint y;";
        let lexed = tokenize(src, Some("t.h")).unwrap();
        let int = &lexed.tokens[0];
        assert_eq!(int.comment_before.as_deref(), Some("leading"));
        let semi = &lexed.tokens[2];
        assert_eq!(semi.comment_after.as_deref(), Some("trailing"));
        assert!(lexed.tokens[3].comment_before.is_none());
        assert_eq!(lexed.first_comment.as_deref(), Some("leading"));
    }

    #[test]
    fn test_multiline_eol_comment_is_after() {
        let src = "int a,\t/*\n\t * multiple lines\n\t */\n\tb;";
        let lexed = tokenize(src, Some("t.h")).unwrap();
        assert_eq!(lexed.tokens[2].text, ",");
        assert_eq!(
            lexed.tokens[2].comment_after.as_deref(),
            Some("multiple lines")
        );
        assert!(lexed.tokens[3].comment_before.is_none());
        assert_eq!(lexed.tokens[3].line, 4);
    }

    #[test]
    fn test_last_leading_comment_wins() {
        let src = "/* file header */\n\n/* function */\nvoid f(void);";
        let lexed = tokenize(src, Some("t.h")).unwrap();
        assert_eq!(lexed.tokens[0].comment_before.as_deref(), Some("function"));
        assert_eq!(lexed.first_comment.as_deref(), Some("file header"));
    }

    #[test]
    fn test_cpp_comment_runs_merge() {
        let src = "// first line\n// second line\nint x; // eol\n// next\nint y;";
        let lexed = tokenize(src, Some("t.h")).unwrap();
        assert_eq!(
            lexed.tokens[0].comment_before.as_deref(),
            Some("first line\nsecond line")
        );
        assert_eq!(lexed.tokens[2].comment_after.as_deref(), Some("eol"));
        assert_eq!(lexed.tokens[3].comment_before.as_deref(), Some("next"));
    }

    #[test]
    fn test_directives_skipped_with_continuations() {
        let src = "#define MAX(a, b) \\\n  ((a) > (b) ? (a) : (b))\n#include <stdio.h>\nint x;";
        let lexed = tokenize(src, Some("t.c")).unwrap();
        assert_eq!(texts(&lexed), vec!["int", "x", ";", ""]);
        assert_eq!(lexed.tokens[0].line, 4);
    }

    #[test]
    fn test_line_markers_track_base_file() {
        let src = "# 1 \"api.h\"\nint a;\n# 1 \"/usr/include/stdio.h\" 1\nint b;\n# 7 \"api.h\" 2\nint c;";
        let lexed = tokenize(src, Some("api.h")).unwrap();
        let a = &lexed.tokens[0];
        let b = &lexed.tokens[3];
        let c = &lexed.tokens[6];
        assert!(a.in_base_file);
        assert!(!b.in_base_file);
        assert_eq!(b.file.as_deref(), Some("/usr/include/stdio.h"));
        assert!(c.in_base_file);
        assert_eq!(c.line, 7);
    }

    #[test]
    fn test_literals_and_numbers() {
        let lexed = tokenize("x = \"a\\\"b\" + 'c' + 1.5e-3f + 0x1F;", None).unwrap();
        assert_eq!(
            texts(&lexed),
            vec!["x", "=", "\"a\\\"b\"", "+", "'c'", "+", "1.5e-3f", "+", "0x1F", ";", ""]
        );
    }

    #[test]
    fn test_unterminated_comment_is_error() {
        let err = tokenize("int x; /* never closed", Some("bad.h")).unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedComment { line: 1, .. }));
    }
}
