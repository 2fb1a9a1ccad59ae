//! Plain-text listing in the style of Amiga autodocs.
//!
//! Output is laid out in fixed columns: section titles are indented by
//! four spaces and their bodies by eight, tables and lists nest four more.

use super::{Header, Output, Settings};

const LINE_LENGTH: usize = 79;
const TAB_LENGTH: usize = 4;
const INDENT_LENGTH: usize = 4;
const MAX_TABLES: usize = 10;

#[derive(Debug)]
pub struct AutodocOutput {
    out: String,
    settings: Settings,
    indent: usize,
    list_indent: usize,
    column: usize,
    /// Indentation is owed before the next character.
    newline: bool,
    /// Inside SEE ALSO, where references are wrapped at the line length.
    see_also: bool,
    file_ended: bool,
    /// Longest tag of each open table.
    tables: Vec<usize>,
}

impl AutodocOutput {
    pub fn new(settings: Settings) -> Self {
        Self {
            out: String::new(),
            settings,
            indent: INDENT_LENGTH,
            list_indent: 0,
            column: 0,
            newline: false,
            see_also: false,
            file_ended: false,
            tables: Vec::new(),
        }
    }

    fn format(&mut self, upcoming: usize) {
        if self.see_also && self.column + upcoming > LINE_LENGTH {
            self.out.push('\n');
            self.newline = true;
        }
        if self.newline {
            self.column = self.indent + self.list_indent;
            self.out.push_str(&" ".repeat(self.column));
            self.newline = false;
        }
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(INDENT_LENGTH);
        self.list_indent = self.list_indent.saturating_sub(INDENT_LENGTH);
    }
}

impl Output for AutodocOutput {
    fn sink(&mut self) -> &mut String {
        &mut self.out
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn format_name(&self) -> &'static str {
        "autodoc"
    }

    fn comment(&mut self) {}

    /// `file.h/name` on the left margin and again flush right.
    fn header(&mut self, header: &Header<'_>) {
        self.file_ended = false;
        self.see_also = false;
        if self.settings.embeddable {
            return;
        }
        let label = match header.first_page.sourcefile.as_deref() {
            Some(file) => {
                let base = file.rsplit_once('/').map_or(file, |(_, base)| base);
                format!("{base}/{}", header.name)
            }
            None => header.name.to_string(),
        };
        self.text(&label);
        if 2 * label.len() < LINE_LENGTH {
            self.text(&" ".repeat(LINE_LENGTH - 2 * label.len()));
            self.text(&label);
        } else {
            let room = (LINE_LENGTH - 1).saturating_sub(label.len());
            let tail: String = label.chars().take(room).collect();
            self.text(&tail);
        }
        self.character('\n');
        self.newline = false;
    }

    fn dash(&mut self) {
        self.text("-");
    }

    fn section(&mut self, name: &str) {
        self.newline = false;
        self.see_also = false;
        let name = match name {
            "DESCRIPTION" => "FUNCTION",
            "PARAMETERS" => "INPUTS",
            "RETURNS" => "RESULT",
            "SEE ALSO" => {
                self.see_also = true;
                name
            }
            _ => name,
        };
        self.out.push_str("\n    ");
        self.column = 4;
        self.text(name);
        self.indent = 2 * INDENT_LENGTH;
        self.list_indent = 0;
        self.character('\n');
    }

    fn sub_section(&mut self, name: &str) {
        self.text(name);
        self.indent = 3 * INDENT_LENGTH;
        self.character('\n');
    }

    fn break_line(&mut self) {
        if self.column > 0 && !self.newline {
            self.character('\n');
        }
    }

    fn blank_line(&mut self) {
        self.character('\n');
    }

    fn code_start(&mut self) {}

    fn code_end(&mut self) {}

    fn code(&mut self, text: &str) {
        self.text(text);
    }

    fn tag_list_start(&mut self) {}

    fn tag_list_end(&mut self) {
        self.list_indent = self.list_indent.saturating_sub(INDENT_LENGTH);
    }

    fn tag_entry_start(&mut self) {
        if self.list_indent > 0 {
            self.character('\n');
            self.list_indent -= INDENT_LENGTH;
        }
    }

    fn tag_entry_start_extra(&mut self) {
        self.tag_entry_start();
    }

    fn tag_entry_end(&mut self) {
        self.list_indent += INDENT_LENGTH;
        self.character('\n');
    }

    fn tag_entry_end_extra(&mut self, text: &str) {
        self.text(" (");
        self.text(text);
        self.text(")");
        self.tag_entry_end();
    }

    fn table_start(&mut self, longest_tag: &str) {
        if self.tables.len() < MAX_TABLES {
            self.tables.push(longest_tag.len());
        }
        self.indent += INDENT_LENGTH;
        self.newline = true;
    }

    fn table_entry(&mut self, name: &str, description: Option<&str>) {
        let width = self.tables.last().copied().unwrap_or(0);
        self.code(name);
        let pad = (width + 1).saturating_sub(name.len());
        self.text(&" ".repeat(pad));
        self.text("- ");
        match description {
            Some(description) => self.paragraph(Some(description)),
            None => self.character('\n'),
        }
    }

    fn table_end(&mut self) {
        self.tables.pop();
        self.character('\n');
        self.dedent();
    }

    fn indent(&mut self) {
        self.format(0);
    }

    fn list_start(&mut self) {
        self.indent += INDENT_LENGTH;
        self.newline = true;
    }

    fn list_entry(&mut self, name: &str) {
        self.code(name);
    }

    fn list_separator(&mut self) {
        self.text(", ");
    }

    fn list_end(&mut self) {
        self.character('\n');
        self.character('\n');
        self.dedent();
    }

    fn include(&mut self, _filename: &str) {}

    fn file_end(&mut self) {
        if !self.file_ended {
            self.out.push('\x0c');
        }
        self.file_ended = true;
        self.newline = false;
    }

    fn text(&mut self, text: &str) {
        if self.see_also && text == ",\n" {
            self.format(2);
            self.out.push_str(", ");
            self.column += 2;
            return;
        }
        self.format(text.len() + 2);
        for c in text.chars() {
            self.character(c);
        }
    }

    fn character(&mut self, c: char) {
        if c == '\x0c' {
            return;
        }
        if c != '\n' {
            self.format(1);
        }
        if c == '\t' {
            let n = TAB_LENGTH - self.column % TAB_LENGTH;
            self.out.push_str(&" ".repeat(n));
            self.column += n;
        } else {
            self.out.push(c);
            self.column += 1;
        }
        if c == '\n' {
            self.newline = true;
            self.column = 0;
        }
    }

    fn reference(&mut self, name: &str) {
        self.text(name);
    }
}
