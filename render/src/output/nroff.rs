//! `man(7)` macros for nroff/troff.

use chrono::{DateTime, Local};

use super::{Header, Output, PROGRAM_NAME, Settings};
use crate::fixup::FixupStyle;

/// Escapes roff text: backslashes become `\e` and a line starting with a
/// control character is protected with `\&`.
fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        let line_start = out.is_empty() || out.ends_with('\n');
        match c {
            '\\' => out.push_str("\\e"),
            '.' | '\'' if line_start => {
                out.push_str("\\&");
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

/// Date printed in the `.TH` line, e.g. `16 October 2026`.
pub(crate) fn page_date(header: &Header<'_>) -> String {
    let when: DateTime<Local> = match header.first_page.sourcetime {
        Some(time) if !(header.grouped && header.input_files > 1) => time.into(),
        _ => Local::now(),
    };
    when.format("%-d %B %Y").to_string()
}

#[derive(Debug)]
pub struct NroffOutput {
    out: String,
    settings: Settings,
}

impl NroffOutput {
    pub fn new(settings: Settings) -> Self {
        Self {
            out: String::new(),
            settings,
        }
    }
}

impl Output for NroffOutput {
    fn sink(&mut self) -> &mut String {
        &mut self.out
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn format_name(&self) -> &'static str {
        "nroff"
    }

    fn comment(&mut self) {
        self.put(".\\\" ");
    }

    fn header(&mut self, header: &Header<'_>) {
        if self.settings.embeddable {
            return;
        }
        self.warning();
        self.put(".TH \"");
        self.text(header.name);
        let date = page_date(header);
        self.put(&format!("\" {} \"{date}\" \"{PROGRAM_NAME}", header.section));

        let source = header
            .first_page
            .sourcefile
            .as_deref()
            .filter(|_| header.input_files <= 1 || !header.grouped);
        if let Some(file) = source {
            let base = file.rsplit_once('/').map_or(file, |(_, base)| base);
            self.put(" ");
            self.text(base);
        }
        if let Some(manual) = self.settings.manual_name.clone() {
            self.put("\" \"");
            self.text(&manual);
        }
        self.put("\"\n");
    }

    fn dash(&mut self) {
        self.put("\\-");
    }

    fn section(&mut self, name: &str) {
        self.put(".SH \"");
        self.text(name);
        self.put("\"\n");
    }

    fn sub_section(&mut self, name: &str) {
        self.put(".SS \"");
        self.text(name);
        self.put("\"\n");
    }

    fn break_line(&mut self) {
        self.put(".br\n");
    }

    fn blank_line(&mut self) {
        self.put(".sp\n");
    }

    fn code_start(&mut self) {
        self.put(".ft B\n");
    }

    fn code_end(&mut self) {
        self.put(".ft R\n");
    }

    fn code(&mut self, text: &str) {
        self.put("\\fB");
        self.text(text);
        self.put("\\fR");
    }

    fn tag_list_start(&mut self) {}

    fn tag_list_end(&mut self) {}

    fn tag_entry_start(&mut self) {
        self.put(".TP\n.B \"");
    }

    fn tag_entry_start_extra(&mut self) {
        self.put(".TP\n.BR \"");
    }

    fn tag_entry_end(&mut self) {
        self.put("\"\n");
    }

    fn tag_entry_end_extra(&mut self, text: &str) {
        self.put("\" \"\t(");
        self.text(text);
        self.put(")\"\n");
    }

    fn table_start(&mut self, longest_tag: &str) {
        self.list_start();
        self.code_start();
        self.put(".nr TL \\w'");
        self.text(longest_tag);
        self.put("'u+0.2i\n");
        self.code_end();
    }

    fn table_entry(&mut self, name: &str, description: Option<&str>) {
        self.put(".TP \\n(TLu\n");
        self.code(name);
        self.character('\n');
        match description {
            Some(description) => self.paragraph(Some(description)),
            None => self.character('\n'),
        }
    }

    fn table_end(&mut self) {
        self.put(".RE\n.PD\n");
    }

    fn indent(&mut self) {
        self.put(".IP\n");
    }

    fn list_start(&mut self) {
        self.put(".RS 0.75in\n.PD 0\n");
    }

    fn list_entry(&mut self, name: &str) {
        self.code(name);
    }

    fn list_separator(&mut self) {
        self.put(",\n");
    }

    fn list_end(&mut self) {
        self.character('\n');
        self.table_end();
    }

    fn include(&mut self, filename: &str) {
        self.put(".so ");
        self.text(filename);
        self.put("\n");
    }

    fn file_end(&mut self) {}

    fn text(&mut self, text: &str) {
        escape_into(&mut self.out, text);
    }

    /// Unescaped, so comments may carry roff requests and escapes.
    fn character(&mut self, c: char) {
        self.out.push(c);
    }

    fn terse_sep(&mut self) {
        self.put(" \\- ");
    }

    fn reference(&mut self, name: &str) {
        self.text(name);
        self.put("(");
        let section = self.settings.manual_section.clone();
        self.text(&section);
        self.put(")");
    }

    fn emphasized(&mut self, text: &str) {
        self.put("\\fI");
        self.text(text);
        self.put("\\fR");
    }

    fn fixup_style(&self) -> FixupStyle {
        FixupStyle {
            dot_commands: true,
            blank_line_breaks: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nroff() -> NroffOutput {
        NroffOutput::new(Settings::default())
    }

    #[test]
    fn test_text_escapes_backslash_and_control_lines() {
        let mut out = nroff();
        out.text("a\\b\n.x\n'y");
        assert_eq!(out.take_output(), "a\\eb\n\\&.x\n\\&'y");

        let mut out = nroff();
        out.text("v1.2");
        assert_eq!(out.take_output(), "v1.2");
    }

    #[test]
    fn test_sections_and_code() {
        let mut out = nroff();
        out.section("SYNOPSIS");
        out.code("int");
        out.terse_sep();
        assert_eq!(out.take_output(), ".SH \"SYNOPSIS\"\n\\fBint\\fR \\- ");
    }

    #[test]
    fn test_annotated_tag_entry() {
        let mut out = nroff();
        out.tag_entry_start_extra();
        out.text("int fd");
        out.tag_entry_end_extra("open");
        assert_eq!(out.take_output(), ".TP\n.BR \"int fd\" \"\t(open)\"\n");
    }

    #[test]
    fn test_reference_uses_manual_section() {
        let mut out = nroff();
        out.reference("sub");
        assert_eq!(out.take_output(), "sub(3)");
    }

    #[test]
    fn test_embeddable_header_is_empty() {
        use c2man_core::{DeclSpec, Declarator, ManualPage};

        let page = ManualPage {
            decl_spec: DeclSpec::default(),
            declarator: Declarator::identifier("x"),
            sourcefile: None,
            sourcetime: None,
        };
        let header = Header {
            first_page: &page,
            input_files: 1,
            grouped: false,
            name: "x",
            terse: "t",
            section: "3",
        };
        let mut out = NroffOutput::new(Settings {
            embeddable: true,
            ..Settings::default()
        });
        out.header(&header);
        assert_eq!(out.take_output(), "");
    }
}
