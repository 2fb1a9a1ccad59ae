//! HTML output.

use super::{Header, Output, PROGRAM_NAME, Settings};
use crate::fixup::FixupStyle;

#[derive(Debug)]
pub struct HtmlOutput {
    out: String,
    settings: Settings,
    in_code: bool,
}

impl HtmlOutput {
    pub fn new(settings: Settings) -> Self {
        Self {
            out: String::new(),
            settings,
            in_code: false,
        }
    }
}

impl Output for HtmlOutput {
    fn sink(&mut self) -> &mut String {
        &mut self.out
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn format_name(&self) -> &'static str {
        "html"
    }

    fn comment(&mut self) {
        self.put("<!-- ");
    }

    fn warning(&mut self) {
        self.put("<!-- WARNING! THIS FILE WAS GENERATED AUTOMATICALLY BY ");
        self.put(PROGRAM_NAME);
        self.put("! -->\n");
        self.put("<!-- DO NOT EDIT! CHANGES MADE TO THIS FILE WILL BE LOST! -->\n");
    }

    fn header(&mut self, header: &Header<'_>) {
        if self.settings.embeddable {
            return;
        }
        self.warning();
        self.put("<html>\n<head>\n<title>");
        self.text(header.name);
        self.terse_sep();
        self.text(header.terse);
        self.put("</title>\n</head>\n<body>\n");
    }

    fn dash(&mut self) {
        self.put("-");
    }

    fn section(&mut self, name: &str) {
        self.put("<h1>");
        self.text(name);
        self.put("</h1>\n");
    }

    fn sub_section(&mut self, name: &str) {
        self.put("<h2>");
        self.text(name);
        self.put("</h2>\n");
    }

    fn break_line(&mut self) {
        if !self.in_code {
            self.put("<br>\n");
        }
    }

    fn blank_line(&mut self) {
        if self.in_code {
            self.put("\n");
        } else {
            self.put("<p>\n");
        }
    }

    fn code_start(&mut self) {
        self.put("<pre>");
        self.in_code = true;
    }

    fn code_end(&mut self) {
        self.put("</pre>\n");
        self.in_code = false;
    }

    fn code(&mut self, text: &str) {
        self.put("<code>");
        self.text(text);
        self.put("</code>");
    }

    fn tag_list_start(&mut self) {
        self.put("<dl>\n");
    }

    fn tag_list_end(&mut self) {
        self.put("</dl>\n");
    }

    fn tag_entry_start(&mut self) {
        self.put("<dt>");
    }

    fn tag_entry_start_extra(&mut self) {
        self.put("<dt>");
    }

    fn tag_entry_end(&mut self) {
        self.put("\n<dd>");
    }

    fn tag_entry_end_extra(&mut self, text: &str) {
        self.put(" (<em>");
        self.text(text);
        self.put("</em>)");
        self.tag_entry_end();
    }

    fn table_start(&mut self, _longest_tag: &str) {
        self.put("<ul>\n");
    }

    fn table_entry(&mut self, name: &str, description: Option<&str>) {
        self.put("<li>");
        self.code(name);
        if let Some(description) = description {
            self.terse_sep();
            if self.settings.fixup_comments {
                self.description(description);
            } else {
                self.text(description);
            }
        }
        self.put("\n");
    }

    fn table_end(&mut self) {
        self.put("</ul>\n");
    }

    fn indent(&mut self) {
        self.put("\t");
    }

    fn list_start(&mut self) {
        self.put("<ul>\n");
    }

    fn list_entry(&mut self, name: &str) {
        self.put("<li>");
        self.code(name);
    }

    fn list_separator(&mut self) {
        self.put("\n");
    }

    fn list_end(&mut self) {
        self.put("\n</ul>\n");
    }

    fn include(&mut self, filename: &str) {
        self.put("<!--#include virtual=\"");
        self.text(filename);
        self.put("\" -->\n");
    }

    fn file_end(&mut self) {
        if !self.settings.embeddable {
            self.put("</body>\n</html>\n");
        }
    }

    fn text(&mut self, text: &str) {
        for c in text.chars() {
            self.character(c);
        }
    }

    fn character(&mut self, c: char) {
        match c {
            '<' => self.out.push_str("&lt;"),
            '>' => self.out.push_str("&gt;"),
            '&' => self.out.push_str("&amp;"),
            '"' => self.out.push_str("&quot;"),
            _ => self.out.push(c),
        }
    }

    fn reference(&mut self, name: &str) {
        let section = self.settings.manual_section.clone();
        self.put("<a href=\"");
        self.text(name);
        self.put(".");
        self.text(&section);
        self.put("\">");
        self.text(name);
        self.put("</a>");
    }

    fn emphasized(&mut self, text: &str) {
        self.put("<em>");
        self.text(text);
        self.put("</em>");
    }

    fn fixup_style(&self) -> FixupStyle {
        FixupStyle {
            dot_commands: false,
            blank_line_breaks: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entities() {
        let mut out = HtmlOutput::new(Settings::default());
        out.text("a < b && \"c\" > d");
        assert_eq!(out.take_output(), "a &lt; b &amp;&amp; &quot;c&quot; &gt; d");
    }

    #[test]
    fn test_breaks_suppressed_in_code() {
        let mut out = HtmlOutput::new(Settings::default());
        out.code_start();
        out.text("int x;");
        out.break_line();
        out.blank_line();
        out.code_end();
        out.break_line();
        assert_eq!(out.take_output(), "<pre>int x;\n</pre>\n<br>\n");
    }

    #[test]
    fn test_reference_links_page_file() {
        let mut out = HtmlOutput::new(Settings {
            manual_section: "html".to_string(),
            ..Settings::default()
        });
        out.reference("sub");
        assert_eq!(out.take_output(), "<a href=\"sub.html\">sub</a>");
    }

    #[test]
    fn test_blank_line_in_prose_breaks() {
        let mut out = HtmlOutput::new(Settings::default());
        out.description("one.\n\ntwo");
        assert_eq!(out.take_output(), "One.\n<br>\n\nTwo.");
    }
}
