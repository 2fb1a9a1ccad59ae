//! LaTeX article output.

use super::{Header, Output, Settings, TAB_SPACES};

#[derive(Debug)]
pub struct LatexOutput {
    out: String,
    settings: Settings,
    verbatim: bool,
}

impl LatexOutput {
    pub fn new(settings: Settings) -> Self {
        Self {
            out: String::new(),
            settings,
            verbatim: false,
        }
    }
}

impl Output for LatexOutput {
    fn sink(&mut self) -> &mut String {
        &mut self.out
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn format_name(&self) -> &'static str {
        "latex"
    }

    fn comment(&mut self) {
        self.put("% ");
    }

    fn header(&mut self, _header: &Header<'_>) {
        if self.settings.embeddable {
            return;
        }
        self.put("\\documentclass{article}\n");
        self.warning();
        self.put("\\begin{document}\n");
    }

    fn dash(&mut self) {
        self.put("---");
    }

    fn section(&mut self, name: &str) {
        self.put("\\section*{");
        self.text(name);
        self.put("}\n");
    }

    fn sub_section(&mut self, name: &str) {
        self.put("\\subsection*{");
        self.text(name);
        self.put("}\n");
    }

    fn break_line(&mut self) {}

    fn blank_line(&mut self) {
        self.put("\n");
    }

    fn code_start(&mut self) {
        self.put("\\begin{verbatim}\n");
        self.verbatim = true;
    }

    fn code_end(&mut self) {
        self.put("\\end{verbatim}\n");
        self.verbatim = false;
    }

    fn code(&mut self, text: &str) {
        self.put("\\verb`");
        self.put(text);
        self.put("`");
    }

    fn tag_list_start(&mut self) {
        self.put("\\begin{description}\n");
    }

    fn tag_list_end(&mut self) {
        self.put("\\end{description}\n");
    }

    fn tag_entry_start(&mut self) {
        self.put("\\item[");
    }

    fn tag_entry_start_extra(&mut self) {
        self.tag_entry_start();
    }

    fn tag_entry_end(&mut self) {
        self.put("]\\hfill\\newline\n");
    }

    fn tag_entry_end_extra(&mut self, text: &str) {
        self.put("(");
        self.text(text);
        self.put(")");
        self.tag_entry_end();
    }

    fn table_start(&mut self, _longest_tag: &str) {
        self.put("\\begin{description}\n");
    }

    fn table_entry(&mut self, name: &str, description: Option<&str>) {
        self.put("\\item[");
        self.text(name);
        self.put("]\n");
        match description {
            Some(description) => self.paragraph(Some(description)),
            None => self.character('\n'),
        }
    }

    fn table_end(&mut self) {
        self.put("\\end{description}\n");
    }

    fn indent(&mut self) {}

    fn list_start(&mut self) {}

    fn list_entry(&mut self, name: &str) {
        self.text(name);
    }

    fn list_separator(&mut self) {
        self.put(",\n");
    }

    fn list_end(&mut self) {
        self.character('\n');
    }

    fn include(&mut self, filename: &str) {
        self.put("\\include{");
        self.text(filename);
        self.put("}\n");
    }

    fn file_end(&mut self) {
        self.put("\\end{document}\n");
    }

    fn text(&mut self, text: &str) {
        for c in text.chars() {
            self.character(c);
        }
    }

    fn character(&mut self, c: char) {
        if self.verbatim {
            match c {
                '\t' => self.out.push_str(&" ".repeat(TAB_SPACES)),
                _ => self.out.push(c),
            }
            return;
        }
        match c {
            '$' | '#' | '&' | '_' | '%' | '{' | '}' => {
                self.out.push('\\');
                self.out.push(c);
            }
            '^' => self.out.push_str("\\^{}"),
            '~' => self.out.push_str("\\~{}"),
            '\\' => self.out.push_str("$\\backslash$"),
            '<' | '>' => {
                self.out.push('$');
                self.out.push(c);
                self.out.push('$');
            }
            '\t' => self.out.push_str(&" ".repeat(TAB_SPACES)),
            _ => self.out.push(c),
        }
    }

    fn terse_sep(&mut self) {
        self.put(" --- ");
    }

    fn reference(&mut self, name: &str) {
        self.text(name);
        self.put("(");
        let section = self.settings.manual_section.clone();
        self.text(&section);
        self.put(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_outside_verbatim_only() {
        let mut out = LatexOutput::new(Settings::default());
        out.text("a_b <c> 50%");
        out.code_start();
        out.text("a_b <c>\t");
        out.code_end();
        assert_eq!(
            out.take_output(),
            "a\\_b $<$c$>$ 50\\%\\begin{verbatim}\na_b <c>    \\end{verbatim}\n"
        );
    }

    #[test]
    fn test_tag_entries() {
        let mut out = LatexOutput::new(Settings::default());
        out.tag_list_start();
        out.tag_entry_start_extra();
        out.text("int a");
        out.tag_entry_end_extra("add");
        out.tag_list_end();
        assert_eq!(
            out.take_output(),
            "\\begin{description}\n\\item[int a(add)]\\hfill\\newline\n\\end{description}\n"
        );
    }
}
