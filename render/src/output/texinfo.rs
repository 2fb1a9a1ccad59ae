//! GNU Texinfo output.
//!
//! Options (after `-T t,`):
//!
//! | option | effect |
//! |--------|--------|
//! | `t`    | use the page title as the NAME heading |
//! | `n`    | write `@node` lines even for embeddable output |
//! | `s<n>` | put page headings at level `n` (0 = chapter) |
//! | `C`    | capitalize section titles |

use super::{Header, Output, Settings, TAB_SPACES};
use crate::error::{RenderError, Result};

const HEADING_NOT_IN_CONTENTS: [&str; 4] = [
    "@chapheading ",
    "@heading ",
    "@subheading ",
    "@subsubheading ",
];

const HEADING_IN_CONTENTS: [&str; 4] = ["@chapter ", "@section ", "@subsection ", "@subsubsection "];

fn level(n: usize) -> usize {
    n.min(HEADING_NOT_IN_CONTENTS.len() - 1)
}

const OPTIONS_HELP: &str = "\ttexinfo options:
\tt\tuse manpage title as NAME title
\tn\toutput node info if embedded output
\ts<n>\tset top heading level to <n>
\tC\tcapitalize section titles
";

#[derive(Debug)]
pub struct TexinfoOutput {
    out: String,
    settings: Settings,
    top_level: usize,
    embed_node_info: bool,
    title_name: bool,
    capitalize_sections: bool,
    title: String,
    first_name: bool,
}

impl TexinfoOutput {
    pub fn new(settings: Settings) -> Self {
        Self {
            out: String::new(),
            settings,
            top_level: 1,
            embed_node_info: false,
            title_name: false,
            capitalize_sections: false,
            title: String::new(),
            first_name: true,
        }
    }

    fn heading(&mut self, command: &str, name: &str, capitalize: bool) {
        self.put(command);
        if capitalize {
            let mut first_letter = true;
            for c in name.chars() {
                self.character(if first_letter {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                });
                first_letter = c.is_ascii_whitespace();
            }
        } else {
            self.text(name);
        }
        self.put("\n@noindent\n");
    }
}

impl Output for TexinfoOutput {
    fn sink(&mut self) -> &mut String {
        &mut self.out
    }

    fn settings(&self) -> &Settings {
        &self.settings
    }

    fn format_name(&self) -> &'static str {
        "texinfo"
    }

    fn parse_option(&mut self, option: &str) -> Result<()> {
        let invalid = || RenderError::InvalidOption {
            format: "texinfo",
            option: option.to_string(),
        };
        match option.chars().next() {
            Some('t') => self.title_name = true,
            Some('n') => self.embed_node_info = true,
            Some('C') => self.capitalize_sections = true,
            Some('s') => self.top_level = option[1..].parse().map_err(|_| invalid())?,
            _ => {
                return Err(RenderError::UnsupportedOption {
                    format: "texinfo",
                    option: option.to_string(),
                });
            }
        }
        Ok(())
    }

    fn print_options(&self) -> &'static str {
        OPTIONS_HELP
    }

    fn comment(&mut self) {
        self.put("@c ");
    }

    fn header(&mut self, header: &Header<'_>) {
        if !self.settings.embeddable {
            self.put("\\input texinfo @c -*-texinfo-*-\n");
            self.warning();
            self.put("@c %**start of header\n@setfilename ");
            self.text(header.name);
            self.put(".info\n@settitle ");
            self.text(header.name);
            self.put("\n@c %**end of header\n@node Top, ");
            self.text(header.name);
            self.put(", (dir), (dir)\n");
        }
        if !self.settings.embeddable || self.embed_node_info {
            self.put("@node ");
            self.text(header.name);
            self.put(", (dir), Top, (dir)\n");
        }
        self.title = header.name.to_string();
    }

    fn dash(&mut self) {
        self.put("---");
    }

    fn section(&mut self, name: &str) {
        let command = HEADING_NOT_IN_CONTENTS[level(self.top_level)];
        self.heading(command, name, self.capitalize_sections);
    }

    fn sub_section(&mut self, name: &str) {
        let command = HEADING_NOT_IN_CONTENTS[level(self.top_level + 1)];
        self.heading(command, name, self.capitalize_sections);
    }

    fn break_line(&mut self) {}

    fn blank_line(&mut self) {
        self.put("@sp 1\n");
    }

    fn code_start(&mut self) {
        self.put("@example\n");
    }

    fn code_end(&mut self) {
        self.put("@end example\n");
    }

    fn code(&mut self, text: &str) {
        self.put("@code{");
        self.text(text);
        self.put("}");
    }

    fn tag_list_start(&mut self) {
        self.put("@quotation\n@table @code\n");
    }

    fn tag_list_end(&mut self) {
        self.put("@end table\n@end quotation\n");
    }

    fn tag_entry_start(&mut self) {
        self.put("@item ");
    }

    fn tag_entry_start_extra(&mut self) {
        self.tag_entry_start();
    }

    fn tag_entry_end(&mut self) {
        self.put("\n");
    }

    fn tag_entry_end_extra(&mut self, text: &str) {
        self.put("(");
        self.text(text);
        self.put(")");
        self.tag_entry_end();
    }

    fn table_start(&mut self, _longest_tag: &str) {
        self.tag_list_start();
    }

    fn table_entry(&mut self, name: &str, description: Option<&str>) {
        self.put("@item ");
        self.text(name);
        self.put("\n");
        match description {
            Some(description) => self.paragraph(Some(description)),
            None => self.put("\n"),
        }
    }

    fn table_end(&mut self) {
        self.tag_list_end();
    }

    fn indent(&mut self) {}

    fn list_start(&mut self) {}

    fn list_entry(&mut self, name: &str) {
        self.code(name);
    }

    fn list_separator(&mut self) {
        self.put(",\n");
    }

    fn list_end(&mut self) {
        self.put("\n");
    }

    fn include(&mut self, filename: &str) {
        self.put("@include ");
        self.text(filename);
        self.put("\n");
    }

    fn file_end(&mut self) {
        self.put("@bye\n");
    }

    fn text(&mut self, text: &str) {
        for c in text.chars() {
            self.character(c);
        }
    }

    fn character(&mut self, c: char) {
        match c {
            '\t' => self.out.push_str(&" ".repeat(TAB_SPACES)),
            '@' | '{' | '}' => {
                self.out.push('@');
                self.out.push(c);
            }
            _ => self.out.push(c),
        }
    }

    fn name(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                if !self.first_name || !self.title_name || self.title != name {
                    self.text(name);
                }
                self.first_name = false;
            }
            None => {
                self.first_name = true;
                if self.title_name {
                    let title = self.title.clone();
                    let command = HEADING_IN_CONTENTS[level(self.top_level)];
                    self.heading(command, &title, false);
                } else {
                    self.section("NAME");
                }
            }
        }
    }

    fn terse_sep(&mut self) {
        if !self.title_name || self.settings.group_together {
            self.put(" ");
            self.dash();
            self.put(" ");
        }
    }

    fn reference(&mut self, name: &str) {
        let section = self.settings.manual_section.clone();
        self.text(name);
        self.put("(");
        self.text(&section);
        self.put(")");
    }
}
