//! Output drivers.
//!
//! Every format implements [`Output`], a fixed set of markup primitives the
//! page renderer composes into a manual page. Drivers write into an
//! in-memory buffer which the caller takes with [`Output::take_output`].

mod autodoc;
mod html;
mod latex;
mod nroff;
mod texinfo;

use c2man_core::{ManualPage, Options, OutputFormat};

use crate::error::{RenderError, Result};
use crate::fixup::{self, FixupStyle};

pub use autodoc::AutodocOutput;
pub use html::HtmlOutput;
pub use latex::LatexOutput;
pub use nroff::NroffOutput;
pub use texinfo::TexinfoOutput;

/// Name the tool signs generated files with.
pub const PROGRAM_NAME: &str = "c2man";

/// Columns a tab expands to in formats without tab stops.
pub const TAB_SPACES: usize = 4;

/// Run-wide settings the drivers consult.
#[derive(Debug, Clone)]
pub struct Settings {
    pub fixup_comments: bool,
    pub embeddable: bool,
    pub group_together: bool,
    pub manual_name: Option<String>,
    pub manual_section: String,
}

impl Settings {
    pub fn from_options(options: &Options) -> Self {
        Self {
            fixup_comments: options.fixup_comments,
            embeddable: options.embeddable,
            group_together: options.group_together,
            manual_name: options.manual_name.clone(),
            manual_section: options.section().to_string(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_options(&Options::default())
    }
}

/// What a page header is built from.
#[derive(Debug, Clone, Copy)]
pub struct Header<'a> {
    pub first_page: &'a ManualPage,
    pub input_files: usize,
    pub grouped: bool,
    /// Page title: the identifier, or the group name.
    pub name: &'a str,
    pub terse: &'a str,
    pub section: &'a str,
}

/// Markup primitives of one output format.
pub trait Output {
    /// Buffer the driver writes into.
    fn sink(&mut self) -> &mut String;

    fn settings(&self) -> &Settings;

    /// Writes a string without any escaping.
    fn put(&mut self, s: &str) {
        self.sink().push_str(s);
    }

    /// Takes everything written so far.
    fn take_output(&mut self) -> String {
        std::mem::take(self.sink())
    }

    /// Starts a comment line in the output format.
    fn comment(&mut self);
    fn header(&mut self, header: &Header<'_>);
    fn dash(&mut self);
    fn section(&mut self, name: &str);
    fn sub_section(&mut self, name: &str);
    fn break_line(&mut self);
    fn blank_line(&mut self);
    fn code_start(&mut self);
    fn code_end(&mut self);
    /// Inline code span.
    fn code(&mut self, text: &str);

    fn tag_list_start(&mut self);
    fn tag_list_end(&mut self);
    fn tag_entry_start(&mut self);
    /// Starts an entry that will be annotated with its function.
    fn tag_entry_start_extra(&mut self);
    fn tag_entry_end(&mut self);
    /// Ends an entry, annotating it with `text`.
    fn tag_entry_end_extra(&mut self, text: &str);

    fn table_start(&mut self, longest_tag: &str);
    fn table_entry(&mut self, name: &str, description: Option<&str>);
    fn table_end(&mut self);
    fn indent(&mut self);

    fn list_start(&mut self);
    fn list_entry(&mut self, name: &str);
    fn list_separator(&mut self);
    fn list_end(&mut self);

    /// Makes the output pull in another file, for link stubs.
    fn include(&mut self, filename: &str);
    fn file_end(&mut self);

    /// Escaped text.
    fn text(&mut self, text: &str);
    fn character(&mut self, c: char);

    /// Applies one driver option given after the `-T` selector.
    fn parse_option(&mut self, option: &str) -> Result<()> {
        Err(RenderError::UnsupportedOption {
            format: self.format_name(),
            option: option.to_string(),
        })
    }

    /// Usage lines for the driver's options.
    fn print_options(&self) -> &'static str {
        ""
    }

    fn format_name(&self) -> &'static str;

    /// Emits the NAME heading (`None`) or one name in the NAME section.
    fn name(&mut self, name: Option<&str>) {
        match name {
            Some(name) => self.text(name),
            None => self.section("NAME"),
        }
    }

    fn terse_sep(&mut self) {
        self.character(' ');
        self.dash();
        self.character(' ');
    }

    /// Cross-reference to another page.
    fn reference(&mut self, name: &str);

    fn emphasized(&mut self, text: &str) {
        self.text(text);
    }

    fn fixup_style(&self) -> FixupStyle {
        FixupStyle::default()
    }

    /// Prose with sentence fixup.
    fn description(&mut self, text: &str) {
        fixup::description(self, text);
    }

    /// Returns text with tagged-list detection.
    fn returns(&mut self, text: &str) {
        fixup::returns(self, text);
    }

    /// A comment body, fixed up if the settings ask for it.
    fn paragraph(&mut self, text: Option<&str>) {
        match text {
            Some(text) if !text.is_empty() => {
                if self.settings().fixup_comments {
                    self.description(text);
                } else {
                    self.text(text);
                }
            }
            _ => self.text("Not Documented."),
        }
        self.character('\n');
    }

    /// Do-not-edit banner.
    fn warning(&mut self) {
        self.comment();
        self.text("WARNING! THIS FILE WAS GENERATED AUTOMATICALLY BY ");
        self.text(PROGRAM_NAME);
        self.text("!\n");
        self.comment();
        self.text("DO NOT EDIT! CHANGES MADE TO THIS FILE WILL BE LOST!\n");
    }
}

/// Creates the driver for `format`.
pub fn driver(format: OutputFormat, settings: Settings) -> Box<dyn Output> {
    match format {
        OutputFormat::Nroff => Box::new(NroffOutput::new(settings)),
        OutputFormat::Latex => Box::new(LatexOutput::new(settings)),
        OutputFormat::Html => Box::new(HtmlOutput::new(settings)),
        OutputFormat::Texinfo => Box::new(TexinfoOutput::new(settings)),
        OutputFormat::Autodoc => Box::new(AutodocOutput::new(settings)),
    }
}

/// Creates the driver selected by `options`, with its `-T` options applied.
pub fn driver_for(options: &Options) -> Result<Box<dyn Output>> {
    let mut output = driver(options.format, Settings::from_options(options));
    for option in &options.format_options {
        output.parse_option(option)?;
    }
    Ok(output)
}
