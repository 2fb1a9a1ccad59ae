//! Run-time options.
//!
//! Options come from the command line and, optionally, a YAML file loaded
//! with [`Options::load`]. Every field has a default so a partial file is
//! enough.
//!
//! # Example YAML
//!
//! ```yaml
//! format: html
//! variables_out: true
//! group_together: true
//! group_terse: "string utilities"
//! excluded_sections:
//!   - SEE ALSO
//! includes:
//!   - stdio.h
//! objects:
//!   static_function:
//!     subdir: internal
//!     extension: 3s
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Output format of the rendered pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Nroff,
    Latex,
    Html,
    Texinfo,
    Autodoc,
}

impl OutputFormat {
    /// Resolves the one-letter selector used by `-T`.
    pub fn from_flag(flag: char) -> Option<Self> {
        match flag {
            'n' => Some(Self::Nroff),
            'l' => Some(Self::Latex),
            'h' => Some(Self::Html),
            't' => Some(Self::Texinfo),
            'a' => Some(Self::Autodoc),
            _ => None,
        }
    }

    /// Manual section (and file extension) used when none is configured.
    pub fn default_section(self) -> &'static str {
        match self {
            Self::Nroff => "3",
            Self::Latex => "tex",
            Self::Html => "html",
            Self::Texinfo => "texi",
            Self::Autodoc => "doc",
        }
    }
}

/// How the extra names of a grouped page are materialized on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LinkPolicy {
    #[default]
    Hard,
    Soft,
    /// A stub file including the real page.
    File,
    None,
    /// Only remove stale files left by an earlier run.
    Remove,
}

impl LinkPolicy {
    pub fn from_flag(flag: char) -> Option<Self> {
        match flag {
            'h' => Some(Self::Hard),
            's' => Some(Self::Soft),
            'f' => Some(Self::File),
            'n' => Some(Self::None),
            'r' => Some(Self::Remove),
            _ => None,
        }
    }
}

/// Category of a documented object; selects file location and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Function,
    Variable,
    StaticFunction,
    StaticVariable,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 4] = [
        Self::Function,
        Self::Variable,
        Self::StaticFunction,
        Self::StaticVariable,
    ];

    pub fn flag(self) -> char {
        match self {
            Self::Function => 'f',
            Self::Variable => 'v',
            Self::StaticFunction => 'F',
            Self::StaticVariable => 'V',
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Variable => "variable",
            Self::StaticFunction => "static function",
            Self::StaticVariable => "static variable",
        }
    }

    pub fn from_flag(flag: char) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.flag() == flag)
    }

    /// Classifies a declaration.
    pub fn classify(is_function: bool, is_static: bool) -> Self {
        match (is_function, is_static) {
            (true, false) => Self::Function,
            (true, true) => Self::StaticFunction,
            (false, false) => Self::Variable,
            (false, true) => Self::StaticVariable,
        }
    }
}

/// Where pages of one [`ObjectKind`] go.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectOutput {
    /// Subdirectory of the output directory.
    pub subdir: Option<String>,
    /// File extension; the manual section when absent.
    pub extension: Option<String>,
}

/// Per-category output overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectOutputs {
    pub function: ObjectOutput,
    pub variable: ObjectOutput,
    pub static_function: ObjectOutput,
    pub static_variable: ObjectOutput,
}

impl ObjectOutputs {
    pub fn get(&self, kind: ObjectKind) -> &ObjectOutput {
        match kind {
            ObjectKind::Function => &self.function,
            ObjectKind::Variable => &self.variable,
            ObjectKind::StaticFunction => &self.static_function,
            ObjectKind::StaticVariable => &self.static_variable,
        }
    }

    pub fn get_mut(&mut self, kind: ObjectKind) -> &mut ObjectOutput {
        match kind {
            ObjectKind::Function => &mut self.function,
            ObjectKind::Variable => &mut self.variable,
            ObjectKind::StaticFunction => &mut self.static_function,
            ObjectKind::StaticVariable => &mut self.static_variable,
        }
    }

    /// Applies an override written as `<flag>[subdir][.ext]`, e.g. `Finternal.3s`.
    ///
    /// ```
    /// use c2man_core::{ObjectKind, ObjectOutputs};
    ///
    /// let mut outputs = ObjectOutputs::default();
    /// outputs.apply_flag_spec("Vvars.3v").unwrap();
    /// let out = outputs.get(ObjectKind::StaticVariable);
    /// assert_eq!(out.subdir.as_deref(), Some("vars"));
    /// assert_eq!(out.extension.as_deref(), Some("3v"));
    /// ```
    pub fn apply_flag_spec(&mut self, spec: &str) -> Result<()> {
        let mut chars = spec.chars();
        let kind = chars
            .next()
            .and_then(ObjectKind::from_flag)
            .ok_or_else(|| ConfigError::InvalidObjectOption(spec.to_string()))?;
        let rest = chars.as_str();
        let output = self.get_mut(kind);
        match rest.split_once('.') {
            Some((subdir, extension)) => {
                output.subdir = Some(subdir.to_string());
                output.extension = Some(extension.to_string());
            }
            None => output.subdir = Some(rest.to_string()),
        }
        Ok(())
    }
}

/// Layout strings used when a prototype is spread over several lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrototypeFormat {
    pub decl_spec_prefix: String,
    pub declarator_prefix: String,
    pub declarator_suffix: String,
    pub first_param_prefix: String,
    pub middle_param_prefix: String,
    pub last_param_suffix: String,
}

impl Default for PrototypeFormat {
    fn default() -> Self {
        Self {
            decl_spec_prefix: String::new(),
            declarator_prefix: " ".to_string(),
            declarator_suffix: "\n".to_string(),
            first_param_prefix: "\n\t".to_string(),
            middle_param_prefix: "\n\t".to_string(),
            last_param_suffix: "\n".to_string(),
        }
    }
}

struct TemplateCursor<'a> {
    rest: &'a str,
}

impl<'a> TemplateCursor<'a> {
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest.len(), |(i, _)| i);
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn skip_one(&mut self) -> bool {
        let mut chars = self.rest.chars();
        let skipped = chars.next().is_some();
        self.rest = chars.as_str();
        skipped
    }

    fn at_end(&self) -> bool {
        self.rest.is_empty()
    }
}

fn is_separator(c: char) -> bool {
    c.is_ascii() && !c.is_ascii_alphanumeric()
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric()
}

/// Replaces `\n` and `\t` escapes; any other escaped character stands for
/// itself.
pub fn unescape(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

impl PrototypeFormat {
    /// Derives the layout from an example prototype such as
    /// `"int f\n(\n\ta,\n\tb\n)"`: the separators around each word become the
    /// corresponding prefix or suffix.
    ///
    /// ```
    /// use c2man_core::PrototypeFormat;
    ///
    /// let fmt = PrototypeFormat::parse("int f\\n(\\n\\ta,\\n\\tb\\n)").unwrap();
    /// assert_eq!(fmt, PrototypeFormat::default());
    /// ```
    pub fn parse(template: &str) -> Result<Self> {
        let unescaped = unescape(template);
        let invalid = || ConfigError::InvalidTemplate(template.to_string());
        let mut cur = TemplateCursor { rest: &unescaped };

        let decl_spec_prefix = cur.take_while(is_separator).to_string();
        if !cur.skip_one() {
            return Err(invalid());
        }
        cur.take_while(is_word);
        if cur.at_end() {
            return Err(invalid());
        }

        let declarator_prefix = cur.take_while(is_separator).to_string();
        if !cur.skip_one() {
            return Err(invalid());
        }
        cur.take_while(is_word);
        if cur.at_end() {
            return Err(invalid());
        }

        let declarator_suffix = cur.take_while(|c| c != '(').to_string();
        if !cur.skip_one() {
            return Err(invalid());
        }

        let first_param_prefix = cur.take_while(is_separator).to_string();
        if !cur.skip_one() {
            return Err(invalid());
        }
        cur.take_while(|c| c != ',');
        if !cur.skip_one() {
            return Err(invalid());
        }

        let middle_param_prefix = cur.take_while(is_separator).to_string();
        if !cur.skip_one() {
            return Err(invalid());
        }
        cur.take_while(is_word);
        if cur.at_end() {
            return Err(invalid());
        }

        let last_param_suffix = cur.take_while(|c| c != ')').to_string();

        Ok(Self {
            decl_spec_prefix,
            declarator_prefix,
            declarator_suffix,
            first_param_prefix,
            middle_param_prefix,
            last_param_suffix,
        })
    }
}

/// All settings of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Document `static` declarations outside header files.
    pub static_out: bool,
    /// Document variables as well as functions.
    pub variables_out: bool,
    /// Promote `char`/`short`/`float` K&R parameters.
    pub promote_params: bool,
    /// Capitalize sentences and add missing full stops.
    pub fixup_comments: bool,
    /// Render all pages as one.
    pub group_together: bool,
    /// Terse description for a grouped page.
    pub group_terse: Option<String>,
    /// List parameters even when they have no comment.
    pub always_document_params: bool,
    /// Use the comment at the start of a function body.
    pub look_at_body_start: bool,
    /// Use only the comment at the start of a function body.
    pub body_start_only: bool,
    pub excluded_sections: Vec<String>,
    /// Extra `#include` lines for SYNOPSIS.
    pub includes: Vec<String>,
    pub header_prefix: Option<String>,
    pub manual_name: Option<String>,
    pub manual_section: Option<String>,
    /// Output directory; `-` writes every page to standard output.
    pub output_dir: Option<PathBuf>,
    /// Name grouped output after the input file.
    pub use_input_name: bool,
    /// Omit document preamble and trailer.
    pub embeddable: bool,
    pub link_policy: LinkPolicy,
    pub format: OutputFormat,
    /// Driver-specific options given after the `-T` selector.
    pub format_options: Vec<String>,
    pub prototype: PrototypeFormat,
    pub objects: ObjectOutputs,
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            static_out: false,
            variables_out: false,
            promote_params: true,
            fixup_comments: true,
            group_together: false,
            group_terse: None,
            always_document_params: true,
            look_at_body_start: false,
            body_start_only: false,
            excluded_sections: Vec::new(),
            includes: Vec::new(),
            header_prefix: None,
            manual_name: None,
            manual_section: None,
            output_dir: None,
            use_input_name: false,
            embeddable: false,
            link_policy: LinkPolicy::default(),
            format: OutputFormat::default(),
            format_options: Vec::new(),
            prototype: PrototypeFormat::default(),
            objects: ObjectOutputs::default(),
            verbose: false,
        }
    }
}

impl Options {
    /// Loads options from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](ConfigError::IoError) if the file cannot be read,
    /// or [`YamlError`](ConfigError::YamlError) if it is not valid YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let options = serde_yaml::from_reader(reader)?;
        Ok(options)
    }

    /// Saves the options as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    /// Manual section, falling back to the format's default.
    pub fn section(&self) -> &str {
        self.manual_section
            .as_deref()
            .unwrap_or_else(|| self.format.default_section())
    }

    pub fn is_excluded(&self, section: &str) -> bool {
        self.excluded_sections.iter().any(|s| s == section)
    }

    /// Whether pages go to standard output.
    pub fn to_stdout(&self) -> bool {
        self.output_dir.as_deref() == Some(Path::new("-"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prototype_template_single_line() {
        let fmt = PrototypeFormat::parse("int f(a, b)").unwrap();
        assert_eq!(fmt.decl_spec_prefix, "");
        assert_eq!(fmt.declarator_prefix, " ");
        assert_eq!(fmt.declarator_suffix, "");
        assert_eq!(fmt.first_param_prefix, "");
        assert_eq!(fmt.middle_param_prefix, " ");
        assert_eq!(fmt.last_param_suffix, "");
    }

    #[test]
    fn test_prototype_template_rejects_truncated() {
        assert!(PrototypeFormat::parse("int").is_err());
        assert!(PrototypeFormat::parse("int f").is_err());
        assert!(PrototypeFormat::parse("int f(a)").is_err());
    }

    #[test]
    fn test_object_flag_spec_without_extension() {
        let mut outputs = ObjectOutputs::default();
        outputs.apply_flag_spec("fman3").unwrap();
        assert_eq!(outputs.function.subdir.as_deref(), Some("man3"));
        assert!(outputs.function.extension.is_none());
        assert!(outputs.apply_flag_spec("xdir").is_err());
        assert!(outputs.apply_flag_spec("").is_err());
    }

    #[test]
    fn test_section_defaults_per_format() {
        let mut options = Options::default();
        assert_eq!(options.section(), "3");
        options.format = OutputFormat::Texinfo;
        assert_eq!(options.section(), "texi");
        options.manual_section = Some("3x".into());
        assert_eq!(options.section(), "3x");
    }

    #[test]
    fn test_options_yaml_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("c2man.yaml");

        let mut options = Options {
            variables_out: true,
            format: OutputFormat::Html,
            ..Options::default()
        };
        options.excluded_sections.push("SEE ALSO".into());
        options.save(&path).unwrap();

        let loaded = Options::load(&path).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let options: Options = serde_yaml::from_str("format: latex\nstatic_out: true\n").unwrap();
        assert_eq!(options.format, OutputFormat::Latex);
        assert!(options.static_out);
        assert!(options.promote_params);
        assert!(options.always_document_params);
        assert_eq!(options.link_policy, LinkPolicy::Hard);
    }

    #[test]
    fn test_flag_selectors() {
        assert_eq!(OutputFormat::from_flag('t'), Some(OutputFormat::Texinfo));
        assert_eq!(OutputFormat::from_flag('x'), None);
        assert_eq!(LinkPolicy::from_flag('r'), Some(LinkPolicy::Remove));
        assert_eq!(ObjectKind::classify(true, true), ObjectKind::StaticFunction);
        assert_eq!(ObjectKind::from_flag('V'), Some(ObjectKind::StaticVariable));
    }
}
