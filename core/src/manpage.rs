//! Manual page records and the registry deciding which declarations get one.

use std::time::SystemTime;

use serde::Serialize;
use tracing::debug;

use crate::config::{ObjectKind, Options};
use crate::types::{DeclSpec, Declarator, DeclaratorKind};

/// Where the parser currently is, as far as page selection cares.
#[derive(Debug, Clone, Default)]
pub struct SourceState {
    /// File named on the command line; `None` for standard input.
    pub basefile: Option<String>,
    /// Modification time of the base file.
    pub basetime: Option<SystemTime>,
    /// Whether the tokens being parsed come from the base file itself.
    pub in_base_file: bool,
    /// Whether the base file is a header (`.h`/`.H`).
    pub header_file: bool,
    /// File the current tokens come from, after line markers.
    pub current_file: Option<String>,
    pub line: usize,
}

impl SourceState {
    /// State at the start of `basefile`.
    pub fn for_file(basefile: Option<&str>, basetime: Option<SystemTime>) -> Self {
        let header_file = basefile
            .and_then(|name| name.rsplit_once('.'))
            .is_some_and(|(_, ext)| ext.starts_with(['h', 'H']));
        Self {
            basefile: basefile.map(str::to_string),
            basetime,
            in_base_file: true,
            header_file,
            current_file: basefile.map(str::to_string),
            line: 1,
        }
    }
}

/// One documented top-level declaration.
///
/// The declaration's comment is kept in `declarator.comment`.
#[derive(Debug, Clone, Serialize)]
pub struct ManualPage {
    pub decl_spec: DeclSpec,
    pub declarator: Declarator,
    pub sourcefile: Option<String>,
    #[serde(skip)]
    pub sourcetime: Option<SystemTime>,
}

impl ManualPage {
    pub fn name(&self) -> &str {
        self.declarator.name.as_deref().unwrap_or("")
    }

    pub fn comment(&self) -> Option<&str> {
        self.declarator.comment.as_deref()
    }

    pub fn is_function(&self) -> bool {
        self.declarator.is_function()
    }

    /// Enum-typed declarations document themselves.
    pub fn is_auto_documented(&self) -> bool {
        self.decl_spec.enum_list.is_some()
    }

    pub fn object_kind(&self) -> ObjectKind {
        ObjectKind::classify(self.is_function(), self.decl_spec.is_static())
    }

    /// Base name of the source file without directory or extension.
    pub fn source_base(&self) -> Option<&str> {
        let file = self.sourcefile.as_deref()?;
        let base = file.rsplit_once('/').map_or(file, |(_, base)| base);
        Some(base.rsplit_once('.').map_or(base, |(stem, _)| stem))
    }
}

/// Documented pages in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PageRegistry {
    pages: Vec<ManualPage>,
}

impl PageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page for the declaration if it deserves one.
    ///
    /// A declaration is documented only when it has a comment, comes from
    /// the base file, is a function (or variables are wanted), is not junk,
    /// is not a `static` hidden by the options, and is not an `extern`
    /// prototype outside a header. Returns whether a page was created;
    /// everything else is dropped.
    pub fn consider(
        &mut self,
        options: &Options,
        source: &SourceState,
        comment: Option<String>,
        decl_spec: DeclSpec,
        mut declarator: Declarator,
    ) -> bool {
        let name = declarator.name.as_deref().unwrap_or("");
        let rejected = if comment.is_none() {
            Some("no comment")
        } else if !source.in_base_file {
            Some("not in base file")
        } else if !options.variables_out && !declarator.is_function() {
            Some("not a function")
        } else if decl_spec.is_junk() {
            Some("uninteresting")
        } else if !options.static_out && decl_spec.is_static() && !source.header_file {
            Some("static")
        } else if decl_spec.is_extern()
            && !source.header_file
            && declarator.kind != DeclaratorKind::FunctionDef
        {
            Some("extern outside header")
        } else {
            None
        };

        if let Some(reason) = rejected {
            debug!(name, reason, "skipping declaration");
            return false;
        }

        debug!(name, "registered manual page");
        declarator.comment = comment;
        self.pages.push(ManualPage {
            decl_spec,
            declarator,
            sourcefile: source.basefile.clone(),
            sourcetime: source.basetime,
        });
        true
    }

    pub fn pages(&self) -> &[ManualPage] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [ManualPage] {
        &mut self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn into_pages(self) -> Vec<ManualPage> {
        self.pages
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}
