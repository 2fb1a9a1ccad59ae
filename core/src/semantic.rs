//! Semantic actions run by the grammar while it reduces declarations.
//!
//! All mutable state of a run lives in [`Session`]: the typedef and enum-tag
//! symbol tables, the enumerator store, the page registry and the error
//! count. Conflicts never abort parsing; they are reported through
//! [`Session::report`] and checked once the input is exhausted.

use std::fmt::Display;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::Options;
use crate::enums::EnumStore;
use crate::error::{Diagnostic, SemanticError};
use crate::manpage::{PageRegistry, SourceState};
use crate::symbol::SymbolTable;
use crate::types::{
    DeclFlags, DeclSpec, Declarator, EnumListId, Enumerator, Identifier, Parameter,
};

/// State of one documentation run.
#[derive(Debug)]
pub struct Session {
    pub options: Options,
    pub typedefs: SymbolTable,
    pub enum_tags: SymbolTable,
    pub enums: EnumStore,
    pub pages: PageRegistry,
    pub source: SourceState,
    /// Terse description for grouped pages, from the options or from the
    /// first comment of the input.
    pub group_terse: Option<String>,
    /// Number of distinct input files seen.
    pub input_files: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Session {
    pub fn new(options: Options) -> Self {
        let group_terse = options.group_terse.clone();
        Self {
            options,
            typedefs: SymbolTable::new(),
            enum_tags: SymbolTable::new(),
            enums: EnumStore::new(),
            pages: PageRegistry::new(),
            source: SourceState::default(),
            group_terse,
            input_files: 0,
            diagnostics: Vec::new(),
        }
    }

    /// Prepares for parsing a new base file (`None` for standard input).
    pub fn begin_file(&mut self, name: Option<&str>, modified: Option<SystemTime>) {
        debug!(file = ?name, "processing file");
        self.source = SourceState::for_file(name, modified);
        self.input_files += 1;
    }

    /// Records a diagnostic at the current position and counts it as an error.
    pub fn error(&mut self, message: impl Display) {
        let diagnostic = Diagnostic {
            file: self.source.current_file.clone(),
            line: self.source.line,
            message: message.to_string(),
        };
        warn!(%diagnostic, "semantic error");
        self.diagnostics.push(diagnostic);
    }

    pub fn report(&mut self, error: SemanticError) {
        self.error(error);
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn is_typedef_name(&self, name: &str) -> bool {
        self.typedefs.contains(name)
    }

    /// Enumerator list a typedef name stands for.
    pub fn typedef_enum_list(&self, name: &str) -> Option<EnumListId> {
        self.enums.lookup(&self.typedefs, name)
    }

    /// Enumerator list registered under an enum tag.
    pub fn find_enum_tag(&self, tag: &str) -> Option<EnumListId> {
        self.enums.lookup(&self.enum_tags, tag)
    }

    pub fn register_enum_tag(&mut self, tag: &str, list: EnumListId) {
        self.enums.register_under(&mut self.enum_tags, tag, list);
    }

    /// Adds every declared name to the typedef table, carrying the
    /// specifier's enumerator list along.
    pub fn new_typedef_symbols(&mut self, decl_spec: &DeclSpec, declarators: &[Declarator]) {
        for name in declarators.iter().filter_map(|d| d.name.as_deref()) {
            match decl_spec.enum_list {
                Some(list) => self.enums.register_under(&mut self.typedefs, name, list),
                None => {
                    self.typedefs.insert_if_absent(name, 0);
                }
            }
            debug!(name, "new typedef name");
        }
    }

    /// Builds a parameter from its parts and the comments around it.
    ///
    /// A missing specifier becomes an uninteresting placeholder, a missing
    /// declarator an abstract one. Two comments are a conflict; the one
    /// before the parameter wins.
    pub fn new_parameter(
        &mut self,
        decl_spec: Option<DeclSpec>,
        declarator: Option<Declarator>,
        comment_before: Option<String>,
        comment_after: Option<String>,
    ) -> Parameter {
        let mut param = Parameter::new(
            decl_spec.unwrap_or_else(|| DeclSpec::empty(DeclFlags::JUNK)),
            declarator.unwrap_or_else(Declarator::abstract_declarator),
        );
        if comment_before.is_some() && comment_after.is_some() {
            self.report(SemanticError::ParameterComments(param_name(&param)));
        }
        let comment = comment_before.or(comment_after);
        if comment.is_some() {
            param.declarator.comment = comment;
        }
        param
    }

    /// Parameter for a name in a K&R identifier list.
    pub fn identifier_parameter(&mut self, ident: Identifier) -> Parameter {
        let declarator = Declarator::identifier(&ident.name);
        self.new_parameter(
            None,
            Some(declarator),
            ident.comment_before,
            ident.comment_after,
        )
    }

    /// Attaches a trailing comment to the last parameter of a list.
    pub fn comment_last_parameter(&mut self, params: &mut [Parameter], comment: String) -> bool {
        let Some(last) = params.last_mut() else {
            self.report(SemanticError::OrphanComment(comment));
            return false;
        };
        if last.declarator.comment.is_some() {
            let name = param_name(last);
            self.report(SemanticError::ParameterComments(name));
            return false;
        }
        last.declarator.comment = Some(comment);
        true
    }

    /// Attaches a trailing comment to the last declarator of a list.
    pub fn comment_last_decl(&mut self, declarators: &mut [Declarator], comment: String) -> bool {
        let Some(last) = declarators.last_mut() else {
            return false;
        };
        if last.comment.is_some() {
            let name = last.name.clone().unwrap_or_default();
            self.report(SemanticError::DeclaratorComments(name));
            return false;
        }
        last.comment = Some(comment);
        true
    }

    /// Attaches a trailing comment to the last enumerator of a list.
    pub fn comment_last_enumerator(&mut self, list: EnumListId, comment: String) -> bool {
        match self.enums.attach_comment(list, comment) {
            Ok(()) => true,
            Err(name) => {
                self.report(SemanticError::EnumeratorComments(name));
                false
            }
        }
    }

    /// Starts an enumerator list; named lists are registered under their tag.
    pub fn new_enum_list(&mut self, tag: Option<&str>, first: Enumerator) -> EnumListId {
        let list = self.enums.new_list(first);
        if let Some(tag) = tag {
            self.register_enum_tag(tag, list);
        }
        list
    }

    /// Types the parameters of a K&R definition from one of its parameter
    /// declarations, e.g. `char c, *s;`.
    ///
    /// Each declared name must appear in the identifier list. Unless
    /// promotion is disabled, a plain `char`/`short` becomes `int` and a plain
    /// `float` becomes `double`.
    pub fn apply_parameter_types(
        &mut self,
        params: &mut [Parameter],
        decl_spec: DeclSpec,
        declarators: Vec<Declarator>,
        comment: Option<String>,
        eol_comment: Option<String>,
    ) {
        if comment.is_some() && eol_comment.is_some() {
            self.report(SemanticError::ParameterDeclarationComments);
            return;
        }
        let comment = comment.or(eol_comment);

        for mut declarator in declarators {
            let name = declarator.name.clone().unwrap_or_default();
            let Some(param) = params
                .iter_mut()
                .find(|p| p.declarator.name.as_deref() == Some(name.as_str()))
            else {
                self.report(SemanticError::MissingArgument(name));
                continue;
            };

            let mut text = decl_spec.text.clone();
            if self.options.promote_params && declarator.text == declarator.name {
                if decl_spec.flags.intersects(DeclFlags::CHAR | DeclFlags::SHORT) {
                    text = Some("int".to_string());
                } else if decl_spec.flags.contains(DeclFlags::FLOAT) {
                    text = Some("double".to_string());
                }
            }
            param.decl_spec.text = text;

            let mut conflict = false;
            if param.decl_spec.flags != decl_spec.flags {
                if param.decl_spec.is_junk() {
                    param.decl_spec.flags = decl_spec.flags;
                } else {
                    conflict = true;
                }
            }
            if param.decl_spec.enum_list != decl_spec.enum_list {
                if param.decl_spec.enum_list.is_none() {
                    param.decl_spec.enum_list = decl_spec.enum_list;
                } else {
                    conflict = true;
                }
            }
            if conflict {
                self.report(SemanticError::ParameterTypeConflict(name.clone()));
            }

            if declarator.comment.is_none() {
                declarator.comment = param.declarator.comment.take();
            }
            param.declarator = declarator;

            if let Some(comment) = &comment {
                if param.declarator.comment.is_some() {
                    self.report(SemanticError::ParameterComments(name));
                } else {
                    param.declarator.comment = Some(comment.clone());
                }
            }
        }
    }

    /// Hands the declarators of a complete declaration to the page registry.
    ///
    /// `eol_comment` trails the declaration on its last line; it describes the
    /// last parameter of a function, or else the last declarator. With a
    /// single declarator the leading comment takes precedence over the
    /// declarator's own; with several, each declarator prefers its own
    /// comment and falls back to a copy of the leading one.
    pub fn remember_declarations(
        &mut self,
        comment: Option<String>,
        decl_spec: DeclSpec,
        mut declarators: Vec<Declarator>,
        eol_comment: Option<String>,
    ) -> bool {
        let mut ok = true;

        if let Some(eol) = eol_comment
            && let Some(last) = declarators.last_mut()
        {
            let to_parameter = last.is_function() && !last.head().parameters.is_empty();
            let target = if to_parameter {
                last.head_parameters_mut()
                    .last_mut()
                    .map(|p| &mut p.declarator)
            } else {
                Some(last)
            };
            if let Some(target) = target {
                if target.comment.is_some() {
                    let name = target.name.clone().unwrap_or_default();
                    self.report(SemanticError::DeclaratorComments(name));
                    ok = false;
                } else {
                    target.comment = Some(eol);
                }
            }
        }

        if declarators.len() == 1 {
            if let Some(mut declarator) = declarators.pop() {
                let own = declarator.comment.take();
                self.consider(comment.or(own), decl_spec, declarator);
            }
        } else {
            for mut declarator in declarators {
                let own = declarator.comment.take();
                self.consider(own.or_else(|| comment.clone()), decl_spec.clone(), declarator);
            }
        }
        ok
    }

    /// Registers a page for the declaration if it passes the selection rules.
    pub fn consider(
        &mut self,
        comment: Option<String>,
        decl_spec: DeclSpec,
        declarator: Declarator,
    ) -> bool {
        self.pages
            .consider(&self.options, &self.source, comment, decl_spec, declarator)
    }

    /// Remembers the terse description of grouped output from the first
    /// comment of the input, unless one is already known.
    pub fn remember_terse(&mut self, comment: &str) {
        if self.group_terse.is_none() {
            self.group_terse = Some(terse_from_comment(comment));
        }
    }

    /// Releases the symbol tables, enumerator lists and pages.
    pub fn teardown(&mut self) {
        self.typedefs.destroy();
        self.enum_tags.destroy();
        self.enums.destroy_all();
        self.pages.clear();
        self.group_terse = self.options.group_terse.clone();
    }
}

fn param_name(param: &Parameter) -> String {
    param.declarator.name.clone().unwrap_or_default()
}

/// First line of a comment, starting after a whitespace-surrounded run of
/// dashes when there is one (`"strings - string utilities"`).
pub fn terse_from_comment(comment: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum Scan {
        Stuff,
        LeadSpace,
        Dash,
        TrailSpace,
    }

    let mut state = Scan::Stuff;
    let mut start = 0;
    for (i, b) in comment.bytes().enumerate() {
        let space = b.is_ascii_whitespace();
        state = match state {
            Scan::Stuff if space => Scan::LeadSpace,
            Scan::Stuff => Scan::Stuff,
            Scan::LeadSpace if b == b'-' => Scan::Dash,
            Scan::LeadSpace if !space => Scan::Stuff,
            Scan::LeadSpace => Scan::LeadSpace,
            Scan::Dash if space => Scan::TrailSpace,
            Scan::Dash if b != b'-' => Scan::Stuff,
            Scan::Dash => Scan::Dash,
            Scan::TrailSpace if !space => {
                start = i;
                break;
            }
            Scan::TrailSpace => Scan::TrailSpace,
        };
    }

    let rest = &comment[start..];
    rest.split('\n').next().unwrap_or_default().to_string()
}
