//! Declaration model and semantic actions for C documentation extraction.
//!
//! This crate holds everything the parser builds and the renderer reads:
//!
//! - [`DeclSpec`], [`Declarator`], [`Parameter`] and [`Enumerator`]: the
//!   intermediate representation of C declarations, with types kept as text
//!   plus a few [`DeclFlags`].
//! - [`SymbolTable`]: typedef names and enum tags.
//! - [`EnumStore`]: enumerator lists shared between symbols.
//! - [`Session`]: the semantic actions (comment attachment, K&R parameter
//!   typing, declaration filtering) and all state of a run.
//! - [`PageRegistry`] / [`ManualPage`]: the declarations that will be
//!   documented.
//! - [`Options`]: run-time settings, loadable from YAML.
//!
//! # Example
//!
//! ```
//! use c2man_core::*;
//!
//! let mut session = Session::new(Options::default());
//! session.begin_file(Some("math.h"), None);
//!
//! let params = vec![
//!     Parameter::new(DeclSpec::new("int", DeclFlags::empty()), Declarator::identifier("a")),
//!     Parameter::new(DeclSpec::new("int", DeclFlags::empty()), Declarator::identifier("b")),
//! ];
//! let add = Declarator::function(Declarator::identifier("add"), params);
//! session.remember_declarations(
//!     Some("Adds two numbers.".to_string()),
//!     DeclSpec::new("int", DeclFlags::empty()),
//!     vec![add],
//!     None,
//! );
//!
//! assert_eq!(session.pages.len(), 1);
//! assert_eq!(session.pages.pages()[0].name(), "add");
//! assert_eq!(session.error_count(), 0);
//! ```

mod config;
mod enums;
mod error;
mod manpage;
mod semantic;
mod symbol;
mod types;

pub use config::{
    LinkPolicy, ObjectKind, ObjectOutput, ObjectOutputs, Options, OutputFormat, PrototypeFormat,
    unescape,
};
pub use enums::EnumStore;
pub use error::{ConfigError, Diagnostic, Result, SemanticError};
pub use manpage::{ManualPage, PageRegistry, SourceState};
pub use semantic::{Session, terse_from_comment};
pub use symbol::{SYMBOL_BUCKETS, Symbol, SymbolId, SymbolTable, SymbolValue};
pub use types::*;
