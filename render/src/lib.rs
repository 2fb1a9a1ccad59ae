//! Rendering of documented C declarations into manual pages.
//!
//! The pipeline for each page:
//!
//! 1. [`comment`] splits the declaration's comment into a terse line, a
//!    description, a returns part and named sections.
//! 2. [`page::output_manpage`] composes NAME, SYNOPSIS, PARAMETERS,
//!    DESCRIPTION, RETURNS, the named sections and SEE ALSO through an
//!    [`Output`] driver.
//! 3. [`files`] writes the result to a file per page (or one file per
//!    group, with links for the other names) or to standard output.
//!
//! Drivers exist for nroff, LaTeX, HTML, Texinfo and autodoc; [`fixup`]
//! holds the sentence clean-up they share.

pub mod comment;
pub mod error;
pub mod files;
pub mod fixup;
pub mod output;
pub mod page;

pub use error::{RenderError, Result};
pub use files::{RenderSummary, page_file_name, render_pages, render_session};
pub use output::{Output, Settings, driver, driver_for};
pub use page::{RenderContext, output_manpage};
