//! Source positions and diagnostics for the BrighterScript validator.
//!
//! This crate is the bottom of the workspace. It provides:
//! - `Position`/`Range`, the zero-based line/character coordinates every AST node carries
//! - `Diagnostic`, the single currency through which validation reports problems
//! - `SourceFile`, the optional source text used to render diagnostics with context
//! - console rendering of diagnostic lists, grouped by file and sorted by position
//!
//! ## Miette Integration
//!
//! Rendering goes through miette's graphical report handler. A `Report` pairs a
//! `Diagnostic` with the text of its file so that miette can draw the labelled span.

mod diagnostic;
mod error;
mod file;
mod position;
mod render;

pub use diagnostic::{Diagnostic, DiagnosticKey, Location, RelatedInformation, Report, Severity, sort_diagnostics};
pub use error::SourceError;
pub use file::{SourceFile, pkg_path_key};
pub use position::{Position, Range};
pub use render::{render_diagnostics, render_plain};
