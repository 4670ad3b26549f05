use bsc_source::Range;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, Error, Diagnostic, PartialEq, Eq)]
pub enum SyntaxError {
    /// A dotted name with an empty part, such as `Alpha..Beta` or a trailing dot.
    #[error("Invalid dotted name `{name}` at {range}")]
    #[diagnostic(code(bsc_syntax::invalid_name), help("Every part of a dotted name must be an identifier"))]
    InvalidName { name: String, range: Range },
}
