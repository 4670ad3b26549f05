use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while mapping diagnostics back onto source text.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// The line of a position lies past the end of the file.
    #[error("Line {line} is out of bounds for `{path}` ({line_count} lines)")]
    #[diagnostic(
        code(bsc_source::line_out_of_bounds),
        help("The file may have changed since the diagnostic was produced")
    )]
    LineOutOfBounds {
        path: String,
        line: u32,
        line_count: usize,
    },

    /// The file has no text attached, so no offset can be computed.
    #[error("No source text is available for `{0}`")]
    #[diagnostic(code(bsc_source::missing_contents))]
    MissingContents(String),
}
