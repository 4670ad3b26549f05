//! The diagnostic model shared by every validation phase.
//!
//! A `Diagnostic` is plain data: it can be compared, sorted, serialized and merged.
//! Two diagnostics describe the same problem when their `DiagnosticKey`s are equal,
//! which is what the multi-scope deduplication relies on.
//!
//! ## Miette Integration
//!
//! `Report` wraps a diagnostic together with the text of its file and implements
//! `miette::Diagnostic`, so it can be handed to any miette report handler.

use crate::{Range, SourceFile};
use miette::{LabeledSpan, SourceSpan};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How serious a diagnostic is. Only `Error` fails a non-watch build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

impl Severity {
    pub fn is_error(self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
            Severity::Hint => "hint",
        };
        f.write_str(text)
    }
}

/// A file/range pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub range: Range,
}

/// A secondary location attached to a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelatedInformation {
    pub message: String,
    pub location: Location,
}

impl RelatedInformation {
    pub fn new(message: impl Into<String>, file: impl Into<String>, range: Range) -> Self {
        Self {
            message: message.into(),
            location: Location {
                file: file.into(),
                range,
            },
        }
    }
}

/// A single problem found in a file.
///
/// # Fields
///
/// * `code` - Stable numeric code, also the key for severity overrides and filters
/// * `file` - Package path of the file the problem is in
/// * `related_information` - Secondary locations (original declarations, affected scopes)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
#[error("{file}:{}:{} - {severity} BS{code}: {message}", .range.start.line + 1, .range.start.character + 1)]
pub struct Diagnostic {
    pub code: u32,
    pub message: String,
    pub range: Range,
    pub file: String,
    pub severity: Severity,
    #[serde(default)]
    pub related_information: Vec<RelatedInformation>,
}

/// Identity of a diagnostic for deduplication: `(code, message, range)`.
///
/// The range participates in its string form so keys stay cheap to hash and print.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DiagnosticKey {
    pub code: u32,
    pub message: String,
    pub range: String,
}

impl Diagnostic {
    pub fn new(code: u32, message: impl Into<String>, severity: Severity, file: impl Into<String>, range: Range) -> Self {
        Self {
            code,
            message: message.into(),
            range,
            file: file.into(),
            severity,
            related_information: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: RelatedInformation) -> Self {
        self.related_information.push(related);
        self
    }

    pub fn key(&self) -> DiagnosticKey {
        DiagnosticKey {
            code: self.code,
            message: self.message.clone(),
            range: self.range.to_string(),
        }
    }

    /// Whether `other` reports the same problem in the same file.
    pub fn is_same_problem(&self, other: &Diagnostic) -> bool {
        self.file == other.file && self.code == other.code && self.message == other.message && self.range == other.range
    }

    /// Pair this diagnostic with the text of its file for rendering.
    pub fn report(&self, file: &SourceFile) -> Report {
        let span = file
            .span_of(self.range)
            .map(|(offset, len)| SourceSpan::from((offset, len)))
            .ok();
        Report {
            diagnostic: self.clone(),
            source_code: file.contents.as_deref().unwrap_or_default().to_string(),
            span,
        }
    }
}

/// Sort diagnostics the way they are printed: by file, then position, then code.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        crate::pkg_path_key(&a.file)
            .cmp(&crate::pkg_path_key(&b.file))
            .then_with(|| a.range.cmp(&b.range))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.message.cmp(&b.message))
    });
}

/// A diagnostic with the source text needed to render it.
#[derive(Debug, Clone, Error)]
#[error("{}", .diagnostic.message)]
pub struct Report {
    pub diagnostic: Diagnostic,
    pub source_code: String,
    span: Option<SourceSpan>,
}

impl miette::Diagnostic for Report {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!("BS{}", self.diagnostic.code)))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.diagnostic.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
            Severity::Information | Severity::Hint => miette::Severity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        if self.diagnostic.related_information.is_empty() {
            return None;
        }
        let lines: Vec<String> = self
            .diagnostic
            .related_information
            .iter()
            .map(|related| {
                format!(
                    "{}:{}:{}: {}",
                    related.location.file,
                    related.location.range.start.line + 1,
                    related.location.range.start.character + 1,
                    related.message
                )
            })
            .collect();
        Some(Box::new(lines.join("\n")))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        self.span.map(|_| &self.source_code as &dyn miette::SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let span = self.span?;
        Some(Box::new(std::iter::once(LabeledSpan::new_with_span(None, span))))
    }
}
