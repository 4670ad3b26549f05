use crate::{Position, Range, SourceError};
use std::path::PathBuf;
use std::sync::Arc;

/// Lower-cased, forward-slash form of a package path.
///
/// This is the key every registry and cache uses for files, and the order
/// files are sorted in whenever precedence between declarations matters.
pub fn pkg_path_key(pkg_path: &str) -> String {
    pkg_path.replace('\\', "/").to_lowercase()
}

/// A source file known to the program.
///
/// # Fields
///
/// * `src_path` - The path on disk the file was loaded from
/// * `pkg_path` - The path of the file inside the packaged channel (e.g. `source/main.bs`)
/// * `contents` - The raw text, when the host made it available
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub src_path: PathBuf,
    pub pkg_path: String,
    pub contents: Option<Arc<str>>,
}

impl SourceFile {
    pub fn new(src_path: impl Into<PathBuf>, pkg_path: impl Into<String>) -> Self {
        Self {
            src_path: src_path.into(),
            pkg_path: pkg_path.into(),
            contents: None,
        }
    }

    pub fn with_contents(mut self, contents: impl Into<Arc<str>>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    pub fn key(&self) -> String {
        pkg_path_key(&self.pkg_path)
    }

    /// Byte offset of a position. Characters past the end of a line clamp to the line end.
    pub fn offset_of(&self, position: Position) -> Result<usize, SourceError> {
        let text = self
            .contents
            .as_deref()
            .ok_or_else(|| SourceError::MissingContents(self.pkg_path.clone()))?;

        let mut line_start = 0usize;
        for _ in 0..position.line {
            match text[line_start..].find('\n') {
                Some(idx) => line_start += idx + 1,
                None => {
                    return Err(SourceError::LineOutOfBounds {
                        path: self.pkg_path.clone(),
                        line: position.line,
                        line_count: text.lines().count(),
                    })
                }
            }
        }

        let line_end = text[line_start..]
            .find('\n')
            .map(|idx| line_start + idx)
            .unwrap_or(text.len());
        let offset = text[line_start..line_end]
            .char_indices()
            .nth(position.character as usize)
            .map(|(idx, _)| line_start + idx)
            .unwrap_or(line_end);
        Ok(offset)
    }

    /// Byte offset and length of a range, as miette expects spans.
    pub fn span_of(&self, range: Range) -> Result<(usize, usize), SourceError> {
        let start = self.offset_of(range.start)?;
        let end = self.offset_of(range.end)?.max(start);
        Ok((start, end - start))
    }
}
