//! Console rendering of diagnostic lists.

use crate::{sort_diagnostics, Diagnostic, SourceFile};
use fxhash::FxHashMap;
use miette::{GraphicalReportHandler, GraphicalTheme};
use std::fmt::Write;

/// One line per diagnostic, grouped by file and sorted by position.
pub fn render_plain(diagnostics: &[Diagnostic]) -> String {
    let mut sorted = diagnostics.to_vec();
    sort_diagnostics(&mut sorted);

    let mut output = String::new();
    for diagnostic in &sorted {
        let _ = writeln!(output, "{}", diagnostic);
    }
    output
}

/// Render diagnostics with source context where the file text is known.
///
/// `sources` is keyed by `pkg_path_key`. Diagnostics whose file has no text (or
/// whose range no longer fits the text) fall back to the plain one-line form.
pub fn render_diagnostics(diagnostics: &[Diagnostic], sources: &FxHashMap<String, SourceFile>) -> String {
    let mut sorted = diagnostics.to_vec();
    sort_diagnostics(&mut sorted);

    let handler = GraphicalReportHandler::new_themed(GraphicalTheme::unicode_nocolor());
    let mut output = String::new();
    let mut current_file: Option<String> = None;

    for diagnostic in &sorted {
        let key = crate::pkg_path_key(&diagnostic.file);
        if current_file.as_deref() != Some(key.as_str()) {
            let _ = writeln!(output, "{}:", diagnostic.file);
            current_file = Some(key.clone());
        }

        let rendered = sources
            .get(&key)
            .filter(|file| file.contents.is_some() && file.span_of(diagnostic.range).is_ok())
            .and_then(|file| {
                let report = diagnostic.report(file);
                let mut text = String::new();
                handler.render_report(&mut text, &report).ok().map(|_| text)
            });

        match rendered {
            Some(text) => output.push_str(&text),
            None => {
                log::trace!("rendering {} without source context", diagnostic.file);
                let _ = writeln!(output, "  {}", diagnostic);
            }
        }
    }
    output
}
