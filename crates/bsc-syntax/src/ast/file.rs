use super::stmt::Statement;
use crate::binder;
use crate::symbol_table::SymbolTable;
use bsc_source::{pkg_path_key, SourceFile};
use std::path::PathBuf;
use std::sync::Arc;

/// A parsed script file with its bound symbol tables.
///
/// Constructing a file runs the binder, so every table reachable from the
/// statements is populated and linked to its lexical parent.
#[derive(Debug)]
pub struct BrsFile {
    pub src_path: PathBuf,
    pub pkg_path: String,
    pub statements: Vec<Statement>,
    pub symbol_table: Arc<SymbolTable>,
    pub contents: Option<Arc<str>>,
}

impl BrsFile {
    pub fn new(src_path: impl Into<PathBuf>, pkg_path: impl Into<String>, statements: Vec<Statement>) -> Self {
        let pkg_path = pkg_path.into();
        let file = Self {
            src_path: src_path.into(),
            symbol_table: Arc::new(SymbolTable::new(format!("file {}", pkg_path))),
            pkg_path,
            statements,
            contents: None,
        };
        binder::bind_file(&file);
        file
    }

    pub fn with_contents(mut self, contents: impl Into<Arc<str>>) -> Self {
        self.contents = Some(contents.into());
        self
    }

    /// Lower-cased package path, the key files are sorted and cached by.
    pub fn key(&self) -> String {
        pkg_path_key(&self.pkg_path)
    }

    pub fn source(&self) -> SourceFile {
        SourceFile {
            src_path: self.src_path.clone(),
            pkg_path: self.pkg_path.clone(),
            contents: self.contents.clone(),
        }
    }
}
