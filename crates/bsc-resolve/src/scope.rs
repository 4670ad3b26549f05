use bsc_source::{pkg_path_key, Location, Range};
use bsc_syntax::BrsFile;
use fxhash::FxHashSet;
use std::sync::Arc;

/// The name of the program scope every non-component script belongs to.
pub const SOURCE_SCOPE: &str = "source";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    Program,
    /// A scenegraph component declared in an XML file.
    Component {
        component_name: String,
        xml_pkg_path: String,
        /// Where the component's name is written in its XML file.
        name_range: Range,
    },
}

/// A validation unit: a set of files plus whatever its parent scope contributes.
#[derive(Debug, Clone)]
pub struct Scope {
    pub name: String,
    pub kind: ScopeKind,
    pub own_files: Vec<Arc<BrsFile>>,
    pub parent_scope_name: Option<String>,
}

impl Scope {
    pub fn program(files: Vec<Arc<BrsFile>>) -> Self {
        Self {
            name: SOURCE_SCOPE.to_string(),
            kind: ScopeKind::Program,
            own_files: files,
            parent_scope_name: None,
        }
    }

    pub fn component(
        component_name: impl Into<String>,
        xml_pkg_path: impl Into<String>,
        name_range: Range,
        files: Vec<Arc<BrsFile>>,
        parent_scope_name: Option<String>,
    ) -> Self {
        let xml_pkg_path = xml_pkg_path.into();
        Self {
            name: xml_pkg_path.clone(),
            kind: ScopeKind::Component {
                component_name: component_name.into(),
                xml_pkg_path,
                name_range,
            },
            own_files: files,
            parent_scope_name,
        }
    }

    pub fn key(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn is_component(&self) -> bool {
        matches!(self.kind, ScopeKind::Component { .. })
    }

    pub fn owns_file(&self, pkg_path: &str) -> bool {
        let key = pkg_path_key(pkg_path);
        self.own_files.iter().any(|file| file.key() == key)
    }

    /// How this scope is named in related information of shared diagnostics.
    pub fn label(&self) -> ScopeLabel {
        let declaration = match &self.kind {
            ScopeKind::Program => None,
            ScopeKind::Component {
                xml_pkg_path,
                name_range,
                ..
            } => Some(Location {
                file: xml_pkg_path.clone(),
                range: *name_range,
            }),
        };
        ScopeLabel {
            name: self.name.clone(),
            declaration,
        }
    }
}

/// A scope's name and, for components, where the component is declared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeLabel {
    pub name: String,
    pub declaration: Option<Location>,
}

impl ScopeLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declaration: None,
        }
    }
}

/// A scope together with its resolved ancestor scopes, nearest first.
#[derive(Debug, Clone)]
pub struct ScopeChain<'a> {
    pub scope: &'a Scope,
    pub ancestors: Vec<&'a Scope>,
}

impl<'a> ScopeChain<'a> {
    pub fn new(scope: &'a Scope, ancestors: Vec<&'a Scope>) -> Self {
        Self { scope, ancestors }
    }

    pub fn single(scope: &'a Scope) -> Self {
        Self::new(scope, Vec::new())
    }

    /// Own files, then each ancestor's files, each file once.
    pub fn all_files(&self) -> Vec<&'a BrsFile> {
        let mut seen = FxHashSet::default();
        std::iter::once(self.scope)
            .chain(self.ancestors.iter().copied())
            .flat_map(|scope| scope.own_files.iter())
            .filter(|file| seen.insert(file.key()))
            .map(|file| file.as_ref())
            .collect()
    }

    /// All files ordered by lower-cased package path.
    pub fn sorted_files(&self) -> Vec<&'a BrsFile> {
        let mut files = self.all_files();
        files.sort_by_key(|file| file.key());
        files
    }
}
