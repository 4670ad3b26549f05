use crate::components::{ComponentDatabase, ComponentEntry};
use crate::config::ProgramConfig;
use crate::error::{DatabaseError, DatabaseResult};
use bsc_platform::Platform;
use bsc_resolve::{
    aggregate_multi_scope, validate_scope_cached, InventoryCache, Scope, ScopeChain, ScopeFindings, ValidationCycle,
    SOURCE_SCOPE,
};
use bsc_source::{pkg_path_key, render_diagnostics, sort_diagnostics, Diagnostic, Severity, SourceFile};
use bsc_syntax::BrsFile;
use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexMap;
use std::sync::Arc;

const SOURCE_DIR: &str = "source/";

/// Files, scopes and the diagnostics of the last validation cycle.
pub struct Program {
    config: ProgramConfig,
    /// Keyed by `pkg_path_key`.
    files: IndexMap<String, Arc<BrsFile>>,
    components: ComponentDatabase,
    /// Keyed by `Scope::key`.
    scopes: IndexMap<String, Scope>,
    validated: FxHashSet<String>,
    /// Raw findings of each scope's last pass, keyed by scope name.
    findings: IndexMap<String, ScopeFindings>,
    /// Filtered diagnostics per scope name.
    diagnostics: IndexMap<String, Vec<Diagnostic>>,
    cycle: ValidationCycle,
}

impl Program {
    pub fn new(config: ProgramConfig) -> Self {
        let source = Scope::program(Vec::new());
        let mut scopes = IndexMap::new();
        scopes.insert(source.key(), source);
        Self {
            config,
            files: IndexMap::new(),
            components: ComponentDatabase::new(),
            scopes,
            validated: FxHashSet::default(),
            findings: IndexMap::new(),
            diagnostics: IndexMap::new(),
            cycle: ValidationCycle::new(),
        }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    pub fn components(&self) -> &ComponentDatabase {
        &self.components
    }

    /// Add or replace a file. Every scope that sees the file, before or after
    /// the change, is marked dirty.
    pub fn set_file(&mut self, file: BrsFile) -> Arc<BrsFile> {
        let key = file.key();
        let file = Arc::new(file);
        let mut affected = self.scopes_including(&key);
        self.files.insert(key.clone(), file.clone());
        self.refresh_scope_files();
        affected.extend(self.scopes_including(&key));
        log::trace!("file {} touches scopes {:?}", file.pkg_path, affected);
        self.invalidate(affected);
        file
    }

    pub fn remove_file(&mut self, pkg_path: &str) -> DatabaseResult<Arc<BrsFile>> {
        let key = pkg_path_key(pkg_path);
        let affected = self.scopes_including(&key);
        let removed = self
            .files
            .shift_remove(&key)
            .ok_or_else(|| DatabaseError::UnknownFile {
                pkg_path: pkg_path.to_string(),
            })?;
        self.refresh_scope_files();
        self.invalidate(affected);
        Ok(removed)
    }

    pub fn get_file(&self, pkg_path: &str) -> Option<&Arc<BrsFile>> {
        self.files.get(&pkg_path_key(pkg_path))
    }

    /// Register a component and its scope. Component names feed the set of
    /// valid node types, so every scope is marked dirty.
    pub fn add_component(&mut self, entry: ComponentEntry) {
        let scope = Scope::component(
            entry.name.clone(),
            entry.xml_pkg_path.clone(),
            entry.name_range,
            Vec::new(),
            entry.parent_name.clone(),
        );
        if let Some(previous) = self.components.insert(entry) {
            if let Some(old) = self.scopes.shift_remove(&previous.xml_pkg_path.to_lowercase()) {
                self.forget_scope(&old);
            }
        }
        self.scopes.insert(scope.key(), scope);
        self.refresh_scope_files();
        self.invalidate_all();
    }

    pub fn remove_component(&mut self, xml_pkg_path: &str) -> DatabaseResult<ComponentEntry> {
        let removed = self
            .components
            .remove_by_xml(xml_pkg_path)
            .ok_or_else(|| DatabaseError::UnknownComponent {
                xml_pkg_path: xml_pkg_path.to_string(),
            })?;
        if let Some(scope) = self.scopes.shift_remove(&removed.xml_pkg_path.to_lowercase()) {
            self.forget_scope(&scope);
        }
        self.invalidate_all();
        Ok(removed)
    }

    pub fn scope(&self, name: &str) -> DatabaseResult<&Scope> {
        self.scopes
            .get(&name.to_lowercase())
            .ok_or_else(|| DatabaseError::UnknownScope { name: name.to_string() })
    }

    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.values().map(|scope| scope.name.as_str())
    }

    /// Whether `name` has been validated since its last contributing change.
    pub fn is_validated(&self, name: &str) -> DatabaseResult<bool> {
        let scope = self.scope(name)?;
        Ok(self.validated.contains(&scope.key()))
    }

    /// The platform extended with this program's components.
    pub fn platform(&self) -> Platform {
        Platform::new().with_custom_nodes(self.components.names())
    }

    /// `scope` with its ancestor component scopes, nearest first.
    pub fn chain<'s>(&'s self, scope: &'s Scope) -> ScopeChain<'s> {
        let ancestors = match self.components.get_by_xml(&scope.name) {
            Some(entry) => self
                .components
                .ancestors(&entry.name)
                .into_iter()
                .filter_map(|parent| self.scopes.get(&parent.xml_pkg_path.to_lowercase()))
                .collect(),
            None => Vec::new(),
        };
        ScopeChain::new(scope, ancestors)
    }

    /// Validate every dirty scope, then rebuild the diagnostic list of the
    /// whole program.
    pub fn validate(&mut self) {
        let mut dirty: Vec<String> = self
            .scopes
            .keys()
            .filter(|key| !self.validated.contains(*key))
            .cloned()
            .collect();
        dirty.sort();
        if dirty.is_empty() {
            log::debug!("nothing to validate");
            return;
        }
        log::debug!("validating {} of {} scopes", dirty.len(), self.scopes.len());

        let results = self.run_passes(&dirty);
        for (key, findings) in results {
            self.findings.insert(findings.scope.name.clone(), findings);
            self.validated.insert(key);
        }
        self.aggregate();
    }

    fn run_passes(&self, dirty: &[String]) -> Vec<(String, ScopeFindings)> {
        let platform = self.platform();
        let chains: Vec<(String, ScopeChain<'_>)> = dirty
            .iter()
            .filter_map(|key| Some((key.clone(), self.chain(self.scopes.get(key)?))))
            .collect();
        let cache = InventoryCache::new();

        if !self.config.parallel_validation || chains.len() < 2 {
            return chains
                .iter()
                .map(|(key, chain)| (key.clone(), validate_scope_cached(chain, &platform, &cache)))
                .collect();
        }

        let mut results = Vec::with_capacity(chains.len());
        for batch in disjoint_batches(&chains) {
            log::trace!("validating batch of {} scopes", batch.len());
            let outcome = crossbeam_utils::thread::scope(|s| {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|&(key, chain)| {
                        let platform = &platform;
                        let cache = &cache;
                        s.spawn(move |_| (key.clone(), validate_scope_cached(chain, platform, cache)))
                    })
                    .collect();
                handles
                    .into_iter()
                    .filter_map(|handle| match handle.join() {
                        Ok(result) => Some(result),
                        Err(_) => {
                            log::error!("a scope validation thread panicked");
                            None
                        }
                    })
                    .collect::<Vec<_>>()
            });
            match outcome {
                Ok(batch_results) => results.extend(batch_results),
                Err(_) => log::error!("scope validation batch did not complete"),
            }
        }
        results
    }

    fn aggregate(&mut self) {
        self.cycle.reset();
        let filed = aggregate_multi_scope(&self.cycle, self.findings.clone());
        self.diagnostics = filed
            .into_iter()
            .map(|(name, diagnostics)| {
                let diagnostics = self.config.apply(diagnostics);
                (name, diagnostics)
            })
            .collect();
        log::debug!(
            "program has {} diagnostics across {} scopes",
            self.diagnostics.values().map(Vec::len).sum::<usize>(),
            self.diagnostics.len()
        );
    }

    /// Every diagnostic of the last cycle, sorted by file and position.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut all: Vec<Diagnostic> = self.diagnostics.values().flatten().cloned().collect();
        sort_diagnostics(&mut all);
        all
    }

    pub fn scope_diagnostics(&self, name: &str) -> DatabaseResult<&[Diagnostic]> {
        let scope = self.scope(name)?;
        Ok(self
            .diagnostics
            .get(&scope.name)
            .map(Vec::as_slice)
            .unwrap_or_default())
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .values()
            .flatten()
            .any(|diagnostic| diagnostic.severity == Severity::Error)
    }

    /// Render the last cycle's diagnostics, with source context for files
    /// whose text is known.
    pub fn render(&self) -> String {
        let sources: FxHashMap<String, SourceFile> = self
            .files
            .iter()
            .filter_map(|(key, file)| {
                let contents = file.contents.clone()?;
                Some((
                    key.clone(),
                    SourceFile::new(file.src_path.clone(), file.pkg_path.clone()).with_contents(contents),
                ))
            })
            .collect();
        render_diagnostics(&self.diagnostics(), &sources)
    }

    fn scopes_including(&self, file_key: &str) -> Vec<String> {
        self.scopes
            .values()
            .filter(|scope| self.chain(scope).all_files().iter().any(|file| file.key() == file_key))
            .map(Scope::key)
            .collect()
    }

    fn refresh_scope_files(&mut self) {
        let files = &self.files;
        let components = &self.components;
        for scope in self.scopes.values_mut() {
            scope.own_files = if scope.name == SOURCE_SCOPE {
                files
                    .iter()
                    .filter(|(key, _)| key.starts_with(SOURCE_DIR))
                    .map(|(_, file)| file.clone())
                    .collect()
            } else {
                components
                    .get_by_xml(&scope.name)
                    .map(|entry| {
                        entry
                            .scripts
                            .iter()
                            .filter_map(|script| files.get(&pkg_path_key(script)).cloned())
                            .collect()
                    })
                    .unwrap_or_default()
            };
        }
    }

    fn forget_scope(&mut self, scope: &Scope) {
        self.validated.remove(&scope.key());
        self.findings.shift_remove(&scope.name);
        self.diagnostics.shift_remove(&scope.name);
    }

    fn invalidate(&mut self, keys: impl IntoIterator<Item = String>) {
        for key in keys {
            self.validated.remove(&key);
        }
    }

    fn invalidate_all(&mut self) {
        self.validated.clear();
    }
}

impl Default for Program {
    fn default() -> Self {
        Self::new(ProgramConfig::default())
    }
}

/// Pack scopes, in order, into batches whose members share no file.
fn disjoint_batches<'c, 's>(chains: &'c [(String, ScopeChain<'s>)]) -> Vec<Vec<&'c (String, ScopeChain<'s>)>> {
    let mut batches: Vec<(FxHashSet<String>, Vec<&'c (String, ScopeChain<'s>)>)> = Vec::new();
    for entry in chains {
        let keys: FxHashSet<String> = entry.1.all_files().iter().map(|file| file.key()).collect();
        match batches.iter_mut().find(|(used, _)| used.is_disjoint(&keys)) {
            Some((used, members)) => {
                used.extend(keys);
                members.push(entry);
            }
            None => batches.push((keys, vec![entry])),
        }
    }
    batches.into_iter().map(|(_, members)| members).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsc_syntax::AstBuilder;

    fn chains_of<'s>(scopes: &'s [Scope]) -> Vec<(String, ScopeChain<'s>)> {
        scopes
            .iter()
            .map(|scope| (scope.name.clone(), ScopeChain::single(scope)))
            .collect()
    }

    #[test]
    fn scopes_sharing_a_file_land_in_different_batches() {
        let b = AstBuilder::new();
        let shared = Arc::new(b.file("source/shared.bs", vec![]));
        let own = Arc::new(b.file("components/own.bs", vec![]));
        let scopes = vec![
            Scope::component("A", "components/A.xml", Default::default(), vec![shared.clone()], None),
            Scope::component("B", "components/B.xml", Default::default(), vec![shared], None),
            Scope::component("C", "components/C.xml", Default::default(), vec![own], None),
        ];
        let chains = chains_of(&scopes);
        let batches: Vec<Vec<&str>> = disjoint_batches(&chains)
            .iter()
            .map(|batch| batch.iter().map(|(name, _)| name.as_str()).collect())
            .collect();
        assert_eq!(batches, vec![vec!["components/A.xml", "components/C.xml"], vec!["components/B.xml"]]);
    }

    #[test]
    fn source_scope_collects_source_files() {
        let b = AstBuilder::new();
        let mut program = Program::default();
        program.set_file(b.file("source/main.bs", vec![]));
        program.set_file(b.file("components/widget.bs", vec![]));
        let source = program.scope(SOURCE_SCOPE).unwrap();
        let files: Vec<&str> = source.own_files.iter().map(|file| file.pkg_path.as_str()).collect();
        assert_eq!(files, vec!["source/main.bs"]);
    }

    #[test]
    fn unknown_names_are_errors() {
        let mut program = Program::default();
        assert!(matches!(program.scope("nope"), Err(DatabaseError::UnknownScope { .. })));
        assert!(matches!(
            program.remove_file("source/missing.bs"),
            Err(DatabaseError::UnknownFile { .. })
        ));
        assert!(matches!(
            program.remove_component("components/missing.xml"),
            Err(DatabaseError::UnknownComponent { .. })
        ));
    }
}
