//! Folding per-scope findings into one diagnostic list per program cycle.
//!
//! A file included by several scopes is validated once per scope, so the same
//! problem is found several times. `ValidationCycle` files each problem once,
//! against the first scope that reported it, and records every scope that
//! found it as related information.

use crate::scope::ScopeLabel;
use bsc_source::{pkg_path_key, Diagnostic, DiagnosticKey, RelatedInformation};
use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexMap;
use parking_lot::Mutex;

/// How a finding is deduplicated across scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dedup {
    /// Reported once per cycle no matter which file or scope finds it.
    Once,
    /// Reported once per file, annotated with every scope that found it.
    MultiScope,
}

/// A diagnostic as one scope pass found it, before deduplication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedFinding {
    pub diagnostic: Diagnostic,
    pub dedup: Dedup,
}

impl ScopedFinding {
    pub fn once(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            dedup: Dedup::Once,
        }
    }

    pub fn multi_scope(diagnostic: Diagnostic) -> Self {
        Self {
            diagnostic,
            dedup: Dedup::MultiScope,
        }
    }
}

/// Everything one scope pass found.
#[derive(Debug, Clone)]
pub struct ScopeFindings {
    pub scope: ScopeLabel,
    pub findings: Vec<ScopedFinding>,
}

#[derive(Debug, Clone, Copy)]
struct Filed {
    scope_index: usize,
    position: usize,
}

#[derive(Debug, Default)]
struct CycleState {
    once: FxHashSet<DiagnosticKey>,
    multi_scope: FxHashMap<(String, DiagnosticKey), Filed>,
    reported_by: FxHashMap<(String, DiagnosticKey), FxHashSet<String>>,
    filed: IndexMap<String, Vec<Diagnostic>>,
}

impl CycleState {
    fn scope_index(&mut self, scope: &ScopeLabel) -> usize {
        let entry = self.filed.entry(scope.name.clone());
        let index = entry.index();
        entry.or_default();
        index
    }
}

/// Dedup state for one program validation cycle.
#[derive(Debug, Default)]
pub struct ValidationCycle {
    state: Mutex<CycleState>,
}

impl ValidationCycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything; call before each program validation cycle.
    pub fn reset(&self) {
        *self.state.lock() = CycleState::default();
    }

    /// Make sure `scope` has a (possibly empty) list.
    pub fn register_scope(&self, scope: &ScopeLabel) {
        self.state.lock().scope_index(scope);
    }

    /// File `diagnostic` against `scope` unless an identical problem was filed
    /// already. Returns whether it was filed.
    pub fn add_diagnostic_once(&self, scope: &ScopeLabel, diagnostic: Diagnostic) -> bool {
        let mut state = self.state.lock();
        if !state.once.insert(diagnostic.key()) {
            return false;
        }
        let index = state.scope_index(scope);
        if let Some((_, list)) = state.filed.get_index_mut(index) {
            list.push(diagnostic);
        }
        true
    }

    /// File `diagnostic` against the first scope that reports it, and note
    /// `scope` in its related information. Returns whether it was newly filed.
    pub fn add_multi_scope_diagnostic(&self, scope: &ScopeLabel, diagnostic: Diagnostic) -> bool {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let key = (pkg_path_key(&diagnostic.file), diagnostic.key());
        let related = RelatedInformation::new(
            format!("Not defined in scope '{}'", scope.name),
            scope
                .declaration
                .as_ref()
                .map(|location| location.file.clone())
                .unwrap_or_else(|| diagnostic.file.clone()),
            scope
                .declaration
                .as_ref()
                .map(|location| location.range)
                .unwrap_or(diagnostic.range),
        );

        let first_report = state
            .reported_by
            .entry(key.clone())
            .or_default()
            .insert(scope.name.clone());

        let existing = state.multi_scope.get(&key).copied();
        let (filed, is_new) = match existing {
            Some(filed) => (filed, false),
            None => {
                let scope_index = state.scope_index(scope);
                let Some((_, list)) = state.filed.get_index_mut(scope_index) else {
                    return false;
                };
                list.push(diagnostic);
                let filed = Filed {
                    scope_index,
                    position: list.len() - 1,
                };
                state.multi_scope.insert(key, filed);
                (filed, true)
            }
        };

        if first_report {
            if let Some(existing) = state
                .filed
                .get_index_mut(filed.scope_index)
                .and_then(|(_, list)| list.get_mut(filed.position))
            {
                existing.related_information.push(related);
            }
        }
        is_new
    }

    /// Route a finding by its dedup kind.
    pub fn add_finding(&self, scope: &ScopeLabel, finding: ScopedFinding) -> bool {
        match finding.dedup {
            Dedup::Once => self.add_diagnostic_once(scope, finding.diagnostic),
            Dedup::MultiScope => self.add_multi_scope_diagnostic(scope, finding.diagnostic),
        }
    }

    /// The diagnostics filed so far, per scope name.
    pub fn diagnostics(&self) -> IndexMap<String, Vec<Diagnostic>> {
        self.state.lock().filed.clone()
    }
}

/// Fold the findings of every scope of one cycle into `cycle`, scope names in
/// sorted order, and return the diagnostics filed against each scope.
pub fn aggregate_multi_scope(
    cycle: &ValidationCycle,
    per_scope: IndexMap<String, ScopeFindings>,
) -> IndexMap<String, Vec<Diagnostic>> {
    let mut per_scope = per_scope;
    per_scope.sort_keys();

    for findings in per_scope.values() {
        cycle.register_scope(&findings.scope);
    }
    let mut count = 0usize;
    for (name, findings) in &per_scope {
        log::trace!("aggregating {} findings of scope {}", findings.findings.len(), name);
        for finding in &findings.findings {
            if cycle.add_finding(&findings.scope, finding.clone()) {
                count += 1;
            }
        }
    }
    log::debug!("{} scopes produced {} distinct diagnostics", per_scope.len(), count);

    let filed = cycle.diagnostics();
    per_scope
        .keys()
        .map(|name| (name.clone(), filed.get(name).cloned().unwrap_or_default()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bsc_source::{Location, Range, Severity};

    fn finding(file: &str, line: u32) -> Diagnostic {
        Diagnostic::new(1001, "Cannot find name 'foo'", Severity::Error, file, Range::on_line(line, 4, 3))
    }

    fn component(name: &str) -> ScopeLabel {
        ScopeLabel {
            name: name.to_string(),
            declaration: Some(Location {
                file: name.to_string(),
                range: Range::on_line(1, 17, 4),
            }),
        }
    }

    #[test]
    fn shared_file_problem_is_filed_once() {
        let cycle = ValidationCycle::new();
        let first = component("components/A.xml");
        let second = component("components/B.xml");
        assert!(cycle.add_multi_scope_diagnostic(&first, finding("source/lib.bs", 3)));
        assert!(!cycle.add_multi_scope_diagnostic(&second, finding("source/lib.bs", 3)));
        assert!(!cycle.add_multi_scope_diagnostic(&second, finding("source/lib.bs", 3)));

        let filed = cycle.diagnostics();
        let list = &filed["components/A.xml"];
        assert_eq!(list.len(), 1);
        let related: Vec<&str> = list[0].related_information.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(
            related,
            vec!["Not defined in scope 'components/A.xml'", "Not defined in scope 'components/B.xml'"]
        );
        assert_eq!(list[0].related_information[1].location.file, "components/B.xml");
        assert!(filed.get("components/B.xml").map_or(true, |list| list.is_empty()));
    }

    #[test]
    fn own_related_information_comes_before_scopes() {
        let cycle = ValidationCycle::new();
        let declared = || {
            finding("source/b.bs", 3).with_related(RelatedInformation::new(
                "Enum 'Color' is first declared here",
                "source/a.bs",
                Range::on_line(1, 5, 5),
            ))
        };
        assert!(cycle.add_multi_scope_diagnostic(&component("components/A.xml"), declared()));
        assert!(!cycle.add_multi_scope_diagnostic(&component("components/B.xml"), declared()));

        let filed = cycle.diagnostics();
        let related: Vec<(&str, &str)> = filed["components/A.xml"][0]
            .related_information
            .iter()
            .map(|r| (r.location.file.as_str(), r.message.as_str()))
            .collect();
        assert_eq!(
            related,
            vec![
                ("source/a.bs", "Enum 'Color' is first declared here"),
                ("components/A.xml", "Not defined in scope 'components/A.xml'"),
                ("components/B.xml", "Not defined in scope 'components/B.xml'"),
            ]
        );
    }

    #[test]
    fn multi_scope_keys_include_the_file() {
        let cycle = ValidationCycle::new();
        let scope = ScopeLabel::new("source");
        assert!(cycle.add_multi_scope_diagnostic(&scope, finding("source/a.bs", 3)));
        assert!(cycle.add_multi_scope_diagnostic(&scope, finding("source/b.bs", 3)));
        assert_eq!(cycle.diagnostics()["source"].len(), 2);
    }

    #[test]
    fn once_keys_ignore_the_file() {
        let cycle = ValidationCycle::new();
        let scope = ScopeLabel::new("source");
        assert!(cycle.add_diagnostic_once(&scope, finding("source/a.bs", 3)));
        assert!(!cycle.add_diagnostic_once(&ScopeLabel::new("other"), finding("source/b.bs", 3)));
        assert_eq!(cycle.diagnostics()["source"].len(), 1);
        assert!(cycle.diagnostics()["source"][0].related_information.is_empty());

        cycle.reset();
        assert!(cycle.diagnostics().is_empty());
        assert!(cycle.add_diagnostic_once(&scope, finding("source/a.bs", 3)));
    }

    #[test]
    fn aggregation_is_order_independent() {
        let build = |order: &[&str]| {
            let mut per_scope = IndexMap::new();
            for name in order {
                per_scope.insert(
                    name.to_string(),
                    ScopeFindings {
                        scope: component(name),
                        findings: vec![ScopedFinding::multi_scope(finding("source/lib.bs", 1))],
                    },
                );
            }
            aggregate_multi_scope(&ValidationCycle::new(), per_scope)
        };
        let forward = build(&["components/A.xml", "components/B.xml"]);
        let backward = build(&["components/B.xml", "components/A.xml"]);
        assert_eq!(forward, backward);
        assert_eq!(forward["components/A.xml"].len(), 1);
        assert!(forward["components/B.xml"].is_empty());
    }
}
