//! Hierarchical name tables.
//!
//! Every scope-like node (file, namespace block, function body) owns a
//! `SymbolTable`. Lookups walk the table's own bindings, then its siblings,
//! then its parent. Parents are reached through providers: closures that hand
//! back the parent on demand and hold only a weak reference, so a table never
//! keeps a rebuilt tree alive. Providers form a stack, letting a validation
//! pass re-parent a file table temporarily and restore it afterwards.

use crate::ast::BscType;
use bsc_source::Range;
use fxhash::{FxHashMap, FxHashSet};
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// One declaration of a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BscSymbol {
    pub name: String,
    pub range: Range,
    pub ty: BscType,
}

/// Resolves the parent table when asked.
pub type ParentProvider = Arc<dyn Fn() -> Option<Arc<SymbolTable>> + Send + Sync>;

pub struct SymbolTable {
    name: String,
    symbol_map: RwLock<FxHashMap<String, Vec<BscSymbol>>>,
    siblings: RwLock<Vec<Weak<SymbolTable>>>,
    parent_providers: RwLock<Vec<ParentProvider>>,
}

impl SymbolTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol_map: RwLock::new(FxHashMap::default()),
            siblings: RwLock::new(Vec::new()),
            parent_providers: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A provider that yields `table` for as long as it is alive.
    pub fn provider_for(table: &Arc<SymbolTable>) -> ParentProvider {
        let weak = Arc::downgrade(table);
        Arc::new(move || weak.upgrade())
    }

    /// Add a binding. Existing bindings of the same name are kept.
    pub fn add_symbol(&self, name: &str, range: Range, ty: BscType) {
        self.symbol_map
            .write()
            .entry(name.to_lowercase())
            .or_default()
            .push(BscSymbol {
                name: name.to_string(),
                range,
                ty,
            });
    }

    /// All bindings of `name`, from the first table in lookup order that has any.
    pub fn get_symbol(&self, name: &str, search_parent: bool) -> Option<Vec<BscSymbol>> {
        let key = name.to_lowercase();
        if let Some(found) = self.lookup_local(&key) {
            return Some(found);
        }
        if !search_parent {
            return None;
        }

        let mut visited = FxHashSet::default();
        visited.insert(self as *const SymbolTable);
        let mut current = self.parent();
        while let Some(table) = current {
            if !visited.insert(Arc::as_ptr(&table)) {
                log::warn!("symbol table `{}` has a cyclic parent chain", self.name);
                return None;
            }
            if let Some(found) = table.lookup_local(&key) {
                return Some(found);
            }
            current = table.parent();
        }
        None
    }

    pub fn has_symbol(&self, name: &str, search_parent: bool) -> bool {
        self.get_symbol(name, search_parent).is_some()
    }

    /// Own bindings, then each live sibling's own bindings.
    fn lookup_local(&self, key: &str) -> Option<Vec<BscSymbol>> {
        if let Some(found) = self.symbol_map.read().get(key).filter(|list| !list.is_empty()) {
            return Some(found.clone());
        }
        let siblings = self.siblings.read();
        siblings.iter().filter_map(Weak::upgrade).find_map(|sibling| {
            if std::ptr::eq(Arc::as_ptr(&sibling), self) {
                return None;
            }
            sibling.symbol_map.read().get(key).filter(|list| !list.is_empty()).cloned()
        })
    }

    pub fn add_sibling(&self, sibling: &Arc<SymbolTable>) {
        let mut siblings = self.siblings.write();
        let already = siblings.iter().any(|existing| std::ptr::eq(existing.as_ptr(), Arc::as_ptr(sibling)));
        if !already {
            siblings.push(Arc::downgrade(sibling));
        }
    }

    /// Drop `sibling`, along with any sibling that no longer exists.
    pub fn remove_sibling(&self, sibling: &Arc<SymbolTable>) {
        self.siblings
            .write()
            .retain(|existing| existing.strong_count() > 0 && !std::ptr::eq(existing.as_ptr(), Arc::as_ptr(sibling)));
    }

    pub fn sibling_count(&self) -> usize {
        self.siblings.read().len()
    }

    /// Copy every binding of `other` into this table.
    pub fn merge_symbol_table(&self, other: &SymbolTable) {
        if std::ptr::eq(self, other) {
            return;
        }
        let symbols = other.get_all_symbols();
        let mut map = self.symbol_map.write();
        for symbol in symbols {
            map.entry(symbol.name.to_lowercase()).or_default().push(symbol);
        }
    }

    pub fn push_parent_provider(&self, provider: ParentProvider) {
        self.parent_providers.write().push(provider);
    }

    pub fn pop_parent_provider(&self) -> Option<ParentProvider> {
        self.parent_providers.write().pop()
    }

    pub fn parent_provider_depth(&self) -> usize {
        self.parent_providers.read().len()
    }

    /// The table the top parent provider currently yields.
    pub fn parent(&self) -> Option<Arc<SymbolTable>> {
        let provider = self.parent_providers.read().last().cloned()?;
        provider()
    }

    /// Own bindings, sorted by name then range.
    pub fn get_all_symbols(&self) -> Vec<BscSymbol> {
        let mut symbols: Vec<BscSymbol> = self.symbol_map.read().values().flatten().cloned().collect();
        symbols.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.range.cmp(&b.range))
        });
        symbols
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("name", &self.name)
            .field("symbols", &self.symbol_map.read().len())
            .field("siblings", &self.siblings.read().len())
            .field("parents", &self.parent_providers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str) -> Arc<SymbolTable> {
        Arc::new(SymbolTable::new(name))
    }

    #[test]
    fn bindings_are_case_insensitive_and_accumulate() {
        let t = table("t");
        t.add_symbol("Foo", Range::on_line(0, 0, 3), BscType::Integer);
        t.add_symbol("FOO", Range::on_line(1, 0, 3), BscType::String);
        let found = t.get_symbol("foo", false).unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "Foo");
        assert_eq!(found[1].ty, BscType::String);
    }

    #[test]
    fn lookup_order_is_own_then_siblings_then_parent() {
        let parent = table("parent");
        let sibling = table("sibling");
        let child = table("child");
        child.push_parent_provider(SymbolTable::provider_for(&parent));
        child.add_sibling(&sibling);

        parent.add_symbol("x", Range::on_line(0, 0, 1), BscType::Integer);
        assert_eq!(child.get_symbol("x", true).unwrap()[0].ty, BscType::Integer);
        assert!(child.get_symbol("x", false).is_none());

        sibling.add_symbol("x", Range::on_line(1, 0, 1), BscType::String);
        assert_eq!(child.get_symbol("x", true).unwrap()[0].ty, BscType::String);

        child.add_symbol("x", Range::on_line(2, 0, 1), BscType::Boolean);
        assert_eq!(child.get_symbol("x", true).unwrap()[0].ty, BscType::Boolean);
    }

    #[test]
    fn parents_are_held_weakly() {
        let child = table("child");
        {
            let parent = table("parent");
            parent.add_symbol("gone", Range::default(), BscType::Dynamic);
            child.push_parent_provider(SymbolTable::provider_for(&parent));
            assert!(child.has_symbol("gone", true));
        }
        assert!(child.parent().is_none());
        assert!(!child.has_symbol("gone", true));
    }

    #[test]
    fn provider_stack_restores_previous_parent() {
        let child = table("child");
        let first = table("first");
        let second = table("second");
        first.add_symbol("a", Range::default(), BscType::Dynamic);
        second.add_symbol("b", Range::default(), BscType::Dynamic);

        child.push_parent_provider(SymbolTable::provider_for(&first));
        child.push_parent_provider(SymbolTable::provider_for(&second));
        assert!(child.has_symbol("b", true));
        assert!(!child.has_symbol("a", true));

        child.pop_parent_provider();
        assert!(child.has_symbol("a", true));
        assert_eq!(child.parent_provider_depth(), 1);
    }

    #[test]
    fn siblings_are_unique_and_removable() {
        let t = table("t");
        let s = table("s");
        t.add_sibling(&s);
        t.add_sibling(&s);
        assert_eq!(t.sibling_count(), 1);
        t.remove_sibling(&s);
        assert_eq!(t.sibling_count(), 0);
    }

    #[test]
    fn cyclic_parents_terminate() {
        let a = table("a");
        let b = table("b");
        a.push_parent_provider(SymbolTable::provider_for(&b));
        b.push_parent_provider(SymbolTable::provider_for(&a));
        assert!(!a.has_symbol("nothing", true));
    }

    #[test]
    fn merge_copies_bindings() {
        let target = table("target");
        let source = table("source");
        source.add_symbol("Alpha", Range::on_line(0, 0, 5), BscType::Function);
        source.add_symbol("beta", Range::on_line(1, 0, 4), BscType::Function);
        target.merge_symbol_table(&source);
        target.merge_symbol_table(&target);
        let names: Vec<String> = target.get_all_symbols().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Alpha", "beta"]);
    }
}
