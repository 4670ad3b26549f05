//! Per-scope registries of everything a scope declares.
//!
//! `ScopeRegistries` is rebuilt from scratch for every validation pass. It indexes
//! namespaces, classes, enums, consts, interfaces and callables of every file in a
//! scope chain by fully-qualified lower-cased name. Files are visited in sorted
//! package-path order, so when a name is declared twice the first declaration in
//! each list is always the same one.
//!
//! The registries also own the scope symbol table: while a pass runs, every file
//! table of the scope is parented to it and every namespace block table sees the
//! merged table of its namespace as a sibling. `link` sets that up and the returned
//! guard tears it down again.

use crate::scope::ScopeChain;
use bsc_platform::{GlobalFunction, Platform};
use bsc_source::Range;
use bsc_syntax::ast::{
    ClassStatement, ConstStatement, EnumMember, EnumStatement, FunctionStatement, Identifier, InterfaceStatement,
    NamespaceStatement, Statement, StatementKind,
};
use bsc_syntax::walk::{walk_file, walk_statement, Visitor, WalkContext};
use bsc_syntax::{BrsFile, BscType, SymbolTable};
use fxhash::FxHashMap;
use std::sync::Arc;

/// One declaration of a named entity.
#[derive(Debug, Clone)]
pub struct Declaration<'a, T> {
    pub file: &'a BrsFile,
    pub node: &'a T,
    pub name: &'a Identifier,
    /// Lower-cased full name of the enclosing namespace.
    pub namespace: Option<String>,
    /// Namespace-qualified name as written, e.g. `Alpha.Beta.Widget`.
    pub full_name: String,
}

impl<'a, T> Declaration<'a, T> {
    pub fn key(&self) -> String {
        self.full_name.to_lowercase()
    }

    pub fn is_namespaced(&self) -> bool {
        self.namespace.is_some()
    }
}

/// Something a call can target.
#[derive(Debug, Clone)]
pub enum Callable<'a> {
    Declared(Declaration<'a, FunctionStatement>),
    Global(&'static GlobalFunction),
}

impl<'a> Callable<'a> {
    pub fn name(&self) -> String {
        match self {
            Callable::Declared(decl) => decl.full_name.clone(),
            Callable::Global(function) => function.name.to_string(),
        }
    }

    /// Accepted argument counts, inclusive.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Callable::Declared(decl) => decl.node.func.arity(),
            Callable::Global(function) => (function.min_args, function.max_args),
        }
    }

    /// Where the callable's name is bound. Platform functions have no source and
    /// are bound at the empty range.
    pub fn binding_range(&self) -> Range {
        match self {
            Callable::Declared(decl) => decl.name.range,
            Callable::Global(_) => Range::default(),
        }
    }
}

/// Every block of one namespace name, merged.
#[derive(Debug)]
pub struct NamespaceContainer<'a> {
    pub full_name: String,
    pub last_part_name: String,
    pub statements: Vec<(&'a BrsFile, &'a NamespaceStatement)>,
    /// The bindings of all blocks of this namespace together.
    pub symbol_table: Arc<SymbolTable>,
    pub namespaces: Vec<String>,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub enums: Vec<String>,
    pub consts: Vec<String>,
    pub interfaces: Vec<String>,
}

impl<'a> NamespaceContainer<'a> {
    fn new(full_name: &str) -> Self {
        let last_part_name = full_name.rsplit('.').next().unwrap_or(full_name).to_string();
        Self {
            full_name: full_name.to_string(),
            last_part_name,
            statements: Vec::new(),
            symbol_table: Arc::new(SymbolTable::new(format!("namespace {}", full_name))),
            namespaces: Vec::new(),
            classes: Vec::new(),
            functions: Vec::new(),
            enums: Vec::new(),
            consts: Vec::new(),
            interfaces: Vec::new(),
        }
    }
}

type DeclarationMap<'a, T> = FxHashMap<String, Vec<Declaration<'a, T>>>;

#[derive(Debug)]
pub struct ScopeRegistries<'a> {
    scope_name: String,
    files: Vec<&'a BrsFile>,
    namespace_lookup: FxHashMap<String, NamespaceContainer<'a>>,
    classes: DeclarationMap<'a, ClassStatement>,
    enums: DeclarationMap<'a, EnumStatement>,
    consts: DeclarationMap<'a, ConstStatement>,
    interfaces: DeclarationMap<'a, InterfaceStatement>,
    callables: FxHashMap<String, Vec<Callable<'a>>>,
    scope_symbol_table: Arc<SymbolTable>,
    platform: &'a Platform,
}

/// Lookup keys for `name` used inside `enclosing`: namespace-relative first.
fn candidates(name: &str, enclosing: Option<&str>) -> Vec<String> {
    let name = name.to_lowercase();
    match enclosing {
        Some(namespace) if !namespace.is_empty() => vec![format!("{}.{}", namespace.to_lowercase(), name), name],
        _ => vec![name],
    }
}

fn first_match<'m, V>(map: &'m FxHashMap<String, Vec<V>>, name: &str, enclosing: Option<&str>) -> Option<&'m V> {
    candidates(name, enclosing)
        .iter()
        .find_map(|key| map.get(key).and_then(|list| list.first()))
}

impl<'a> ScopeRegistries<'a> {
    pub fn build(chain: &ScopeChain<'a>, platform: &'a Platform) -> Self {
        let files = chain.sorted_files();
        let mut registries = Self {
            scope_name: chain.scope.name.clone(),
            files: files.clone(),
            namespace_lookup: FxHashMap::default(),
            classes: FxHashMap::default(),
            enums: FxHashMap::default(),
            consts: FxHashMap::default(),
            interfaces: FxHashMap::default(),
            callables: FxHashMap::default(),
            scope_symbol_table: Arc::new(SymbolTable::new(format!("scope {}", chain.scope.name))),
            platform,
        };

        let mut collector = Collector {
            registries: &mut registries,
        };
        for file in &files {
            walk_file(&mut collector, file);
        }
        registries.finish();
        log::debug!(
            "registries for scope {}: {} files, {} namespaces, {} classes, {} enums, {} callables",
            registries.scope_name,
            registries.files.len(),
            registries.namespace_lookup.len(),
            registries.classes.len(),
            registries.enums.len(),
            registries.callables.len()
        );
        registries
    }

    fn finish(&mut self) {
        for list in self.classes.values_mut() {
            list.sort_by_key(|decl| decl.file.key());
        }
        for list in self.enums.values_mut() {
            list.sort_by_key(|decl| decl.file.key());
        }
        for list in self.consts.values_mut() {
            list.sort_by_key(|decl| decl.file.key());
        }
        for list in self.interfaces.values_mut() {
            list.sort_by_key(|decl| decl.file.key());
        }

        let platform = self.platform;
        for function in platform.global_functions() {
            self.callables
                .entry(function.name.to_lowercase())
                .or_default()
                .push(Callable::Global(function));
            self.scope_symbol_table
                .add_symbol(function.name, Range::default(), BscType::Function);
        }

        for file in &self.files {
            self.scope_symbol_table.merge_symbol_table(&file.symbol_table);
        }
        for list in self.callables.values() {
            for callable in list {
                if let Callable::Declared(decl) = callable {
                    if decl.is_namespaced() {
                        let runtime_name = decl.full_name.replace('.', "_");
                        self.scope_symbol_table
                            .add_symbol(&runtime_name, decl.name.range, BscType::Function);
                    }
                }
            }
        }

        for container in self.namespace_lookup.values() {
            for (_, statement) in &container.statements {
                container.symbol_table.merge_symbol_table(&statement.symbol_table);
            }
        }
    }

    pub fn scope_name(&self) -> &str {
        &self.scope_name
    }

    /// The chain's files in sorted package-path order.
    pub fn files(&self) -> &[&'a BrsFile] {
        &self.files
    }

    pub fn platform(&self) -> &'a Platform {
        self.platform
    }

    pub fn scope_symbol_table(&self) -> &Arc<SymbolTable> {
        &self.scope_symbol_table
    }

    pub fn get_namespace(&self, name: &str, enclosing: Option<&str>) -> Option<&NamespaceContainer<'a>> {
        candidates(name, enclosing)
            .iter()
            .find_map(|key| self.namespace_lookup.get(key))
    }

    pub fn get_class(&self, name: &str, enclosing: Option<&str>) -> Option<&Declaration<'a, ClassStatement>> {
        first_match(&self.classes, name, enclosing)
    }

    pub fn get_enum(&self, name: &str, enclosing: Option<&str>) -> Option<&Declaration<'a, EnumStatement>> {
        first_match(&self.enums, name, enclosing)
    }

    pub fn get_const(&self, name: &str, enclosing: Option<&str>) -> Option<&Declaration<'a, ConstStatement>> {
        first_match(&self.consts, name, enclosing)
    }

    pub fn get_interface(&self, name: &str, enclosing: Option<&str>) -> Option<&Declaration<'a, InterfaceStatement>> {
        first_match(&self.interfaces, name, enclosing)
    }

    pub fn get_callable(&self, name: &str, enclosing: Option<&str>) -> Option<&Callable<'a>> {
        first_match(&self.callables, name, enclosing)
    }

    pub fn get_callable_by_name(&self, name: &str) -> Option<&Callable<'a>> {
        self.get_callable(name, None)
    }

    /// Resolve `Enum.Member`. The enum is returned even when the member is not
    /// one of its members.
    pub fn get_enum_member_file_link(
        &self,
        qualified_member: &str,
        enclosing: Option<&str>,
    ) -> Option<(&Declaration<'a, EnumStatement>, Option<&'a EnumMember>)> {
        let (enum_name, member_name) = qualified_member.rsplit_once('.')?;
        let decl = self.get_enum(enum_name, enclosing)?;
        let member = decl
            .node
            .members
            .iter()
            .find(|member| member.name.text.eq_ignore_ascii_case(member_name));
        Some((decl, member))
    }

    /// Whether `name` names a class, interface or enum.
    pub fn is_known_type(&self, name: &str, enclosing: Option<&str>) -> bool {
        self.get_class(name, enclosing).is_some()
            || self.get_interface(name, enclosing).is_some()
            || self.get_enum(name, enclosing).is_some()
    }

    pub fn namespace_map(&self) -> &FxHashMap<String, NamespaceContainer<'a>> {
        &self.namespace_lookup
    }

    pub fn class_map(&self) -> &DeclarationMap<'a, ClassStatement> {
        &self.classes
    }

    pub fn enum_map(&self) -> &DeclarationMap<'a, EnumStatement> {
        &self.enums
    }

    pub fn const_map(&self) -> &DeclarationMap<'a, ConstStatement> {
        &self.consts
    }

    pub fn interface_map(&self) -> &DeclarationMap<'a, InterfaceStatement> {
        &self.interfaces
    }

    pub fn callable_map(&self) -> &FxHashMap<String, Vec<Callable<'a>>> {
        &self.callables
    }

    /// Parent every file table to the scope table and join every namespace block
    /// to its merged namespace table, until the guard is dropped.
    pub fn link(&self) -> LinkedScope<'_, 'a> {
        for file in &self.files {
            file.symbol_table
                .push_parent_provider(SymbolTable::provider_for(&self.scope_symbol_table));
        }
        for container in self.namespace_lookup.values() {
            for (_, statement) in &container.statements {
                statement.symbol_table.add_sibling(&container.symbol_table);
            }
        }
        log::trace!("linked symbol tables of scope {}", self.scope_name);
        LinkedScope { registries: self }
    }

    fn unlink(&self) {
        for file in &self.files {
            file.symbol_table.pop_parent_provider();
        }
        for container in self.namespace_lookup.values() {
            for (_, statement) in &container.statements {
                statement.symbol_table.remove_sibling(&container.symbol_table);
            }
        }
        log::trace!("unlinked symbol tables of scope {}", self.scope_name);
    }

    fn container_mut(&mut self, full_name: &str) -> &mut NamespaceContainer<'a> {
        let mut prefix = String::new();
        for part in full_name.split('.') {
            let parent_key = prefix.to_lowercase();
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(part);
            let key = prefix.to_lowercase();
            if !self.namespace_lookup.contains_key(&key) {
                self.namespace_lookup.insert(key.clone(), NamespaceContainer::new(&prefix));
                if let Some(parent) = self.namespace_lookup.get_mut(&parent_key) {
                    parent.namespaces.push(key);
                }
            }
        }
        self.namespace_lookup
            .entry(full_name.to_lowercase())
            .or_insert_with(|| NamespaceContainer::new(full_name))
    }
}

/// Keeps a scope's symbol tables linked. Dropping it unlinks them.
#[derive(Debug)]
pub struct LinkedScope<'r, 'a> {
    registries: &'r ScopeRegistries<'a>,
}

impl Drop for LinkedScope<'_, '_> {
    fn drop(&mut self) {
        self.registries.unlink();
    }
}

struct Collector<'r, 'a> {
    registries: &'r mut ScopeRegistries<'a>,
}

impl<'r, 'a> Collector<'r, 'a> {
    fn declaration<T>(node: &'a T, name: &'a Identifier, ctx: &WalkContext<'a>) -> Declaration<'a, T> {
        let namespace = ctx.namespace();
        let full_name = match namespace {
            Some(ns) => format!("{}.{}", ns.name.text(), name.text),
            None => name.text.clone(),
        };
        Declaration {
            file: ctx.file(),
            node,
            name,
            namespace: namespace.map(|ns| ns.name.lower()),
            full_name,
        }
    }

    /// Record `key` as a member of the enclosing namespace, if any.
    fn register_member(&mut self, ctx: &WalkContext<'a>, key: &str, pick: for<'c> fn(&'c mut NamespaceContainer<'a>) -> &'c mut Vec<String>) {
        if let Some(ns) = ctx.namespace() {
            let container = self.registries.container_mut(&ns.name.text());
            pick(container).push(key.to_string());
        }
    }
}

impl<'r, 'a> Visitor<'a> for Collector<'r, 'a> {
    fn visit_statement(&mut self, stmt: &'a Statement, ctx: &mut WalkContext<'a>) {
        match &stmt.kind {
            StatementKind::Namespace(ns) => {
                let container = self.registries.container_mut(&ns.name.text());
                container.statements.push((ctx.file(), ns));
                walk_statement(self, stmt, ctx);
            }
            StatementKind::Class(class) => {
                let decl = Self::declaration(class, &class.name, ctx);
                let key = decl.key();
                self.register_member(ctx, &key, |c| &mut c.classes);
                self.registries.classes.entry(key).or_default().push(decl);
            }
            StatementKind::Enum(enum_stmt) => {
                let decl = Self::declaration(enum_stmt, &enum_stmt.name, ctx);
                let key = decl.key();
                self.register_member(ctx, &key, |c| &mut c.enums);
                self.registries.enums.entry(key).or_default().push(decl);
            }
            StatementKind::Const(constant) => {
                let decl = Self::declaration(constant, &constant.name, ctx);
                let key = decl.key();
                self.register_member(ctx, &key, |c| &mut c.consts);
                self.registries.consts.entry(key).or_default().push(decl);
            }
            StatementKind::Interface(interface) => {
                let decl = Self::declaration(interface, &interface.name, ctx);
                let key = decl.key();
                self.register_member(ctx, &key, |c| &mut c.interfaces);
                self.registries.interfaces.entry(key).or_default().push(decl);
            }
            StatementKind::Function(function) if ctx.function().is_none() => {
                let decl = Self::declaration(function, &function.name, ctx);
                let key = decl.key();
                self.register_member(ctx, &key, |c| &mut c.functions);
                self.registries
                    .callables
                    .entry(key)
                    .or_default()
                    .push(Callable::Declared(decl));
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use bsc_syntax::AstBuilder;

    fn program(files: Vec<BrsFile>) -> Scope {
        Scope::program(files.into_iter().map(Arc::new).collect())
    }

    #[test]
    fn namespaces_register_every_prefix() {
        let b = AstBuilder::new();
        let scope = program(vec![b.file(
            "source/lib.bs",
            vec![b.namespace(
                "Alpha.Beta",
                vec![b.function("helper", vec![], None, vec![]), b.class("Widget", None, vec![])],
            )],
        )]);
        let platform = Platform::new();
        let chain = ScopeChain::single(&scope);
        let registries = ScopeRegistries::build(&chain, &platform);

        let alpha = registries.get_namespace("ALPHA", None).unwrap();
        assert_eq!(alpha.namespaces, vec!["alpha.beta".to_string()]);
        assert_eq!(registries.get_namespace("Beta", Some("alpha")).unwrap().full_name, "Alpha.Beta");
        assert!(registries.get_namespace("Beta", None).is_none());
        let beta = registries.get_namespace("alpha.beta", None).unwrap();
        assert_eq!(beta.classes, vec!["alpha.beta.widget".to_string()]);
        assert_eq!(beta.functions, vec!["alpha.beta.helper".to_string()]);
        assert!(beta.enums.is_empty());

        assert_eq!(registries.get_class("Widget", Some("alpha.beta")).unwrap().full_name, "Alpha.Beta.Widget");
        assert!(registries.get_class("Widget", None).is_none());
        assert_eq!(registries.get_callable_by_name("alpha.beta.helper").unwrap().arity(), (0, 0));
        assert!(registries.scope_symbol_table().has_symbol("Alpha_Beta_helper", false));
    }

    #[test]
    fn duplicates_keep_sorted_path_order() {
        let platform = Platform::new();
        let b = AstBuilder::new();
        let zebra = b.file("source/zebra.bs", vec![b.enumeration("Color", vec![("Red", None)])]);
        let apple = b.file("source/Apple.bs", vec![b.enumeration("Color", vec![("Blue", None)])]);
        let scope = program(vec![zebra, apple]);
        let chain = ScopeChain::single(&scope);
        let registries = ScopeRegistries::build(&chain, &platform);

        let declarations = &registries.enum_map()["color"];
        let paths: Vec<&str> = declarations.iter().map(|d| d.file.pkg_path.as_str()).collect();
        assert_eq!(paths, vec!["source/Apple.bs", "source/zebra.bs"]);

        let (decl, member) = registries.get_enum_member_file_link("color.blue", None).unwrap();
        assert_eq!(decl.file.pkg_path, "source/Apple.bs");
        assert!(member.is_some());
        assert!(registries.get_enum_member_file_link("Color.Green", None).unwrap().1.is_none());
    }

    #[test]
    fn declared_callables_shadow_globals() {
        let platform = Platform::new();
        let b = AstBuilder::new();
        let scope = program(vec![b.file(
            "source/main.bs",
            vec![b.function("Len", vec![b.param("a", None), b.param("b", None)], None, vec![])],
        )]);
        let chain = ScopeChain::single(&scope);
        let registries = ScopeRegistries::build(&chain, &platform);

        let all = &registries.callable_map()["len"];
        assert_eq!(all.len(), 2);
        assert!(matches!(all[0], Callable::Declared(_)));
        assert_eq!(registries.get_callable_by_name("len").unwrap().arity(), (2, 2));
        assert_eq!(registries.get_callable_by_name("UCase").unwrap().binding_range(), Range::default());
    }

    #[test]
    fn linking_is_undone_by_the_guard() {
        let platform = Platform::new();
        let b = AstBuilder::new();
        let scope = program(vec![
            b.file("source/a.bs", vec![b.namespace("Alpha", vec![b.function("first", vec![], None, vec![])])]),
            b.file("source/b.bs", vec![b.namespace("Alpha", vec![b.function("second", vec![], None, vec![])])]),
        ]);
        let chain = ScopeChain::single(&scope);
        let registries = ScopeRegistries::build(&chain, &platform);
        let file_a = &scope.own_files[0];
        let StatementKind::Namespace(block_a) = &file_a.statements[0].kind else {
            panic!("expected namespace");
        };

        assert!(!block_a.symbol_table.has_symbol("second", true));
        {
            let _linked = registries.link();
            assert!(block_a.symbol_table.has_symbol("second", true));
            assert!(file_a.symbol_table.has_symbol("UCase", true));
            assert_eq!(file_a.symbol_table.parent_provider_depth(), 1);
        }
        assert!(!block_a.symbol_table.has_symbol("second", true));
        assert_eq!(file_a.symbol_table.parent_provider_depth(), 0);
        assert_eq!(block_a.symbol_table.sibling_count(), 0);
    }
}
