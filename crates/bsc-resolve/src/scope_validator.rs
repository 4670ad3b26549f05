//! Name resolution for every expression of a scope.
//!
//! Each file is first flattened into an inventory: every dotted-name chain
//! (`a`, `a.b.c`, the callee of a call, an `extends` clause), every `new`
//! expression, every function signature and every `CreateObject` call, each with
//! the namespace and symbol table in effect where it was written. Inventories
//! only depend on the file, so one cache can serve every scope of a validation
//! cycle.
//!
//! A chain is resolved left to right. A root found in the symbol tables ends the
//! check: member access on runtime values is never validated. A root that names a
//! namespace or an enum is followed through the registries until it reaches a
//! declaration. Only the first unresolvable part of a chain is reported.

use crate::cache::Cache;
use crate::create_object::{is_create_object_call, validate_create_object};
use crate::dedup::ScopedFinding;
use crate::error::ResolveDiagnostic;
use crate::registry::{Callable, Declaration, ScopeRegistries};
use crate::scope::ScopeChain;
use bsc_source::{Range, RelatedInformation};
use bsc_syntax::ast::{
    EnumStatement, Expression, ExpressionKind, FunctionExpression, Identifier, NamespacedName, Statement,
    StatementKind,
};
use bsc_syntax::walk::{walk_expression, walk_file, walk_function, walk_statement, Visitor, WalkContext};
use bsc_syntax::{BrsFile, BscSymbol, BscType, SymbolTable};
use std::sync::Arc;

/// How a dotted chain is used where it appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Usage {
    Value,
    Callee { arg_count: usize },
    Extends,
}

#[derive(Debug, Clone)]
pub struct ExpressionInfo<'a> {
    pub parts: Vec<&'a Identifier>,
    pub usage: Usage,
    /// Lower-cased full name of the enclosing namespace.
    pub namespace: Option<String>,
    pub symbol_table: &'a Arc<SymbolTable>,
    pub range: Range,
}

#[derive(Debug, Clone)]
pub struct NewInfo<'a> {
    pub class_name: &'a NamespacedName,
    pub namespace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo<'a> {
    pub func: &'a FunctionExpression,
    pub namespace: Option<String>,
}

/// Everything the resolver checks in one file.
#[derive(Debug)]
pub struct FileInventory<'a> {
    pub file: &'a BrsFile,
    pub expressions: Vec<ExpressionInfo<'a>>,
    pub new_expressions: Vec<NewInfo<'a>>,
    pub functions: Vec<FunctionInfo<'a>>,
    pub create_object_calls: Vec<&'a Expression>,
}

impl<'a> FileInventory<'a> {
    pub fn collect(file: &'a BrsFile) -> Self {
        let mut collector = InventoryCollector {
            inventory: FileInventory {
                file,
                expressions: Vec::new(),
                new_expressions: Vec::new(),
                functions: Vec::new(),
                create_object_calls: Vec::new(),
            },
        };
        walk_file(&mut collector, file);
        log::trace!(
            "inventory of {}: {} expressions, {} functions",
            file.pkg_path,
            collector.inventory.expressions.len(),
            collector.inventory.functions.len()
        );
        collector.inventory
    }
}

/// File inventories by lower-cased package path.
pub type InventoryCache<'a> = Cache<String, Arc<FileInventory<'a>>>;

struct InventoryCollector<'a> {
    inventory: FileInventory<'a>,
}

impl<'a> InventoryCollector<'a> {
    fn usage_of(expr: &Expression, ctx: &WalkContext<'a>) -> Usage {
        match ctx.parent().and_then(|node| node.as_expression()) {
            Some(Expression {
                kind: ExpressionKind::Call { callee, args },
                ..
            }) if std::ptr::eq(&**callee, expr) => Usage::Callee { arg_count: args.len() },
            _ => Usage::Value,
        }
    }
}

impl<'a> Visitor<'a> for InventoryCollector<'a> {
    fn visit_statement(&mut self, stmt: &'a Statement, ctx: &mut WalkContext<'a>) {
        if let StatementKind::Class(class) = &stmt.kind {
            if let Some(parent) = &class.parent_class {
                self.inventory.expressions.push(ExpressionInfo {
                    parts: parent.parts.iter().collect(),
                    usage: Usage::Extends,
                    namespace: ctx.namespace_name(),
                    symbol_table: ctx.symbol_table(),
                    range: parent.range,
                });
            }
        }
        walk_statement(self, stmt, ctx)
    }

    fn visit_expression(&mut self, expr: &'a Expression, ctx: &mut WalkContext<'a>) {
        if let Some(parts) = expr.dotted_parts() {
            self.inventory.expressions.push(ExpressionInfo {
                parts,
                usage: Self::usage_of(expr, ctx),
                namespace: ctx.namespace_name(),
                symbol_table: ctx.symbol_table(),
                range: expr.range,
            });
            return;
        }
        match &expr.kind {
            ExpressionKind::New { class_name, .. } => self.inventory.new_expressions.push(NewInfo {
                class_name,
                namespace: ctx.namespace_name(),
            }),
            ExpressionKind::Call { .. } if is_create_object_call(expr) => self.inventory.create_object_calls.push(expr),
            _ => {}
        }
        walk_expression(self, expr, ctx)
    }

    fn visit_function(&mut self, func: &'a FunctionExpression, ctx: &mut WalkContext<'a>) {
        self.inventory.functions.push(FunctionInfo {
            func,
            namespace: ctx.namespace_name(),
        });
        walk_function(self, func, ctx)
    }
}

/// Resolve every expression of the scope. Links the scope's symbol tables for
/// the duration of the call.
pub fn validate_expressions<'a>(chain: &ScopeChain<'a>, registries: &ScopeRegistries<'a>) -> Vec<ScopedFinding> {
    let cache = InventoryCache::new();
    validate_expressions_cached(chain, registries, &cache)
}

/// Like `validate_expressions`, reusing inventories from `cache`.
pub fn validate_expressions_cached<'a>(
    chain: &ScopeChain<'a>,
    registries: &ScopeRegistries<'a>,
    cache: &InventoryCache<'a>,
) -> Vec<ScopedFinding> {
    let _linked = registries.link();
    let mut validator = ScopeValidator {
        scope_name: chain.scope.name.clone(),
        registries,
        findings: Vec::new(),
    };
    for &file in registries.files() {
        let inventory = cache.get_or_add(file.key(), |_| Arc::new(FileInventory::collect(file)));
        validator.validate_file(&inventory);
    }
    validator.check_duplicate_enums();
    validator.check_enum_values();
    log::debug!(
        "expression validation of scope {}: {} files, {} findings",
        validator.scope_name,
        registries.files().len(),
        validator.findings.len()
    );
    validator.findings
}

/// What a chain prefix resolved to.
enum Resolved<'r, 'a> {
    Namespace(String),
    Enum(&'r Declaration<'a, EnumStatement>),
    Callable(&'r Callable<'a>),
    Declaration,
}

struct ScopeValidator<'r, 'a> {
    scope_name: String,
    registries: &'r ScopeRegistries<'a>,
    findings: Vec<ScopedFinding>,
}

impl<'r, 'a> ScopeValidator<'r, 'a> {
    fn report(&mut self, file: &BrsFile, range: Range, diagnostic: ResolveDiagnostic) {
        self.findings
            .push(ScopedFinding::multi_scope(diagnostic.at(&file.pkg_path, range)));
    }

    fn validate_file(&mut self, inventory: &FileInventory<'a>) {
        let file = inventory.file;
        for info in &inventory.expressions {
            self.resolve_expression(file, info);
        }
        for info in &inventory.new_expressions {
            self.check_new_expression(file, info);
        }
        for info in &inventory.functions {
            self.check_signature(file, info);
        }
        let platform = self.registries.platform();
        for call in &inventory.create_object_calls {
            self.findings.extend(validate_create_object(call, file, platform));
        }
    }

    fn resolve_expression(&mut self, file: &BrsFile, info: &ExpressionInfo<'a>) {
        let Some((root, rest)) = info.parts.split_first() else {
            return;
        };
        let namespace = info.namespace.as_deref();
        let registries = self.registries;

        if let Some(symbols) = info.symbol_table.get_symbol(&root.text, true) {
            if let (Usage::Callee { arg_count }, true) = (info.usage, rest.is_empty()) {
                if let Some(callable) = registries.get_callable(&root.text, namespace) {
                    if binds_callable(&symbols, callable) {
                        self.check_arity(file, info.range, callable, arg_count);
                    }
                }
            }
            return;
        }

        let mut current = if let Some(container) = registries.get_namespace(&root.text, namespace) {
            Resolved::Namespace(container.full_name.clone())
        } else if let Some(decl) = registries.get_enum(&root.text, namespace) {
            Resolved::Enum(decl)
        } else {
            log::trace!("{}: cannot resolve {}", file.pkg_path, root.text);
            self.report(
                file,
                root.range,
                ResolveDiagnostic::CannotFindName {
                    name: root.text.clone(),
                    namespace: None,
                },
            );
            return;
        };

        for part in rest {
            current = match current {
                Resolved::Namespace(full_name) => {
                    let qualified = format!("{}.{}", full_name, part.text);
                    if let Some(container) = registries.get_namespace(&qualified, None) {
                        Resolved::Namespace(container.full_name.clone())
                    } else if let Some(decl) = registries.get_enum(&qualified, None) {
                        Resolved::Enum(decl)
                    } else if let Some(callable) = registries.get_callable_by_name(&qualified) {
                        Resolved::Callable(callable)
                    } else if registries.get_class(&qualified, None).is_some()
                        || registries.get_const(&qualified, None).is_some()
                    {
                        Resolved::Declaration
                    } else {
                        self.report(
                            file,
                            part.range,
                            ResolveDiagnostic::CannotFindName {
                                name: part.text.clone(),
                                namespace: Some(full_name),
                            },
                        );
                        return;
                    }
                }
                Resolved::Enum(decl) => {
                    let qualified = format!("{}.{}", decl.full_name, part.text);
                    match registries.get_enum_member_file_link(&qualified, None) {
                        Some((_, Some(_))) => Resolved::Declaration,
                        _ => {
                            let related = RelatedInformation::new(
                                format!("Enum '{}' is declared here", decl.full_name),
                                decl.file.pkg_path.clone(),
                                decl.name.range,
                            );
                            let diagnostic = ResolveDiagnostic::UnknownEnumValue {
                                name: part.text.clone(),
                                enum_name: decl.full_name.clone(),
                            }
                            .at(&file.pkg_path, part.range)
                            .with_related(related);
                            self.findings.push(ScopedFinding::multi_scope(diagnostic));
                            return;
                        }
                    }
                }
                // Member access on a runtime value is not checked.
                Resolved::Callable(_) | Resolved::Declaration => return,
            };
        }

        match current {
            Resolved::Namespace(full_name) => self.report(
                file,
                info.range,
                ResolveDiagnostic::ItemCannotBeUsedAsVariable {
                    kind: "Namespace".to_string(),
                    name: full_name,
                },
            ),
            Resolved::Callable(callable) => {
                if let Usage::Callee { arg_count } = info.usage {
                    self.check_arity(file, info.range, callable, arg_count);
                }
            }
            Resolved::Enum(_) | Resolved::Declaration => {}
        }
    }

    fn check_arity(&mut self, file: &BrsFile, range: Range, callable: &Callable<'a>, arg_count: usize) {
        let (min, max) = callable.arity();
        if (min..=max).contains(&arg_count) {
            return;
        }
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        self.report(
            file,
            range,
            ResolveDiagnostic::MismatchArgumentCount {
                expected,
                actual: arg_count,
            },
        );
    }

    fn check_new_expression(&mut self, file: &BrsFile, info: &NewInfo<'a>) {
        let name = info.class_name.text();
        let namespace = info.namespace.as_deref();
        let registries = self.registries;
        if registries.get_class(&name, namespace).is_some() {
            return;
        }
        let other_kind = registries.get_namespace(&name, namespace).is_some()
            || registries.get_enum(&name, namespace).is_some()
            || registries.get_callable(&name, namespace).is_some()
            || registries.get_const(&name, namespace).is_some();
        let diagnostic = if other_kind {
            ResolveDiagnostic::ExpressionIsNotConstructable { name }
        } else {
            ResolveDiagnostic::ClassCouldNotBeFound {
                name,
                scope: self.scope_name.clone(),
            }
        };
        self.report(file, info.class_name.range, diagnostic);
    }

    fn check_signature(&mut self, file: &BrsFile, info: &FunctionInfo<'a>) {
        let namespace = info.namespace.as_deref();
        if let Some(return_type) = &info.func.return_type {
            if !self.is_valid_type(&return_type.to_bsc_type(), namespace) {
                self.report(
                    file,
                    return_type.range,
                    ResolveDiagnostic::InvalidFunctionReturnType {
                        type_name: return_type.text.clone(),
                    },
                );
            }
        }
        for param in &info.func.parameters {
            let Some(annotation) = &param.type_expr else {
                continue;
            };
            if !self.is_valid_type(&annotation.to_bsc_type(), namespace) {
                self.report(
                    file,
                    annotation.range,
                    ResolveDiagnostic::FunctionParameterTypeIsInvalid {
                        param: param.name.text.clone(),
                        type_name: annotation.text.clone(),
                    },
                );
            }
        }
    }

    fn is_valid_type(&self, ty: &BscType, namespace: Option<&str>) -> bool {
        match ty {
            BscType::Custom(name) => self.registries.is_known_type(name, namespace),
            _ => true,
        }
    }

    fn check_duplicate_enums(&mut self) {
        let registries = self.registries;
        let mut keys: Vec<&String> = registries.enum_map().keys().collect();
        keys.sort();
        for key in keys {
            let Some((canonical, duplicates)) = registries.enum_map()[key].split_first() else {
                continue;
            };
            for duplicate in duplicates {
                let related = RelatedInformation::new(
                    format!("Enum '{}' is first declared here", canonical.full_name),
                    canonical.file.pkg_path.clone(),
                    canonical.name.range,
                );
                let diagnostic = ResolveDiagnostic::DuplicateEnumDeclaration {
                    scope: self.scope_name.clone(),
                    name: duplicate.full_name.clone(),
                }
                .at(&duplicate.file.pkg_path, duplicate.name.range)
                .with_related(related);
                self.findings.push(ScopedFinding::multi_scope(diagnostic));
            }
        }
    }

    /// Every member of an enum holds the kind of the first valued member, and
    /// only integer enums may leave values out.
    fn check_enum_values(&mut self) {
        let registries = self.registries;
        let mut keys: Vec<&String> = registries.enum_map().keys().collect();
        keys.sort();
        for key in keys {
            for decl in &registries.enum_map()[key] {
                let members = &decl.node.members;
                let kind = members
                    .iter()
                    .find_map(|member| member.value.as_ref().and_then(Expression::literal_type))
                    .unwrap_or(BscType::Integer);
                for member in members {
                    match &member.value {
                        Some(value) => match value.literal_type() {
                            Some(ty) if ty != kind => self.report(
                                decl.file,
                                value.range,
                                ResolveDiagnostic::EnumValueMustBeType {
                                    expected: kind.to_string(),
                                },
                            ),
                            _ => {}
                        },
                        None if kind != BscType::Integer => self.report(
                            decl.file,
                            member.range,
                            ResolveDiagnostic::EnumValueIsRequired {
                                expected: kind.to_string(),
                            },
                        ),
                        None => {}
                    }
                }
            }
        }
    }
}

/// Whether one of `symbols` is the binding of `callable` itself rather than a
/// local that shadows it.
fn binds_callable(symbols: &[BscSymbol], callable: &Callable<'_>) -> bool {
    let range = callable.binding_range();
    symbols.iter().any(|symbol| symbol.range == range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use bsc_platform::Platform;
    use bsc_syntax::AstBuilder;

    fn run(files: Vec<BrsFile>) -> Vec<String> {
        let scope = Scope::program(files.into_iter().map(Arc::new).collect());
        let platform = Platform::new();
        let chain = ScopeChain::single(&scope);
        let registries = ScopeRegistries::build(&chain, &platform);
        validate_expressions(&chain, &registries)
            .into_iter()
            .map(|finding| finding.diagnostic.message)
            .collect()
    }

    #[test]
    fn unknown_roots_are_reported_once() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![b.sub("main", vec![], vec![b.print(vec![b.dotted("a.b.c")])])],
        )]);
        assert_eq!(found, vec!["Cannot find name 'a'"]);
    }

    #[test]
    fn known_roots_are_not_followed() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![b.sub(
                "main",
                vec![b.param("node", None)],
                vec![
                    b.expr_stmt(b.call(b.dotted("node.anything.atAll"), vec![])),
                    b.expr_stmt(b.call(b.dotted("m.top.whatever"), vec![])),
                ],
            )],
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn namespace_paths_are_walked() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.namespace(
                    "Alpha.Beta",
                    vec![
                        b.function("helper", vec![], None, vec![]),
                        b.enumeration("Mood", vec![("Happy", None)]),
                    ],
                ),
                b.sub(
                    "main",
                    vec![],
                    vec![
                        b.expr_stmt(b.call(b.dotted("Alpha.Beta.helper"), vec![])),
                        b.print(vec![b.dotted("Alpha.Beta.Mood.Happy")]),
                        b.print(vec![b.dotted("Alpha.Beta.Mood.Sad")]),
                        b.print(vec![b.dotted("Alpha.Gamma.helper")]),
                        b.print(vec![b.dotted("Alpha.Beta")]),
                        b.expr_stmt(b.call(b.dotted("Alpha.Beta.helper"), vec![b.int(1)])),
                    ],
                ),
            ],
        )]);
        assert_eq!(
            found,
            vec![
                "Property 'Sad' does not exist on enum 'Alpha.Beta.Mood'",
                "Cannot find name 'Gamma' in namespace 'Alpha'",
                "Namespace 'Alpha.Beta' cannot be used as a variable",
                "Expected 0 arguments, but got 1",
            ]
        );
    }

    #[test]
    fn locals_shadow_global_functions() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.sub(
                    "shadowed",
                    vec![],
                    vec![b.assign("len", b.int(3)), b.expr_stmt(b.call(b.var("len"), vec![]))],
                ),
                b.sub(
                    "plain",
                    vec![],
                    vec![
                        b.expr_stmt(b.call(b.var("len"), vec![])),
                        b.expr_stmt(b.call(b.var("len"), vec![b.string("ok")])),
                    ],
                ),
            ],
        )]);
        assert_eq!(found, vec!["Expected 1 arguments, but got 0"]);
    }

    #[test]
    fn new_targets_must_be_classes() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.namespace("Shapes", vec![b.class("Circle", None, vec![])]),
                b.sub(
                    "main",
                    vec![],
                    vec![
                        b.assign("a", b.new_object("Shapes.Circle", vec![])),
                        b.assign("c", b.new_object("Shapes", vec![])),
                        b.assign("d", b.new_object("Square", vec![])),
                    ],
                ),
            ],
        )]);
        assert_eq!(
            found,
            vec![
                "Cannot use the 'new' keyword here for 'Shapes'",
                "Class 'Square' could not be found when this file is included in scope 'source'",
            ]
        );
    }

    #[test]
    fn signature_types_must_resolve() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![b.namespace(
                "N",
                vec![
                    b.class("Known", None, vec![]),
                    b.function("foo", vec![b.param("a", Some("Known")), b.param("b", Some("Missing"))], Some("UnknownType"), vec![]),
                ],
            )],
        )]);
        assert_eq!(
            found,
            vec![
                "Function return type 'UnknownType' is invalid",
                "Parameter 'b' is of invalid type 'Missing'",
            ]
        );
    }

    #[test]
    fn enum_values_share_a_kind() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.enumeration("Plain", vec![("A", None), ("B", Some(b.int(4)))]),
                b.enumeration("Named", vec![("A", Some(b.string("a"))), ("B", Some(b.int(2))), ("C", None)]),
            ],
        )]);
        assert_eq!(
            found,
            vec!["Enum value must be type 'string'", "Value is required for string enum"]
        );
    }
}
