//! Class hierarchy checks for one scope.
//!
//! The validator links every class to its parent class in a side table owned by
//! the pass; the syntax tree is never touched. The table is dropped when
//! `validate_classes` returns.

use crate::dedup::ScopedFinding;
use crate::error::ResolveDiagnostic;
use crate::registry::{Declaration, ScopeRegistries};
use crate::scope::ScopeChain;
use bsc_source::{Range, RelatedInformation};
use bsc_syntax::ast::{ClassMember, ClassStatement, Expression, ExpressionKind};
use bsc_syntax::walk::{walk_expression, walk_statement, walk_statements, Visitor, WalkContext};
use bsc_syntax::{BrsFile, BscType};
use fxhash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

type ClassDecl<'a> = Declaration<'a, ClassStatement>;

/// Run every class check of the scope.
pub fn validate_classes<'a>(chain: &ScopeChain<'a>, registries: &ScopeRegistries<'a>) -> Vec<ScopedFinding> {
    let mut validator = ClassValidator::new(&chain.scope.name, registries);
    validator.collect();
    validator.check_namespace_collisions();
    validator.link();
    validator.detect_cycles();
    validator.check_members();
    validator.check_constructors();
    validator.check_field_types();
    log::debug!(
        "class validation of scope {}: {} classes, {} links, {} findings",
        chain.scope.name,
        validator.classes.len(),
        validator.links.len(),
        validator.findings.len()
    );
    validator.findings
}

struct ClassValidator<'r, 'a> {
    scope_name: String,
    registries: &'r ScopeRegistries<'a>,
    /// The canonical declaration of each class, by lower-cased full name.
    classes: BTreeMap<String, &'r ClassDecl<'a>>,
    /// Class key to parent class key.
    links: FxHashMap<String, String>,
    findings: Vec<ScopedFinding>,
}

impl<'r, 'a> ClassValidator<'r, 'a> {
    fn new(scope_name: &str, registries: &'r ScopeRegistries<'a>) -> Self {
        Self {
            scope_name: scope_name.to_string(),
            registries,
            classes: BTreeMap::new(),
            links: FxHashMap::default(),
            findings: Vec::new(),
        }
    }

    fn report(&mut self, file: &BrsFile, range: Range, diagnostic: ResolveDiagnostic) {
        self.findings
            .push(ScopedFinding::multi_scope(diagnostic.at(&file.pkg_path, range)));
    }

    fn report_with(&mut self, file: &BrsFile, range: Range, diagnostic: ResolveDiagnostic, related: RelatedInformation) {
        let diagnostic = diagnostic.at(&file.pkg_path, range).with_related(related);
        self.findings.push(ScopedFinding::multi_scope(diagnostic));
    }

    fn collect(&mut self) {
        let registries = self.registries;
        let mut keys: Vec<&String> = registries.class_map().keys().collect();
        keys.sort();
        for key in keys {
            let declarations = &registries.class_map()[key];
            let Some((canonical, duplicates)) = declarations.split_first() else {
                continue;
            };
            self.classes.insert(key.clone(), canonical);
            for duplicate in duplicates {
                let related = RelatedInformation::new(
                    format!("'{}' is first declared here", canonical.full_name),
                    canonical.file.pkg_path.clone(),
                    canonical.name.range,
                );
                self.report_with(
                    duplicate.file,
                    duplicate.name.range,
                    ResolveDiagnostic::DuplicateClassDeclaration {
                        scope: self.scope_name.clone(),
                        name: duplicate.full_name.clone(),
                    },
                    related,
                );
            }
        }
    }

    fn check_namespace_collisions(&mut self) {
        let namespaced: Vec<&'r ClassDecl<'a>> =
            self.classes.values().copied().filter(|decl| decl.is_namespaced()).collect();
        for decl in namespaced {
            let Some(global) = self.classes.get(&decl.name.lower()).copied() else {
                continue;
            };
            if global.is_namespaced() {
                continue;
            }
            let related = RelatedInformation::new(
                format!("Non-namespaced class '{}' is declared here", global.full_name),
                global.file.pkg_path.clone(),
                global.name.range,
            );
            self.report_with(
                decl.file,
                decl.name.range,
                ResolveDiagnostic::NamespacedClassCannotShareNameWithNonNamespacedClass {
                    name: decl.name.text.clone(),
                },
                related,
            );
        }
    }

    fn link(&mut self) {
        for (key, decl) in &self.classes {
            let Some(parent) = &decl.node.parent_class else {
                continue;
            };
            let enclosing = if parent.parts.len() > 1 {
                None
            } else {
                decl.namespace.as_deref()
            };
            match self.registries.get_class(&parent.text(), enclosing) {
                Some(parent_decl) => {
                    self.links.insert(key.clone(), parent_decl.key());
                }
                None => log::trace!("class {} extends unknown class {}", decl.full_name, parent.text()),
            }
        }
    }

    fn detect_cycles(&mut self) {
        let mut reported: FxHashSet<Vec<String>> = FxHashSet::default();
        let keys: Vec<String> = self.classes.keys().cloned().collect();
        for start in keys {
            let mut path: Vec<String> = vec![start.clone()];
            let mut current = start;
            while let Some(parent) = self.links.get(&current) {
                if let Some(position) = path.iter().position(|key| key == parent) {
                    let members = &path[position..];
                    let mut identity = members.to_vec();
                    identity.sort();
                    if reported.insert(identity) {
                        self.report_cycle(members);
                    }
                    break;
                }
                path.push(parent.clone());
                current = parent.clone();
            }
        }
    }

    /// `members` is the cycle in link order; it is reported starting at its
    /// smallest key.
    fn report_cycle(&mut self, members: &[String]) {
        let Some(start) = members
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.cmp(b.1))
            .map(|(index, _)| index)
        else {
            return;
        };
        let rotated: Vec<&String> = members[start..].iter().chain(members[..start].iter()).collect();
        let names: Vec<String> = rotated
            .iter()
            .chain(rotated.first())
            .filter_map(|key| self.classes.get(*key).map(|decl| decl.full_name.clone()))
            .collect();
        let Some(anchor) = rotated.first().and_then(|key| self.classes.get(*key)).copied() else {
            return;
        };
        self.report(
            anchor.file,
            anchor.name.range,
            ResolveDiagnostic::CircularReferenceDetected { path: names.join(" -> ") },
        );
    }

    /// Ancestors of `key`, nearest first. Stops at the first repeated class.
    fn ancestors(&self, key: &str) -> Vec<&'r ClassDecl<'a>> {
        let mut seen = FxHashSet::default();
        seen.insert(key.to_string());
        let mut found = Vec::new();
        let mut current = key;
        while let Some(parent) = self.links.get(current) {
            if !seen.insert(parent.clone()) {
                break;
            }
            let Some(decl) = self.classes.get(parent) else {
                break;
            };
            found.push(*decl);
            current = parent;
        }
        found
    }

    /// Assignability that also accepts a class where one of its ancestors is expected.
    fn is_assignable(&self, child: &BscType, child_ns: Option<&str>, base: &BscType, base_ns: Option<&str>) -> bool {
        if child.is_assignable_to(base) {
            return true;
        }
        let (BscType::Custom(child_name), BscType::Custom(base_name)) = (child, base) else {
            return false;
        };
        let (Some(child_class), Some(base_class)) = (
            self.registries.get_class(child_name, child_ns),
            self.registries.get_class(base_name, base_ns),
        ) else {
            return false;
        };
        let base_key = base_class.key();
        child_class.key() == base_key
            || self
                .ancestors(&child_class.key())
                .iter()
                .any(|ancestor| ancestor.key() == base_key)
    }

    fn check_members(&mut self) {
        let classes: Vec<(String, &'r ClassDecl<'a>)> =
            self.classes.iter().map(|(key, decl)| (key.clone(), *decl)).collect();
        for (key, decl) in classes {
            let ancestors = self.ancestors(&key);
            let mut seen = FxHashSet::default();
            for member in &decl.node.members {
                let name = member.name();
                if !seen.insert(name.lower()) {
                    self.report(decl.file, name.range, ResolveDiagnostic::DuplicateIdentifier { name: name.text.clone() });
                    continue;
                }
                let inherited = ancestors.iter().find_map(|ancestor| {
                    ancestor
                        .node
                        .members
                        .iter()
                        .find(|candidate| candidate.name().text.eq_ignore_ascii_case(&name.text))
                        .map(|found| (*ancestor, found))
                });
                if let Some((ancestor, ancestor_member)) = inherited {
                    self.check_override(decl, member, ancestor, ancestor_member);
                }
            }
        }
    }

    fn check_override(
        &mut self,
        decl: &'r ClassDecl<'a>,
        member: &ClassMember,
        ancestor: &'r ClassDecl<'a>,
        ancestor_member: &ClassMember,
    ) {
        let name = member.name();
        let kind = |member: &ClassMember| if member.is_method() { "method" } else { "field" };
        if member.is_method() != ancestor_member.is_method() {
            self.report(
                decl.file,
                name.range,
                ResolveDiagnostic::ClassChildMemberDifferentMemberTypeThanAncestor {
                    member_kind: kind(member).to_string(),
                    ancestor_member_kind: kind(ancestor_member).to_string(),
                    ancestor_class: ancestor.full_name.clone(),
                },
            );
            return;
        }

        match (member, ancestor_member) {
            (ClassMember::Field(field), ClassMember::Field(base_field)) => {
                let child_type = field.field_type();
                let base_type = base_field.field_type();
                if !self.is_assignable(&child_type, decl.namespace.as_deref(), &base_type, ancestor.namespace.as_deref()) {
                    self.report(
                        decl.file,
                        name.range,
                        ResolveDiagnostic::ChildFieldTypeNotAssignableToBaseProperty {
                            child_class: decl.full_name.clone(),
                            base_class: ancestor.full_name.clone(),
                            field: name.text.clone(),
                            child_type: child_type.to_string(),
                            base_type: base_type.to_string(),
                        },
                    );
                }
            }
            (ClassMember::Method(method), ClassMember::Method(_)) => {
                if !method.is_override && !method.name.text.eq_ignore_ascii_case("new") {
                    self.report(
                        decl.file,
                        name.range,
                        ResolveDiagnostic::MissingOverrideKeyword {
                            ancestor_class: ancestor.full_name.clone(),
                        },
                    );
                }
                let access = member.access_modifier();
                let ancestor_access = ancestor_member.access_modifier();
                if access != ancestor_access {
                    self.report(
                        decl.file,
                        name.range,
                        ResolveDiagnostic::MismatchedOverriddenMemberVisibility {
                            member: name.text.clone(),
                            child_class: decl.full_name.clone(),
                            child_access: access.as_str().to_string(),
                            ancestor_class: ancestor.full_name.clone(),
                            ancestor_access: ancestor_access.as_str().to_string(),
                        },
                    );
                }
            }
            _ => {}
        }
    }

    fn check_constructors(&mut self) {
        let classes: Vec<&'r ClassDecl<'a>> = self.classes.values().copied().collect();
        for decl in classes {
            if decl.node.parent_class.is_none() {
                continue;
            }
            let Some(constructor) = decl.node.constructor() else {
                continue;
            };

            let mut finder = EarlyReceiverUse {
                uses: Vec::new(),
                found_super: false,
            };
            let mut ctx = WalkContext::new(decl.file);
            walk_statements(&mut finder, &constructor.func.body, &mut ctx);
            for range in finder.uses {
                self.report(decl.file, range, ResolveDiagnostic::ClassConstructorIllegalUseOfMBeforeSuperCall);
            }
            if !finder.found_super {
                self.report(decl.file, constructor.name.range, ResolveDiagnostic::ClassConstructorMissingSuperCall);
            }
        }
    }

    fn check_field_types(&mut self) {
        let classes: Vec<&'r ClassDecl<'a>> = self.classes.values().copied().collect();
        for decl in classes {
            for field in decl.node.fields() {
                let Some(annotation) = &field.type_expr else {
                    continue;
                };
                let BscType::Custom(type_name) = annotation.to_bsc_type() else {
                    continue;
                };
                if !self.registries.is_known_type(&type_name, decl.namespace.as_deref()) {
                    self.report(
                        decl.file,
                        annotation.range,
                        ResolveDiagnostic::CannotFindType {
                            type_name: annotation.text.clone(),
                        },
                    );
                }
            }
        }
    }
}

fn is_super_call(expr: &Expression) -> bool {
    match &expr.kind {
        ExpressionKind::Call { callee, .. } => {
            matches!(&callee.kind, ExpressionKind::Variable(name) if name.text.eq_ignore_ascii_case("super"))
        }
        _ => false,
    }
}

/// Collects `m` references up to the first `super(...)` call, at any depth of the body.
struct EarlyReceiverUse {
    uses: Vec<Range>,
    found_super: bool,
}

impl<'a> Visitor<'a> for EarlyReceiverUse {
    fn visit_statement(&mut self, stmt: &'a bsc_syntax::ast::Statement, ctx: &mut WalkContext<'a>) {
        if !self.found_super {
            walk_statement(self, stmt, ctx);
        }
    }

    fn visit_expression(&mut self, expr: &'a Expression, ctx: &mut WalkContext<'a>) {
        if self.found_super {
            return;
        }
        if let ExpressionKind::Call { args, .. } = &expr.kind {
            if is_super_call(expr) {
                for arg in args {
                    self.visit_expression(arg, ctx);
                }
                self.found_super = true;
                return;
            }
        }
        if let ExpressionKind::Variable(name) = &expr.kind {
            if name.text.eq_ignore_ascii_case("m") {
                self.uses.push(name.range);
            }
        }
        walk_expression(self, expr, ctx);
    }

    // A nested function has its own `m`.
    fn visit_function(&mut self, _func: &'a bsc_syntax::ast::FunctionExpression, _ctx: &mut WalkContext<'a>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::Scope;
    use bsc_platform::Platform;
    use bsc_syntax::ast::AccessModifier;
    use bsc_syntax::AstBuilder;
    use std::sync::Arc;

    fn run(files: Vec<BrsFile>) -> Vec<String> {
        let scope = Scope::program(files.into_iter().map(Arc::new).collect());
        let platform = Platform::new();
        let chain = ScopeChain::single(&scope);
        let registries = ScopeRegistries::build(&chain, &platform);
        validate_classes(&chain, &registries)
            .into_iter()
            .map(|finding| format!("{} {}", finding.diagnostic.file, finding.diagnostic.message))
            .collect()
    }

    #[test]
    fn mutual_inheritance_reports_one_cycle() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.class("B", Some("A"), vec![]),
                b.class("A", Some("B"), vec![]),
                b.class("C", Some("A"), vec![]),
            ],
        )]);
        assert_eq!(found, vec!["source/main.bs Circular reference detected: A -> B -> A"]);
    }

    #[test]
    fn self_inheritance_is_a_cycle() {
        let b = AstBuilder::new();
        let found = run(vec![b.file("source/main.bs", vec![b.class("Loop", Some("Loop"), vec![])])]);
        assert_eq!(found, vec!["source/main.bs Circular reference detected: Loop -> Loop"]);
    }

    #[test]
    fn duplicate_classes_keep_the_first_path() {
        let b = AstBuilder::new();
        let found = run(vec![
            b.file("source/b.bs", vec![b.class("Widget", None, vec![])]),
            b.file("source/a.bs", vec![b.class("Widget", None, vec![])]),
        ]);
        assert_eq!(found, vec!["source/b.bs Scope 'source' already contains a class with name 'Widget'"]);
    }

    #[test]
    fn namespaced_class_may_not_reuse_a_global_name() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![b.class("Widget", None, vec![]), b.namespace("Alpha", vec![b.class("Widget", None, vec![])])],
        )]);
        assert_eq!(
            found,
            vec!["source/main.bs Namespaced class 'Widget' cannot have the same name as a non-namespaced class"]
        );
    }

    #[test]
    fn member_overrides_are_checked_against_the_nearest_ancestor() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.class(
                    "Animal",
                    None,
                    vec![
                        b.method("speak", vec![], None, vec![]),
                        b.method("hide", vec![], None, vec![]).with_access(AccessModifier::Protected),
                        b.field("legs", Some("integer"), None),
                        b.field("name", Some("string"), None),
                    ],
                ),
                b.class(
                    "Dog",
                    Some("Animal"),
                    vec![
                        b.method("speak", vec![], None, vec![]),
                        b.method("hide", vec![], None, vec![]).overriding(),
                        b.method("legs", vec![], None, vec![]),
                        b.field("name", Some("integer"), None),
                        b.field("name", Some("string"), None),
                    ],
                ),
            ],
        )]);
        assert_eq!(
            found,
            vec![
                "source/main.bs Method has no override keyword but is declared in ancestor class 'Animal'",
                "source/main.bs Access modifier mismatch: 'hide' is public in type 'Dog' but protected in type 'Animal'",
                "source/main.bs Class member is a method here but a field in ancestor class 'Animal'",
                "source/main.bs Field 'name' in class 'Dog' is not assignable to the same field in base class 'Animal': type 'integer' is not assignable to type 'string'",
                "source/main.bs Duplicate identifier 'name'",
            ]
        );
    }

    #[test]
    fn subclass_fields_may_narrow_to_a_subclass() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.class("Animal", None, vec![]),
                b.class("Dog", Some("Animal"), vec![]),
                b.class("Owner", None, vec![b.field("pet", Some("Animal"), None)]),
                b.class("DogOwner", Some("Owner"), vec![b.field("pet", Some("Dog"), None)]),
            ],
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn receiver_use_before_super_is_reported() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.class("A", None, vec![b.method("new", vec![], None, vec![])]),
                b.class(
                    "B",
                    Some("A"),
                    vec![b.method(
                        "new",
                        vec![],
                        None,
                        vec![
                            b.print(vec![b.dotted("m.foo")]),
                            b.expr_stmt(b.call(b.var("super"), vec![])),
                            b.print(vec![b.dotted("m.bar")]),
                        ],
                    )],
                ),
                b.class("C", Some("A"), vec![b.method("new", vec![], None, vec![])]),
            ],
        )]);
        assert_eq!(
            found,
            vec![
                "source/main.bs Illegal use of 'm' before calling 'super()'",
                "source/main.bs Missing call to 'super()' in the constructor of a class that extends another class",
            ]
        );
    }

    #[test]
    fn receiver_use_is_reported_without_any_super_call() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.class("A", None, vec![b.method("new", vec![], None, vec![])]),
                b.class(
                    "B",
                    Some("A"),
                    vec![b.method("new", vec![], None, vec![b.print(vec![b.dotted("m.foo")])])],
                ),
            ],
        )]);
        assert_eq!(
            found,
            vec![
                "source/main.bs Illegal use of 'm' before calling 'super()'",
                "source/main.bs Missing call to 'super()' in the constructor of a class that extends another class",
            ]
        );
    }

    #[test]
    fn nested_super_call_counts() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![
                b.class("A", None, vec![b.method("new", vec![], None, vec![])]),
                b.class(
                    "C",
                    Some("A"),
                    vec![b.method(
                        "new",
                        vec![],
                        None,
                        vec![
                            b.if_(b.boolean(true), vec![b.expr_stmt(b.call(b.var("super"), vec![]))], vec![]),
                            b.print(vec![b.dotted("m.ready")]),
                        ],
                    )],
                ),
            ],
        )]);
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn field_types_must_exist() {
        let b = AstBuilder::new();
        let found = run(vec![b.file(
            "source/main.bs",
            vec![b.namespace(
                "Alpha",
                vec![
                    b.enumeration("Mood", vec![("Happy", None)]),
                    b.class(
                        "Widget",
                        None,
                        vec![
                            b.field("mood", Some("Mood"), None),
                            b.field("other", Some("Alpha.Mood"), None),
                            b.field("missing", Some("Gizmo"), None),
                        ],
                    ),
                ],
            )],
        )]);
        assert_eq!(found, vec!["source/main.bs Cannot find type with name 'Gizmo'"]);
    }
}
