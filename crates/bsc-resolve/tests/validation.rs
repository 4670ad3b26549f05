use bsc_platform::Platform;
use bsc_resolve::{aggregate_multi_scope, validate_scope, Scope, ScopeChain, ValidationCycle};
use bsc_source::{Diagnostic, Range};
use bsc_syntax::{AstBuilder, BrsFile};
use expect_test::{expect, Expect};
use indexmap::IndexMap;
use std::fmt::Write;
use std::sync::Arc;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn component(name: &str, files: Vec<Arc<BrsFile>>) -> Scope {
    Scope::component(
        name,
        format!("components/{}.xml", name),
        Range::on_line(1, 17, name.len() as u32),
        files,
        None,
    )
}

fn validate_with(cycle: &ValidationCycle, scopes: &[Scope], platform: &Platform) -> IndexMap<String, Vec<Diagnostic>> {
    cycle.reset();
    let per_scope = scopes
        .iter()
        .map(|scope| (scope.name.clone(), validate_scope(&ScopeChain::single(scope), platform)))
        .collect();
    aggregate_multi_scope(cycle, per_scope)
}

fn validate_all(scopes: &[Scope]) -> IndexMap<String, Vec<Diagnostic>> {
    init_logging();
    validate_with(&ValidationCycle::new(), scopes, &Platform::new())
}

fn render(filed: &IndexMap<String, Vec<Diagnostic>>) -> String {
    let mut out = String::new();
    for (scope, diagnostics) in filed {
        if diagnostics.is_empty() {
            continue;
        }
        writeln!(out, "[{}]", scope).unwrap();
        for diagnostic in diagnostics {
            writeln!(
                out,
                "{} BS{} {}: {}",
                diagnostic.severity, diagnostic.code, diagnostic.file, diagnostic.message
            )
            .unwrap();
            for related in &diagnostic.related_information {
                writeln!(out, "    {}: {}", related.location.file, related.message).unwrap();
            }
        }
    }
    out
}

fn check(scopes: &[Scope], expect: Expect) {
    expect.assert_eq(&render(&validate_all(scopes)));
}

fn program(files: Vec<BrsFile>) -> Scope {
    Scope::program(files.into_iter().map(Arc::new).collect())
}

#[test]
fn namespace_blocks_see_each_other() {
    let b = AstBuilder::new();
    let scope = program(vec![
        b.file(
            "source/first.bs",
            vec![b.namespace(
                "Alpha",
                vec![b.sub(
                    "first",
                    vec![],
                    vec![
                        b.expr_stmt(b.call(b.var("second"), vec![])),
                        b.expr_stmt(b.call(b.var("third"), vec![])),
                    ],
                )],
            )],
        ),
        b.file(
            "source/second.bs",
            vec![b.namespace("Alpha", vec![b.sub("second", vec![], vec![])])],
        ),
    ]);
    check(
        &[scope],
        expect![[r#"
            [source]
            error BS1001 source/first.bs: Cannot find name 'third'
                source/first.bs: Not defined in scope 'source'
        "#]],
    );
}

#[test]
fn parent_class_from_a_reopened_namespace_block() {
    let b = AstBuilder::new();
    let scope = program(vec![
        b.file(
            "source/a.bs",
            vec![b.namespace("Alpha.Beta", vec![b.class("Beta", None, vec![])])],
        ),
        b.file(
            "source/b.bs",
            vec![b.namespace("Alpha.Beta", vec![b.class("Charlie", Some("Beta"), vec![])])],
        ),
    ]);
    check(&[scope], expect![[r#""#]]);
}

#[test]
fn scope_independent_findings_are_reported_once() {
    let b = AstBuilder::new();
    let shared = Arc::new(b.file(
        "source/shared.bs",
        vec![b.sub(
            "build",
            vec![],
            vec![
                b.assign("screen", b.create_object(&["roBogus"])),
                b.assign("node", b.create_object(&["roSGNode", "NotANode"])),
            ],
        )],
    ));
    let first = component("First", vec![shared.clone()]);
    let second = component("Second", vec![shared]);
    check(
        &[first, second],
        expect![[r#"
            [components/First.xml]
            error BS1021 source/shared.bs: Unknown BrightScript component 'roBogus'
            error BS1020 source/shared.bs: Unknown roSGNode 'NotANode'
        "#]],
    );
}

#[test]
fn separately_parsed_copies_share_one_finding() {
    let first = AstBuilder::starting_at(0);
    let second = AstBuilder::starting_at(0);
    let body = |b: &AstBuilder| {
        vec![b.sub(
            "build",
            vec![],
            vec![b.assign("screen", b.create_object(&["roBogus"]))],
        )]
    };
    let a = component("First", vec![Arc::new(first.file("source/shared.bs", body(&first)))]);
    let c = component("Second", vec![Arc::new(second.file("source/shared.bs", body(&second)))]);
    let filed = validate_all(&[a, c]);
    let total: usize = filed.values().map(Vec::len).sum();
    assert_eq!(total, 1);
}

#[test]
fn receiver_use_before_super() {
    let b = AstBuilder::new();
    let scope = program(vec![b.file(
        "source/classes.bs",
        vec![
            b.class("Base", None, vec![b.method("new", vec![], None, vec![])]),
            b.class(
                "Child",
                Some("Base"),
                vec![b.method(
                    "new",
                    vec![],
                    None,
                    vec![
                        b.print(vec![b.dotted("m.label")]),
                        b.expr_stmt(b.call(b.var("super"), vec![])),
                        b.assign("ready", b.dotted("m.label")),
                    ],
                )],
            ),
        ],
    )]);
    check(
        &[scope],
        expect![[r#"
            [source]
            error BS1019 source/classes.bs: Illegal use of 'm' before calling 'super()'
                source/classes.bs: Not defined in scope 'source'
        "#]],
    );
}

#[test]
fn duplicate_enums_point_at_the_first_declaration() {
    let b = AstBuilder::new();
    let scope = program(vec![
        b.file("source/b.bs", vec![b.enumeration("Direction", vec![("Up", None)])]),
        b.file("source/a.bs", vec![b.enumeration("Direction", vec![("Down", None)])]),
    ]);
    check(
        &[scope],
        expect![[r#"
            [source]
            error BS1024 source/b.bs: Scope 'source' already contains an enum with name 'Direction'
                source/a.bs: Enum 'Direction' is first declared here
                source/b.bs: Not defined in scope 'source'
        "#]],
    );
}

#[test]
fn signatures_report_the_written_type() {
    let b = AstBuilder::new();
    let scope = program(vec![b.file(
        "source/main.bs",
        vec![b.function(
            "make",
            vec![b.param("target", Some("Gadget"))],
            Some("Gizmo"),
            vec![],
        )],
    )]);
    check(
        &[scope],
        expect![[r#"
            [source]
            error BS1007 source/main.bs: Function return type 'Gizmo' is invalid
                source/main.bs: Not defined in scope 'source'
            error BS1008 source/main.bs: Parameter 'target' is of invalid type 'Gadget'
                source/main.bs: Not defined in scope 'source'
        "#]],
    );
}

#[test]
fn unknown_roots_do_not_cascade() {
    let b = AstBuilder::new();
    let scope = program(vec![b.file(
        "source/main.bs",
        vec![b.sub(
            "main",
            vec![],
            vec![
                b.print(vec![b.dotted("missing.deeper.deepest")]),
                b.expr_stmt(b.call(b.dotted("missing.call"), vec![b.int(1), b.int(2)])),
            ],
        )],
    )]);
    let filed = validate_all(&[scope]);
    let messages: Vec<&str> = filed["source"].iter().map(|d| d.message.as_str()).collect();
    assert_eq!(messages, vec!["Cannot find name 'missing'", "Cannot find name 'missing'"]);
}

#[test]
fn parameters_shadow_global_functions() {
    let b = AstBuilder::new();
    let scope = program(vec![b.file(
        "source/main.bs",
        vec![
            b.sub(
                "apply",
                vec![b.param("len", None)],
                vec![b.expr_stmt(b.call(b.var("len"), vec![]))],
            ),
            b.sub("measure", vec![], vec![b.expr_stmt(b.call(b.var("len"), vec![]))]),
        ],
    )]);
    check(
        &[scope],
        expect![[r#"
            [source]
            error BS1004 source/main.bs: Expected 1 arguments, but got 0
                source/main.bs: Not defined in scope 'source'
        "#]],
    );
}

#[test]
fn inheritance_cycles_terminate() {
    let b = AstBuilder::new();
    let scope = program(vec![b.file(
        "source/main.bs",
        vec![
            b.class("Left", Some("Right"), vec![b.field("name", Some("string"), None)]),
            b.class(
                "Right",
                Some("Left"),
                vec![b.field("name", Some("integer"), None)],
            ),
        ],
    )]);
    let filed = validate_all(&[scope]);
    assert!(filed["source"]
        .iter()
        .any(|d| d.message == "Circular reference detected: Left -> Right -> Left"));
}

#[test]
fn shared_file_problems_name_every_scope() {
    let b = AstBuilder::new();
    let shared = Arc::new(b.file(
        "source/shared.bs",
        vec![b.sub("shared", vec![], vec![b.print(vec![b.var("undefinedThing")])])],
    ));
    let first = component("First", vec![shared.clone()]);
    let second = component("Second", vec![shared]);
    check(
        &[second, first],
        expect![[r#"
            [components/First.xml]
            error BS1001 source/shared.bs: Cannot find name 'undefinedThing'
                components/First.xml: Not defined in scope 'components/First.xml'
                components/Second.xml: Not defined in scope 'components/Second.xml'
        "#]],
    );
}

#[test]
fn file_order_does_not_change_results() {
    let b = AstBuilder::new();
    let files = vec![
        Arc::new(b.file("source/zeta.bs", vec![b.class("Widget", None, vec![])])),
        Arc::new(b.file("source/alpha.bs", vec![b.class("Widget", None, vec![])])),
        Arc::new(b.file(
            "source/main.bs",
            vec![b.sub("main", vec![], vec![b.print(vec![b.var("nowhere")])])],
        )),
    ];
    let forward = Scope::program(files.clone());
    let backward = Scope::program(files.into_iter().rev().collect());
    let forward = render(&validate_all(&[forward]));
    assert_eq!(forward, render(&validate_all(&[backward])));
    assert!(forward.contains("source/zeta.bs: Scope 'source' already contains a class with name 'Widget'"));
}

#[test]
fn repeated_cycles_are_idempotent() {
    init_logging();
    let b = AstBuilder::new();
    let shared = Arc::new(b.file(
        "source/shared.bs",
        vec![b.sub(
            "shared",
            vec![],
            vec![
                b.print(vec![b.var("undefinedThing")]),
                b.assign("s", b.create_object(&["roSearchScreen"])),
            ],
        )],
    ));
    let scopes = [component("First", vec![shared.clone()]), component("Second", vec![shared])];
    let platform = Platform::new();
    let cycle = ValidationCycle::new();
    let once = validate_with(&cycle, &scopes, &platform);
    let twice = validate_with(&cycle, &scopes, &platform);
    assert_eq!(once, twice);
    assert_eq!(once["components/First.xml"].len(), 2);
}
