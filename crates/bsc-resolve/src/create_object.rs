//! Checks for `CreateObject(...)` calls with literal arguments.
//!
//! These findings do not depend on the scope a file is validated in, so they are
//! deduplicated globally.

use crate::dedup::ScopedFinding;
use crate::error::ResolveDiagnostic;
use bsc_platform::Platform;
use bsc_syntax::ast::{Expression, ExpressionKind};
use bsc_syntax::BrsFile;

const SCENEGRAPH_NODE: &str = "roSGNode";

/// Whether `expr` is a call of the global `CreateObject`.
pub fn is_create_object_call(expr: &Expression) -> bool {
    match &expr.kind {
        ExpressionKind::Call { callee, .. } => {
            matches!(&callee.kind, ExpressionKind::Variable(name) if name.text.eq_ignore_ascii_case("CreateObject"))
        }
        _ => false,
    }
}

/// Validate one `CreateObject` call. Calls whose first argument is not a string
/// literal are skipped.
pub fn validate_create_object(call: &Expression, file: &BrsFile, platform: &Platform) -> Vec<ScopedFinding> {
    let ExpressionKind::Call { args, .. } = &call.kind else {
        return Vec::new();
    };
    let Some((first, rest)) = args.split_first() else {
        return Vec::new();
    };
    let Some(component_name) = first.as_string_literal() else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    let mut report = |diagnostic: ResolveDiagnostic, range| {
        findings.push(ScopedFinding::once(diagnostic.at(&file.pkg_path, range)));
    };

    let Some(component) = platform.component(component_name) else {
        report(
            ResolveDiagnostic::UnknownBrightScriptComponent {
                name: component_name.to_string(),
            },
            first.range,
        );
        return findings;
    };

    if !component.accepts(rest.len()) {
        let expected: Vec<String> = component.arities.iter().map(|arity| arity.to_string()).collect();
        report(
            ResolveDiagnostic::MismatchCreateObjectArgumentCount {
                component: component.name.to_string(),
                expected: expected.join(" or "),
                actual: rest.len(),
            },
            call.range,
        );
    }
    if let Some(note) = component.deprecation {
        report(
            ResolveDiagnostic::DeprecatedBrightScriptComponent {
                name: component.name.to_string(),
                note: note.to_string(),
            },
            first.range,
        );
    }

    if component.name == SCENEGRAPH_NODE {
        if let Some(node) = rest.first() {
            match node.as_string_literal() {
                // `library:Component` names a component library member.
                Some(name) if name.contains(':') => {}
                Some(name) if !platform.is_scenegraph_node(name) => report(
                    ResolveDiagnostic::UnknownRoSGNode { name: name.to_string() },
                    node.range,
                ),
                _ => {}
            }
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::Dedup;
    use bsc_syntax::AstBuilder;

    fn check(platform: &Platform, args: &[&str]) -> Vec<String> {
        let b = AstBuilder::new();
        let call = b.create_object(args);
        let file = b.file("source/main.bs", vec![]);
        let findings = validate_create_object(&call, &file, platform);
        assert!(findings.iter().all(|finding| finding.dedup == Dedup::Once));
        findings.into_iter().map(|finding| finding.diagnostic.message).collect()
    }

    #[test]
    fn scenegraph_nodes() {
        let platform = Platform::new().with_custom_nodes(["HeroScreen"]);
        assert!(check(&platform, &["roSGNode", "Poster"]).is_empty());
        assert!(check(&platform, &["roSGNode", "heroscreen"]).is_empty());
        assert!(check(&platform, &["roSGNode", "lib:Anything"]).is_empty());
        assert_eq!(check(&platform, &["roSGNode", "NotReal"]), vec!["Unknown roSGNode 'NotReal'"]);
        assert_eq!(
            check(&platform, &["roSGNode"]),
            vec!["For roSGNode, expected 1 arguments, but got 0"]
        );
    }

    #[test]
    fn components() {
        let platform = Platform::new();
        assert!(check(&platform, &["roDateTime"]).is_empty());
        assert_eq!(check(&platform, &["roBogus"]), vec!["Unknown BrightScript component 'roBogus'"]);
        assert_eq!(
            check(&platform, &["roScreen", "a", "b"]),
            vec!["For roScreen, expected 0 or 1 or 3 arguments, but got 2"]
        );
        let deprecated = check(&platform, &["roSearchScreen"]);
        assert_eq!(deprecated.len(), 1);
        assert!(deprecated[0].starts_with("roSearchScreen has been deprecated"));
    }

    #[test]
    fn non_literal_names_are_skipped() {
        let b = AstBuilder::new();
        let call = b.call(b.var("CreateObject"), vec![b.var("name")]);
        let file = b.file("source/main.bs", vec![]);
        assert!(is_create_object_call(&call));
        assert!(validate_create_object(&call, &file, &Platform::new()).is_empty());
    }
}
