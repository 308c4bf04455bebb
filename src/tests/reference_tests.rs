use super::*;
use crate::diagnostics::Severity;
use crate::module::{KnownPaths, Module};
use crate::module_graph::ModuleGraph;
use crate::options::ShadowPolicy;
use crate::printer::JsPrinter;
use crate::rewrite::{NonInteractive, TargetedRewriter};

fn mid(n: u64) -> ModuleId {
    ModuleId::Num(n)
}

fn graph() -> ModuleGraph {
    ModuleGraph::from_modules(&[
        Module::new(1u64, Node::EmptyStatement).with_lookup([("./b", 2u64), ("./lib/util", 3), ("lodash", 4)]),
        Module::new(2u64, Node::EmptyStatement).with_lookup(Vec::<(&str, u64)>::new()),
        Module::new(3u64, Node::EmptyStatement).with_lookup(Vec::<(&str, u64)>::new()),
        Module::new(4u64, Node::EmptyStatement).with_lookup(Vec::<(&str, u64)>::new()),
    ])
}

fn loader_call(args: Vec<Node>) -> Node {
    Node::expr_stmt(Node::call(Node::id("e"), args))
}

/// Rewrites the loader `e` of module 1 and returns the printed body.
fn rewrite_loader(
    statements: Vec<Node>,
    mode: ReplaceMode,
    visitors: &mut [ReferenceVisitor],
) -> (String, ReferenceStats, Diagnostics) {
    let graph = graph();
    let known = KnownPaths::new();
    let mut resolver = LocationResolver::new(&graph, &known, mid(1));
    let mut diagnostics = Diagnostics::new();
    let mut code = Node::function(&["e", "t", "n"], statements);

    let module = mid(1);
    let mut references = ReferenceRewriter::new(&module, &mut resolver, "e", mode, visitors, &mut diagnostics);
    let mut resolver_prompt = NonInteractive;
    let mut engine_visitors = Vec::new();
    let mut engine = TargetedRewriter::new(&module, ShadowPolicy::Replace, &mut resolver_prompt, &mut engine_visitors);
    engine
        .rewrite(&mut code, "e", &mut |node: Node, site: &RewriteSite<'_>| references.update(node, site))
        .unwrap();
    let stats = references.stats();

    (JsPrinter::emit_module_body(&code), stats, diagnostics)
}

#[test]
fn test_literal_ids_become_relative_specifiers() {
    let (output, stats, diagnostics) = rewrite_loader(
        vec![
            loader_call(vec![Node::number(2.0)]),
            loader_call(vec![Node::number(3.0), Node::string("extra")]),
            loader_call(vec![Node::number(4.0)]),
        ],
        ReplaceMode::Inline,
        &mut [],
    );

    assert_eq!(
        output,
        "require(\"./b\");\nrequire(\"./lib/util\", \"extra\");\nrequire(\"lodash\");\n"
    );
    assert_eq!(stats.resolved, 3);
    assert_eq!(stats.unresolved, 0);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_unknown_and_invalid_ids_are_left_in_place() {
    let (output, stats, diagnostics) = rewrite_loader(
        vec![
            loader_call(vec![Node::number(99.0)]),
            loader_call(vec![Node::null()]),
        ],
        ReplaceMode::Inline,
        &mut [],
    );

    assert_eq!(output, "e(99);\ne(null);\n");
    assert_eq!(stats.unresolved, 2);

    let warnings: Vec<_> = diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 2);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(
        warnings[0].kind,
        DiagnosticKind::UnresolvedReference {
            target: "99".to_string()
        }
    );
    assert!(warnings[0].message.contains("module 99 cannot be found"));
    assert_eq!(
        warnings[1].kind,
        DiagnosticKind::UnresolvedReference {
            target: "null".to_string()
        }
    );
}

#[test]
fn test_non_literal_shapes_are_renamed_inline() {
    let member_call = Node::expr_stmt(Node::call(Node::member(Node::id("e"), "n"), vec![Node::id("x")]));
    let (output, stats, _) = rewrite_loader(
        vec![
            loader_call(vec![]),
            loader_call(vec![Node::id("x")]),
            member_call,
            Node::var_decl(crate::ast::DeclarationKind::Var, "r", Some(Node::id("e"))),
        ],
        ReplaceMode::Inline,
        &mut [],
    );

    assert_eq!(output, "require();\nrequire(x);\nrequire.n(x);\nvar r = require;\n");
    assert_eq!(stats, ReferenceStats::default());
}

#[test]
fn test_variable_mode_keeps_the_minified_callee() {
    let member_call = Node::expr_stmt(Node::call(Node::member(Node::id("e"), "n"), vec![Node::id("x")]));
    let (output, stats, _) = rewrite_loader(
        vec![
            loader_call(vec![Node::number(2.0)]),
            loader_call(vec![Node::id("x")]),
            member_call,
            loader_call(vec![]),
        ],
        ReplaceMode::Variable,
        &mut [],
    );

    assert_eq!(output, "e(\"./b\");\ne(x);\ne.n(x);\ne();\n");
    assert_eq!(stats.resolved, 1);
}

#[test]
fn test_loader_passed_to_itself() {
    let (output, _, _) = rewrite_loader(
        vec![loader_call(vec![Node::number(2.0), Node::id("e")])],
        ReplaceMode::Inline,
        &mut [],
    );
    assert_eq!(output, "require(\"./b\", require);\n");

    let (output, _, _) = rewrite_loader(
        vec![loader_call(vec![Node::number(2.0), Node::id("e")])],
        ReplaceMode::Keep,
        &mut [],
    );
    assert_eq!(output, "e(\"./b\", e);\n");
}

#[test]
fn test_custom_visitor_runs_before_builtin_rules() {
    let mut visitors = vec![ReferenceVisitor::new(
        "missing-module-stub",
        |_, ctx| matches!(ctx.shape, ReferenceShape::LiteralCall(ModuleId::Num(99))),
        |_, ctx| {
            Ok(ReferenceOutcome::Handled(Node::call(
                Node::id(ctx.canonical()),
                vec![Node::string("./missing")],
            )))
        },
    )];
    let (output, stats, diagnostics) = rewrite_loader(
        vec![loader_call(vec![Node::number(99.0)]), loader_call(vec![Node::number(2.0)])],
        ReplaceMode::Inline,
        &mut visitors,
    );

    assert_eq!(output, "require(\"./missing\");\nrequire(\"./b\");\n");
    assert_eq!(stats.by_visitor, 1);
    assert_eq!(stats.resolved, 1);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_visitor_can_reshape_a_site() {
    let mut visitors = vec![ReferenceVisitor::new(
        "null-means-empty",
        |_, ctx| *ctx.shape == ReferenceShape::InvalidLiteral,
        |_, _| Ok(ReferenceOutcome::Reshape(ReferenceShape::EmptyCall)),
    )];
    let (output, stats, diagnostics) = rewrite_loader(
        vec![loader_call(vec![Node::null()])],
        ReplaceMode::Inline,
        &mut visitors,
    );

    assert_eq!(output, "require();\n");
    assert_eq!(stats.unresolved, 0);
    assert!(diagnostics.is_empty());
}

#[test]
fn test_classify_shapes() {
    let call = |callee: Node, args: Vec<Node>| Node::call(callee, args);

    assert_eq!(ReferenceShape::classify(&Node::id("e")), ReferenceShape::Bare);
    assert_eq!(ReferenceShape::classify(&call(Node::id("e"), vec![])), ReferenceShape::EmptyCall);
    assert_eq!(
        ReferenceShape::classify(&call(Node::id("e"), vec![Node::string("abc")])),
        ReferenceShape::LiteralCall(ModuleId::Str("abc".into()))
    );
    assert_eq!(
        ReferenceShape::classify(&call(Node::id("e"), vec![Node::number(1.5)])),
        ReferenceShape::InvalidLiteral
    );
    assert_eq!(
        ReferenceShape::classify(&call(Node::id("e"), vec![Node::id("x")])),
        ReferenceShape::DynamicCall
    );
    // member calls win even without arguments
    assert_eq!(
        ReferenceShape::classify(&call(Node::member(Node::id("e"), "n"), vec![])),
        ReferenceShape::MemberCall
    );
}
