//! End-to-end tests for the debundle pipeline
//!
//! These tests drive the public API the way the binary does:
//! - Building or deserializing the normalized module list
//! - Transforming and placing every module
//! - Rendering and writing one file per module

use std::fs;
use std::path::Path;

use debundle::ast::{DeclarationKind, Node};
use debundle::output::{render_files, write_files};
use debundle::rewrite::NonInteractive;
use debundle::{BundlerKind, Hooks, KnownPaths, Module, ReplaceMode, TransformOptions, debundle};

fn require_var(name: &str, id: f64) -> Node {
    Node::var_decl(
        DeclarationKind::Var,
        name,
        Some(Node::call(Node::id("n"), vec![Node::number(id)])),
    )
}

fn assign(object: &str, property: &str, value: Node) -> Node {
    Node::expr_stmt(Node::assign(Node::member(Node::id(object), property), value))
}

/// Webpack shaped closures: `function (module, exports, require)`.
fn webpack_bundle() -> Vec<Module> {
    let params = ["e", "t", "n"];
    vec![
        Module::new(
            0u64,
            Node::function(
                &params,
                vec![
                    require_var("a", 1.0),
                    require_var("u", 2.0),
                    assign("e", "exports", Node::id("a")),
                ],
            ),
        )
        .with_lookup([("./lib/a", 1u64), ("uuid", 2u64)]),
        Module::new(
            1u64,
            Node::function(
                &params,
                vec![assign("t", "util", Node::call(Node::id("n"), vec![Node::number(3.0)]))],
            ),
        )
        .with_lookup([("../util", 3u64)]),
        Module::new(2u64, Node::function(&params, vec![assign("t", "v4", Node::number(4.0))]))
            .with_lookup(Vec::<(&str, u64)>::new()),
        Module::new(
            3u64,
            Node::function(&params, vec![assign("e", "exports", Node::string("util"))]),
        )
        .with_lookup(Vec::<(&str, u64)>::new()),
    ]
}

fn run(modules: &mut [Module], options: &TransformOptions, out_dir: &Path) -> usize {
    let mut report = debundle(modules, options, &mut Hooks::new(), &mut NonInteractive)
        .expect("debundle should succeed");
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    let files = render_files(modules, &report.placements, None, &mut report.diagnostics);
    write_files(out_dir, &files).expect("write should succeed")
}

fn read(out_dir: &Path, path: &str) -> String {
    fs::read_to_string(out_dir.join(path)).unwrap_or_else(|err| panic!("{path}: {err}"))
}

#[test]
fn test_webpack_bundle_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut modules = webpack_bundle();
    let options = TransformOptions::new(0u64).with_bundler(BundlerKind::Webpack);

    assert_eq!(run(&mut modules, &options, dir.path()), 4);

    assert_eq!(
        read(dir.path(), "index.js"),
        "var a = require(\"./lib/a\");\nvar u = require(\"uuid\");\nmodule.exports = a;\n"
    );
    assert_eq!(read(dir.path(), "lib/a.js"), "exports.util = require(\"./util\");\n");
    assert_eq!(read(dir.path(), "node_modules/uuid/index.js"), "exports.v4 = 4;\n");
    // `../util` resolves against `lib/a` as a directory
    assert_eq!(read(dir.path(), "lib/util.js"), "module.exports = \"util\";\n");
    assert!(!dir.path().join("util.js").exists());
}

#[test]
fn test_known_paths_move_files_and_references() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut modules = webpack_bundle();
    let mut known = KnownPaths::new();
    known.insert(3u64, "./shared/util");
    let mut options = TransformOptions::new(0u64)
        .with_bundler(BundlerKind::Webpack)
        .with_known_paths(known);
    options.output_prefix = Some("dist".to_string());

    run(&mut modules, &options, dir.path());

    assert_eq!(
        read(dir.path(), "dist/lib/a.js"),
        "exports.util = require(\"../shared/util\");\n"
    );
    assert!(dir.path().join("dist/shared/util.js").exists());
    assert!(!dir.path().join("dist/lib/util.js").exists());
}

#[test]
fn test_variable_mode_from_json_modules() {
    let source = r#"[
      {
        "id": "main",
        "code": {
          "type": "FunctionExpression",
          "params": [{"type": "Identifier", "name": "r"}, {"type": "Identifier", "name": "m"}],
          "body": {"type": "BlockStatement", "body": [
            {"type": "ExpressionStatement", "expression": {
              "type": "AssignmentExpression", "operator": "=",
              "left": {"type": "MemberExpression", "object": {"type": "Identifier", "name": "m"},
                       "property": {"type": "Identifier", "name": "exports"}, "computed": false},
              "right": {"type": "CallExpression", "callee": {"type": "Identifier", "name": "r"},
                        "arguments": [{"type": "Literal", "value": "dep"}]}
            }}
          ]}
        },
        "lookup": {"./dep": "dep"}
      },
      {
        "id": "dep",
        "code": {
          "type": "FunctionExpression",
          "params": [],
          "body": {"type": "BlockStatement", "body": []}
        },
        "lookup": {}
      }
    ]"#;
    let mut modules: Vec<Module> = serde_json::from_str(source).expect("modules should parse");
    let options = TransformOptions::new("main").with_replace_mode(ReplaceMode::Variable);

    let dir = tempfile::tempdir().expect("tempdir");
    let mut report = debundle(&mut modules, &options, &mut Hooks::new(), &mut NonInteractive)
        .expect("debundle should succeed");
    let files = render_files(&modules, &report.placements, None, &mut report.diagnostics);
    write_files(dir.path(), &files).expect("write should succeed");

    assert_eq!(
        read(dir.path(), "index.js"),
        "var r = require;\nvar m = module;\nm.exports = r(\"./dep\");\n"
    );
    // A closure without parameters is placed but left as is.
    assert_eq!(read(dir.path(), "dep.js"), "");
    assert!(report.modules[1].skipped);
}
