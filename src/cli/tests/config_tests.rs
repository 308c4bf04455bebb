use super::config::DebundleConfig;
use crate::ast::DeclarationKind;
use crate::module::ModuleId;
use crate::options::{BundlerKind, ReplaceMode, ShadowPolicy};

#[test]
fn parses_full_config() {
    let input = r#"{
        "type": "webpack",
        "entryPoint": 4,
        "knownPaths": { "1": "./lib/util", "7": "lodash" },
        "replaceRequires": "variable",
        "replaceModules": "keep",
        "inDescendantsOfSameNameDeclaration": "ask",
        "variableType": "const",
        "fileExt": ".js",
        "outputPrefix": "dist",
        "replaceResultString": { "from": "foo", "to": "bar", "regexp": true }
    }"#;

    let config = DebundleConfig::parse(input).expect("config should parse");
    assert_eq!(config.bundler, BundlerKind::Webpack);
    assert_eq!(config.shadow_policy, ShadowPolicy::Ask);
    assert!(config.replace_result_string.as_ref().is_some_and(|r| r.all));

    let options = config.into_options();
    assert_eq!(options.entry_point, ModuleId::Num(4));
    assert_eq!(options.known_paths.get(&ModuleId::Num(7)), Some("lodash"));
    assert_eq!(options.replace_requires, ReplaceMode::Variable);
    assert_eq!(options.replace_modules, ReplaceMode::Keep);
    assert_eq!(options.replace_exports, ReplaceMode::Inline);
    assert_eq!(options.variable_kind, DeclarationKind::Const);
    assert_eq!(options.file_ext.as_deref(), Some(".js"));
    assert_eq!(options.output_root(), "dist");
}

#[test]
fn applies_defaults() {
    let config = DebundleConfig::parse(r#"{ "entryPoint": "main", "knownPaths": {} }"#)
        .expect("minimal config should parse");
    let options = config.into_options();

    assert_eq!(options.bundler, BundlerKind::Browserify);
    assert_eq!(options.entry_point, ModuleId::Str("main".into()));
    assert_eq!(options.shadow_policy, ShadowPolicy::Replace);
    assert_eq!(options.variable_kind, DeclarationKind::Var);
    assert_eq!(options.output_root(), "");
}

#[test]
fn rejects_missing_entry_point() {
    let err = DebundleConfig::parse(r#"{ "knownPaths": {} }"#).unwrap_err();
    assert!(format!("{err:#}").contains("entryPoint"));
}

#[test]
fn rejects_bad_enum_value() {
    let result = DebundleConfig::parse(
        r#"{ "entryPoint": 1, "knownPaths": {}, "replaceRequires": "sometimes" }"#,
    );
    assert!(result.is_err());
}

#[test]
fn rejects_escaping_output_prefix() {
    let result =
        DebundleConfig::parse(r#"{ "entryPoint": 1, "knownPaths": {}, "outputPrefix": "../up" }"#);
    assert!(result.is_err());
}

#[test]
fn compiles_result_replacement() {
    let config = DebundleConfig::parse(
        r#"{ "entryPoint": 1, "knownPaths": {},
             "replaceResultString": { "from": "e\\(", "to": "load(", "regexp": true, "all": false } }"#,
    )
    .expect("config should parse");
    let replacement = config
        .result_replacement()
        .expect("pattern should compile")
        .expect("replacement configured");
    assert_eq!(replacement.apply("e(1); e(2);"), "load(1); e(2);");

    let invalid = DebundleConfig::parse(
        r#"{ "entryPoint": 1, "knownPaths": {},
             "replaceResultString": { "from": "(", "to": "", "regexp": true } }"#,
    )
    .expect("config should parse");
    let err = invalid.result_replacement().unwrap_err();
    assert!(err.to_string().contains("replaceResultString"));
}

#[test]
fn load_reports_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("missing.json");
    let err = DebundleConfig::load(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("missing.json"));
}

#[test]
fn accepts_legacy_shadowing_key() {
    let config = DebundleConfig::parse(
        r#"{ "entryPoint": 1, "knownPaths": {}, "inDescendantsOfSameNameDeclaraton": "keep" }"#,
    )
    .expect("legacy key should parse");
    assert_eq!(config.shadow_policy, ShadowPolicy::Keep);
}

#[test]
fn ignores_depth_limits() {
    let config = DebundleConfig::parse(
        r#"{ "entryPoint": 1, "knownPaths": {}, "keepDeeperThan": "3", "keepArgumentsDeeperThan": 1 }"#,
    )
    .expect("depth limits should be accepted");
    assert_eq!(config.shadow_policy, ShadowPolicy::Replace);
}
