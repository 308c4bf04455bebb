use std::io::Cursor;

use super::prompt::LinePrompt;
use crate::error::DebundleError;
use crate::module::ModuleId;
use crate::rewrite::{ShadowBinding, ShadowDecision, ShadowRequest, ShadowResolver};

fn request() -> ShadowRequest {
    ShadowRequest {
        module: ModuleId::Num(3),
        name: "e".to_string(),
        binding: ShadowBinding::Parameter,
        function: Some("helper".to_string()),
        depth: 1,
    }
}

#[test]
fn yes_replaces_and_anything_else_keeps() {
    let mut output = Vec::new();
    let mut prompt = LinePrompt::new(Cursor::new("y\nno\n\nYES\n"), &mut output);

    assert_eq!(prompt.resolve(&request()).expect("answer"), ShadowDecision::Replace);
    assert_eq!(prompt.resolve(&request()).expect("answer"), ShadowDecision::Keep);
    assert_eq!(prompt.resolve(&request()).expect("answer"), ShadowDecision::Keep);
    assert_eq!(prompt.resolve(&request()).expect("answer"), ShadowDecision::Replace);
    drop(prompt);

    let asked = String::from_utf8(output).expect("utf8");
    assert!(asked.contains("module 3: `e` is redeclared as a parameter in function `helper`"));
    assert_eq!(asked.matches("[y/N]").count(), 4);
}

#[test]
fn closed_input_is_an_error() {
    let mut prompt = LinePrompt::new(Cursor::new(""), Vec::new());
    let err = prompt.resolve(&request()).unwrap_err();
    assert!(matches!(err, DebundleError::PromptUnavailable { .. }));
}
