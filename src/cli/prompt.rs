//! Terminal prompt for the `ask` shadowing policy.

use std::io::{self, BufRead, IsTerminal, Write};

use crate::error::{DebundleError, Result};
use crate::rewrite::{ShadowBinding, ShadowDecision, ShadowRequest, ShadowResolver};

/// Asks a yes/no question per shadowing scope. Anything but `y`/`yes`
/// leaves the scope untouched.
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl LinePrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on stdin, questions on stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

/// Whether an interactive prompt can be shown at all.
pub fn stdin_is_terminal() -> bool {
    io::stdin().is_terminal()
}

fn question(request: &ShadowRequest) -> String {
    let binding = match request.binding {
        ShadowBinding::Parameter => "a parameter",
        ShadowBinding::FunctionName => "the function name",
        ShadowBinding::Declarator => "a local variable",
        ShadowBinding::CatchParameter => "a catch parameter",
    };
    let scope = match &request.function {
        Some(name) => format!("function `{name}`"),
        None => "an anonymous function".to_string(),
    };
    format!(
        "module {}: `{}` is redeclared as {} in {} (depth {}). Rewrite references inside it? [y/N] ",
        request.module, request.name, binding, scope, request.depth
    )
}

impl<R: BufRead, W: Write> ShadowResolver for LinePrompt<R, W> {
    fn resolve(&mut self, request: &ShadowRequest) -> Result<ShadowDecision> {
        self.output.write_all(question(request).as_bytes())?;
        self.output.flush()?;

        let mut answer = String::new();
        if self.input.read_line(&mut answer)? == 0 {
            return Err(DebundleError::PromptUnavailable {
                module: request.module.clone(),
                name: request.name.clone(),
            });
        }

        Ok(match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => ShadowDecision::Replace,
            _ => ShadowDecision::Keep,
        })
    }
}
