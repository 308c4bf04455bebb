//! JavaScript Printer
//!
//! Renders [`Node`] trees back to source text. Parenthesization is
//! conservative: a child expression is wrapped whenever its precedence is not
//! strictly higher than its context requires, so output may carry a few
//! redundant parentheses but never changes meaning.

use crate::ast::{LiteralValue, Node};

/// Formatting preferences.
#[derive(Clone, Copy, Debug)]
pub struct PrinterOptions {
    pub indent_size: usize,
    pub newline: &'static str,
}

impl Default for PrinterOptions {
    fn default() -> Self {
        Self {
            indent_size: 4,
            newline: "\n",
        }
    }
}

// Operator precedence, loosest first.
const SEQUENCE: u8 = 1;
const ASSIGNMENT: u8 = 2;
const CONDITIONAL: u8 = 3;
const UNARY: u8 = 16;
const CALL: u8 = 18;
const PRIMARY: u8 = 20;

fn binary_precedence(operator: &str) -> u8 {
    match operator {
        "??" => 4,
        "||" => 5,
        "&&" => 6,
        "|" => 7,
        "^" => 8,
        "&" => 9,
        "==" | "!=" | "===" | "!==" => 10,
        "<" | ">" | "<=" | ">=" | "instanceof" | "in" => 11,
        "<<" | ">>" | ">>>" => 12,
        "+" | "-" => 13,
        "*" | "/" | "%" => 14,
        "**" => 15,
        _ => 4,
    }
}

fn precedence(node: &Node) -> u8 {
    match node {
        Node::SequenceExpression { .. } => SEQUENCE,
        Node::AssignmentExpression { .. } | Node::ArrowFunctionExpression { .. } => ASSIGNMENT,
        Node::ConditionalExpression { .. } => CONDITIONAL,
        Node::BinaryExpression { operator, .. } | Node::LogicalExpression { operator, .. } => {
            binary_precedence(operator)
        }
        Node::UnaryExpression { .. } => UNARY,
        Node::Literal {
            value: LiteralValue::Number(n),
        } if n.is_sign_negative() => UNARY,
        Node::CallExpression { .. } | Node::NewExpression { .. } | Node::MemberExpression { .. } => CALL,
        Node::Raw { code } if is_simple_raw(code) => PRIMARY,
        Node::Raw { .. } => 0,
        _ => PRIMARY,
    }
}

fn is_simple_raw(code: &str) -> bool {
    !code.is_empty()
        && code
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

/// Leftmost sub-expression, which decides how an expression statement starts.
fn leftmost(node: &Node) -> &Node {
    match node {
        Node::CallExpression { callee, .. } if !callee.is_function() => leftmost(callee),
        Node::MemberExpression { object, .. } => leftmost(object),
        Node::AssignmentExpression { left, .. }
        | Node::BinaryExpression { left, .. }
        | Node::LogicalExpression { left, .. } => leftmost(left),
        Node::ConditionalExpression { test, .. } => leftmost(test),
        Node::SequenceExpression { expressions } => expressions.first().map_or(node, leftmost),
        _ => node,
    }
}

/// Printer for module code trees.
pub struct JsPrinter {
    options: PrinterOptions,
    out: String,
    indent: usize,
}

impl JsPrinter {
    pub fn new() -> Self {
        Self::with_options(PrinterOptions::default())
    }

    pub fn with_options(options: PrinterOptions) -> Self {
        Self {
            options,
            out: String::new(),
            indent: 0,
        }
    }

    /// Render a single node. Statements end with their terminator, bare
    /// expressions do not.
    pub fn emit_to_string(node: &Node) -> String {
        let mut printer = Self::new();
        if is_statement(node) {
            printer.statement(node);
        } else {
            printer.expression(node, SEQUENCE);
        }
        printer.out
    }

    /// Render the contents of a module file.
    ///
    /// For a function root these are its body statements (an expression
    /// body becomes a single expression statement); anything else is printed
    /// as one statement.
    pub fn emit_module_body(code: &Node) -> String {
        Self::new().print_module_body(code)
    }

    /// [`JsPrinter::emit_module_body`] with this printer's options.
    pub fn print_module_body(mut self, code: &Node) -> String {
        let printer = &mut self;
        match code.function_body() {
            Some(statements) => {
                for statement in statements {
                    printer.statement(statement);
                }
            }
            None => match code {
                Node::ArrowFunctionExpression { body, .. } => printer.expression_statement(body),
                other if is_statement(other) => printer.statement(other),
                other => printer.expression_statement(other),
            },
        }
        self.out
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn statement(&mut self, node: &Node) {
        self.write_indent();
        self.statement_inline(node);
        self.newline();
    }

    /// A statement whose indentation has already been written.
    fn statement_inline(&mut self, node: &Node) {
        match node {
            Node::BlockStatement { body } => self.block(body),
            Node::ExpressionStatement { expression } => {
                self.expression_statement_inline(expression);
            }
            Node::ReturnStatement { argument } => {
                self.write("return");
                if let Some(argument) = argument {
                    self.write(" ");
                    self.expression(argument, SEQUENCE);
                }
                self.write(";");
            }
            Node::ThrowStatement { argument } => {
                self.write("throw ");
                self.expression(argument, SEQUENCE);
                self.write(";");
            }
            Node::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                self.write("if (");
                self.expression(test, SEQUENCE);
                self.write(") ");
                match alternate {
                    Some(alternate) => {
                        self.braced(consequent);
                        self.write(" else ");
                        if matches!(alternate.as_ref(), Node::IfStatement { .. }) {
                            self.statement_inline(alternate);
                        } else {
                            self.braced(alternate);
                        }
                    }
                    None => self.braced(consequent),
                }
            }
            Node::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                self.write("for (");
                if let Some(init) = init {
                    match init.as_ref() {
                        Node::VariableDeclaration { .. } => self.declaration(init),
                        other => self.expression(other, SEQUENCE),
                    }
                }
                self.write(";");
                if let Some(test) = test {
                    self.write(" ");
                    self.expression(test, SEQUENCE);
                }
                self.write(";");
                if let Some(update) = update {
                    self.write(" ");
                    self.expression(update, SEQUENCE);
                }
                self.write(") ");
                self.braced(body);
            }
            Node::WhileStatement { test, body } => {
                self.write("while (");
                self.expression(test, SEQUENCE);
                self.write(") ");
                self.braced(body);
            }
            Node::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                self.write("try ");
                self.braced(block);
                if let Some(handler) = handler {
                    self.write(" ");
                    self.statement_inline(handler);
                }
                if let Some(finalizer) = finalizer {
                    self.write(" finally ");
                    self.braced(finalizer);
                }
            }
            Node::CatchClause { param, body } => {
                self.write("catch ");
                if let Some(param) = param {
                    self.write("(");
                    self.expression(param, SEQUENCE);
                    self.write(") ");
                }
                self.braced(body);
            }
            Node::VariableDeclaration { .. } => {
                self.declaration(node);
                self.write(";");
            }
            Node::FunctionDeclaration { .. } => self.function(node),
            Node::EmptyStatement => self.write(";"),
            Node::Raw { code } => self.write(code),
            other => self.expression_statement_inline(other),
        }
    }

    fn expression_statement(&mut self, expression: &Node) {
        self.write_indent();
        self.expression_statement_inline(expression);
        self.newline();
    }

    fn expression_statement_inline(&mut self, expression: &Node) {
        let ambiguous = matches!(
            leftmost(expression),
            Node::FunctionExpression { .. } | Node::ObjectExpression { .. }
        );
        if ambiguous {
            self.write("(");
            self.expression(expression, SEQUENCE);
            self.write(")");
        } else {
            self.expression(expression, SEQUENCE);
        }
        self.write(";");
    }

    fn block(&mut self, body: &[Node]) {
        if body.is_empty() {
            self.write("{}");
            return;
        }
        self.write("{");
        self.newline();
        self.indent += 1;
        for statement in body {
            self.statement(statement);
        }
        self.indent -= 1;
        self.write_indent();
        self.write("}");
    }

    /// Statement body of a control-flow construct, always braced.
    fn braced(&mut self, node: &Node) {
        match node {
            Node::BlockStatement { body } => self.block(body),
            other => self.block(std::slice::from_ref(other)),
        }
    }

    fn declaration(&mut self, node: &Node) {
        let Node::VariableDeclaration { kind, declarations } = node else {
            return;
        };
        self.write(kind.as_str());
        self.write(" ");
        for (index, declarator) in declarations.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            match declarator {
                Node::VariableDeclarator { id, init } => {
                    self.expression(id, PRIMARY);
                    if let Some(init) = init {
                        self.write(" = ");
                        self.expression(init, ASSIGNMENT);
                    }
                }
                other => self.expression(other, ASSIGNMENT),
            }
        }
    }

    fn function(&mut self, node: &Node) {
        match node {
            Node::FunctionDeclaration { id, params, body } | Node::FunctionExpression { id, params, body } => {
                self.write("function");
                match id {
                    Some(id) => {
                        self.write(" ");
                        self.expression(id, PRIMARY);
                        self.write("(");
                    }
                    None => self.write(" ("),
                }
                self.list(params, ASSIGNMENT);
                self.write(") ");
                self.braced(body);
            }
            Node::ArrowFunctionExpression { params, body } => {
                self.write("(");
                self.list(params, ASSIGNMENT);
                self.write(") => ");
                match body.as_ref() {
                    Node::BlockStatement { body } => self.block(body),
                    Node::ObjectExpression { .. } | Node::SequenceExpression { .. } => {
                        self.write("(");
                        self.expression(body, SEQUENCE);
                        self.write(")");
                    }
                    other => self.expression(other, ASSIGNMENT),
                }
            }
            _ => {}
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    /// Print `node`, parenthesized unless it binds at least as tightly as
    /// `min`.
    fn expression(&mut self, node: &Node, min: u8) {
        if precedence(node) < min {
            self.write("(");
            self.expression_inner(node);
            self.write(")");
        } else {
            self.expression_inner(node);
        }
    }

    fn expression_inner(&mut self, node: &Node) {
        match node {
            Node::Identifier { name } => self.write(name),
            Node::Literal { value } => self.literal(value),
            Node::ThisExpression => self.write("this"),
            Node::Raw { code } => self.write(code),
            Node::FunctionDeclaration { .. }
            | Node::FunctionExpression { .. }
            | Node::ArrowFunctionExpression { .. } => self.function(node),
            Node::CallExpression { callee, arguments } => {
                let wrap_callee = matches!(
                    callee.as_ref(),
                    Node::FunctionExpression { .. } | Node::FunctionDeclaration { .. }
                );
                if wrap_callee {
                    self.write("(");
                    self.expression_inner(callee);
                    self.write(")");
                } else {
                    self.expression(callee, CALL);
                }
                self.write("(");
                self.list(arguments, ASSIGNMENT);
                self.write(")");
            }
            Node::NewExpression { callee, arguments } => {
                self.write("new ");
                let plain = matches!(callee.as_ref(), Node::Identifier { .. })
                    || matches!(callee.as_ref(), Node::MemberExpression { object, .. } if !contains_call(object));
                if plain {
                    self.expression_inner(callee);
                } else {
                    self.write("(");
                    self.expression_inner(callee);
                    self.write(")");
                }
                self.write("(");
                self.list(arguments, ASSIGNMENT);
                self.write(")");
            }
            Node::MemberExpression {
                object,
                property,
                computed,
            } => {
                let numeric_object = matches!(
                    object.as_ref(),
                    Node::Literal {
                        value: LiteralValue::Number(_)
                    }
                );
                let object_min = if numeric_object { PRIMARY + 1 } else { CALL };
                self.expression(object, object_min);
                if *computed {
                    self.write("[");
                    self.expression(property, SEQUENCE);
                    self.write("]");
                } else {
                    self.write(".");
                    self.expression_inner(property);
                }
            }
            Node::AssignmentExpression {
                operator,
                left,
                right,
            } => {
                self.expression(left, CALL);
                self.write(" ");
                self.write(operator);
                self.write(" ");
                self.expression(right, ASSIGNMENT);
            }
            Node::BinaryExpression {
                operator,
                left,
                right,
            }
            | Node::LogicalExpression {
                operator,
                left,
                right,
            } => {
                let own = binary_precedence(operator);
                let (left_min, right_min) = if operator == "**" {
                    (own + 1, own)
                } else {
                    (own, own + 1)
                };
                self.expression(left, left_min);
                self.write(" ");
                self.write(operator);
                self.write(" ");
                self.expression(right, right_min);
            }
            Node::UnaryExpression { operator, argument } => {
                self.write(operator);
                let keyword = operator.chars().all(|c| c.is_ascii_alphabetic());
                let doubled = match argument.as_ref() {
                    Node::UnaryExpression { operator: inner, .. } => {
                        inner.starts_with(operator.as_str())
                    }
                    Node::Literal {
                        value: LiteralValue::Number(n),
                    } => operator == "-" && n.is_sign_negative(),
                    _ => false,
                };
                if keyword || doubled {
                    self.write(" ");
                }
                self.expression(argument, UNARY);
            }
            Node::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.expression(test, CONDITIONAL + 1);
                self.write(" ? ");
                self.expression(consequent, ASSIGNMENT);
                self.write(" : ");
                self.expression(alternate, ASSIGNMENT);
            }
            Node::SequenceExpression { expressions } => self.list(expressions, ASSIGNMENT),
            Node::ArrayExpression { elements } => {
                self.write("[");
                self.list(elements, ASSIGNMENT);
                self.write("]");
            }
            Node::ObjectExpression { properties } => {
                if properties.is_empty() {
                    self.write("{}");
                } else {
                    self.write("{ ");
                    self.list(properties, ASSIGNMENT);
                    self.write(" }");
                }
            }
            Node::Property {
                key,
                value,
                computed,
                shorthand,
            } => {
                let same_name = matches!(
                    (key.as_ref(), value.as_ref()),
                    (Node::Identifier { name: k }, Node::Identifier { name: v }) if k == v
                );
                if *shorthand && same_name && !*computed {
                    self.expression_inner(key);
                    return;
                }
                if *computed {
                    self.write("[");
                    self.expression(key, ASSIGNMENT);
                    self.write("]");
                } else {
                    self.expression_inner(key);
                }
                self.write(": ");
                self.expression(value, ASSIGNMENT);
            }
            Node::VariableDeclarator { id, init } => {
                self.expression(id, PRIMARY);
                if let Some(init) = init {
                    self.write(" = ");
                    self.expression(init, ASSIGNMENT);
                }
            }
            statement => {
                // Statements only reach here through malformed input.
                self.statement_inline(statement);
            }
        }
    }

    fn list(&mut self, nodes: &[Node], min: u8) {
        for (index, node) in nodes.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            self.expression(node, min);
        }
    }

    fn literal(&mut self, value: &LiteralValue) {
        match value {
            LiteralValue::Null => self.write("null"),
            LiteralValue::Bool(true) => self.write("true"),
            LiteralValue::Bool(false) => self.write("false"),
            LiteralValue::Number(n) if n.is_infinite() => {
                self.write(if *n > 0.0 { "Infinity" } else { "-Infinity" });
            }
            LiteralValue::Number(n) => {
                let text = n.to_string();
                self.write(&text);
            }
            LiteralValue::String(s) => {
                let quoted = serde_json::to_string(s).unwrap_or_else(|_| format!("\"{s}\""));
                self.write(&quoted);
            }
        }
    }

    // =========================================================================
    // Output
    // =========================================================================

    fn write(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn write_indent(&mut self) {
        let width = self.indent * self.options.indent_size;
        self.out.extend(std::iter::repeat_n(' ', width));
    }

    fn newline(&mut self) {
        self.out.push_str(self.options.newline);
    }
}

impl Default for JsPrinter {
    fn default() -> Self {
        Self::new()
    }
}

fn is_statement(node: &Node) -> bool {
    matches!(
        node,
        Node::BlockStatement { .. }
            | Node::ExpressionStatement { .. }
            | Node::ReturnStatement { .. }
            | Node::IfStatement { .. }
            | Node::ForStatement { .. }
            | Node::WhileStatement { .. }
            | Node::ThrowStatement { .. }
            | Node::TryStatement { .. }
            | Node::VariableDeclaration { .. }
            | Node::FunctionDeclaration { .. }
            | Node::EmptyStatement
    )
}

fn contains_call(node: &Node) -> bool {
    match node {
        Node::CallExpression { .. } => true,
        Node::MemberExpression { object, .. } => contains_call(object),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/printer_tests.rs"]
mod tests;
