//! Module Code Tree
//!
//! An owned, ESTree-flavoured syntax tree for the closure bodies of bundled
//! modules. Decoders hand modules over in this shape (it deserializes from
//! JSON with a `type` tag per node), the rewrite passes mutate it in place and
//! the printer turns it back into JavaScript text.
//!
//! # Structure
//!
//! Each module's code is a single-owner tree: children are boxed or held in
//! vectors, there are no parent pointers. Passes that need ancestry (scope
//! tracking during rewrites) carry it down the traversal explicitly.
//!
//! Only the shapes a CommonJS-style module body needs are modelled. Anything
//! the decoder could not express is carried through verbatim as [`Node::Raw`].

use serde::{Deserialize, Serialize};

use crate::module::ModuleId;

/// Literal value carried by [`Node::Literal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
}

impl LiteralValue {
    /// Interpret the literal as a module id, the way a bundler writes ids
    /// into loader calls. Only non-negative integers and strings qualify.
    pub fn as_module_id(&self) -> Option<ModuleId> {
        match self {
            LiteralValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= u64::MAX as f64 => {
                Some(ModuleId::Num(*n as u64))
            }
            LiteralValue::String(s) => Some(ModuleId::Str(s.clone())),
            _ => None,
        }
    }
}

/// Declaration keyword of a [`Node::VariableDeclaration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeclarationKind {
    #[default]
    Var,
    Let,
    Const,
}

impl DeclarationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclarationKind::Var => "var",
            DeclarationKind::Let => "let",
            DeclarationKind::Const => "const",
        }
    }
}

/// A node in a module's code tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    // =========================================================================
    // Leaves
    // =========================================================================
    /// Identifier: `foo`
    Identifier { name: String },

    /// Literal: `1`, `"./a"`, `true`, `null`
    Literal { value: LiteralValue },

    /// `this`
    ThisExpression,

    /// Verbatim source text the decoder did not model.
    Raw { code: String },

    // =========================================================================
    // Functions
    // =========================================================================
    /// `function name(params) { body }` in statement position
    FunctionDeclaration {
        #[serde(default)]
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
    },

    /// `function name(params) { body }` in expression position
    FunctionExpression {
        #[serde(default)]
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
    },

    /// `(params) => body`, where body is a block or an expression
    ArrowFunctionExpression { params: Vec<Node>, body: Box<Node> },

    // =========================================================================
    // Statements
    // =========================================================================
    BlockStatement { body: Vec<Node> },

    ExpressionStatement { expression: Box<Node> },

    ReturnStatement {
        #[serde(default)]
        argument: Option<Box<Node>>,
    },

    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        #[serde(default)]
        alternate: Option<Box<Node>>,
    },

    ForStatement {
        #[serde(default)]
        init: Option<Box<Node>>,
        #[serde(default)]
        test: Option<Box<Node>>,
        #[serde(default)]
        update: Option<Box<Node>>,
        body: Box<Node>,
    },

    WhileStatement { test: Box<Node>, body: Box<Node> },

    ThrowStatement { argument: Box<Node> },

    TryStatement {
        block: Box<Node>,
        #[serde(default)]
        handler: Option<Box<Node>>,
        #[serde(default)]
        finalizer: Option<Box<Node>>,
    },

    /// `catch (param) { body }`, only valid as a `TryStatement` handler
    CatchClause {
        #[serde(default)]
        param: Option<Box<Node>>,
        body: Box<Node>,
    },

    VariableDeclaration {
        #[serde(default)]
        kind: DeclarationKind,
        declarations: Vec<Node>,
    },

    VariableDeclarator {
        id: Box<Node>,
        #[serde(default)]
        init: Option<Box<Node>>,
    },

    EmptyStatement,

    // =========================================================================
    // Expressions
    // =========================================================================
    CallExpression { callee: Box<Node>, arguments: Vec<Node> },

    NewExpression { callee: Box<Node>, arguments: Vec<Node> },

    /// `object.property` or `object[property]`
    MemberExpression {
        object: Box<Node>,
        property: Box<Node>,
        #[serde(default)]
        computed: bool,
    },

    AssignmentExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },

    BinaryExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },

    LogicalExpression {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },

    UnaryExpression { operator: String, argument: Box<Node> },

    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },

    SequenceExpression { expressions: Vec<Node> },

    ArrayExpression { elements: Vec<Node> },

    ObjectExpression { properties: Vec<Node> },

    /// `key: value` inside an object literal
    Property {
        key: Box<Node>,
        value: Box<Node>,
        #[serde(default)]
        computed: bool,
        #[serde(default)]
        shorthand: bool,
    },
}

impl Default for Node {
    fn default() -> Self {
        Node::EmptyStatement
    }
}

impl Node {
    pub fn id(name: impl Into<String>) -> Node {
        Node::Identifier { name: name.into() }
    }

    pub fn string(value: impl Into<String>) -> Node {
        Node::Literal {
            value: LiteralValue::String(value.into()),
        }
    }

    pub fn number(value: f64) -> Node {
        Node::Literal {
            value: LiteralValue::Number(value),
        }
    }

    pub fn null() -> Node {
        Node::Literal {
            value: LiteralValue::Null,
        }
    }

    pub fn call(callee: Node, arguments: Vec<Node>) -> Node {
        Node::CallExpression {
            callee: Box::new(callee),
            arguments,
        }
    }

    /// Non-computed member access: `object.property`
    pub fn member(object: Node, property: impl Into<String>) -> Node {
        Node::MemberExpression {
            object: Box::new(object),
            property: Box::new(Node::id(property)),
            computed: false,
        }
    }

    pub fn assign(left: Node, right: Node) -> Node {
        Node::AssignmentExpression {
            operator: "=".to_string(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn expr_stmt(expression: Node) -> Node {
        Node::ExpressionStatement {
            expression: Box::new(expression),
        }
    }

    pub fn block(body: Vec<Node>) -> Node {
        Node::BlockStatement { body }
    }

    pub fn ret(argument: Node) -> Node {
        Node::ReturnStatement {
            argument: Some(Box::new(argument)),
        }
    }

    /// `function (params) { body }`
    pub fn function(params: &[&str], body: Vec<Node>) -> Node {
        Node::FunctionExpression {
            id: None,
            params: params.iter().map(|p| Node::id(*p)).collect(),
            body: Box::new(Node::block(body)),
        }
    }

    /// `kind name = init;`
    pub fn var_decl(kind: DeclarationKind, name: impl Into<String>, init: Option<Node>) -> Node {
        Node::VariableDeclaration {
            kind,
            declarations: vec![Node::VariableDeclarator {
                id: Box::new(Node::id(name)),
                init: init.map(Box::new),
            }],
        }
    }

    /// Name of an identifier node.
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Node::Identifier { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_identifier_named(&self, target: &str) -> bool {
        self.as_identifier() == Some(target)
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self,
            Node::FunctionDeclaration { .. }
                | Node::FunctionExpression { .. }
                | Node::ArrowFunctionExpression { .. }
        )
    }

    /// Parameters of a function node.
    pub fn params(&self) -> Option<&[Node]> {
        match self {
            Node::FunctionDeclaration { params, .. }
            | Node::FunctionExpression { params, .. }
            | Node::ArrowFunctionExpression { params, .. } => Some(params),
            _ => None,
        }
    }

    /// Statements of a function whose body is a block.
    pub fn function_body_mut(&mut self) -> Option<&mut Vec<Node>> {
        let body = match self {
            Node::FunctionDeclaration { body, .. }
            | Node::FunctionExpression { body, .. }
            | Node::ArrowFunctionExpression { body, .. } => body,
            _ => return None,
        };
        match body.as_mut() {
            Node::BlockStatement { body } => Some(body),
            _ => None,
        }
    }

    pub fn function_body(&self) -> Option<&[Node]> {
        let body = match self {
            Node::FunctionDeclaration { body, .. }
            | Node::FunctionExpression { body, .. }
            | Node::ArrowFunctionExpression { body, .. } => body,
            _ => return None,
        };
        match body.as_ref() {
            Node::BlockStatement { body } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_module_ids() {
        assert_eq!(
            LiteralValue::Number(4.0).as_module_id(),
            Some(ModuleId::Num(4))
        );
        assert_eq!(
            LiteralValue::String("abc".into()).as_module_id(),
            Some(ModuleId::Str("abc".into()))
        );
        assert_eq!(LiteralValue::Number(1.5).as_module_id(), None);
        assert_eq!(LiteralValue::Number(-1.0).as_module_id(), None);
        assert_eq!(LiteralValue::Null.as_module_id(), None);
        assert_eq!(LiteralValue::Bool(true).as_module_id(), None);
    }

    #[test]
    fn test_deserialize_estree_shape() {
        let json = r#"{
            "type": "FunctionExpression",
            "params": [{"type": "Identifier", "name": "e"}],
            "body": {"type": "BlockStatement", "body": [
                {"type": "ExpressionStatement", "expression": {
                    "type": "CallExpression",
                    "callee": {"type": "Identifier", "name": "e"},
                    "arguments": [{"type": "Literal", "value": 3}]
                }}
            ]}
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let expected = Node::function(&["e"], vec![Node::expr_stmt(Node::call(
            Node::id("e"),
            vec![Node::number(3.0)],
        ))]);
        assert_eq!(node, expected);
    }

    #[test]
    fn test_function_accessors() {
        let mut f = Node::function(&["a", "b"], vec![Node::EmptyStatement]);
        assert!(f.is_function());
        assert_eq!(f.params().map(|p| p.len()), Some(2));
        f.function_body_mut().unwrap().push(Node::EmptyStatement);
        assert_eq!(f.function_body().map(|b| b.len()), Some(2));

        let arrow = Node::ArrowFunctionExpression {
            params: vec![],
            body: Box::new(Node::id("x")),
        };
        assert!(arrow.function_body().is_none());
    }
}
