//! Targeted Tree Rewrites
//!
//! A scope-aware find/replace over one module's code tree, keyed by a binding
//! name. Every syntactic *use* of the name is handed to an updater callback
//! and replaced by whatever it returns:
//!
//! - bare references: `e`, `e.cache`, `x = e`
//! - calls through the binding: `e(1)`, `e.n(x)` (the whole call is the
//!   candidate; afterwards only the replacement's arguments are walked)
//! - binding identifiers: parameters and declarators that bind the name,
//!   kept only when the updater returns an identifier
//!
//! Non-computed member properties and object keys are never candidates.
//! [`Node::Raw`] fragments are opaque and left alone.
//!
//! # Shadowing
//!
//! A nested function that rebinds the name (parameter, its own name, or a
//! declarator in its body) starts a shadowing scope. [`ShadowPolicy`] decides
//! what happens to it: skip it, rewrite it, or ask a [`ShadowResolver`] once
//! and apply the answer to the whole subtree. Scope frames are passed down
//! the traversal as an immutable parent-linked list.
//!
//! # Visitors
//!
//! Registered [`RewriteVisitor`]s are consulted in order before the updater.
//! The first one that returns [`VisitOutcome::Handled`] supplies the
//! replacement and the updater is skipped for that node.

pub mod alias;
pub mod reference;

use tracing::{debug, trace};

use crate::ast::Node;
use crate::error::{DebundleError, Result};
use crate::module::ModuleId;
use crate::options::ShadowPolicy;

/// Syntactic role of a rewrite candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiteKind {
    /// A read or write of the binding.
    Reference,
    /// A call whose callee is the binding or a member of it.
    Call,
    /// An identifier that binds the name.
    Declaration,
}

/// Answer to a [`ShadowRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowDecision {
    Keep,
    Replace,
}

/// How a nested scope rebinds the target name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadowBinding {
    Parameter,
    FunctionName,
    Declarator,
    CatchParameter,
}

/// A shadowing decision the traversal needs before it can continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShadowRequest {
    pub module: ModuleId,
    pub name: String,
    pub binding: ShadowBinding,
    /// Name of the shadowing function, when it has one
    pub function: Option<String>,
    /// Nesting depth below the module closure
    pub depth: usize,
}

/// Resolves shadowing decisions under [`ShadowPolicy::Ask`].
pub trait ShadowResolver {
    fn resolve(&mut self, request: &ShadowRequest) -> Result<ShadowDecision>;
}

impl<F> ShadowResolver for F
where
    F: FnMut(&ShadowRequest) -> Result<ShadowDecision>,
{
    fn resolve(&mut self, request: &ShadowRequest) -> Result<ShadowDecision> {
        self(request)
    }
}

/// Resolver for runs without an interactive channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl ShadowResolver for NonInteractive {
    fn resolve(&mut self, request: &ShadowRequest) -> Result<ShadowDecision> {
        Err(DebundleError::PromptUnavailable {
            module: request.module.clone(),
            name: request.name.clone(),
        })
    }
}

/// Lexical scope frame.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'p> {
    parent: Option<&'p Scope<'p>>,
    depth: usize,
    shadowing: bool,
    decision: Option<ShadowDecision>,
}

impl<'p> Scope<'p> {
    pub fn root() -> Self {
        Scope {
            parent: None,
            depth: 0,
            shadowing: false,
            decision: None,
        }
    }

    fn enter(&'p self, shadowing: bool, decision: Option<ShadowDecision>) -> Scope<'p> {
        Scope {
            parent: Some(self),
            depth: self.depth + 1,
            shadowing,
            decision: decision.or(self.decision),
        }
    }

    /// Function nesting depth below the module closure.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this frame or an enclosing one rebinds the target name.
    pub fn is_shadowed(&self) -> bool {
        self.shadowing || self.parent.is_some_and(Scope::is_shadowed)
    }
}

/// Context handed to updaters and visitors.
#[derive(Debug, Clone, Copy)]
pub struct RewriteSite<'s> {
    pub module: &'s ModuleId,
    pub target: &'s str,
    pub kind: SiteKind,
    pub scope: &'s Scope<'s>,
}

/// Produces the replacement for a candidate node.
pub type Updater<'u> = dyn FnMut(Node, &RewriteSite<'_>) -> Result<Node> + 'u;

/// Result of a [`RewriteVisitor`] handler.
#[derive(Debug, Clone, PartialEq)]
pub enum VisitOutcome {
    Handled(Node),
    NotHandled,
}

type VisitPredicate = Box<dyn Fn(&Node, &RewriteSite<'_>) -> bool>;
type VisitHandler = Box<dyn FnMut(&Node, &RewriteSite<'_>) -> Result<VisitOutcome>>;

/// An engine-level extension point: a predicate and a handler.
pub struct RewriteVisitor {
    name: String,
    predicate: VisitPredicate,
    handler: VisitHandler,
}

impl RewriteVisitor {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&Node, &RewriteSite<'_>) -> bool + 'static,
        handler: impl FnMut(&Node, &RewriteSite<'_>) -> Result<VisitOutcome> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
            handler: Box::new(handler),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for RewriteVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteVisitor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Counters for one [`TargetedRewriter::rewrite`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteReport {
    /// Reference and call sites replaced
    pub replaced: usize,
    /// Binding identifiers renamed
    pub declarations: usize,
    /// Nested scopes that rebind the name
    pub shadowing_scopes: usize,
    /// Shadowing scopes left untouched
    pub skipped_scopes: usize,
}

struct Pass<'p, 'u> {
    target: &'p str,
    updater: &'p mut Updater<'u>,
    report: RewriteReport,
}

/// Rewrites uses of a binding name in one module's code tree.
pub struct TargetedRewriter<'a> {
    module: &'a ModuleId,
    policy: ShadowPolicy,
    resolver: &'a mut dyn ShadowResolver,
    visitors: &'a mut [RewriteVisitor],
}

impl<'a> TargetedRewriter<'a> {
    pub fn new(
        module: &'a ModuleId,
        policy: ShadowPolicy,
        resolver: &'a mut dyn ShadowResolver,
        visitors: &'a mut [RewriteVisitor],
    ) -> Self {
        Self {
            module,
            policy,
            resolver,
            visitors,
        }
    }

    /// Rewrite every use of `target` under `root`.
    ///
    /// When `root` is a function its parameters are binding sites of the
    /// outermost scope and its body is walked; any other node is walked as is.
    pub fn rewrite(
        &mut self,
        root: &mut Node,
        target: &str,
        updater: &mut Updater<'_>,
    ) -> Result<RewriteReport> {
        let mut pass = Pass {
            target,
            updater,
            report: RewriteReport::default(),
        };
        let scope = Scope::root();

        match root {
            Node::FunctionDeclaration { params, body, .. }
            | Node::FunctionExpression { params, body, .. }
            | Node::ArrowFunctionExpression { params, body } => {
                self.declarations(params, &scope, &mut pass)?;
                self.walk(body, &scope, &mut pass)?;
            }
            other => self.walk(other, &scope, &mut pass)?,
        }

        debug!(
            module = %self.module,
            target,
            replaced = pass.report.replaced,
            declarations = pass.report.declarations,
            skipped_scopes = pass.report.skipped_scopes,
            "rewrite finished"
        );
        Ok(pass.report)
    }

    fn walk(&mut self, node: &mut Node, scope: &Scope<'_>, pass: &mut Pass<'_, '_>) -> Result<()> {
        if let Some(kind) = candidate_kind(node, pass.target) {
            return self.replace_candidate(node, kind, scope, pass);
        }

        match node {
            Node::Identifier { .. }
            | Node::Literal { .. }
            | Node::ThisExpression
            | Node::Raw { .. }
            | Node::EmptyStatement => {}

            Node::FunctionDeclaration { .. }
            | Node::FunctionExpression { .. }
            | Node::ArrowFunctionExpression { .. } => self.walk_function(node, scope, pass)?,

            Node::BlockStatement { body } => self.walk_all(body, scope, pass)?,
            Node::ExpressionStatement { expression } => self.walk(expression, scope, pass)?,
            Node::ReturnStatement { argument } => self.walk_opt(argument, scope, pass)?,
            Node::IfStatement {
                test,
                consequent,
                alternate,
            } => {
                self.walk(test, scope, pass)?;
                self.walk(consequent, scope, pass)?;
                self.walk_opt(alternate, scope, pass)?;
            }
            Node::ForStatement {
                init,
                test,
                update,
                body,
            } => {
                self.walk_opt(init, scope, pass)?;
                self.walk_opt(test, scope, pass)?;
                self.walk_opt(update, scope, pass)?;
                self.walk(body, scope, pass)?;
            }
            Node::WhileStatement { test, body } => {
                self.walk(test, scope, pass)?;
                self.walk(body, scope, pass)?;
            }
            Node::ThrowStatement { argument } => self.walk(argument, scope, pass)?,
            Node::TryStatement {
                block,
                handler,
                finalizer,
            } => {
                self.walk(block, scope, pass)?;
                self.walk_opt(handler, scope, pass)?;
                self.walk_opt(finalizer, scope, pass)?;
            }
            Node::CatchClause { param, body } => {
                let rebinds = param
                    .as_deref()
                    .is_some_and(|p| p.is_identifier_named(pass.target));
                if !rebinds {
                    self.walk(body, scope, pass)?;
                } else if let Some(inner) =
                    self.shadow_scope(scope, ShadowBinding::CatchParameter, None, pass)?
                {
                    if let Some(param) = param {
                        self.declaration_site(param, &inner, pass)?;
                    }
                    self.walk(body, &inner, pass)?;
                }
            }
            Node::VariableDeclaration { declarations, .. } => {
                self.walk_all(declarations, scope, pass)?
            }
            Node::VariableDeclarator { id, init } => {
                if id.is_identifier_named(pass.target) {
                    self.declaration_site(id, scope, pass)?;
                }
                self.walk_opt(init, scope, pass)?;
            }

            Node::CallExpression { callee, arguments } | Node::NewExpression { callee, arguments } => {
                self.walk(callee, scope, pass)?;
                self.walk_all(arguments, scope, pass)?;
            }
            Node::MemberExpression {
                object,
                property,
                computed,
            } => {
                self.walk(object, scope, pass)?;
                if *computed {
                    self.walk(property, scope, pass)?;
                }
            }
            Node::AssignmentExpression { left, right, .. }
            | Node::BinaryExpression { left, right, .. }
            | Node::LogicalExpression { left, right, .. } => {
                self.walk(left, scope, pass)?;
                self.walk(right, scope, pass)?;
            }
            Node::UnaryExpression { argument, .. } => self.walk(argument, scope, pass)?,
            Node::ConditionalExpression {
                test,
                consequent,
                alternate,
            } => {
                self.walk(test, scope, pass)?;
                self.walk(consequent, scope, pass)?;
                self.walk(alternate, scope, pass)?;
            }
            Node::SequenceExpression { expressions } => self.walk_all(expressions, scope, pass)?,
            Node::ArrayExpression { elements } => self.walk_all(elements, scope, pass)?,
            Node::ObjectExpression { properties } => self.walk_all(properties, scope, pass)?,
            Node::Property {
                key,
                value,
                computed,
                ..
            } => {
                if *computed {
                    self.walk(key, scope, pass)?;
                }
                self.walk(value, scope, pass)?;
            }
        }

        Ok(())
    }

    fn walk_all(&mut self, nodes: &mut [Node], scope: &Scope<'_>, pass: &mut Pass<'_, '_>) -> Result<()> {
        for node in nodes {
            self.walk(node, scope, pass)?;
        }
        Ok(())
    }

    fn walk_opt(
        &mut self,
        node: &mut Option<Box<Node>>,
        scope: &Scope<'_>,
        pass: &mut Pass<'_, '_>,
    ) -> Result<()> {
        match node {
            Some(node) => self.walk(node, scope, pass),
            None => Ok(()),
        }
    }

    fn replace_candidate(
        &mut self,
        node: &mut Node,
        kind: SiteKind,
        scope: &Scope<'_>,
        pass: &mut Pass<'_, '_>,
    ) -> Result<()> {
        let target = pass.target;
        let site = RewriteSite {
            module: self.module,
            target,
            kind,
            scope,
        };

        let original = std::mem::take(node);
        *node = self.apply(original, &site, pass)?;
        pass.report.replaced += 1;

        if kind == SiteKind::Call
            && let Node::CallExpression { arguments, .. } = node
        {
            self.walk_all(arguments, scope, pass)?;
        }
        Ok(())
    }

    fn declaration_site(&mut self, node: &mut Node, scope: &Scope<'_>, pass: &mut Pass<'_, '_>) -> Result<()> {
        let target = pass.target;
        let site = RewriteSite {
            module: self.module,
            target,
            kind: SiteKind::Declaration,
            scope,
        };

        let replacement = self.apply(node.clone(), &site, pass)?;
        if matches!(replacement, Node::Identifier { .. }) && replacement != *node {
            *node = replacement;
            pass.report.declarations += 1;
        }
        Ok(())
    }

    fn declarations(&mut self, params: &mut [Node], scope: &Scope<'_>, pass: &mut Pass<'_, '_>) -> Result<()> {
        for param in params {
            if param.is_identifier_named(pass.target) {
                self.declaration_site(param, scope, pass)?;
            }
        }
        Ok(())
    }

    fn apply(&mut self, node: Node, site: &RewriteSite<'_>, pass: &mut Pass<'_, '_>) -> Result<Node> {
        for visitor in self.visitors.iter_mut() {
            if !(visitor.predicate)(&node, site) {
                continue;
            }
            match (visitor.handler)(&node, site)? {
                VisitOutcome::Handled(replacement) => {
                    trace!(visitor = %visitor.name, kind = ?site.kind, "visitor supplied replacement");
                    return Ok(replacement);
                }
                VisitOutcome::NotHandled => {}
            }
        }
        (*pass.updater)(node, site)
    }

    fn walk_function(&mut self, node: &mut Node, scope: &Scope<'_>, pass: &mut Pass<'_, '_>) -> Result<()> {
        let inner = match shadow_binding(node, pass.target) {
            None => scope.enter(false, None),
            Some(binding) => {
                let function = function_name(node);
                match self.shadow_scope(scope, binding, function, pass)? {
                    Some(inner) => inner,
                    None => return Ok(()),
                }
            }
        };

        match node {
            Node::FunctionDeclaration { id, params, body }
            | Node::FunctionExpression { id, params, body } => {
                if let Some(id) = id
                    && id.is_identifier_named(pass.target)
                {
                    self.declaration_site(id, &inner, pass)?;
                }
                self.declarations(params, &inner, pass)?;
                self.walk(body, &inner, pass)
            }
            Node::ArrowFunctionExpression { params, body } => {
                self.declarations(params, &inner, pass)?;
                self.walk(body, &inner, pass)
            }
            _ => Ok(()),
        }
    }

    /// Frame for a scope that rebinds the target, or `None` when it must be
    /// left untouched.
    fn shadow_scope<'s>(
        &mut self,
        scope: &'s Scope<'s>,
        binding: ShadowBinding,
        function: Option<String>,
        pass: &mut Pass<'_, '_>,
    ) -> Result<Option<Scope<'s>>> {
        pass.report.shadowing_scopes += 1;

        let decision = match (scope.decision, self.policy) {
            (Some(inherited), _) => inherited,
            (None, ShadowPolicy::Keep) => ShadowDecision::Keep,
            (None, ShadowPolicy::Replace) => ShadowDecision::Replace,
            (None, ShadowPolicy::Ask) => {
                let request = ShadowRequest {
                    module: self.module.clone(),
                    name: pass.target.to_string(),
                    binding,
                    function,
                    depth: scope.depth + 1,
                };
                let decision = self.resolver.resolve(&request)?;
                debug!(module = %self.module, name = pass.target, ?binding, ?decision, "shadowing decision");
                decision
            }
        };

        if decision == ShadowDecision::Keep {
            pass.report.skipped_scopes += 1;
            trace!(module = %self.module, name = pass.target, ?binding, "leaving shadowed scope untouched");
            return Ok(None);
        }
        Ok(Some(scope.enter(true, Some(decision))))
    }
}

fn candidate_kind(node: &Node, target: &str) -> Option<SiteKind> {
    match node {
        Node::Identifier { name } if name == target => Some(SiteKind::Reference),
        Node::CallExpression { callee, .. } if is_target_callee(callee, target) => Some(SiteKind::Call),
        _ => None,
    }
}

/// `target(...)` or `target.member(...)`
fn is_target_callee(callee: &Node, target: &str) -> bool {
    match callee {
        Node::Identifier { name } => name == target,
        Node::MemberExpression { object, .. } => object.is_identifier_named(target),
        _ => false,
    }
}

fn function_name(node: &Node) -> Option<String> {
    match node {
        Node::FunctionDeclaration { id, .. } | Node::FunctionExpression { id, .. } => {
            id.as_deref().and_then(Node::as_identifier).map(str::to_string)
        }
        _ => None,
    }
}

/// How `function` rebinds `target` for its own body, if it does.
fn shadow_binding(function: &Node, target: &str) -> Option<ShadowBinding> {
    if function
        .params()
        .is_some_and(|params| params.iter().any(|p| p.is_identifier_named(target)))
    {
        return Some(ShadowBinding::Parameter);
    }

    if let Node::FunctionExpression { id: Some(id), .. } = function
        && id.is_identifier_named(target)
    {
        return Some(ShadowBinding::FunctionName);
    }

    let body = match function {
        Node::FunctionDeclaration { body, .. }
        | Node::FunctionExpression { body, .. }
        | Node::ArrowFunctionExpression { body, .. } => body,
        _ => return None,
    };
    declares(body, target).then_some(ShadowBinding::Declarator)
}

/// Whether a declarator in `node` binds `target`, without entering nested
/// functions.
fn declares(node: &Node, target: &str) -> bool {
    match node {
        Node::VariableDeclaration { declarations, .. } => declarations.iter().any(|d| declares(d, target)),
        Node::VariableDeclarator { id, .. } => id.is_identifier_named(target),
        Node::BlockStatement { body } => body.iter().any(|s| declares(s, target)),
        Node::IfStatement {
            consequent,
            alternate,
            ..
        } => declares(consequent, target) || alternate.as_deref().is_some_and(|a| declares(a, target)),
        Node::ForStatement { init, body, .. } => {
            init.as_deref().is_some_and(|i| declares(i, target)) || declares(body, target)
        }
        Node::WhileStatement { body, .. } => declares(body, target),
        Node::TryStatement {
            block,
            handler,
            finalizer,
        } => {
            declares(block, target)
                || handler.as_deref().is_some_and(|h| declares(h, target))
                || finalizer.as_deref().is_some_and(|f| declares(f, target))
        }
        Node::CatchClause { body, .. } => declares(body, target),
        _ => false,
    }
}

/// Updater that renames the binding to `canonical`: bare identifiers, the
/// callee of direct calls, and the object of member calls.
pub fn rename_to(canonical: &str) -> impl FnMut(Node, &RewriteSite<'_>) -> Result<Node> + '_ {
    move |node: Node, _site: &RewriteSite<'_>| Ok(rename_reference(node, canonical))
}

fn rename_reference(node: Node, canonical: &str) -> Node {
    match node {
        Node::Identifier { .. } => Node::id(canonical),
        Node::CallExpression { callee, arguments } => Node::CallExpression {
            callee: Box::new(rename_reference(*callee, canonical)),
            arguments,
        },
        Node::MemberExpression {
            object,
            property,
            computed,
        } => Node::MemberExpression {
            object: Box::new(rename_reference(*object, canonical)),
            property,
            computed,
        },
        other => other,
    }
}

#[cfg(test)]
#[path = "../tests/rewrite_tests.rs"]
mod tests;
