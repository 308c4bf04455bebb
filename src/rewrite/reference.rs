//! Loader Call Rewriting
//!
//! Updater used with [`TargetedRewriter`](super::TargetedRewriter) when the
//! target is the loader parameter. Each candidate is classified into a
//! [`ReferenceShape`] and rewritten accordingly:
//!
//! ```text
//! e()          => require()
//! e(4)         => require("./lib/util")      (unresolved ids stay as they are)
//! e(x)         => require(x)
//! e.n(x)       => require.n(x)
//! e            => require
//! ```
//!
//! Callee renaming only happens under [`ReplaceMode::Inline`]; literal ids are
//! always turned into paths.

use tracing::{debug, trace};

use crate::ast::{LiteralValue, Node};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::error::Result;
use crate::location::LocationResolver;
use crate::module::ModuleId;
use crate::options::{LOADER_NAME, ReplaceMode};
use crate::relative::{RelativeReference, relative_reference};

use super::{RewriteSite, SiteKind};

/// Shape of a loader occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceShape {
    /// The loader used as a value.
    Bare,
    /// `e()`
    EmptyCall,
    /// `e(4)` or `e("abc")`
    LiteralCall(ModuleId),
    /// `e(null)`, `e(1.5)`: a literal that cannot name a module
    InvalidLiteral,
    /// `e(x)` or any other non-literal argument
    DynamicCall,
    /// `e.n(x)`
    MemberCall,
    /// A call that also passes the loader itself as an argument, such as
    /// `e(4, e)`. Carries the shape the call has otherwise.
    SameNameArgument { callee: Box<ReferenceShape> },
}

impl ReferenceShape {
    /// Classify a candidate node handed over by the rewrite engine.
    pub fn classify(node: &Node) -> ReferenceShape {
        let Node::CallExpression { callee, arguments } = node else {
            return ReferenceShape::Bare;
        };

        if matches!(callee.as_ref(), Node::MemberExpression { .. }) {
            return ReferenceShape::MemberCall;
        }

        match arguments.first() {
            None => ReferenceShape::EmptyCall,
            Some(Node::Literal { value }) => match value.as_module_id() {
                Some(id) => ReferenceShape::LiteralCall(id),
                None => ReferenceShape::InvalidLiteral,
            },
            Some(_) => ReferenceShape::DynamicCall,
        }
    }
}

/// Context handed to [`ReferenceVisitor`]s.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceContext<'c> {
    pub module: &'c ModuleId,
    /// Minified loader name being rewritten
    pub loader: &'c str,
    pub mode: ReplaceMode,
    pub shape: &'c ReferenceShape,
    pub site: SiteKind,
}

impl ReferenceContext<'_> {
    /// Name the loader is rewritten to under the active mode.
    pub fn canonical(&self) -> &str {
        if self.mode.renames_inline() {
            LOADER_NAME
        } else {
            self.loader
        }
    }
}

/// Result of a [`ReferenceVisitor`] handler.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferenceOutcome {
    /// Use this node; later visitors and the built-in rules are skipped.
    Handled(Node),
    /// Continue with a different shape.
    Reshape(ReferenceShape),
    NotHandled,
}

type ReferencePredicate = Box<dyn Fn(&Node, &ReferenceContext<'_>) -> bool>;
type ReferenceHandler = Box<dyn FnMut(&Node, &ReferenceContext<'_>) -> Result<ReferenceOutcome>>;

/// Extension point consulted before the built-in shape rules.
pub struct ReferenceVisitor {
    name: String,
    predicate: ReferencePredicate,
    handler: ReferenceHandler,
}

impl ReferenceVisitor {
    pub fn new(
        name: impl Into<String>,
        predicate: impl Fn(&Node, &ReferenceContext<'_>) -> bool + 'static,
        handler: impl FnMut(&Node, &ReferenceContext<'_>) -> Result<ReferenceOutcome> + 'static,
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

    /// Marks calls that pass the loader to itself, e.g. `e(4, e)`.
    pub fn same_name_argument() -> Self {
        Self::new(
            "same-name-argument",
            |node, ctx| {
                ctx.site == SiteKind::Call
                    && !matches!(ctx.shape, ReferenceShape::SameNameArgument { .. })
                    && passes_itself(node, ctx.loader)
            },
            |_, ctx| {
                Ok(ReferenceOutcome::Reshape(ReferenceShape::SameNameArgument {
                    callee: Box::new(ctx.shape.clone()),
                }))
            },
        )
    }
}

impl std::fmt::Debug for ReferenceVisitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceVisitor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn passes_itself(node: &Node, loader: &str) -> bool {
    matches!(node, Node::CallExpression { arguments, .. }
        if arguments.iter().any(|a| a.is_identifier_named(loader)))
}

/// Counters for one module's loader rewrite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceStats {
    /// Literal ids turned into paths
    pub resolved: usize,
    /// Literal ids left in place
    pub unresolved: usize,
    /// Sites handled by a visitor
    pub by_visitor: usize,
}

/// Rewrites loader occurrences in one module.
pub struct ReferenceRewriter<'r, 'g> {
    module: &'r ModuleId,
    resolver: &'r mut LocationResolver<'g>,
    loader: String,
    mode: ReplaceMode,
    builtin: ReferenceVisitor,
    visitors: &'r mut [ReferenceVisitor],
    diagnostics: &'r mut Diagnostics,
    stats: ReferenceStats,
}

impl<'r, 'g> ReferenceRewriter<'r, 'g> {
    pub fn new(
        module: &'r ModuleId,
        resolver: &'r mut LocationResolver<'g>,
        loader: impl Into<String>,
        mode: ReplaceMode,
        visitors: &'r mut [ReferenceVisitor],
        diagnostics: &'r mut Diagnostics,
    ) -> Self {
        Self {
            module,
            resolver,
            loader: loader.into(),
            mode,
            builtin: ReferenceVisitor::same_name_argument(),
            visitors,
            diagnostics,
            stats: ReferenceStats::default(),
        }
    }

    pub fn stats(&self) -> ReferenceStats {
        self.stats
    }

    /// Updater entry point.
    pub fn update(&mut self, node: Node, site: &RewriteSite<'_>) -> Result<Node> {
        let mut shape = ReferenceShape::classify(&node);

        let visitors = std::iter::once(&mut self.builtin).chain(self.visitors.iter_mut());
        for visitor in visitors {
            let ctx = ReferenceContext {
                module: self.module,
                loader: &self.loader,
                mode: self.mode,
                shape: &shape,
                site: site.kind,
            };
            if !(visitor.predicate)(&node, &ctx) {
                continue;
            }
            match (visitor.handler)(&node, &ctx)? {
                ReferenceOutcome::Handled(replacement) => {
                    trace!(module = %self.module, visitor = %visitor.name, "visitor handled loader site");
                    self.stats.by_visitor += 1;
                    return Ok(replacement);
                }
                ReferenceOutcome::Reshape(next) => shape = next,
                ReferenceOutcome::NotHandled => {}
            }
        }

        self.apply(shape, node)
    }

    fn apply(&mut self, shape: ReferenceShape, node: Node) -> Result<Node> {
        let inline = self.mode.renames_inline();

        match shape {
            ReferenceShape::Bare => Ok(self.loader_identifier(node)),
            ReferenceShape::EmptyCall => Ok(Node::call(self.loader_identifier(Node::id(&self.loader)), vec![])),
            ReferenceShape::LiteralCall(target) => self.literal_call(node, &target),
            ReferenceShape::InvalidLiteral => {
                self.unresolved(&describe_first_argument(&node));
                Ok(node)
            }
            ReferenceShape::DynamicCall if inline => Ok(map_call(node, |_, arguments| {
                Node::call(Node::id(LOADER_NAME), arguments)
            })),
            ReferenceShape::MemberCall if inline => Ok(map_call(node, |callee, arguments| {
                let callee = match callee {
                    Node::MemberExpression {
                        property, computed, ..
                    } => Node::MemberExpression {
                        object: Box::new(Node::id(LOADER_NAME)),
                        property,
                        computed,
                    },
                    other => other,
                };
                Node::call(callee, arguments)
            })),
            ReferenceShape::DynamicCall | ReferenceShape::MemberCall => Ok(node),
            ReferenceShape::SameNameArgument { callee } => {
                let node = self.apply(*callee, node)?;
                if !inline {
                    return Ok(node);
                }
                let loader = self.loader.clone();
                Ok(map_call(node, |callee, arguments| {
                    let arguments = arguments
                        .into_iter()
                        .map(|a| if a.is_identifier_named(&loader) { Node::id(LOADER_NAME) } else { a })
                        .collect();
                    Node::call(callee, arguments)
                }))
            }
        }
    }

    fn literal_call(&mut self, node: Node, target: &ModuleId) -> Result<Node> {
        match relative_reference(self.resolver, self.module, target)? {
            RelativeReference::Specifier(specifier) => {
                debug!(module = %self.module, target = %target, %specifier, "rewrote loader call");
                self.stats.resolved += 1;
                let callee = self.loader_identifier(Node::id(&self.loader));
                Ok(map_call(node, move |_, arguments| {
                    let rest = arguments.into_iter().skip(1);
                    let arguments = std::iter::once(Node::string(specifier)).chain(rest).collect();
                    Node::call(callee, arguments)
                }))
            }
            RelativeReference::Unresolved => {
                self.unresolved(&target.to_string());
                Ok(node)
            }
        }
    }

    fn unresolved(&mut self, target: &str) {
        self.stats.unresolved += 1;
        self.diagnostics.warn(
            self.module,
            DiagnosticKind::UnresolvedReference {
                target: target.to_string(),
            },
            format!("module {target} cannot be found, leaving the loader call unchanged"),
        );
    }

    /// The canonical loader identifier under inline mode, `original`
    /// otherwise.
    fn loader_identifier(&self, original: Node) -> Node {
        if self.mode.renames_inline() {
            Node::id(LOADER_NAME)
        } else {
            original
        }
    }
}

/// Rebuild a call from its parts; non-calls are returned unchanged.
fn map_call(node: Node, build: impl FnOnce(Node, Vec<Node>) -> Node) -> Node {
    match node {
        Node::CallExpression { callee, arguments } => build(*callee, arguments),
        other => other,
    }
}

fn describe_first_argument(node: &Node) -> String {
    match node {
        Node::CallExpression { arguments, .. } => match arguments.first() {
            Some(Node::Literal { value }) => match value {
                LiteralValue::Null => "null".to_string(),
                LiteralValue::Bool(b) => b.to_string(),
                LiteralValue::Number(n) => n.to_string(),
                LiteralValue::String(s) => s.clone(),
            },
            _ => "<dynamic>".to_string(),
        },
        _ => "<dynamic>".to_string(),
    }
}

#[cfg(test)]
#[path = "../tests/reference_tests.rs"]
mod tests;
