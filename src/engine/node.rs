//! Resolution tree nodes.
//!
//! Every node answers two queries:
//!
//! - [`Resolve::resolve`]: a concrete value is available.
//! - [`Resolve::resolve_type`]: only a type is available (no instance).
//!
//! ```text
//! Node ──┬─ Types(TypeStore)          dispatch on the value's type (+ ancestors)
//!        ├─ Values(ValueStore)        dispatch on the exact scalar value
//!        ├─ Conditional               first matching guard, else default
//!        ├─ Indirection               extract a sub-value, dispatch on it
//!        └─ Leaf(MessageLeaf)         catalog key / accessor + positional args
//! ```
//!
//! Composite nodes (everything but the leaf) may carry an *own type-name
//! resolution* ([`OwnType`]): a display leaf consulted by `resolve_type` when
//! the queried type is exactly the type the node was registered under.
//!
//! A query walks down the tree with a [`Scope`] that provides the type table,
//! the catalog and (for verbose queries) the step trace.

use super::conditional::Conditional;
use super::indirection::Indirection;
use super::leaf::MessageLeaf;
use super::store::{TypeStore, ValueStore};
use super::trace::{Step, StepKind};
use crate::catalog::Catalog;
use crate::types::TypeTable;
use crate::value::{TypeName, Value};
use crate::Error;
use std::cell::{Cell, RefCell};
use std::fmt;

/// The two query capabilities shared by all nodes.
pub trait Resolve {
    /// Produce the message for `value`, or `""` when nothing matches.
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error>;

    /// Produce the message for `ty` without an instance, or `""`.
    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error>;
}

/// Environment of one query.
pub struct Scope<'a> {
    types: &'a TypeTable,
    catalog: Option<&'a dyn Catalog>,
    depth: Cell<usize>,
    trace: Option<RefCell<Vec<Step>>>,
}

impl<'a> Scope<'a> {
    pub fn new(types: &'a TypeTable, catalog: Option<&'a dyn Catalog>) -> Self {
        Scope { types, catalog, depth: Cell::new(0), trace: None }
    }

    /// A scope that records every dispatch decision.
    pub fn traced(types: &'a TypeTable, catalog: Option<&'a dyn Catalog>) -> Self {
        Scope { trace: Some(RefCell::new(Vec::new())), ..Scope::new(types, catalog) }
    }

    pub fn types(&self) -> &'a TypeTable {
        self.types
    }

    /// Fetch a template from the catalog.
    pub fn lookup(&self, key: &str) -> Result<String, Error> {
        let catalog = self.catalog.ok_or(Error::CatalogNotSet)?;
        catalog.lookup(key).map(|t| t.into_owned()).ok_or_else(|| Error::CatalogMiss(key.to_string()))
    }

    /// Record a dispatch decision. `kind` is only built when someone listens.
    pub(crate) fn note(&self, kind: impl FnOnce() -> StepKind) {
        let tracing_on = tracing::enabled!(tracing::Level::TRACE);
        if self.trace.is_none() && !tracing_on {
            return;
        }

        let step = Step { depth: self.depth.get(), kind: kind() };
        if tracing_on {
            tracing::trace!(depth = step.depth, "{}", step.kind);
        }
        if let Some(trace) = &self.trace {
            trace.borrow_mut().push(step);
        }
    }

    fn descend<R>(&self, f: impl FnOnce() -> R) -> R {
        self.depth.set(self.depth.get() + 1);
        let out = f();
        self.depth.set(self.depth.get() - 1);
        out
    }

    pub fn into_steps(self) -> Vec<Step> {
        self.trace.map(RefCell::into_inner).unwrap_or_default()
    }
}

/// A node of the resolution tree. Each node owns its children.
pub enum Node {
    Types(TypeStore),
    Values(ValueStore),
    Conditional(Conditional),
    Indirection(Indirection),
    Leaf(MessageLeaf),
}

impl Node {
    /// Short name used in traces and error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Types(_) => "type store",
            Node::Values(_) => "value store",
            Node::Conditional(_) => "conditional",
            Node::Indirection(_) => "indirection",
            Node::Leaf(_) => "message",
        }
    }

    /// Record the type this node is registered under, unless already bound.
    /// Defaults share the subject of the node that owns them.
    pub(crate) fn bind_subject(&mut self, ty: &TypeName) {
        match self {
            Node::Types(n) => n.bind_subject(ty),
            Node::Values(n) => n.bind_subject(ty),
            Node::Conditional(n) => n.bind_subject(ty),
            Node::Indirection(n) => n.bind_subject(ty),
            Node::Leaf(_) => {}
        }
    }
}

impl Resolve for Node {
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error> {
        scope.descend(|| match self {
            Node::Types(n) => n.resolve(value, scope),
            Node::Values(n) => n.resolve(value, scope),
            Node::Conditional(n) => n.resolve(value, scope),
            Node::Indirection(n) => n.resolve(value, scope),
            Node::Leaf(n) => n.resolve(value, scope),
        })
    }

    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error> {
        scope.descend(|| match self {
            Node::Types(n) => n.resolve_type(ty, scope),
            Node::Values(n) => n.resolve_type(ty, scope),
            Node::Conditional(n) => n.resolve_type(ty, scope),
            Node::Indirection(n) => n.resolve_type(ty, scope),
            Node::Leaf(n) => n.resolve_type(ty, scope),
        })
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Types(n) => fmt::Debug::fmt(n, f),
            Node::Values(n) => fmt::Debug::fmt(n, f),
            Node::Conditional(n) => fmt::Debug::fmt(n, f),
            Node::Indirection(n) => fmt::Debug::fmt(n, f),
            Node::Leaf(n) => fmt::Debug::fmt(n, f),
        }
    }
}

impl From<TypeStore> for Node {
    fn from(n: TypeStore) -> Self {
        Node::Types(n)
    }
}

impl From<ValueStore> for Node {
    fn from(n: ValueStore) -> Self {
        Node::Values(n)
    }
}

impl From<Conditional> for Node {
    fn from(n: Conditional) -> Self {
        Node::Conditional(n)
    }
}

impl From<Indirection> for Node {
    fn from(n: Indirection) -> Self {
        Node::Indirection(n)
    }
}

impl From<MessageLeaf> for Node {
    fn from(n: MessageLeaf) -> Self {
        Node::Leaf(n)
    }
}

/// Own type-name resolution of a composite node.
#[derive(Debug, Default)]
pub(crate) struct OwnType {
    subject: Option<TypeName>,
    display: Option<Box<MessageLeaf>>,
}

impl OwnType {
    pub(crate) fn bound(subject: TypeName) -> Self {
        OwnType { subject: Some(subject), display: None }
    }

    pub(crate) fn bind(&mut self, ty: &TypeName) {
        if self.subject.is_none() {
            self.subject = Some(ty.clone());
        }
    }

    pub(crate) fn subject(&self) -> Option<&TypeName> {
        self.subject.as_ref()
    }

    /// Bind `self`, then hand the resulting subject down to `default`.
    pub(crate) fn bind_with(&mut self, ty: &TypeName, default: Option<&mut Node>) {
        self.bind(ty);
        if let (Some(subject), Some(node)) = (self.subject.as_ref(), default) {
            node.bind_subject(subject);
        }
    }

    pub(crate) fn set_display(&mut self, display: MessageLeaf) {
        self.display = Some(Box::new(display));
    }

    /// Answer a type-only query when `ty` is this node's own type and a
    /// display is configured; `None` lets the caller fall through.
    pub(crate) fn resolve(&self, ty: &TypeName, scope: &Scope<'_>) -> Option<Result<String, Error>> {
        let display = self.display.as_deref()?;
        if self.subject.as_ref() != Some(ty) {
            return None;
        }
        scope.note(|| StepKind::OwnType { ty: ty.clone() });
        Some(display.resolve_type(ty, scope))
    }
}
