//! Guarded (conditional) nodes.
//!
//! ## Invariants
//!
//! - Guards run strictly in registration order and the first predicate
//!   returning `true` wins, even when later guards would also match.
//! - When no guard matches, the default child answers; without a default the
//!   result is `""`.
//! - A failing predicate aborts resolution with [`Error::PredicateFailure`];
//!   later guards are not tried.

use super::leaf::MessageLeaf;
use super::node::{Node, OwnType, Resolve, Scope};
use super::trace::StepKind;
use crate::value::{TypeName, Value};
use crate::{Error, Fault, Predicate};
use std::fmt;

struct Guard {
    predicate: Predicate,
    node: Node,
}

/// Ordered `(predicate, node)` pairs plus an optional default.
#[derive(Default)]
pub struct Conditional {
    guards: Vec<Guard>,
    default: Option<Box<Node>>,
    own: OwnType,
}

impl Conditional {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a guard.
    pub fn when(
        mut self,
        predicate: impl Fn(&Value) -> Result<bool, Fault> + Send + Sync + 'static,
        node: impl Into<Node>,
    ) -> Self {
        self.add_guard(predicate, node);
        self
    }

    pub fn add_guard(
        &mut self,
        predicate: impl Fn(&Value) -> Result<bool, Fault> + Send + Sync + 'static,
        node: impl Into<Node>,
    ) {
        self.guards.push(Guard { predicate: Box::new(predicate), node: node.into() });
    }

    /// Child used when no guard matches. Replaces any prior default.
    pub fn otherwise(mut self, node: impl Into<Node>) -> Self {
        self.set_default(node);
        self
    }

    pub fn set_default(&mut self, node: impl Into<Node>) {
        let mut node = node.into();
        if let Some(subject) = self.own.subject() {
            node.bind_subject(subject);
        }
        self.default = Some(Box::new(node));
    }

    pub fn display(mut self, display: MessageLeaf) -> Self {
        self.own.set_display(display);
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub(crate) fn bind_subject(&mut self, ty: &TypeName) {
        self.own.bind_with(ty, self.default.as_deref_mut());
    }

    fn select(&self, value: &Value, scope: &Scope<'_>) -> Result<Option<&Node>, Error> {
        for (index, guard) in self.guards.iter().enumerate() {
            let matched = (guard.predicate)(value)
                .map_err(|source| Error::PredicateFailure { index, ty: value.type_name(), source })?;
            scope.note(|| StepKind::Guard { index, matched });
            if matched {
                return Ok(Some(&guard.node));
            }
        }
        Ok(None)
    }
}

impl Resolve for Conditional {
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error> {
        if let Some(node) = self.select(value, scope)? {
            return node.resolve(value, scope);
        }
        match &self.default {
            Some(node) => {
                scope.note(|| StepKind::Default { node: node.kind() });
                node.resolve(value, scope)
            }
            None => {
                scope.note(|| StepKind::Empty);
                Ok(String::new())
            }
        }
    }

    /// Guards need an instance, so only an own display can answer.
    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error> {
        self.own.resolve(ty, scope).unwrap_or_else(|| Ok(String::new()))
    }
}

impl fmt::Debug for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guards: Vec<&Node> = self.guards.iter().map(|g| &g.node).collect();
        f.debug_struct("Conditional")
            .field("guards", &guards)
            .field("default", &self.default)
            .field("own", &self.own)
            .finish()
    }
}
