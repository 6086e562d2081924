//! Sub-value indirection.
//!
//! An [`Indirection`] pulls a related value out of the incoming one (a field,
//! an inner error, a computed code) and resolves the inner node against that
//! sub-value instead. Messages for wrapped errors are typically expressed this
//! way: "for an `AppError`, dispatch on its `code`".

use super::leaf::MessageLeaf;
use super::node::{Node, OwnType, Resolve, Scope};
use super::trace::StepKind;
use crate::value::{TypeName, Value};
use crate::{Error, Extractor, Fault};
use std::fmt;

pub struct Indirection {
    extract: Extractor,
    inner: Box<Node>,
    own: OwnType,
}

impl Indirection {
    pub fn new(
        extract: impl Fn(&Value) -> Result<Value, Fault> + Send + Sync + 'static,
        inner: impl Into<Node>,
    ) -> Self {
        Indirection { extract: Box::new(extract), inner: Box::new(inner.into()), own: OwnType::default() }
    }

    /// Indirection through one record field.
    pub fn field(name: &'static str, inner: impl Into<Node>) -> Self {
        Self::new(move |v| v.field(name).cloned(), inner)
    }

    pub fn display(mut self, display: MessageLeaf) -> Self {
        self.own.set_display(display);
        self
    }

    pub fn inner(&self) -> &Node {
        &self.inner
    }

    pub(crate) fn bind_subject(&mut self, ty: &TypeName) {
        self.own.bind(ty);
    }
}

impl Resolve for Indirection {
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error> {
        let sub = (self.extract)(value).map_err(|source| Error::ExtractionFailure { parent: value.type_name(), source })?;
        scope.note(|| StepKind::Extracted { ty: sub.type_name() });
        self.inner.resolve(&sub, scope)
    }

    /// No instance means nothing to extract from; only an own display answers.
    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error> {
        self.own.resolve(ty, scope).unwrap_or_else(|| Ok(String::new()))
    }
}

impl fmt::Debug for Indirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Indirection")
            .field("extract", &"<function>")
            .field("inner", &self.inner)
            .field("own", &self.own)
            .finish()
    }
}
