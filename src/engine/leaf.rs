//! Message leaves: the terminal nodes that produce the final string.
//!
//! A leaf gets its base template either from the catalog (by key) or from an
//! accessor callback applied to the value, then interpolates its argument
//! accessors positionally (see `format.rs`). Arguments are computed in
//! registration order and only when a value is at hand; type-only queries
//! return the bare template.

use super::format::interpolate;
use super::node::{Resolve, Scope};
use super::trace::{StepKind, TemplateSource};
use crate::value::{TypeName, Value};
use crate::{Accessor, Error, Fault};
use std::fmt;

enum Source {
    Catalog(String),
    Accessor(Accessor),
}

/// Terminal node producing a formatted message.
pub struct MessageLeaf {
    source: Source,
    args: Vec<Accessor>,
}

impl MessageLeaf {
    /// Template looked up in the catalog under `key`.
    pub fn catalog(key: impl Into<String>) -> Self {
        MessageLeaf { source: Source::Catalog(key.into()), args: Vec::new() }
    }

    /// Template computed from the value itself.
    ///
    /// Type-only queries call `accessor` on the default instance of the queried
    /// type, so that type must have a default registered in the type table.
    pub fn from_fn(accessor: impl Fn(&Value) -> Result<String, Fault> + Send + Sync + 'static) -> Self {
        MessageLeaf { source: Source::Accessor(Box::new(accessor)), args: Vec::new() }
    }

    /// Append a positional argument (`{0}`, `{1}`, ... in registration order).
    pub fn arg(mut self, accessor: impl Fn(&Value) -> Result<String, Fault> + Send + Sync + 'static) -> Self {
        self.add_arg(accessor);
        self
    }

    pub fn add_arg(&mut self, accessor: impl Fn(&Value) -> Result<String, Fault> + Send + Sync + 'static) {
        self.args.push(Box::new(accessor));
    }

    /// Shorthand for an argument rendering one field of a record value.
    pub fn arg_field(self, name: &'static str) -> Self {
        self.arg(move |v| Ok(v.field(name)?.to_string()))
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    fn call(&self, accessor: &Accessor, value: &Value) -> Result<String, Error> {
        accessor(value).map_err(|source| Error::AccessorFailure { ty: value.type_name(), source })
    }
}

impl Resolve for MessageLeaf {
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error> {
        let template = match &self.source {
            Source::Catalog(key) => scope.lookup(key)?,
            Source::Accessor(accessor) => self.call(accessor, value)?,
        };

        scope.note(|| StepKind::Rendered { source: self.template_source(), args: self.args.len() });
        if self.args.is_empty() {
            return Ok(template);
        }

        let args = self.args.iter().map(|accessor| self.call(accessor, value)).collect::<Result<Vec<_>, _>>()?;
        interpolate(&template, &args)
    }

    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error> {
        scope.note(|| StepKind::Rendered { source: self.template_source(), args: 0 });
        match &self.source {
            Source::Catalog(key) => scope.lookup(key),
            Source::Accessor(accessor) => {
                let instance = scope.types().instantiate(ty)?;
                self.call(accessor, &instance)
            }
        }
    }
}

impl MessageLeaf {
    fn template_source(&self) -> TemplateSource {
        match &self.source {
            Source::Catalog(key) => TemplateSource::Catalog(key.clone()),
            Source::Accessor(_) => TemplateSource::Accessor,
        }
    }
}

impl fmt::Debug for MessageLeaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("MessageLeaf");
        match &self.source {
            Source::Catalog(key) => s.field("catalog", key),
            Source::Accessor(_) => s.field("accessor", &"<function>"),
        };
        s.field("args", &self.args.len()).finish()
    }
}
