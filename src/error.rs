//! Error taxonomy.
//!
//! "No mapping found" is never an error: every dispatch level turns a miss into
//! an empty message. Everything here is a configuration or data defect and is
//! propagated to the caller unchanged.

use crate::value::TypeName;
use thiserror::Error;

/// Errors raised while configuring or querying a message map.
#[derive(Debug, Error)]
pub enum Error {
    /// A query was issued before any tree was configured.
    #[error("message map is not configured")]
    NotConfigured,

    /// The same type or value was registered twice at one dispatch level.
    #[error("duplicate key `{key}` in {store}")]
    DuplicateKey { store: &'static str, key: String },

    #[error("type `{0}` is already defined")]
    DuplicateType(TypeName),

    #[error("type `{ty}` extends undefined type `{parent}`")]
    UnknownParent { ty: TypeName, parent: TypeName },

    /// An exact-value store received a value of the wrong type.
    #[error("value store expects `{expected}` values, found `{found}`")]
    TypeMismatch { expected: TypeName, found: TypeName },

    /// A record was used where a scalar key is required.
    #[error("`{0}` values are not scalar and cannot key a value store")]
    NotScalar(TypeName),

    #[error("extracting a sub-value from `{parent}` failed: {source}")]
    ExtractionFailure {
        parent: TypeName,
        #[source]
        source: Fault,
    },

    #[error("guard #{index} failed on a `{ty}` value: {source}")]
    PredicateFailure {
        index: usize,
        ty: TypeName,
        #[source]
        source: Fault,
    },

    #[error("message accessor failed on a `{ty}` value: {source}")]
    AccessorFailure {
        ty: TypeName,
        #[source]
        source: Fault,
    },

    /// Placeholder indices in a template do not line up with the argument list.
    #[error("template `{template}` has {placeholders} placeholder(s) but {args} argument(s) were supplied")]
    FormatMismatch { template: String, placeholders: usize, args: usize },

    #[error("malformed template `{template}` at byte {offset}")]
    MalformedTemplate { template: String, offset: usize },

    #[error("catalog has no entry for `{0}`")]
    CatalogMiss(String),

    #[error("no message catalog has been set")]
    CatalogNotSet,

    #[error("a message catalog is already set")]
    CatalogAlreadySet,

    /// A type-only query needed a default instance of a type that has none.
    #[error("type `{0}` has no default instance")]
    NoDefaultInstance(TypeName),
}

/// Failure reported by a configuration callback (predicate, extractor or
/// message/argument accessor).
///
/// The engine wraps it into the [`Error`] variant matching the callback's role.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    pub fn new(message: impl Into<String>) -> Self {
        Fault { message: message.into() }
    }
}

/// Lets callbacks perform nested lookups with `?`.
impl From<Error> for Fault {
    fn from(err: Error) -> Self {
        Fault::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrapped_faults_render_their_source() {
        let err = Error::ExtractionFailure { parent: "Outer".into(), source: Fault::new("no field `inner`") };
        assert_eq!(err.to_string(), "extracting a sub-value from `Outer` failed: no field `inner`");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn nested_errors_convert_into_faults() {
        let fault: Fault = Error::CatalogMiss("KEY".to_string()).into();
        assert_eq!(fault.to_string(), "catalog has no entry for `KEY`");
    }
}
