//! Type-directed message resolution.
//!
//! A message map turns an arbitrary runtime [`Value`] into a human-readable
//! message by walking a tree configured up front: dispatch on the value's type
//! (with fallback to its ancestors), on its exact scalar value, on ordered
//! predicates, or on a sub-value extracted from it, bottoming out at a
//! [`MessageLeaf`] that formats a catalog template.
//!
//! ```
//! use missive::{Conditional, MapCatalog, MessageLeaf, MessageMap, TypeDef, record};
//!
//! let mut map = MessageMap::with_catalog(
//!     MapCatalog::new().with("OVER", "too big").with("OK", "{0} is fine"),
//! );
//! map.define_type(TypeDef::new("Reading")).unwrap();
//! map.configure("Reading", |readings| {
//!     readings.add_type(
//!         "Reading",
//!         Conditional::new()
//!             .when(|v| Ok(v.field("value")?.as_int()? > 100), MessageLeaf::catalog("OVER"))
//!             .otherwise(MessageLeaf::catalog("OK").arg_field("value")),
//!     )
//! })
//! .unwrap();
//!
//! assert_eq!(map.message(&record!("Reading" { value: 150 })).unwrap(), "too big");
//! assert_eq!(map.message(&record!("Reading" { value: 7 })).unwrap(), "7 is fine");
//! ```
//!
//! "Nothing matched" is always `Ok("")`; configuration and data defects are
//! reported as [`Error`].

#[macro_use]
mod macros;
mod api;
mod catalog;
mod engine;
mod error;
mod map;
mod types;
mod value;

pub use api::{configure, define_type, get_message, get_message_verbose, get_type_message, reset, set_catalog};
pub use catalog::{Catalog, MapCatalog};
pub use engine::{
    Conditional, Dispatch, Indirection, LookupStrategy, MessageLeaf, Node, Resolution, Resolve, Scope, Step, StepKind,
    TemplateSource, TypeStore, ValueStore,
};
pub use error::{Error, Fault};
pub use map::MessageMap;
pub use types::{TypeDef, TypeTable};
pub use value::{ANY, BOOL, ENUM, FLOAT, INT, Record, STR, ScalarKey, TypeName, UNIT, Value};

// --- Callback types ---------------------------------------------------------

/// Guard of a [`Conditional`] branch.
pub type Predicate = Box<dyn Fn(&Value) -> Result<bool, Fault> + Send + Sync>;

/// Derives the sub-value an [`Indirection`] dispatches on.
pub type Extractor = Box<dyn Fn(&Value) -> Result<Value, Fault> + Send + Sync>;

/// Produces a template or a positional argument of a [`MessageLeaf`].
pub type Accessor = Box<dyn Fn(&Value) -> Result<String, Fault> + Send + Sync>;
