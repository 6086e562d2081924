//! Resolution engine.
//!
//! The engine is a tree of [`Node`]s built once at configuration time and
//! walked read-only by every query. The submodules under `src/engine/` each
//! own one node kind, while the public paths stay flat (`crate::engine::TypeStore`,
//! `crate::engine::Conditional`, ...).
//!
//! ## How the parts work together
//!
//! ```text
//! value ── MessageMap::message ── root TypeStore (InheritChain, store.rs)
//!                                      │  value type, then its ancestors
//!                                      v
//!                          per-type node (any Node kind)
//!                            - TypeStore / ValueStore   (store.rs)
//!                            - Conditional              (conditional.rs)
//!                            - Indirection              (indirection.rs)
//!                                      │
//!                                      v
//!                              MessageLeaf (leaf.rs)
//!                                - catalog key or accessor
//!                                - positional args  (format.rs)
//!                                      │
//!                                      v
//!                                   String
//! ```
//!
//! Every miss without a default yields `""`; every failure (a callback fault, a
//! missing catalog key, a template/argument mismatch) is an [`Error`](crate::Error).
//!
//! ## Responsibilities by module
//!
//! - `node.rs`: the [`Node`] enum, the [`Resolve`] trait and the per-query [`Scope`].
//! - `store.rs`: type-keyed and value-keyed dispatch with defaults.
//! - `conditional.rs`: ordered guards.
//! - `indirection.rs`: sub-value extraction.
//! - `leaf.rs`: message leaves.
//! - `format.rs`: `{N}` interpolation.
//! - `trace.rs`: verbose query traces.
//!
//! ## Debugging
//!
//! Install a `tracing` subscriber at `TRACE` level for the `missive` target to
//! see every dispatch step, or use `message_verbose` to get them back as data.

#[path = "engine/conditional.rs"]
mod conditional;
#[path = "engine/format.rs"]
mod format;
#[path = "engine/indirection.rs"]
mod indirection;
#[path = "engine/leaf.rs"]
mod leaf;
#[path = "engine/node.rs"]
mod node;
#[path = "engine/store.rs"]
mod store;
#[path = "engine/trace.rs"]
mod trace;


pub use conditional::Conditional;
pub use indirection::Indirection;
pub use leaf::MessageLeaf;
pub use node::{Node, Resolve, Scope};
pub use store::{Dispatch, LookupStrategy, TypeStore, ValueStore};
pub use trace::{Resolution, Step, StepKind, TemplateSource};
