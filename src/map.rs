//! Root registry.
//!
//! A [`MessageMap`] owns everything a query needs: the type table, the
//! message catalog and the root of the resolution tree. The root is an
//! inheritance-aware [`TypeStore`] created by the first [`MessageMap::configure`]
//! call; each configured root type gets its own inheritance-aware sub-store
//! beneath it.
//!
//! ```text
//! MessageMap
//!   ├─ TypeTable              parents + default instances
//!   ├─ Catalog (set once)     key -> template
//!   └─ root TypeStore (InheritChain)
//!        ├─ "Exception" ─ TypeStore (InheritChain) ─ ...
//!        └─ "Widget"    ─ TypeStore (InheritChain) ─ ...
//! ```
//!
//! ## Invariants
//!
//! - Configuring a root type that already has a subtree extends that subtree;
//!   registering the same child type twice still fails with
//!   [`Error::DuplicateKey`].
//! - A `configure` closure that fails on a *new* root type leaves the map
//!   untouched. On an existing root type, entries added before the failure stay.

use crate::catalog::Catalog;
use crate::engine::{LookupStrategy, Node, Resolution, Resolve, Scope, TypeStore};
use crate::types::{TypeDef, TypeTable};
use crate::value::{ANY, TypeName, Value};
use crate::Error;
use std::fmt;
use std::time::Instant;

/// Types, catalog and the resolution tree for one message domain.
#[derive(Default)]
pub struct MessageMap {
    types: TypeTable,
    catalog: Option<Box<dyn Catalog>>,
    root: Option<TypeStore>,
}

impl MessageMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map that already has its catalog.
    pub fn with_catalog(catalog: impl Catalog + 'static) -> Self {
        MessageMap { catalog: Some(Box::new(catalog)), ..Self::default() }
    }

    // --- Configuration -----------------------------------------------------------

    /// Install the message catalog. It can be set only once per map lifetime.
    pub fn set_catalog(&mut self, catalog: impl Catalog + 'static) -> Result<(), Error> {
        if self.catalog.is_some() {
            return Err(Error::CatalogAlreadySet);
        }
        tracing::debug!("message catalog installed");
        self.catalog = Some(Box::new(catalog));
        Ok(())
    }

    pub fn define_type(&mut self, def: TypeDef) -> Result<(), Error> {
        self.types.define(def)
    }

    pub fn types(&self) -> &TypeTable {
        &self.types
    }

    pub fn has_catalog(&self) -> bool {
        self.catalog.is_some()
    }

    pub fn is_configured(&self) -> bool {
        self.root.is_some()
    }

    /// Populate the subtree for `root_type`.
    ///
    /// `configure` receives an inheritance-aware [`TypeStore`] registered under
    /// `root_type`, either a fresh one or the one left by a previous call.
    pub fn configure(
        &mut self,
        root_type: impl Into<TypeName>,
        configure: impl FnOnce(&mut TypeStore) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let root_type = root_type.into();
        let root = self.root.get_or_insert_with(|| {
            tracing::debug!("creating root type store");
            TypeStore::rooted(LookupStrategy::InheritChain, TypeName::from(ANY))
        });

        match root.get_mut(&root_type) {
            Some(Node::Types(store)) => {
                tracing::debug!(root = %root_type, "extending root type");
                configure(store)
            }
            Some(other) => {
                Err(Error::DuplicateKey { store: "root type store", key: format!("{} ({})", root_type, other.kind()) })
            }
            None => {
                tracing::debug!(root = %root_type, "configuring new root type");
                root.nest(root_type, configure)
            }
        }
    }

    /// Discard the tree, the type table and the catalog.
    pub fn reset(&mut self) {
        tracing::debug!(configured = self.root.is_some(), "resetting message map");
        *self = MessageMap::new();
    }

    // --- Queries -----------------------------------------------------------------

    /// Message for `value`; `""` when nothing in the tree matches.
    pub fn message(&self, value: &Value) -> Result<String, Error> {
        let root = self.root()?;
        root.resolve(value, &self.scope())
    }

    /// Message for a type when no instance is at hand.
    pub fn type_message(&self, ty: impl Into<TypeName>) -> Result<String, Error> {
        let root = self.root()?;
        root.resolve_type(&ty.into(), &self.scope())
    }

    /// [`message`](Self::message) plus timing and the dispatch path taken.
    pub fn message_verbose(&self, value: &Value) -> Result<Resolution, Error> {
        let root = self.root()?;
        let start = Instant::now();
        let scope = Scope::traced(&self.types, self.catalog.as_deref());
        let message = root.resolve(value, &scope)?;
        Ok(Resolution { message, elapsed: start.elapsed(), steps: scope.into_steps() })
    }

    pub fn type_message_verbose(&self, ty: impl Into<TypeName>) -> Result<Resolution, Error> {
        let root = self.root()?;
        let ty = ty.into();
        let start = Instant::now();
        let scope = Scope::traced(&self.types, self.catalog.as_deref());
        let message = root.resolve_type(&ty, &scope)?;
        Ok(Resolution { message, elapsed: start.elapsed(), steps: scope.into_steps() })
    }

    fn root(&self) -> Result<&TypeStore, Error> {
        self.root.as_ref().ok_or(Error::NotConfigured)
    }

    fn scope(&self) -> Scope<'_> {
        Scope::new(&self.types, self.catalog.as_deref())
    }
}

impl fmt::Debug for MessageMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageMap")
            .field("types", &self.types)
            .field("catalog", &self.catalog.as_ref().map(|_| "<catalog>"))
            .field("root", &self.root)
            .finish()
    }
}
