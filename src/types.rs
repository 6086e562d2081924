//! Type registry.
//!
//! Inheritance-aware dispatch needs to know a type's parent, and type-only
//! queries answered by a callback need a default instance of the queried type.
//! Both come from a [`TypeTable`] populated during configuration.
//!
//! ```text
//! any ─┬─ unit, bool, int, float, str
//!      ├─ enum ─── <enumerations>
//!      └─ <declared types> ─── <their subtypes> ...
//! ```
//!
//! ## Invariants
//!
//! - A parent must be defined before any type that extends it, and a type can be
//!   defined only once. Ancestry is therefore a finite tree rooted at `any` and
//!   [`TypeTable::ancestors`] always terminates.
//! - A type that was never defined has no parent: a walk starting at it visits
//!   only the type itself.

use crate::value::{ANY, BOOL, ENUM, FLOAT, INT, STR, TypeName, UNIT, Value};
use crate::Error;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// Declaration of one type, consumed by [`TypeTable::define`].
pub struct TypeDef {
    name: TypeName,
    parent: TypeName,
    default: Option<DefaultFn>,
}

impl TypeDef {
    /// A type extending `any`, with no default instance.
    pub fn new(name: impl Into<TypeName>) -> Self {
        TypeDef { name: name.into(), parent: TypeName::from(ANY), default: None }
    }

    /// An enumeration type extending `enum`; its default instance is the first variant.
    pub fn enumeration(name: impl Into<TypeName>, first_variant: &str) -> Self {
        let name = name.into();
        let default = Value::variant(name.clone(), first_variant);
        TypeDef { name, parent: TypeName::from(ENUM), default: None }.default_value(default)
    }

    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.parent = parent.into();
        self
    }

    /// Zero-argument constructor used by type-only queries.
    pub fn default_with(mut self, make: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(Arc::new(make));
        self
    }

    pub fn default_value(self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default_with(move || value.clone())
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("default", &self.default.as_ref().map(|_| "<function>"))
            .finish()
    }
}

struct TypeEntry {
    parent: Option<TypeName>,
    default: Option<DefaultFn>,
}

/// Parent links and default-instance factories for every known type.
pub struct TypeTable {
    entries: HashMap<TypeName, TypeEntry>,
}

impl TypeTable {
    /// A table holding only the built-in types.
    pub fn new() -> Self {
        let mut table = TypeTable { entries: HashMap::new() };
        table.entries.insert(TypeName::from(ANY), TypeEntry { parent: None, default: None });

        let builtins: [(&str, Option<Value>); 6] = [
            (UNIT, Some(Value::Unit)),
            (BOOL, Some(Value::Bool(false))),
            (INT, Some(Value::Int(0))),
            (FLOAT, Some(Value::Float(0.0))),
            (STR, Some(Value::str(""))),
            (ENUM, None),
        ];
        for (name, default) in builtins {
            let default = default.map(|v| Arc::new(move || v.clone()) as DefaultFn);
            table.entries.insert(TypeName::from(name), TypeEntry { parent: Some(TypeName::from(ANY)), default });
        }
        table
    }

    pub fn define(&mut self, def: TypeDef) -> Result<(), Error> {
        if self.entries.contains_key(&def.name) {
            return Err(Error::DuplicateType(def.name));
        }
        if !self.entries.contains_key(&def.parent) {
            return Err(Error::UnknownParent { ty: def.name, parent: def.parent });
        }

        tracing::debug!(ty = %def.name, parent = %def.parent, has_default = def.default.is_some(), "defined type");
        self.entries.insert(def.name, TypeEntry { parent: Some(def.parent), default: def.default });
        Ok(())
    }

    pub fn contains(&self, ty: &TypeName) -> bool {
        self.entries.contains_key(ty)
    }

    pub fn parent(&self, ty: &TypeName) -> Option<&TypeName> {
        self.entries.get(ty).and_then(|e| e.parent.as_ref())
    }

    /// `ty` followed by each of its ancestors, nearest first.
    pub fn ancestors<'a>(&'a self, ty: &'a TypeName) -> impl Iterator<Item = &'a TypeName> + 'a {
        std::iter::successors(Some(ty), move |current| self.parent(current))
    }

    /// Whether `ty` is `ancestor` or descends from it.
    pub fn is_a(&self, ty: &TypeName, ancestor: &TypeName) -> bool {
        self.ancestors(ty).any(|t| t == ancestor)
    }

    /// Build the default instance of `ty`.
    pub fn instantiate(&self, ty: &TypeName) -> Result<Value, Error> {
        let make = self.entries.get(ty).and_then(|e| e.default.as_ref());
        make.map(|make| make()).ok_or_else(|| Error::NoDefaultInstance(ty.clone()))
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("TypeTable").field("types", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TypeTable {
        let mut types = TypeTable::new();
        types.define(TypeDef::new("Exception")).unwrap();
        types.define(TypeDef::new("BaseException").extends("Exception")).unwrap();
        types.define(TypeDef::new("PermissionException").extends("BaseException")).unwrap();
        types
    }

    #[test]
    fn ancestors_walk_to_root() {
        let types = table();
        let ty = TypeName::from("PermissionException");
        let chain: Vec<&str> = types.ancestors(&ty).map(TypeName::as_str).collect();
        assert_eq!(chain, vec!["PermissionException", "BaseException", "Exception", "any"]);
        assert!(types.is_a(&ty, &TypeName::from("Exception")));
        assert!(!types.is_a(&TypeName::from("Exception"), &ty));
    }

    #[test]
    fn undefined_types_have_no_parent() {
        let types = table();
        let ty = TypeName::from("Stranger");
        assert_eq!(types.ancestors(&ty).count(), 1);
        assert!(!types.contains(&ty));
    }

    #[test]
    fn builtins_extend_any() {
        let types = TypeTable::new();
        assert_eq!(types.parent(&TypeName::from(INT)), Some(&TypeName::from(ANY)));
        assert_eq!(types.parent(&TypeName::from(ANY)), None);
        assert_eq!(types.instantiate(&TypeName::from(INT)).unwrap(), Value::Int(0));
    }

    #[test]
    fn define_rejects_duplicates_and_unknown_parents() {
        let mut types = table();
        assert!(matches!(types.define(TypeDef::new("Exception")), Err(Error::DuplicateType(_))));
        assert!(matches!(
            types.define(TypeDef::new("Orphan").extends("Missing")),
            Err(Error::UnknownParent { .. })
        ));
    }

    #[test]
    fn enumerations_default_to_first_variant() {
        let mut types = TypeTable::new();
        types.define(TypeDef::enumeration("UserType", "Unknown")).unwrap();
        let ty = TypeName::from("UserType");
        assert_eq!(types.parent(&ty), Some(&TypeName::from(ENUM)));
        assert_eq!(types.instantiate(&ty).unwrap(), Value::variant("UserType", "Unknown"));
    }

    #[test]
    fn instantiate_without_default_fails() {
        let types = table();
        let err = types.instantiate(&TypeName::from("Exception")).unwrap_err();
        assert!(matches!(err, Error::NoDefaultInstance(ty) if ty == "Exception"));
    }
}
