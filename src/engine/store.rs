//! Dispatch stores.
//!
//! A store maps a key derived from the incoming value to a child node:
//!
//! - [`TypeStore`] keys on the value's type. With
//!   [`LookupStrategy::InheritChain`] a miss on the exact type retries with the
//!   parent type, then the grandparent, until a registered type is found or the
//!   ancestry is exhausted.
//! - [`ValueStore`] keys on the exact scalar value. It declares an element type
//!   and rejects values of any other type with [`Error::TypeMismatch`]; it never
//!   answers type-only lookups.
//!
//! Both implement [`Dispatch`], and both resolve the same way:
//!
//! ```text
//! start ── find(key) ──┬─ Some(child) ──────────────▶ child.resolve(..)
//!                      └─ None ── default? ──┬─ yes ─▶ default.resolve(..)
//!                                            └─ no ──▶ ""
//! ```
//!
//! A type-only query first gives the store's own type-name resolution a chance
//! (see `OwnType`) and then follows the same machine with `find_type`.

use super::leaf::MessageLeaf;
use super::node::{Node, OwnType, Resolve, Scope};
use super::trace::StepKind;
use crate::value::{ScalarKey, TypeName, Value};
use crate::Error;
use std::collections::HashMap;
use std::fmt;

/// How a [`TypeStore`] treats types that are not registered directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LookupStrategy {
    /// Exactly one lookup for the value's own type.
    #[default]
    ConcreteOnly,
    /// Walk up the ancestry until a registered type is found.
    InheritChain,
}

/// Key lookup shared by both store kinds.
pub trait Dispatch {
    /// Find the child for a concrete value. `Ok(None)` is a plain miss.
    fn find(&self, value: &Value, scope: &Scope<'_>) -> Result<Option<&Node>, Error>;

    /// Find the child for a type when no instance is available.
    fn find_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Option<&Node>;
}

fn dispatch_value<S: Dispatch>(
    store: &S,
    default: Option<&Node>,
    value: &Value,
    scope: &Scope<'_>,
) -> Result<String, Error> {
    if let Some(child) = store.find(value, scope)? {
        return child.resolve(value, scope);
    }
    match default {
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

fn dispatch_type<S: Dispatch>(
    store: &S,
    own: &OwnType,
    default: Option<&Node>,
    ty: &TypeName,
    scope: &Scope<'_>,
) -> Result<String, Error> {
    if let Some(answer) = own.resolve(ty, scope) {
        return answer;
    }
    if let Some(child) = store.find_type(ty, scope) {
        return child.resolve_type(ty, scope);
    }
    match default {
        Some(node) => {
            scope.note(|| StepKind::Default { node: node.kind() });
            node.resolve_type(ty, scope)
        }
        None => {
            scope.note(|| StepKind::Empty);
            Ok(String::new())
        }
    }
}

// --- Type store ----------------------------------------------------------------

/// Dispatch on the type of the incoming value.
#[derive(Default)]
pub struct TypeStore {
    strategy: LookupStrategy,
    entries: HashMap<TypeName, Node>,
    default: Option<Box<Node>>,
    own: OwnType,
}

impl TypeStore {
    pub fn new(strategy: LookupStrategy) -> Self {
        TypeStore { strategy, ..TypeStore::default() }
    }

    pub fn concrete() -> Self {
        Self::new(LookupStrategy::ConcreteOnly)
    }

    pub fn inherit() -> Self {
        Self::new(LookupStrategy::InheritChain)
    }

    pub(crate) fn rooted(strategy: LookupStrategy, subject: TypeName) -> Self {
        TypeStore { strategy, own: OwnType::bound(subject), ..TypeStore::default() }
    }

    /// Message answering type-only queries for the type this store is registered under.
    pub fn display(mut self, display: MessageLeaf) -> Self {
        self.own.set_display(display);
        self
    }

    pub fn strategy(&self) -> LookupStrategy {
        self.strategy
    }

    /// Register `node` for values of type `ty`.
    pub fn add_type(&mut self, ty: impl Into<TypeName>, node: impl Into<Node>) -> Result<(), Error> {
        let ty = ty.into();
        if self.entries.contains_key(&ty) {
            return Err(Error::DuplicateKey { store: "type store", key: ty.to_string() });
        }
        let mut node = node.into();
        node.bind_subject(&ty);
        self.entries.insert(ty, node);
        Ok(())
    }

    pub fn with_type(mut self, ty: impl Into<TypeName>, node: impl Into<Node>) -> Result<Self, Error> {
        self.add_type(ty, node)?;
        Ok(self)
    }

    /// Register a nested inheritance-aware type store for `ty`, populated by `configure`.
    pub fn nest(
        &mut self,
        ty: impl Into<TypeName>,
        configure: impl FnOnce(&mut TypeStore) -> Result<(), Error>,
    ) -> Result<(), Error> {
        let ty = ty.into();
        let mut nested = TypeStore::rooted(LookupStrategy::InheritChain, ty.clone());
        configure(&mut nested)?;
        self.add_type(ty, nested)
    }

    /// Run `configure` against this store and hand it back.
    pub fn build(mut self, configure: impl FnOnce(&mut TypeStore) -> Result<(), Error>) -> Result<Self, Error> {
        configure(&mut self)?;
        Ok(self)
    }

    /// Child used when no registered type matches. Replaces any prior default.
    pub fn set_default(&mut self, node: impl Into<Node>) {
        let mut node = node.into();
        if let Some(subject) = self.own.subject() {
            node.bind_subject(subject);
        }
        self.default = Some(Box::new(node));
    }

    pub fn with_default(mut self, node: impl Into<Node>) -> Self {
        self.set_default(node);
        self
    }

    pub fn get(&self, ty: &TypeName) -> Option<&Node> {
        self.entries.get(ty)
    }

    pub(crate) fn get_mut(&mut self, ty: &TypeName) -> Option<&mut Node> {
        self.entries.get_mut(ty)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn bind_subject(&mut self, ty: &TypeName) {
        self.own.bind_with(ty, self.default.as_deref_mut());
    }

    fn find_by_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Option<&Node> {
        let found = match self.strategy {
            LookupStrategy::ConcreteOnly => self.entries.get_key_value(ty),
            LookupStrategy::InheritChain => {
                scope.types().ancestors(ty).find_map(|candidate| self.entries.get_key_value(candidate))
            }
        };

        match found {
            Some((matched, node)) => {
                scope.note(|| StepKind::TypeHit {
                    strategy: self.strategy,
                    queried: ty.clone(),
                    matched: matched.clone(),
                });
                Some(node)
            }
            None => {
                scope.note(|| StepKind::TypeMiss { strategy: self.strategy, queried: ty.clone() });
                None
            }
        }
    }
}

impl Dispatch for TypeStore {
    fn find(&self, value: &Value, scope: &Scope<'_>) -> Result<Option<&Node>, Error> {
        Ok(self.find_by_type(&value.type_name(), scope))
    }

    fn find_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Option<&Node> {
        self.find_by_type(ty, scope)
    }
}

impl Resolve for TypeStore {
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error> {
        dispatch_value(self, self.default.as_deref(), value, scope)
    }

    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error> {
        dispatch_type(self, &self.own, self.default.as_deref(), ty, scope)
    }
}

impl fmt::Debug for TypeStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&TypeName> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("TypeStore")
            .field("strategy", &self.strategy)
            .field("entries", &keys)
            .field("default", &self.default)
            .field("own", &self.own)
            .finish()
    }
}

// --- Exact-value store ---------------------------------------------------------

/// Dispatch on the exact value of a scalar of one declared type.
pub struct ValueStore {
    element: TypeName,
    entries: HashMap<ScalarKey, Node>,
    default: Option<Box<Node>>,
    own: OwnType,
}

impl ValueStore {
    /// A store for values of type `element`.
    pub fn new(element: impl Into<TypeName>) -> Self {
        let element = element.into();
        ValueStore { own: OwnType::bound(element.clone()), element, entries: HashMap::new(), default: None }
    }

    pub fn element(&self) -> &TypeName {
        &self.element
    }

    pub fn display(mut self, display: MessageLeaf) -> Self {
        self.own.set_display(display);
        self
    }

    /// Register `node` for values equal to `value`.
    pub fn add_value(&mut self, value: impl Into<Value>, node: impl Into<Node>) -> Result<(), Error> {
        let key = self.key_of(&value.into())?;
        if self.entries.contains_key(&key) {
            return Err(Error::DuplicateKey { store: "value store", key: key.to_string() });
        }
        self.entries.insert(key, node.into());
        Ok(())
    }

    pub fn with_value(mut self, value: impl Into<Value>, node: impl Into<Node>) -> Result<Self, Error> {
        self.add_value(value, node)?;
        Ok(self)
    }

    pub fn build(mut self, configure: impl FnOnce(&mut ValueStore) -> Result<(), Error>) -> Result<Self, Error> {
        configure(&mut self)?;
        Ok(self)
    }

    pub fn set_default(&mut self, node: impl Into<Node>) {
        let mut node = node.into();
        if let Some(subject) = self.own.subject() {
            node.bind_subject(subject);
        }
        self.default = Some(Box::new(node));
    }

    pub fn with_default(mut self, node: impl Into<Node>) -> Self {
        self.set_default(node);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn bind_subject(&mut self, ty: &TypeName) {
        self.own.bind_with(ty, self.default.as_deref_mut());
    }

    fn key_of(&self, value: &Value) -> Result<ScalarKey, Error> {
        let found = value.type_name();
        if found != self.element {
            return Err(Error::TypeMismatch { expected: self.element.clone(), found });
        }
        value.scalar_key().ok_or(Error::NotScalar(found))
    }
}

impl Dispatch for ValueStore {
    fn find(&self, value: &Value, scope: &Scope<'_>) -> Result<Option<&Node>, Error> {
        let key = self.key_of(value)?;
        let found = self.entries.get(&key);
        scope.note(|| match found {
            Some(_) => StepKind::ValueHit { key: key.clone() },
            None => StepKind::ValueMiss { key: key.clone() },
        });
        Ok(found)
    }

    /// Values carry no type-level semantics: always a miss.
    fn find_type(&self, _ty: &TypeName, _scope: &Scope<'_>) -> Option<&Node> {
        None
    }
}

impl Resolve for ValueStore {
    fn resolve(&self, value: &Value, scope: &Scope<'_>) -> Result<String, Error> {
        dispatch_value(self, self.default.as_deref(), value, scope)
    }

    fn resolve_type(&self, ty: &TypeName, scope: &Scope<'_>) -> Result<String, Error> {
        dispatch_type(self, &self.own, self.default.as_deref(), ty, scope)
    }
}

impl fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.entries.keys().map(ToString::to_string).collect();
        keys.sort();
        f.debug_struct("ValueStore")
            .field("element", &self.element)
            .field("entries", &keys)
            .field("default", &self.default)
            .field("own", &self.own)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MapCatalog;
    use crate::types::{TypeDef, TypeTable};
    use proptest::prelude::*;

    fn types() -> TypeTable {
        let mut types = TypeTable::new();
        types.define(TypeDef::new("Animal")).unwrap();
        types.define(TypeDef::new("Dog").extends("Animal")).unwrap();
        types.define(TypeDef::new("Puppy").extends("Dog")).unwrap();
        types.define(TypeDef::new("Cat").extends("Animal")).unwrap();
        types.define(TypeDef::enumeration("Color", "Red")).unwrap();
        types
    }

    fn catalog() -> MapCatalog {
        [("ANIMAL", "an animal"), ("DOG", "a dog"), ("ONE", "one"), ("TWO", "two"), ("OTHER", "other")]
            .into_iter()
            .collect()
    }

    fn val(ty: &str) -> Value {
        Value::Record(Value::record(ty))
    }

    #[test]
    fn concrete_only_ignores_ancestors() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = TypeStore::concrete().with_type("Dog", MessageLeaf::catalog("DOG")).unwrap();

        assert_eq!(store.resolve(&val("Dog"), &scope).unwrap(), "a dog");
        assert_eq!(store.resolve(&val("Puppy"), &scope).unwrap(), "");
    }

    #[test]
    fn inherit_chain_prefers_most_specific() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = TypeStore::inherit()
            .with_type("Animal", MessageLeaf::catalog("ANIMAL"))
            .unwrap()
            .with_type("Dog", MessageLeaf::catalog("DOG"))
            .unwrap();

        assert_eq!(store.resolve(&val("Puppy"), &scope).unwrap(), "a dog");
        assert_eq!(store.resolve(&val("Cat"), &scope).unwrap(), "an animal");
        assert_eq!(store.resolve(&val("Stranger"), &scope).unwrap(), "");
        assert_eq!(store.resolve_type(&TypeName::from("Puppy"), &scope).unwrap(), "a dog");
    }

    #[test]
    fn default_answers_misses() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = TypeStore::concrete()
            .with_type("Dog", MessageLeaf::catalog("DOG"))
            .unwrap()
            .with_default(MessageLeaf::catalog("OTHER"));

        assert_eq!(store.resolve(&val("Cat"), &scope).unwrap(), "other");
        assert_eq!(store.resolve_type(&TypeName::from("Cat"), &scope).unwrap(), "other");
    }

    #[test]
    fn last_default_wins() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let mut store = TypeStore::concrete();
        store.set_default(MessageLeaf::catalog("ONE"));
        store.set_default(MessageLeaf::catalog("TWO"));
        assert_eq!(store.resolve(&val("Cat"), &scope).unwrap(), "two");
    }

    #[test]
    fn duplicate_types_are_rejected() {
        let mut store = TypeStore::concrete();
        store.add_type("Dog", MessageLeaf::catalog("DOG")).unwrap();
        let err = store.add_type("Dog", MessageLeaf::catalog("OTHER")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { store: "type store", ref key } if key == "Dog"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn display_answers_only_its_own_type() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let mut root = TypeStore::inherit();
        root.add_type("Dog", TypeStore::inherit().display(MessageLeaf::catalog("DOG"))).unwrap();

        assert_eq!(root.resolve_type(&TypeName::from("Dog"), &scope).unwrap(), "a dog");
        assert_eq!(root.resolve_type(&TypeName::from("Puppy"), &scope).unwrap(), "");
    }

    #[test]
    fn value_store_matches_exact_values() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = ValueStore::new("int")
            .with_value(1, MessageLeaf::catalog("ONE"))
            .unwrap()
            .with_value(2, MessageLeaf::catalog("TWO"))
            .unwrap();

        assert_eq!(store.resolve(&Value::Int(2), &scope).unwrap(), "two");
        assert_eq!(store.resolve(&Value::Int(3), &scope).unwrap(), "");
    }

    #[test]
    fn value_store_rejects_foreign_types() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = ValueStore::new("int").with_value(1, MessageLeaf::catalog("ONE")).unwrap();

        let err = store.resolve(&Value::str("1"), &scope).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { ref expected, ref found } if expected == "int" && found == "str"));

        let mut store = ValueStore::new("int");
        assert!(matches!(store.add_value("x", MessageLeaf::catalog("ONE")), Err(Error::TypeMismatch { .. })));
        assert!(matches!(store.add_value(1, MessageLeaf::catalog("ONE")), Ok(())));
        assert!(matches!(store.add_value(1, MessageLeaf::catalog("TWO")), Err(Error::DuplicateKey { .. })));
    }

    #[test]
    fn default_display_answers_for_the_owning_type() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let mut root = TypeStore::inherit();
        root.add_type("Dog", TypeStore::inherit().with_default(TypeStore::inherit().display(MessageLeaf::catalog("DOG"))))
            .unwrap();
        root.nest("Cat", |cats| {
            cats.set_default(TypeStore::inherit().display(MessageLeaf::catalog("ANIMAL")));
            Ok(())
        })
        .unwrap();

        assert_eq!(root.resolve_type(&TypeName::from("Dog"), &scope).unwrap(), "a dog");
        assert_eq!(root.resolve_type(&TypeName::from("Puppy"), &scope).unwrap(), "");
        assert_eq!(root.resolve_type(&TypeName::from("Cat"), &scope).unwrap(), "an animal");
    }

    #[test]
    fn float_values_match_by_equality() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let mut store = ValueStore::new("float").with_value(0.0, MessageLeaf::catalog("ONE")).unwrap();

        assert_eq!(store.resolve(&Value::Float(-0.0), &scope).unwrap(), "one");
        let err = store.add_value(-0.0, MessageLeaf::catalog("TWO")).unwrap_err();
        assert!(matches!(err, Error::DuplicateKey { store: "value store", ref key } if key == "0"));

        store.add_value(f64::NAN, MessageLeaf::catalog("TWO")).unwrap();
        assert_eq!(store.resolve(&Value::Float(f64::NAN), &scope).unwrap(), "two");
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn build_populates_in_place() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = TypeStore::inherit()
            .build(|s| {
                s.add_type("Dog", MessageLeaf::catalog("DOG"))?;
                s.set_default(MessageLeaf::catalog("OTHER"));
                Ok(())
            })
            .unwrap();
        assert_eq!(store.strategy(), LookupStrategy::InheritChain);
        assert_eq!(TypeStore::concrete().strategy(), LookupStrategy::ConcreteOnly);
        assert_eq!(store.resolve(&val("Puppy"), &scope).unwrap(), "a dog");

        let values = ValueStore::new("int")
            .build(|s| {
                s.add_value(1, MessageLeaf::catalog("ONE"))?;
                s.add_value(2, MessageLeaf::catalog("TWO"))
            })
            .unwrap();
        assert_eq!(values.element(), "int");
        assert_eq!(values.len(), 2);

        let err = ValueStore::new("int").build(|s| s.add_value("x", MessageLeaf::catalog("ONE"))).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn value_store_rejects_records() {
        let mut store = ValueStore::new("Dog");
        let err = store.add_value(val("Dog"), MessageLeaf::catalog("DOG")).unwrap_err();
        assert!(matches!(err, Error::NotScalar(_)));
    }

    #[test]
    fn value_store_type_queries_fall_to_default() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let store = ValueStore::new("Color").with_value(Value::variant("Color", "Red"), MessageLeaf::catalog("ONE")).unwrap();
        assert_eq!(store.resolve_type(&TypeName::from("Color"), &scope).unwrap(), "");

        let store = store.with_default(MessageLeaf::catalog("OTHER"));
        assert_eq!(store.resolve_type(&TypeName::from("Color"), &scope).unwrap(), "other");
        assert_eq!(store.resolve(&Value::variant("Color", "Red"), &scope).unwrap(), "one");
        assert_eq!(store.resolve(&Value::variant("Color", "Blue"), &scope).unwrap(), "other");
    }

    #[test]
    fn nest_builds_inheriting_subtrees() {
        let (types, catalog) = (types(), catalog());
        let scope = Scope::new(&types, Some(&catalog));
        let mut root = TypeStore::inherit();
        root.nest("Animal", |animals| {
            animals.add_type("Dog", MessageLeaf::catalog("DOG"))?;
            animals.set_default(MessageLeaf::catalog("ANIMAL"));
            Ok(())
        })
        .unwrap();

        assert_eq!(root.resolve(&val("Puppy"), &scope).unwrap(), "a dog");
        assert_eq!(root.resolve(&val("Cat"), &scope).unwrap(), "an animal");
    }

    proptest! {
        #[test]
        fn concrete_store_hits_exact_types_only(registered in 0usize..4, queried in 0usize..4) {
            let names = ["Animal", "Dog", "Puppy", "Cat"];
            let (types, catalog) = (types(), catalog());
            let scope = Scope::new(&types, Some(&catalog));
            let store = TypeStore::concrete().with_type(names[registered], MessageLeaf::catalog("DOG")).unwrap();

            let out = store.resolve(&val(names[queried]), &scope).unwrap();
            prop_assert_eq!(out.is_empty(), registered != queried);
        }

        #[test]
        fn inherit_store_hits_registered_ancestors(registered in 0usize..4, queried in 0usize..4) {
            let names = ["Animal", "Dog", "Puppy", "Cat"];
            let (types, catalog) = (types(), catalog());
            let scope = Scope::new(&types, Some(&catalog));
            let store = TypeStore::inherit().with_type(names[registered], MessageLeaf::catalog("DOG")).unwrap();

            let out = store.resolve(&val(names[queried]), &scope).unwrap();
            let is_a = types.is_a(&TypeName::from(names[queried]), &TypeName::from(names[registered]));
            prop_assert_eq!(!out.is_empty(), is_a);
        }

        #[test]
        fn value_lookups_are_idempotent(n in -5i64..5) {
            let (types, catalog) = (types(), catalog());
            let scope = Scope::new(&types, Some(&catalog));
            let store = ValueStore::new("int")
                .with_value(1, MessageLeaf::catalog("ONE"))
                .unwrap()
                .with_default(MessageLeaf::catalog("OTHER"));

            let first = store.resolve(&Value::Int(n), &scope).unwrap();
            let second = store.resolve(&Value::Int(n), &scope).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first == "one", n == 1);
        }
    }
}
