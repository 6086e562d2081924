//! Runtime values and their dispatch descriptors.
//!
//! Resolution never inspects host types. Every value handed to the engine is a
//! [`Value`]: a tagged union that carries its own type tag, so dispatch stores
//! can switch on [`Value::type_name`] (type-keyed dispatch) or on
//! [`Value::scalar_key`] (exact-value dispatch) without downcasting.
//!
//! ```text
//! Value ──┬─ type_name()  -> TypeName   (TypeStore key, hierarchy walk)
//!         └─ scalar_key() -> ScalarKey  (ValueStore key; None for records)
//! ```
//!
//! The accessor helpers (`field`, `as_int`, ...) return [`Fault`] rather than
//! `Option` so predicates, extractors and argument accessors can use `?` and
//! have shape mismatches reported as resolution errors.

use crate::Fault;
use std::fmt;
use std::sync::Arc;

/// Name of the root type every declared type descends from.
pub const ANY: &str = "any";
/// Type tag of [`Value::Unit`].
pub const UNIT: &str = "unit";
/// Type tag of [`Value::Bool`].
pub const BOOL: &str = "bool";
/// Type tag of [`Value::Int`].
pub const INT: &str = "int";
/// Type tag of [`Value::Float`].
pub const FLOAT: &str = "float";
/// Type tag of [`Value::Str`].
pub const STR: &str = "str";
/// Default parent of enumeration types.
pub const ENUM: &str = "enum";

/// Identity of a type.
///
/// Cheap to clone; compared and hashed by name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeName(Arc<str>);

impl TypeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        TypeName(Arc::from(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        TypeName::new(name)
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        TypeName(Arc::from(name))
    }
}

impl From<&TypeName> for TypeName {
    fn from(name: &TypeName) -> Self {
        name.clone()
    }
}

impl PartialEq<str> for TypeName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for TypeName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A typed record: a type tag plus named fields in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    ty: TypeName,
    fields: Vec<(Arc<str>, Value)>,
}

impl Record {
    pub fn new(ty: impl Into<TypeName>) -> Self {
        Record { ty: ty.into(), fields: Vec::new() }
    }

    /// Add (or replace) a field, builder style.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| &**n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((Arc::from(name), value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| &**n == name).map(|(_, v)| v)
    }

    pub fn type_name(&self) -> &TypeName {
        &self.ty
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (&**n, v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A runtime value handed to the resolution engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unit,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    /// A variant of a declared enumeration type.
    Enum { ty: TypeName, variant: Arc<str> },
    Record(Record),
}

/// Hashable identity of a scalar value, used as the key of exact-value stores.
///
/// Floats are keyed by value: `0.0` and `-0.0` share a key, and every `NaN`
/// maps to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKey {
    Unit,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(Arc<str>),
    Enum(TypeName, Arc<str>),
}

fn float_bits(x: f64) -> u64 {
    if x.is_nan() {
        f64::NAN.to_bits()
    } else if x == 0.0 {
        0.0f64.to_bits()
    } else {
        x.to_bits()
    }
}

impl fmt::Display for ScalarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKey::Unit => f.write_str("()"),
            ScalarKey::Bool(b) => write!(f, "{b}"),
            ScalarKey::Int(i) => write!(f, "{i}"),
            ScalarKey::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            ScalarKey::Str(s) => write!(f, "{s:?}"),
            ScalarKey::Enum(ty, variant) => write!(f, "{ty}::{variant}"),
        }
    }
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Arc::from(s.as_ref()))
    }

    pub fn variant(ty: impl Into<TypeName>, variant: &str) -> Self {
        Value::Enum { ty: ty.into(), variant: Arc::from(variant) }
    }

    pub fn record(ty: impl Into<TypeName>) -> Record {
        Record::new(ty)
    }

    /// The type tag used for type-keyed dispatch.
    pub fn type_name(&self) -> TypeName {
        match self {
            Value::Unit => TypeName::from(UNIT),
            Value::Bool(_) => TypeName::from(BOOL),
            Value::Int(_) => TypeName::from(INT),
            Value::Float(_) => TypeName::from(FLOAT),
            Value::Str(_) => TypeName::from(STR),
            Value::Enum { ty, .. } => ty.clone(),
            Value::Record(record) => record.ty.clone(),
        }
    }

    /// The key used for exact-value dispatch; `None` for records.
    pub fn scalar_key(&self) -> Option<ScalarKey> {
        let key = match self {
            Value::Unit => ScalarKey::Unit,
            Value::Bool(b) => ScalarKey::Bool(*b),
            Value::Int(i) => ScalarKey::Int(*i),
            Value::Float(x) => ScalarKey::Float(float_bits(*x)),
            Value::Str(s) => ScalarKey::Str(s.clone()),
            Value::Enum { ty, variant } => ScalarKey::Enum(ty.clone(), variant.clone()),
            Value::Record(_) => return None,
        };
        Some(key)
    }

    // --- Accessors for callbacks ---------------------------------------------

    /// Borrow a field of a record value.
    pub fn field(&self, name: &str) -> Result<&Value, Fault> {
        match self {
            Value::Record(record) => {
                record.get(name).ok_or_else(|| Fault::new(format!("`{}` has no field `{name}`", record.ty)))
            }
            other => Err(Fault::new(format!("cannot read field `{name}` of a `{}` value", other.type_name()))),
        }
    }

    /// Like [`Value::field`], but treats a missing field or a `Unit` field as absent.
    pub fn opt_field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Record(record) => record.get(name).filter(|v| !matches!(v, Value::Unit)),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Result<i64, Fault> {
        match self {
            Value::Int(i) => Ok(*i),
            other => Err(other.shape_fault(INT)),
        }
    }

    pub fn as_float(&self) -> Result<f64, Fault> {
        match self {
            Value::Float(x) => Ok(*x),
            Value::Int(i) => Ok(*i as f64),
            other => Err(other.shape_fault(FLOAT)),
        }
    }

    pub fn as_bool(&self) -> Result<bool, Fault> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.shape_fault(BOOL)),
        }
    }

    pub fn as_str(&self) -> Result<&str, Fault> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(other.shape_fault(STR)),
        }
    }

    /// The variant name of an enum value.
    pub fn as_variant(&self) -> Result<&str, Fault> {
        match self {
            Value::Enum { variant, .. } => Ok(variant),
            other => Err(other.shape_fault(ENUM)),
        }
    }

    pub fn as_record(&self) -> Result<&Record, Fault> {
        match self {
            Value::Record(record) => Ok(record),
            other => Err(other.shape_fault("record")),
        }
    }

    fn shape_fault(&self, expected: &str) -> Fault {
        Fault::new(format!("expected a `{expected}` value, found `{}`", self.type_name()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => f.write_str(""),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => f.write_str(s),
            Value::Enum { variant, .. } => f.write_str(variant),
            Value::Record(record) => {
                write!(f, "{} {{", record.ty)?;
                for (idx, (name, value)) in record.fields().enumerate() {
                    let sep = if idx == 0 { " " } else { ", " };
                    write!(f, "{sep}{name}: {value}")?;
                }
                if record.is_empty() { f.write_str("}") } else { f.write_str(" }") }
            }
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Unit, Into::into)
    }
}
