//! The runtime value union processed by the glean engine.
//!
//! # Heap Enforcement
//!
//! Mutable container variants go through the `Heap<T>` wrapper, so all
//! allocations are created by factory methods on `Value`:
//!
//! ```text
//! let s = Value::string("hello");           // OK
//! let list = Value::list(vec![]);           // OK
//! ```
//!
//! Cloning a `Value` is always cheap: scalars copy, containers bump a
//! reference count and alias the same allocation.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::func::FuncValue;
use crate::heap::Heap;
use crate::type_tag::{ForeignValue, TypeTag};

/// Insertion-ordered mapping used by `Value::Map`.
pub type ValueMap = IndexMap<Value, Value>;

/// Insertion-ordered set used by `Value::Set`.
pub type ValueSet = IndexSet<Value>;

/// A dynamically typed runtime value.
///
/// Targets and results of spec evaluation are `Value`s. The union is closed:
/// host types plug in through the `Foreign` variant and its trait rather
/// than by extending the enum.
#[derive(Clone)]
pub enum Value {
    /// Absent/neutral value (distinct from an *omitted* result, which is
    /// expressed by `Flow::Skip`).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Immutable text.
    Str(Rc<str>),
    /// Mutable ordered sequence.
    List(Heap<Vec<Value>>),
    /// Immutable fixed sequence.
    Tuple(Rc<[Value]>),
    /// Mutable insertion-ordered set.
    Set(Heap<ValueSet>),
    /// Mutable insertion-ordered mapping with value keys.
    Map(Heap<ValueMap>),
    /// Named native function.
    Func(FuncValue),
    /// Host-provided opaque value.
    Foreign(Rc<dyn ForeignValue>),
}

// Factory Methods

impl Value {
    /// Create an integer value.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create a float value.
    #[inline]
    pub fn float(f: f64) -> Self {
        Value::Float(f)
    }

    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<Rc<str>>) -> Self {
        Value::Str(s.into())
    }

    /// Create a list value.
    #[inline]
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Heap::new(items))
    }

    /// Create a tuple value.
    #[inline]
    pub fn tuple(items: Vec<Value>) -> Self {
        Value::Tuple(items.into())
    }

    /// Create a set value, deduplicating in insertion order.
    #[inline]
    pub fn set(items: Vec<Value>) -> Self {
        Value::Set(Heap::new(items.into_iter().collect()))
    }

    /// Create a map value from key/value pairs, keeping insertion order.
    #[inline]
    pub fn map(pairs: Vec<(Value, Value)>) -> Self {
        Value::Map(Heap::new(pairs.into_iter().collect()))
    }

    /// Create an empty map value.
    #[inline]
    pub fn empty_map() -> Self {
        Value::Map(Heap::new(ValueMap::default()))
    }

    /// Create a foreign value.
    #[inline]
    pub fn foreign(v: impl ForeignValue + 'static) -> Self {
        Value::Foreign(Rc::new(v))
    }

    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Map(_) => "map",
            Value::Func(_) => "func",
            Value::Foreign(v) => v.type_name(),
        }
    }

    /// Concrete-type token for dispatch registry lookups.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Null => TypeTag::Null,
            Value::Bool(_) => TypeTag::Bool,
            Value::Int(_) => TypeTag::Int,
            Value::Float(_) => TypeTag::Float,
            Value::Str(_) => TypeTag::Str,
            Value::List(_) => TypeTag::List,
            Value::Tuple(_) => TypeTag::Tuple,
            Value::Set(_) => TypeTag::Set,
            Value::Map(_) => TypeTag::Map,
            Value::Func(_) => TypeTag::Func,
            Value::Foreign(v) => TypeTag::Foreign(v.as_any().type_id()),
        }
    }

    /// Identity of the underlying allocation for container variants.
    ///
    /// Scalars have no identity; deep star expansion uses this to visit
    /// each container exactly once even in the presence of cycles.
    pub fn identity(&self) -> Option<*const ()> {
        match self {
            Value::List(h) => Some(h.as_ptr()),
            Value::Set(h) => Some(h.as_ptr()),
            Value::Map(h) => Some(h.as_ptr()),
            Value::Tuple(t) => Some(Rc::as_ptr(t).cast::<()>()),
            Value::Foreign(v) => Some(Rc::as_ptr(v).cast::<()>()),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

// Structural equality. Floats compare by bit pattern so that `Eq` holds and
// hashing stays consistent; functions and foreign values compare by pointer
// identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Set(a), Value::Set(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => a.ptr_eq(b) || *a.borrow() == *b.borrow(),
            (Value::Func(a), Value::Func(b)) => a == b,
            (Value::Foreign(a), Value::Foreign(b)) => {
                std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
            }
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
            Value::List(items) => {
                for item in items.borrow().iter() {
                    item.hash(state);
                }
            }
            Value::Tuple(items) => {
                for item in items.iter() {
                    item.hash(state);
                }
            }
            Value::Set(items) => {
                items.borrow().len().hash(state);
            }
            Value::Map(entries) => {
                for (k, v) in entries.borrow().iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Value::Func(f) => f.addr().hash(state),
            Value::Foreign(v) => Rc::as_ptr(v).cast::<()>().hash(state),
        }
    }
}

fn write_str_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for c in s.chars() {
        match c {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value], open: &str, close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str(close)
}

/// Canonical rendering of values, used verbatim in diagnostics and traces.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x:?}"),
            Value::Str(s) => write_str_literal(f, s),
            Value::List(items) => write_seq(f, &items.borrow(), "[", "]"),
            Value::Tuple(items) => write_seq(f, items, "(", ")"),
            Value::Set(items) => {
                let items = items.borrow();
                if items.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("}")
            }
            Value::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.borrow().iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Func(func) => write!(f, "{func}"),
            Value::Foreign(v) => write!(f, "<{} {:?}>", v.type_name(), v),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::list(items)
    }
}
