//! Concrete-type tokens and the foreign-value extension trait.
//!
//! Rust has no runtime subclassing, so the engine's "subclass-aware"
//! dispatch works over *declared* ancestry: every tag implicitly descends
//! from `Any`, and foreign types may name their own ancestor chain.

use std::any::{Any, TypeId};
use std::fmt;

use crate::value::Value;

/// Token identifying the concrete type of a value.
///
/// Used as the key of the dispatch registry's per-operation type tables.
/// One tag exists per `Value` variant, plus `Any` (the universal ancestor)
/// and one `Foreign` tag per host type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    /// Universal ancestor of every other tag.
    Any,
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Tuple,
    Set,
    Map,
    Func,
    /// Host-provided type, identified by its `TypeId`.
    Foreign(TypeId),
}

impl TypeTag {
    /// The tag of a concrete host type.
    pub fn foreign<T: 'static>() -> Self {
        TypeTag::Foreign(TypeId::of::<T>())
    }

    /// Builtin display name; foreign tags are named by the registry.
    pub fn builtin_name(self) -> Option<&'static str> {
        match self {
            TypeTag::Any => Some("any"),
            TypeTag::Null => Some("null"),
            TypeTag::Bool => Some("bool"),
            TypeTag::Int => Some("int"),
            TypeTag::Float => Some("float"),
            TypeTag::Str => Some("str"),
            TypeTag::List => Some("list"),
            TypeTag::Tuple => Some("tuple"),
            TypeTag::Set => Some("set"),
            TypeTag::Map => Some("map"),
            TypeTag::Func => Some("func"),
            TypeTag::Foreign(_) => None,
        }
    }
}

/// Extension point for host values carried through evaluation opaquely.
///
/// Foreign values participate in attribute access and typed dispatch; all
/// other operations come from handlers registered for their tag.
pub trait ForeignValue: fmt::Debug {
    /// Display name used in error messages.
    fn type_name(&self) -> &'static str;

    /// Downcast support; also the source of this value's `TypeId` tag.
    fn as_any(&self) -> &dyn Any;

    /// Attribute lookup (`T.name` on this value). Default: no attributes.
    fn attr(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Declared ancestor tags, nearest first, standing in for subclass
    /// introspection. `Any` is always appended implicitly by the registry.
    fn ancestor_tags(&self) -> Vec<TypeTag> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Point {
        x: i64,
        y: i64,
    }

    impl ForeignValue for Point {
        fn type_name(&self) -> &'static str {
            "Point"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn attr(&self, name: &str) -> Option<Value> {
            match name {
                "x" => Some(Value::int(self.x)),
                "y" => Some(Value::int(self.y)),
                _ => None,
            }
        }
    }

    #[test]
    fn foreign_tag_is_per_type() {
        let p = Value::foreign(Point { x: 1, y: 2 });
        assert_eq!(p.type_tag(), TypeTag::foreign::<Point>());
        assert_ne!(p.type_tag(), TypeTag::Any);
    }

    #[test]
    fn foreign_attr_lookup() {
        let p = Point { x: 3, y: 4 };
        assert_eq!(p.attr("x"), Some(Value::int(3)));
        assert_eq!(p.attr("z"), None);
    }

    #[test]
    fn builtin_names() {
        assert_eq!(TypeTag::Map.builtin_name(), Some("map"));
        assert_eq!(TypeTag::foreign::<Point>().builtin_name(), None);
    }
}
