//! The specification union: what the evaluator can be asked to run.
//!
//! A spec is a closed tagged union with a single match dispatch in the
//! evaluator core. Host code extends the engine through `SpecNode` (one
//! method: evaluate against a target and scope) rather than through
//! structural probing.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use glean_value::{Flow, FuncValue, Value};

use crate::error::GleanError;
use crate::path::{Path, PathExpr};
use crate::scope::Scope;

/// Custom spec extension point.
///
/// Implementors receive the current target and the evaluation scope and
/// produce a step result; everything else (scope chaining, error
/// bookkeeping, trace recording) is handled by the evaluator around them.
pub trait SpecNode: fmt::Debug {
    /// Evaluate this spec against `target` in `scope`.
    fn evaluate(&self, target: &Value, scope: &Scope) -> Result<Flow, GleanError>;
}

/// A declarative specification of how to derive a result from a target.
#[derive(Clone)]
pub enum Spec {
    /// Deferred path expression (`T`/`S`/`A`-rooted).
    Expr(PathExpr),
    /// Ordered access path.
    Path(Path),
    /// Dotted-path text shorthand (`"a.b.c"`) in Auto mode; a literal
    /// string in Fill mode.
    Text(Rc<str>),
    /// Mapping spec: evaluated per key/value pair in insertion order.
    Map(Rc<[(Spec, Spec)]>),
    /// List spec: a one-element template in Auto mode, a literal list in
    /// Fill mode.
    List(Rc<[Spec]>),
    /// Tuple spec: a sequential pipeline in Auto mode, a literal tuple in
    /// Fill mode.
    Tuple(Rc<[Spec]>),
    /// Set spec: literal set construction (Fill mode only).
    Set(Rc<[Spec]>),
    /// Bare callable, invoked with the target.
    Call(FuncValue),
    /// Literal value, returned as-is by Fill mode.
    Lit(Value),
    /// Mode switch: interpret the inner spec in Auto mode.
    Auto(Rc<Spec>),
    /// Mode switch: interpret the inner spec in Fill mode.
    Fill(Rc<Spec>),
    /// Host-defined spec behavior.
    Custom(Rc<dyn SpecNode>),
}

impl Spec {
    /// Wrap a plain closure as a callable spec.
    pub fn func(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Value, String> + 'static,
    ) -> Spec {
        Spec::Call(FuncValue::new(name, f))
    }

    /// Wrap a closure that may emit `Skip`/`Stop` as a callable spec.
    pub fn control_func(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Flow, String> + 'static,
    ) -> Spec {
        Spec::Call(FuncValue::control(name, f))
    }

    /// Literal value spec.
    pub fn lit(v: impl Into<Value>) -> Spec {
        Spec::Lit(v.into())
    }

    /// Interpret `inner` in Auto mode regardless of the ambient mode.
    pub fn auto(inner: Spec) -> Spec {
        Spec::Auto(Rc::new(inner))
    }

    /// Interpret `inner` in Fill (literal-construction) mode.
    pub fn fill(inner: Spec) -> Spec {
        Spec::Fill(Rc::new(inner))
    }

    /// Wrap a host-defined spec behavior.
    pub fn custom(node: impl SpecNode + 'static) -> Spec {
        Spec::Custom(Rc::new(node))
    }
}

/// Build a mapping spec from key/value pairs, keeping insertion order.
pub fn map_spec(pairs: Vec<(Spec, Spec)>) -> Spec {
    Spec::Map(pairs.into())
}

/// Build a one-element templating sequence spec.
pub fn seq(template: Spec) -> Spec {
    Spec::List(Rc::from(vec![template]))
}

/// Build a list spec from explicit elements.
pub fn list_of(elems: Vec<Spec>) -> Spec {
    Spec::List(elems.into())
}

/// Build a sequential pipeline spec.
pub fn pipeline(steps: Vec<Spec>) -> Spec {
    Spec::Tuple(steps.into())
}

/// Build a set spec from explicit elements.
pub fn set_of(elems: Vec<Spec>) -> Spec {
    Spec::Set(elems.into())
}

impl From<&str> for Spec {
    fn from(s: &str) -> Self {
        Spec::Text(Rc::from(s))
    }
}

impl From<String> for Spec {
    fn from(s: String) -> Self {
        Spec::Text(Rc::from(s.as_str()))
    }
}

impl From<PathExpr> for Spec {
    fn from(e: PathExpr) -> Self {
        Spec::Expr(e)
    }
}

impl From<Path> for Spec {
    fn from(p: Path) -> Self {
        Spec::Path(p)
    }
}

impl From<FuncValue> for Spec {
    fn from(f: FuncValue) -> Self {
        Spec::Call(f)
    }
}

impl From<Value> for Spec {
    fn from(v: Value) -> Self {
        Spec::Lit(v)
    }
}

fn write_pairs(f: &mut fmt::Formatter<'_>, pairs: &[(Spec, Spec)]) -> fmt::Result {
    f.write_str("{")?;
    for (i, (k, v)) in pairs.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{k}: {v}")?;
    }
    f.write_str("}")
}

fn write_elems(f: &mut fmt::Formatter<'_>, elems: &[Spec], open: &str, close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, e) in elems.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{e}")?;
    }
    f.write_str(close)
}

/// Canonical rendering of specs, used verbatim in error traces.
impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spec::Expr(e) => write!(f, "{e}"),
            Spec::Path(p) => write!(f, "{p}"),
            Spec::Text(s) => write!(f, "{}", Value::string(s.as_ref())),
            Spec::Map(pairs) => write_pairs(f, pairs),
            Spec::List(elems) => write_elems(f, elems, "[", "]"),
            Spec::Tuple(elems) => write_elems(f, elems, "(", ")"),
            Spec::Set(elems) => write_elems(f, elems, "{", "}"),
            Spec::Call(func) => write!(f, "{func}"),
            Spec::Lit(v) => write!(f, "{v}"),
            Spec::Auto(inner) => write!(f, "Auto({inner})"),
            Spec::Fill(inner) => write!(f, "Fill({inner})"),
            Spec::Custom(node) => write!(f, "{node:?}"),
        }
    }
}

impl fmt::Debug for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// Structural equality; callables and custom nodes compare by identity.
impl PartialEq for Spec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Spec::Expr(a), Spec::Expr(b)) => a == b,
            (Spec::Path(a), Spec::Path(b)) => a == b,
            (Spec::Text(a), Spec::Text(b)) => a == b,
            (Spec::Map(a), Spec::Map(b)) => a == b,
            (Spec::List(a), Spec::List(b)) => a == b,
            (Spec::Tuple(a), Spec::Tuple(b)) => a == b,
            (Spec::Set(a), Spec::Set(b)) => a == b,
            (Spec::Call(a), Spec::Call(b)) => a == b,
            (Spec::Lit(a), Spec::Lit(b)) => a == b,
            (Spec::Auto(a), Spec::Auto(b)) => a == b,
            (Spec::Fill(a), Spec::Fill(b)) => a == b,
            (Spec::Custom(a), Spec::Custom(b)) => {
                std::ptr::eq(Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>())
            }
            _ => false,
        }
    }
}

impl Eq for Spec {}

impl Hash for Spec {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Spec::Expr(e) => e.hash(state),
            Spec::Path(p) => p.hash(state),
            Spec::Text(s) => s.hash(state),
            Spec::Map(pairs) => pairs.hash(state),
            Spec::List(elems) | Spec::Tuple(elems) | Spec::Set(elems) => elems.hash(state),
            Spec::Call(f) => f.addr().hash(state),
            Spec::Lit(v) => v.hash(state),
            Spec::Auto(inner) | Spec::Fill(inner) => inner.hash(state),
            Spec::Custom(node) => Rc::as_ptr(node).cast::<()>().hash(state),
        }
    }
}
