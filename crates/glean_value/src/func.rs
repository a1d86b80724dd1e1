//! Named native functions embeddable in targets and specs.

use std::fmt;
use std::rc::Rc;

use crate::flow::Flow;
use crate::value::Value;

/// Full native call signature: positional arguments plus named arguments.
pub type RawFn = dyn Fn(&[Value], &[(Rc<str>, Value)]) -> Result<Flow, String>;

/// A named native function value.
///
/// Functions are opaque to the engine: they are invoked, never inspected.
/// The `String` error channel carries arbitrary user-code failures, which
/// the evaluator wraps into its own error type at the call boundary.
#[derive(Clone)]
pub struct FuncValue {
    name: Rc<str>,
    func: Rc<RawFn>,
}

impl FuncValue {
    /// Create a function from a plain value-returning closure.
    ///
    /// Named arguments are not visible to closures created this way; use
    /// [`FuncValue::with_kwargs`] when they matter.
    pub fn new(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        FuncValue {
            name: name.into(),
            func: Rc::new(move |args, _kwargs| f(args).map(Flow::Value)),
        }
    }

    /// Create a function that can emit `Skip`/`Stop` control signals.
    pub fn control(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value]) -> Result<Flow, String> + 'static,
    ) -> Self {
        FuncValue {
            name: name.into(),
            func: Rc::new(move |args, _kwargs| f(args)),
        }
    }

    /// Create a function receiving both positional and named arguments.
    pub fn with_kwargs(
        name: impl Into<Rc<str>>,
        f: impl Fn(&[Value], &[(Rc<str>, Value)]) -> Result<Flow, String> + 'static,
    ) -> Self {
        FuncValue {
            name: name.into(),
            func: Rc::new(f),
        }
    }

    /// Invoke the function.
    #[inline]
    pub fn call(&self, args: &[Value], kwargs: &[(Rc<str>, Value)]) -> Result<Flow, String> {
        (self.func)(args, kwargs)
    }

    /// The function's display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable address used for identity comparison and hashing.
    #[inline]
    pub fn addr(&self) -> *const () {
        Rc::as_ptr(&self.func).cast::<()>()
    }
}

// Identity semantics: two functions are the same function only if they
// share the same closure allocation.
impl PartialEq for FuncValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.addr(), other.addr())
    }
}

impl fmt::Display for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<func {}>", self.name)
    }
}

impl fmt::Debug for FuncValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FuncValue").field("name", &self.name).finish()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;

    #[test]
    fn plain_function_wraps_value() {
        let double = FuncValue::new("double", |args| match args {
            [Value::Int(n)] => Ok(Value::int(n * 2)),
            _ => Err("double expects one int".to_string()),
        });
        assert_eq!(
            double.call(&[Value::int(4)], &[]).unwrap(),
            Flow::Value(Value::int(8))
        );
        assert!(double.call(&[Value::Null], &[]).is_err());
    }

    #[test]
    fn control_function_emits_signals() {
        let gate = FuncValue::control("gate", |args| match args {
            [Value::Int(n)] if *n < 5 => Ok(Flow::Value(Value::int(*n))),
            _ => Ok(Flow::Stop),
        });
        assert_eq!(
            gate.call(&[Value::int(3)], &[]).unwrap(),
            Flow::Value(Value::int(3))
        );
        assert_eq!(gate.call(&[Value::int(9)], &[]).unwrap(), Flow::Stop);
    }

    #[test]
    fn equality_is_identity() {
        let a = FuncValue::new("id", |args| Ok(args[0].clone()));
        let b = FuncValue::new("id", |args| Ok(args[0].clone()));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn display_shows_name() {
        let f = FuncValue::new("abs", |args| Ok(args[0].clone()));
        assert_eq!(f.to_string(), "<func abs>");
    }
}
