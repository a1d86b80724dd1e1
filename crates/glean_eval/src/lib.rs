//! Declarative data transformation.
//!
//! A spec describes how to derive a result from a nested target value:
//! dotted-path text reads through keyed containers, deferred `T`/`S`/`A`
//! expressions record access chains for later replay, and data-shaped
//! specs act as templates (Auto mode) or literal constructors (Fill
//! mode). Dispatch to unfamiliar target types goes through a
//! registry that hosts extend with their own handlers, and failures
//! carry a branch-aware trace of every step that led to them.
//!
//! ```
//! use glean_eval::{evaluate, map_spec, Spec};
//! use glean_value::Value;
//!
//! let target = Value::map(vec![(
//!     Value::string("a"),
//!     Value::map(vec![(Value::string("b"), Value::Int(5))]),
//! )]);
//! let spec = map_spec(vec![(Spec::from("b"), Spec::from("a.b"))]);
//! let result = evaluate(&target, &spec).unwrap();
//! assert_eq!(
//!     result,
//!     Value::map(vec![(Value::string("b"), Value::Int(5))])
//! );
//! ```

mod error;
mod eval;
mod exec;
mod mode;
pub mod path;
pub mod registry;
mod scope;
mod spec;
mod trace;

#[cfg(test)]
mod tests;

pub use error::{
    GleanError, GleanErrorKind, PathAccessError, PathAssignError, UnregisteredTarget,
};
pub use eval::{evaluate, register, register_op, CompiledSpec, Evaluation};
pub use exec::evaluate_spec;
pub use mode::Mode;
pub use path::{a, parse_expr, s, t, Path, PathExpr, PathOp, Root};
pub use registry::{Handler, OpSupport, Registration, Registry, Resolution};
pub use scope::Scope;
pub use spec::{list_of, map_spec, pipeline, seq, set_of, Spec, SpecNode};
pub use trace::{TraceSnapshot, TraceStep, DEFAULT_MAX_WIDTH};
