//! Spec execution.
//!
//! `evaluate_spec` is the single recursion point: it opens a child scope
//! for the step, dispatches on the spec variant, and records the outcome
//! on the parent so failure traces can be reconstructed afterwards.

mod replay;

pub(crate) use replay::replay;

use glean_value::{Flow, Value};

use crate::error::GleanError;
use crate::mode::Mode;
use crate::scope::Scope;
use crate::spec::Spec;

/// Evaluate one spec step in a fresh child of `scope`.
#[tracing::instrument(level = "debug", skip_all)]
pub fn evaluate_spec(
    target: &Value,
    spec: &Spec,
    scope: &Scope,
) -> Result<Flow, GleanError> {
    let child = scope.child();
    child.set_spec(spec.clone());
    child.set_target(target.clone());
    let result = dispatch(target, spec, &child);
    scope.note_child(&child, result.is_err());
    if let Err(err) = &result {
        child.record_error(err.clone());
    }
    result
}

/// Variant dispatch. Deferred expressions, paths, custom nodes, and mode
/// switches are mode-independent; everything else is interpreted by the
/// ambient mode.
pub(crate) fn dispatch(
    target: &Value,
    spec: &Spec,
    scope: &Scope,
) -> Result<Flow, GleanError> {
    match spec {
        Spec::Expr(expr) => replay(target, expr, scope),
        Spec::Path(path) => replay(target, path.expr(), scope),
        Spec::Custom(node) => node.evaluate(target, scope),
        Spec::Auto(inner) => {
            scope.set_mode(Mode::Auto);
            evaluate_spec(target, inner, scope)
        }
        Spec::Fill(inner) => {
            scope.set_mode(Mode::Fill);
            evaluate_spec(target, inner, scope)
        }
        other => scope.mode().interpret(target, other, scope),
    }
}
