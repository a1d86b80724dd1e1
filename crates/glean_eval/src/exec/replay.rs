//! Path expression replay.
//!
//! Replays a recorded operation chain against live data. Target-rooted
//! expressions walk from the current target, scope-rooted expressions
//! start from a name binding, and assignment expressions write through
//! the chain's final operation.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use smallvec::SmallVec;

use glean_value::{
    access,
    ops::{evaluate_binary, evaluate_unary},
    Flow, FuncValue, Value,
};

use crate::error::GleanError;
use crate::exec::evaluate_spec;
use crate::path::{Path, PathExpr, PathOp, Root};
use crate::registry::Handler;
use crate::scope::Scope;
use crate::spec::Spec;

/// Replay `expr` with `target` as the ambient target.
pub(crate) fn replay(
    target: &Value,
    expr: &PathExpr,
    scope: &Scope,
) -> Result<Flow, GleanError> {
    expr.validate().map_err(GleanError::malformed)?;
    let ops = expr.ops();
    match expr.root() {
        Root::Target => walk(target.clone(), expr, &ops, 0, scope, target),
        Root::Scope => {
            let first = scope_lookup(expr, &ops, scope)?;
            walk(first, expr, &ops, 1, scope, target)
        }
        Root::Assign => assign_replay(target, expr, &ops, scope),
    }
}

fn op_name(op: &PathOp) -> Option<&str> {
    match op {
        PathOp::Attr(name) => Some(name),
        PathOp::Item(Value::Str(name)) | PathOp::Seg(Value::Str(name)) => Some(name),
        _ => None,
    }
}

/// The first operation of a scope-rooted chain names a binding.
fn scope_lookup(
    expr: &PathExpr,
    ops: &[&PathOp],
    scope: &Scope,
) -> Result<Value, GleanError> {
    let path = Path::of_expr(expr.clone());
    let Some(first) = ops.first() else {
        return Err(GleanError::malformed(
            "scope expression needs at least one access",
        ));
    };
    let Some(name) = op_name(first) else {
        return Err(GleanError::access(
            path,
            0,
            format!("scope access needs a name, got {first:?}"),
        ));
    };
    scope.lookup(name).ok_or_else(|| {
        GleanError::access(path, 0, format!("name '{name}' is not defined in scope"))
    })
}

fn walk(
    mut current: Value,
    expr: &PathExpr,
    ops: &[&PathOp],
    start: usize,
    scope: &Scope,
    target: &Value,
) -> Result<Flow, GleanError> {
    let access_err = |idx: usize, cause: String| {
        GleanError::access(Path::of_expr(expr.clone()), idx, cause)
    };
    for idx in start..ops.len() {
        match ops[idx] {
            PathOp::Attr(name) => {
                current = access::attr_get(&current, name)
                    .map_err(|cause| access_err(idx, cause))?;
            }
            PathOp::Item(key) => {
                current = access::item_get(&current, key)
                    .map_err(|cause| access_err(idx, cause))?;
            }
            PathOp::Seg(key) => {
                let context = Path::of_expr(expr.prefix(idx));
                let registry = scope.registry();
                let handler = registry.resolve_or_err(&current, "get", &context)?;
                let Handler::Get(get) = handler else {
                    return Err(GleanError::malformed(
                        "registered 'get' handler has the wrong shape",
                    ));
                };
                current = get(&current, key, &context)
                    .map_err(|cause| access_err(idx, cause))?;
            }
            PathOp::Call { args, kwargs } => {
                let Value::Func(func) = &current else {
                    return Err(access_err(
                        idx,
                        format!("'{}' is not callable", current.type_name()),
                    ));
                };
                let func = func.clone();
                match call(&func, args, kwargs, scope, target, idx, &access_err)? {
                    Flow::Value(v) => current = v,
                    signal => return Ok(signal),
                }
                scope.push_path_segment(format!("{}()", func.name()));
            }
            PathOp::Binary(op, operand) => {
                let rhs = match operand_value(operand, scope, target)? {
                    Flow::Value(v) => v,
                    signal => return Ok(signal),
                };
                current = evaluate_binary(&current, &rhs, *op)
                    .map_err(|cause| access_err(idx, cause))?;
            }
            PathOp::Unary(op) => {
                current = evaluate_unary(&current, *op)
                    .map_err(|cause| access_err(idx, cause))?;
            }
            PathOp::Star => {
                let children = expand(&current, scope);
                return Ok(Flow::Value(Value::list(apply_rest(
                    children, expr, ops, idx, scope, target,
                ))));
            }
            PathOp::DeepStar => {
                let children = expand_deep(&current, scope);
                return Ok(Flow::Value(Value::list(apply_rest(
                    children, expr, ops, idx, scope, target,
                ))));
            }
        }
    }
    Ok(Flow::Value(current))
}

/// Spec arguments of a recorded call, evaluated against the ambient
/// target before invocation.
fn call(
    func: &FuncValue,
    args: &[Spec],
    kwargs: &[(Rc<str>, Spec)],
    scope: &Scope,
    target: &Value,
    idx: usize,
    access_err: &impl Fn(usize, String) -> GleanError,
) -> Result<Flow, GleanError> {
    let mut arg_values = SmallVec::<[Value; 4]>::new();
    for arg in args {
        match operand_value(arg, scope, target)? {
            Flow::Value(v) => arg_values.push(v),
            signal => return Ok(signal),
        }
    }
    let mut kwarg_values = Vec::with_capacity(kwargs.len());
    for (name, arg) in kwargs {
        match operand_value(arg, scope, target)? {
            Flow::Value(v) => kwarg_values.push((Rc::clone(name), v)),
            signal => return Ok(signal),
        }
    }
    func.call(&arg_values, &kwarg_values)
        .map_err(|cause| access_err(idx, cause))
}

fn operand_value(
    operand: &Spec,
    scope: &Scope,
    target: &Value,
) -> Result<Flow, GleanError> {
    match operand {
        // Literals stay cheap: no child scope, no trace step.
        Spec::Lit(v) => Ok(Flow::Value(v.clone())),
        other => evaluate_spec(target, other, scope),
    }
}

/// Apply the operations after a wildcard to each expanded child,
/// keeping only the children whose remainder succeeds.
fn apply_rest(
    children: Vec<Value>,
    expr: &PathExpr,
    ops: &[&PathOp],
    star_idx: usize,
    scope: &Scope,
    target: &Value,
) -> Vec<Value> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        if let Ok(Flow::Value(v)) = walk(child, expr, ops, star_idx + 1, scope, target) {
            out.push(v);
        }
    }
    out
}

/// One level of wildcard expansion: keyed children for keyed shapes,
/// elements otherwise. Unexpandable values expand to nothing.
fn expand(value: &Value, scope: &Scope) -> Vec<Value> {
    let registry = scope.registry();
    if let crate::registry::Resolution::Handler(Handler::Keys(keys)) =
        registry.resolve(value, "keys")
    {
        if let Ok(keys) = keys(value) {
            if let crate::registry::Resolution::Handler(Handler::Get(get)) =
                registry.resolve(value, "get")
            {
                let empty = Path::new(vec![]);
                return keys
                    .iter()
                    .filter_map(|key| get(value, key, &empty).ok())
                    .collect();
            }
        }
        return Vec::new();
    }
    if let crate::registry::Resolution::Handler(Handler::Iterate(iter)) =
        registry.resolve(value, "iterate")
    {
        if let Ok(items) = iter(value) {
            return items;
        }
    }
    Vec::new()
}

/// Recursive wildcard expansion, pre-order, guarded against aliasing
/// cycles by container identity.
fn expand_deep(value: &Value, scope: &Scope) -> Vec<Value> {
    let mut out = Vec::new();
    let mut seen = FxHashSet::default();
    if let Some(id) = value.identity() {
        seen.insert(id);
    }
    descend(value, scope, &mut seen, &mut out);
    out
}

fn descend(
    value: &Value,
    scope: &Scope,
    seen: &mut FxHashSet<*const ()>,
    out: &mut Vec<Value>,
) {
    for child in expand(value, scope) {
        if let Some(id) = child.identity() {
            if !seen.insert(id) {
                continue;
            }
        }
        out.push(child.clone());
        descend(&child, scope, seen, out);
    }
}

/// Assignment replay: single-name chains bind into the scope, longer
/// chains write through the final operation of the resolved object.
fn assign_replay(
    target: &Value,
    expr: &PathExpr,
    ops: &[&PathOp],
    scope: &Scope,
) -> Result<Flow, GleanError> {
    let path = Path::of_expr(expr.clone());
    if let [only] = ops {
        let Some(name) = op_name(only) else {
            return Err(GleanError::assign(
                format!("{only:?}"),
                path,
                "assignment destination needs a name".to_owned(),
            ));
        };
        // Bind outside this step's own frame so sibling steps see it.
        scope.define_in_parent(name, target.clone());
        return Ok(Flow::Value(target.clone()));
    }
    let base = scope_lookup(expr, ops, scope)?;
    let last = ops.len() - 1;
    let destination = match walk(base, expr, &ops[..last], 1, scope, target)? {
        Flow::Value(v) => v,
        signal => return Ok(signal),
    };
    let summary = path.part(last).unwrap_or_else(|| "?".to_owned());
    let result = match ops[last] {
        PathOp::Attr(name) => access::attr_set(&destination, name, target.clone()),
        PathOp::Item(key) => access::item_set(&destination, key, target.clone()),
        PathOp::Seg(key) => {
            let registry = scope.registry();
            let handler = registry.resolve_or_err(&destination, "assign", &path)?;
            let Handler::Assign(assign) = handler else {
                return Err(GleanError::malformed(
                    "registered 'assign' handler has the wrong shape",
                ));
            };
            assign(&destination, key, target.clone())
        }
        other => Err(format!("cannot assign through {other:?}")),
    };
    result.map_err(|cause| GleanError::assign(summary, path, cause))?;
    Ok(Flow::Value(target.clone()))
}
