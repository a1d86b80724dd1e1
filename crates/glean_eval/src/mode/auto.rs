//! Auto mode: data shapes as transformation templates.

use glean_value::{Flow, Value, ValueMap};

use crate::error::GleanError;
use crate::exec;
use crate::path::Path;
use crate::registry::Handler;
use crate::scope::Scope;
use crate::spec::Spec;

pub(super) fn interpret(
    target: &Value,
    spec: &Spec,
    scope: &Scope,
) -> Result<Flow, GleanError> {
    match spec {
        Spec::Text(text) => {
            let path = Path::from_text(text);
            exec::replay(target, path.expr(), scope)
        }
        Spec::Map(pairs) => interpret_map(target, pairs, scope),
        Spec::List(elems) => interpret_seq(target, elems, scope),
        Spec::Tuple(steps) => interpret_pipeline(target, steps, scope),
        Spec::Call(func) => super::invoke(func, target),
        Spec::Lit(v) => Err(GleanError::malformed(format!(
            "literal {v} is not a transformation; wrap it in Fill"
        ))),
        Spec::Set(_) => Err(GleanError::malformed(
            "set specs construct literals and require Fill mode",
        )),
        // Mode-independent variants never reach the mode.
        other => exec::dispatch(target, other, scope),
    }
}

/// Mapping template: each pair runs against the same target, in
/// insertion order. Literal-looking keys stay literal.
fn interpret_map(
    target: &Value,
    pairs: &[(Spec, Spec)],
    scope: &Scope,
) -> Result<Flow, GleanError> {
    let mut out = ValueMap::default();
    for (key_spec, value_spec) in pairs {
        let key = match key_spec {
            Spec::Lit(v) => v.clone(),
            Spec::Text(s) => Value::string(s.as_ref()),
            other => match exec::evaluate_spec(target, other, scope)? {
                Flow::Value(v) => v,
                Flow::Skip => continue,
                Flow::Stop => break,
            },
        };
        match exec::evaluate_spec(target, value_spec, scope)? {
            Flow::Value(v) => {
                out.insert(key, v);
            }
            Flow::Skip => continue,
            Flow::Stop => break,
        }
    }
    Ok(Flow::Value(Value::Map(glean_value::Heap::new(out))))
}

/// Sequence template: a single element spec applied to every element the
/// target iterates into.
fn interpret_seq(
    target: &Value,
    elems: &[Spec],
    scope: &Scope,
) -> Result<Flow, GleanError> {
    let [template] = elems else {
        return Err(GleanError::malformed(format!(
            "sequence templates take exactly one element spec, got {}",
            elems.len()
        )));
    };
    let registry = scope.registry();
    let handler = registry.resolve_or_err(target, "iterate", &Path::new(vec![]))?;
    let items = match handler {
        Handler::Iterate(f) | Handler::Keys(f) => {
            f(target).map_err(|message| GleanError::wrapped("iterate", message))?
        }
        _ => {
            return Err(GleanError::malformed(
                "registered 'iterate' handler has the wrong shape",
            ));
        }
    };
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        match exec::evaluate_spec(&item, template, scope)? {
            Flow::Value(v) => out.push(v),
            Flow::Skip => continue,
            Flow::Stop => break,
        }
    }
    Ok(Flow::Value(Value::list(out)))
}

/// Pipeline: each step consumes the previous step's output. Later steps
/// rebase their scope on the previous step's deepest frame so the trace
/// reads as one spine and recovered failures do not fork it.
fn interpret_pipeline(
    target: &Value,
    steps: &[Spec],
    scope: &Scope,
) -> Result<Flow, GleanError> {
    let mut current = target.clone();
    let mut hop = scope.clone();
    for step in steps {
        match exec::evaluate_spec(&current, step, &hop)? {
            Flow::Value(v) => current = v,
            Flow::Skip => {}
            Flow::Stop => break,
        }
        hop = hop.deepest_child();
        hop.clear_child_errors();
        // Sequence steps manage their own per-item path segments.
        if !matches!(step, Spec::List(_)) {
            hop.push_path_segment(step.to_string());
        }
    }
    Ok(Flow::Value(current))
}
