//! Fill mode: data shapes build themselves literally, with inner specs
//! still evaluated against the target.

use glean_value::{Flow, Value, ValueMap, ValueSet};

use crate::error::GleanError;
use crate::exec;
use crate::scope::Scope;
use crate::spec::Spec;

pub(super) fn interpret(
    target: &Value,
    spec: &Spec,
    scope: &Scope,
) -> Result<Flow, GleanError> {
    match spec {
        Spec::Text(text) => Ok(Flow::Value(Value::string(text.as_ref()))),
        Spec::Lit(v) => Ok(Flow::Value(v.clone())),
        Spec::Map(pairs) => {
            let mut out = ValueMap::default();
            for (key_spec, value_spec) in pairs.iter() {
                let key = match exec::evaluate_spec(target, key_spec, scope)? {
                    Flow::Value(v) => v,
                    Flow::Skip => continue,
                    Flow::Stop => break,
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
        Spec::List(elems) => elements(target, elems, scope).map(|items| {
            Flow::Value(Value::list(items))
        }),
        Spec::Tuple(elems) => elements(target, elems, scope).map(|items| {
            Flow::Value(Value::tuple(items))
        }),
        Spec::Set(elems) => elements(target, elems, scope).map(|items| {
            Flow::Value(Value::Set(glean_value::Heap::new(
                items.into_iter().collect::<ValueSet>(),
            )))
        }),
        Spec::Call(func) => super::invoke(func, target),
        // Mode-independent variants never reach the mode.
        other => exec::dispatch(target, other, scope),
    }
}

fn elements(
    target: &Value,
    elems: &[Spec],
    scope: &Scope,
) -> Result<Vec<Value>, GleanError> {
    let mut out = Vec::with_capacity(elems.len());
    for elem in elems {
        match exec::evaluate_spec(target, elem, scope)? {
            Flow::Value(v) => out.push(v),
            Flow::Skip => continue,
            Flow::Stop => break,
        }
    }
    Ok(out)
}
