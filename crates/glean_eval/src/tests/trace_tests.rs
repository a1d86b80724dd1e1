//! Failure traces attached to top-level errors.
//!
//! Relocated from `trace.rs` per coding guidelines (>200 lines).

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use glean_value::{Flow, Value};

use crate::error::GleanError;
use crate::eval::{evaluate, Evaluation};
use crate::exec::evaluate_spec;
use crate::scope::Scope;
use crate::spec::{map_spec, Spec, SpecNode};

fn nested_target() -> Value {
    Value::map(vec![(
        Value::string("a"),
        Value::map(vec![(Value::string("b"), Value::Int(5))]),
    )])
}

#[test]
fn failed_evaluations_carry_a_rendered_trace() {
    let err = evaluate(&nested_target(), &Spec::from("a.c")).unwrap_err();
    let rendered = err.to_string();
    assert!(
        rendered.starts_with("Target-spec trace (most recent last):"),
        "{rendered}"
    );
    assert!(rendered.contains(" - Target: {'a': {'b': 5}}"), "{rendered}");
    assert!(rendered.contains(" + Spec: 'a.c'"), "{rendered}");
    assert!(
        rendered.ends_with(
            "glean.PathAccessError: could not access 'c', part 1 of \
             Path('a', 'c'), got error: \"key not found: 'c'\""
        ),
        "{rendered}"
    );
}

#[test]
fn unchanged_targets_are_not_repeated() {
    let err = evaluate(
        &nested_target(),
        &map_spec(vec![(Spec::from("out"), Spec::from("a.c"))]),
    )
    .unwrap_err();
    let rendered = err.to_string();
    let target_lines = rendered
        .lines()
        .filter(|line| line.trim_start().starts_with("- Target:"))
        .count();
    assert_eq!(target_lines, 1, "{rendered}");
}

#[test]
fn long_values_are_clipped_with_a_length_marker() {
    let big = Value::list((0..200).map(Value::Int).collect());
    let target = Value::map(vec![(Value::string("xs"), big)]);
    let err = Evaluation::new()
        .max_trace_width(40)
        .run(&target, &Spec::from("xs.missing"))
        .unwrap_err();
    assert!(err.to_string().contains("... (len="), "{err}");
}

/// Tries sub-specs in order, keeping the first success.
#[derive(Debug)]
struct FirstOf(Vec<Spec>);

impl SpecNode for FirstOf {
    fn evaluate(&self, target: &Value, scope: &Scope) -> Result<Flow, GleanError> {
        let mut last = None;
        for spec in &self.0 {
            match evaluate_spec(target, spec, scope) {
                Ok(flow) => return Ok(flow),
                Err(err) => last = Some(err),
            }
        }
        match last {
            Some(err) => Err(err),
            None => Err(GleanError::malformed("no alternatives given")),
        }
    }
}

#[test]
fn custom_nodes_can_recover_from_branch_failures() {
    let spec = Spec::custom(FirstOf(vec![
        Spec::from("missing"),
        Spec::from("a.b"),
    ]));
    assert_eq!(evaluate(&nested_target(), &spec).unwrap(), Value::Int(5));
}

#[test]
fn multiple_failed_branches_fork_the_trace() {
    let spec = Spec::custom(FirstOf(vec![
        Spec::from("nope"),
        Spec::from("also.nope"),
    ]));
    let err = evaluate(&nested_target(), &spec).unwrap_err();
    let rendered = err.to_string();
    assert!(rendered.contains("| Branch 1:"), "{rendered}");
    assert!(rendered.contains("\\ Branch 2:"), "{rendered}");
    assert!(rendered.contains("+ Spec: 'nope'"), "{rendered}");
    assert!(rendered.contains("+ Spec: 'also.nope'"), "{rendered}");
}

#[test]
fn callable_failures_surface_as_wrapped_errors() {
    let spec = Spec::func("boom", |_| Err("it broke".to_owned()));
    let err = evaluate(&Value::Null, &spec).unwrap_err();
    assert!(
        err.to_string()
            .ends_with("glean.WrappedError: error from boom: it broke"),
        "{err}"
    );
}

#[test]
fn trace_snapshot_is_plain_data() {
    let err = evaluate(&nested_target(), &Spec::from("a.c")).unwrap_err();
    let trace = err.trace().unwrap().clone();
    // A cloned snapshot renders identically with the error long gone.
    let head = err.to_string();
    drop(err);
    assert!(head.starts_with(&trace.to_string()), "{trace}");
}
