//! Mode interpretation of the data-shaped spec variants.
//!
//! Relocated from `mode/auto.rs` per coding guidelines (>200 lines).

#![expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]

use pretty_assertions::assert_eq;

use glean_value::{Flow, Value};

use crate::error::GleanErrorKind;
use crate::eval::evaluate;
use crate::spec::{map_spec, pipeline, seq, set_of, Spec};

fn range_target(n: i64) -> Value {
    Value::list((0..n).map(Value::Int).collect())
}

#[test]
fn map_template_reads_each_pair_from_the_same_target() {
    let target = Value::map(vec![
        (Value::string("first"), Value::string("ann")),
        (Value::string("last"), Value::string("perkins")),
    ]);
    let spec = map_spec(vec![
        (Spec::from("given"), Spec::from("first")),
        (Spec::from("family"), Spec::from("last")),
    ]);
    assert_eq!(
        evaluate(&target, &spec).unwrap(),
        Value::map(vec![
            (Value::string("given"), Value::string("ann")),
            (Value::string("family"), Value::string("perkins")),
        ])
    );
}

#[test]
fn skipped_map_entries_leave_an_empty_map() {
    let target = Value::Int(0);
    let spec = map_spec(vec![(
        Spec::from("a"),
        Spec::control_func("always_skip", |_| Ok(Flow::Skip)),
    )]);
    assert_eq!(evaluate(&target, &spec).unwrap(), Value::map(vec![]));
}

#[test]
fn stop_in_a_map_ends_the_remaining_pairs() {
    let target = Value::Int(0);
    let spec = map_spec(vec![
        (Spec::from("a"), Spec::fill(Spec::lit(1))),
        (
            Spec::from("b"),
            Spec::control_func("always_stop", |_| Ok(Flow::Stop)),
        ),
        (Spec::from("c"), Spec::fill(Spec::lit(3))),
    ]);
    assert_eq!(
        evaluate(&target, &spec).unwrap(),
        Value::map(vec![(Value::string("a"), Value::Int(1))])
    );
}

#[test]
fn sequence_template_maps_over_the_target() {
    let target = range_target(4);
    let double = Spec::func("double", |args| match &args[0] {
        Value::Int(n) => Ok(Value::Int(n * 2)),
        other => Err(format!("'{}' is not an int", other.type_name())),
    });
    assert_eq!(
        evaluate(&target, &seq(double)).unwrap(),
        Value::list(vec![
            Value::Int(0),
            Value::Int(2),
            Value::Int(4),
            Value::Int(6),
        ])
    );
}

#[test]
fn stop_truncates_a_sequence_template() {
    let target = range_target(10);
    let below_five = Spec::control_func("below_five", |args| match &args[0] {
        Value::Int(n) if *n < 5 => Ok(Flow::Value(Value::Int(*n))),
        Value::Int(_) => Ok(Flow::Stop),
        other => Err(format!("'{}' is not an int", other.type_name())),
    });
    assert_eq!(
        evaluate(&target, &seq(below_five)).unwrap(),
        Value::list((0..5).map(Value::Int).collect())
    );
}

#[test]
fn skip_drops_sequence_elements() {
    let target = range_target(6);
    let evens = Spec::control_func("evens", |args| match &args[0] {
        Value::Int(n) if n % 2 == 0 => Ok(Flow::Value(Value::Int(*n))),
        Value::Int(_) => Ok(Flow::Skip),
        other => Err(format!("'{}' is not an int", other.type_name())),
    });
    assert_eq!(
        evaluate(&target, &seq(evens)).unwrap(),
        Value::list(vec![Value::Int(0), Value::Int(2), Value::Int(4)])
    );
}

#[test]
fn sequence_template_requires_exactly_one_element() {
    let spec = Spec::List([Spec::from("a"), Spec::from("b")].into());
    let err = evaluate(&range_target(3), &spec).unwrap_err();
    assert!(matches!(err.kind(), GleanErrorKind::Malformed(_)), "{err:?}");
}

#[test]
fn sequence_template_over_a_scalar_is_unregistered() {
    let err = evaluate(&Value::Int(3), &seq(Spec::from("a"))).unwrap_err();
    assert!(
        matches!(err.kind(), GleanErrorKind::Unregistered(_)),
        "{err:?}"
    );
}

#[test]
fn bare_literals_are_malformed_in_auto_mode() {
    let err = evaluate(&Value::Int(1), &Spec::lit(5)).unwrap_err();
    assert!(matches!(err.kind(), GleanErrorKind::Malformed(_)), "{err:?}");
}

#[test]
fn fill_mode_builds_data_shapes_literally() {
    let target = Value::map(vec![(Value::string("n"), Value::Int(2))]);
    let spec = Spec::fill(map_spec(vec![
        (Spec::from("tag"), Spec::from("fixed")),
        (
            Spec::from("values"),
            Spec::List([Spec::from("n"), Spec::lit(9)].into()),
        ),
    ]));
    // Inside Fill, text is literal; only explicit specs read the target.
    assert_eq!(
        evaluate(&target, &spec).unwrap(),
        Value::map(vec![
            (Value::string("tag"), Value::string("fixed")),
            (
                Value::string("values"),
                Value::list(vec![Value::string("n"), Value::Int(9)]),
            ),
        ])
    );
}

#[test]
fn fill_set_collects_distinct_values() {
    let spec = Spec::fill(set_of(vec![
        Spec::lit(1),
        Spec::lit(2),
        Spec::lit(1),
    ]));
    assert_eq!(
        evaluate(&Value::Null, &spec).unwrap(),
        Value::set(vec![Value::Int(1), Value::Int(2)])
    );
}

#[test]
fn set_specs_are_malformed_in_auto_mode() {
    let spec = set_of(vec![Spec::lit(1)]);
    let err = evaluate(&Value::Null, &spec).unwrap_err();
    assert!(matches!(err.kind(), GleanErrorKind::Malformed(_)), "{err:?}");
}

#[test]
fn auto_reenters_inside_fill() {
    let target = Value::map(vec![(Value::string("k"), Value::Int(3))]);
    let spec = Spec::fill(Spec::Tuple(
        [Spec::from("k"), Spec::auto(Spec::from("k"))].into(),
    ));
    assert_eq!(
        evaluate(&target, &spec).unwrap(),
        Value::tuple(vec![Value::string("k"), Value::Int(3)])
    );
}

#[test]
fn pipeline_skip_keeps_the_previous_value() {
    let target = Value::Int(4);
    let spec = pipeline(vec![
        Spec::control_func("noop_skip", |_| Ok(Flow::Skip)),
        Spec::func("incr", |args| match &args[0] {
            Value::Int(n) => Ok(Value::Int(n + 1)),
            other => Err(format!("'{}' is not an int", other.type_name())),
        }),
    ]);
    assert_eq!(evaluate(&target, &spec).unwrap(), Value::Int(5));
}

#[test]
fn pipeline_stop_keeps_the_value_so_far() {
    let target = Value::Int(4);
    let spec = pipeline(vec![
        Spec::func("incr", |args| match &args[0] {
            Value::Int(n) => Ok(Value::Int(n + 1)),
            other => Err(format!("'{}' is not an int", other.type_name())),
        }),
        Spec::control_func("halt", |_| Ok(Flow::Stop)),
        Spec::func("never", |_| Err("unreachable step".to_owned())),
    ]);
    assert_eq!(evaluate(&target, &spec).unwrap(), Value::Int(5));
}

#[test]
fn nested_templates_compose() {
    let target = Value::map(vec![(
        Value::string("pts"),
        Value::list(vec![
            Value::map(vec![(Value::string("x"), Value::Int(1))]),
            Value::map(vec![(Value::string("x"), Value::Int(2))]),
        ]),
    )]);
    let spec = map_spec(vec![(
        Spec::from("xs"),
        pipeline(vec![Spec::from("pts"), seq(Spec::from("x"))]),
    )]);
    assert_eq!(
        evaluate(&target, &spec).unwrap(),
        Value::map(vec![(
            Value::string("xs"),
            Value::list(vec![Value::Int(1), Value::Int(2)]),
        )])
    );
}
