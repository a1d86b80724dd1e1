//! Property-based tests for path expressions and dotted-path text.
//!
//! These tests use proptest to generate random access chains and verify:
//! 1. Round-trip: rendered expressions re-parse to equal expressions
//! 2. Prefix: truncation agrees with the recorded operation list
//! 3. Plumbing: a dotted path built from random keys reads back the
//!    value it was planted over

#![allow(clippy::unwrap_used, clippy::expect_used, reason = "Tests can panic")]

use glean_eval::{evaluate, parse_expr, t, Path, PathExpr, Spec};
use glean_value::Value;
use proptest::prelude::*;

/// Generate a bare identifier, valid both as an attribute name and as a
/// dotted-path segment.
fn identifier_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_]{0,11}").expect("valid regex")
}

#[derive(Debug, Clone)]
enum StepKind {
    Attr(String),
    StrItem(String),
    IntItem(i64),
    Star,
}

fn step_strategy() -> impl Strategy<Value = StepKind> {
    prop_oneof![
        4 => identifier_strategy().prop_map(StepKind::Attr),
        2 => "[a-z ]{0,8}".prop_map(StepKind::StrItem),
        2 => (-99i64..99).prop_map(StepKind::IntItem),
        1 => Just(StepKind::Star),
    ]
}

fn build(steps: &[StepKind]) -> PathExpr {
    let mut expr = t();
    for step in steps {
        expr = match step {
            StepKind::Attr(name) => expr.attr(name.as_str()),
            StepKind::StrItem(s) => expr.item(Value::string(s.as_str())),
            StepKind::IntItem(n) => expr.item(Value::Int(*n)),
            StepKind::Star => expr.star(),
        };
    }
    expr
}

proptest! {
    #[test]
    fn rendered_expressions_reparse_equal(steps in prop::collection::vec(step_strategy(), 0..8)) {
        let expr = build(&steps);
        let rendered = expr.to_string();
        let reparsed = parse_expr(&rendered).expect(&rendered);
        prop_assert_eq!(reparsed, expr);
    }

    #[test]
    fn prefix_agrees_with_the_operation_list(
        steps in prop::collection::vec(step_strategy(), 0..8),
        cut in 0usize..10,
    ) {
        let expr = build(&steps);
        let prefix = expr.prefix(cut);
        let expected = cut.min(expr.len());
        prop_assert_eq!(prefix.len(), expected);
        let ops = expr.ops();
        let prefix_ops = prefix.ops();
        prop_assert_eq!(&prefix_ops[..], &ops[..expected]);
    }

    #[test]
    fn extending_never_disturbs_the_base(
        steps in prop::collection::vec(identifier_strategy(), 1..6),
        extra in identifier_strategy(),
    ) {
        let mut expr = t();
        for name in &steps {
            expr = expr.attr(name.as_str());
        }
        let before = expr.clone();
        let _extended = expr.attr(extra.as_str());
        prop_assert_eq!(expr, before);
    }

    #[test]
    fn dotted_text_reads_back_a_planted_value(
        segments in prop::collection::vec(identifier_strategy(), 1..5),
        leaf in any::<i64>(),
    ) {
        let mut value = Value::Int(leaf);
        for segment in segments.iter().rev() {
            value = Value::map(vec![(Value::string(segment.as_str()), value)]);
        }
        let text = segments.join(".");
        let result = evaluate(&value, &Spec::from(text.as_str())).unwrap();
        prop_assert_eq!(result, Value::Int(leaf));

        let path = Path::new(
            segments
                .iter()
                .map(|s| Value::string(s.as_str()))
                .collect(),
        );
        let via_path = evaluate(&value, &Spec::Path(path)).unwrap();
        prop_assert_eq!(via_path, Value::Int(leaf));
    }
}
