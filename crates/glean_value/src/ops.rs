//! Binary and unary arithmetic over values.
//!
//! Direct enum-based dispatch: the type set is fixed, so pattern matching
//! is preferred over trait objects for exhaustiveness checking. Errors are
//! plain strings wrapped with path context by the evaluator.

use std::rc::Rc;

use crate::value::Value;

/// Binary operator codes usable inside path expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    BitAnd,
    BitOr,
    BitXor,
}

impl BinaryOp {
    /// The operator's source symbol, used in diagnostics and rendering.
    pub fn as_symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Pow => "**",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        }
    }
}

/// Unary operator codes usable inside path expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Neg,
    Invert,
}

impl UnaryOp {
    /// The operator's source symbol.
    pub fn as_symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Invert => "~",
        }
    }
}

fn type_mismatch(op: BinaryOp, left: &Value, right: &Value) -> String {
    format!(
        "unsupported operand types for {}: {} and {}",
        op.as_symbol(),
        left.type_name(),
        right.type_name()
    )
}

/// Checked arithmetic with overflow reporting.
fn checked_arith(result: Option<i64>, op_name: &'static str) -> Result<Value, String> {
    result
        .map(Value::Int)
        .ok_or_else(|| format!("integer overflow in {op_name}"))
}

fn eval_int_binary(a: i64, b: i64, op: BinaryOp) -> Result<Value, String> {
    match op {
        BinaryOp::Add => checked_arith(a.checked_add(b), "addition"),
        BinaryOp::Sub => checked_arith(a.checked_sub(b), "subtraction"),
        BinaryOp::Mul => checked_arith(a.checked_mul(b), "multiplication"),
        // True division always yields a float, even for int operands.
        BinaryOp::Div => {
            if b == 0 {
                Err("division by zero".to_string())
            } else {
                #[expect(clippy::cast_precision_loss, reason = "true division is float-valued")]
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                Err("modulo by zero".to_string())
            } else {
                checked_arith(a.checked_rem_euclid(b), "remainder")
            }
        }
        BinaryOp::Pow => match u32::try_from(b) {
            Ok(exp) => checked_arith(a.checked_pow(exp), "exponentiation"),
            // Negative exponent: float-valued result.
            Err(_) => {
                #[expect(clippy::cast_precision_loss, reason = "negative exponent is float-valued")]
                Ok(Value::Float((a as f64).powi(i32::try_from(b).map_err(
                    |_| "exponent out of range".to_string(),
                )?)))
            }
        },
        BinaryOp::BitAnd => Ok(Value::Int(a & b)),
        BinaryOp::BitOr => Ok(Value::Int(a | b)),
        BinaryOp::BitXor => Ok(Value::Int(a ^ b)),
    }
}

fn eval_float_binary(a: f64, b: f64, op: BinaryOp) -> Result<Value, String> {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => {
            if b == 0.0 {
                Err("division by zero".to_string())
            } else {
                Ok(Value::Float(a / b))
            }
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                Err("modulo by zero".to_string())
            } else {
                Ok(Value::Float(a.rem_euclid(b)))
            }
        }
        BinaryOp::Pow => Ok(Value::Float(a.powf(b))),
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => Err(format!(
            "unsupported operand types for {}: float and float",
            op.as_symbol()
        )),
    }
}

fn eval_str_binary(a: &Rc<str>, b: &Rc<str>, op: BinaryOp) -> Result<Value, String> {
    match op {
        BinaryOp::Add => {
            let mut s = String::with_capacity(a.len() + b.len());
            s.push_str(a);
            s.push_str(b);
            Ok(Value::string(s))
        }
        _ => Err(format!(
            "unsupported operand types for {}: str and str",
            op.as_symbol()
        )),
    }
}

/// Evaluate a binary operation using direct pattern matching.
///
/// Mixed int/float operands promote to float; `+` concatenates strings and
/// lists; bitwise operators are integer-only.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> Result<Value, String> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => eval_int_binary(*a, *b, op),
        (Value::Float(a), Value::Float(b)) => eval_float_binary(*a, *b, op),
        #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic promotes to float")]
        (Value::Int(a), Value::Float(b)) => eval_float_binary(*a as f64, *b, op),
        #[expect(clippy::cast_precision_loss, reason = "mixed arithmetic promotes to float")]
        (Value::Float(a), Value::Int(b)) => eval_float_binary(*a, *b as f64, op),
        (Value::Str(a), Value::Str(b)) => eval_str_binary(a, b, op),
        (Value::List(a), Value::List(b)) if op == BinaryOp::Add => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => Err(type_mismatch(op, left, right)),
    }
}

/// Evaluate a unary operation.
pub fn evaluate_unary(value: &Value, op: UnaryOp) -> Result<Value, String> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| "integer overflow in negation".to_string()),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Invert, Value::Int(n)) => Ok(Value::Int(!n)),
        (op, value) => Err(format!(
            "unsupported operand type for {}: {}",
            op.as_symbol(),
            value.type_name()
        )),
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn int_arithmetic() {
        assert_eq!(
            evaluate_binary(&Value::int(2), &Value::int(3), BinaryOp::Add).unwrap(),
            Value::int(5)
        );
        assert_eq!(
            evaluate_binary(&Value::int(2), &Value::int(3), BinaryOp::Pow).unwrap(),
            Value::int(8)
        );
        assert_eq!(
            evaluate_binary(&Value::int(7), &Value::int(3), BinaryOp::Mod).unwrap(),
            Value::int(1)
        );
    }

    #[test]
    fn true_division_is_float_valued() {
        assert_eq!(
            evaluate_binary(&Value::int(7), &Value::int(2), BinaryOp::Div).unwrap(),
            Value::float(3.5)
        );
    }

    #[test]
    fn division_by_zero() {
        assert_eq!(
            evaluate_binary(&Value::int(1), &Value::int(0), BinaryOp::Div).unwrap_err(),
            "division by zero"
        );
    }

    #[test]
    fn mixed_operands_promote() {
        assert_eq!(
            evaluate_binary(&Value::int(1), &Value::float(0.5), BinaryOp::Add).unwrap(),
            Value::float(1.5)
        );
    }

    #[test]
    fn string_concat() {
        assert_eq!(
            evaluate_binary(&Value::string("a"), &Value::string("b"), BinaryOp::Add).unwrap(),
            Value::string("ab")
        );
    }

    #[test]
    fn list_concat() {
        assert_eq!(
            evaluate_binary(
                &Value::list(vec![Value::int(1)]),
                &Value::list(vec![Value::int(2)]),
                BinaryOp::Add
            )
            .unwrap(),
            Value::list(vec![Value::int(1), Value::int(2)])
        );
    }

    #[test]
    fn bitwise_ops_are_integer_only() {
        assert_eq!(
            evaluate_binary(&Value::int(6), &Value::int(3), BinaryOp::BitAnd).unwrap(),
            Value::int(2)
        );
        assert!(evaluate_binary(&Value::float(1.0), &Value::float(2.0), BinaryOp::BitOr).is_err());
    }

    #[test]
    fn type_mismatch_message() {
        assert_eq!(
            evaluate_binary(&Value::int(1), &Value::string("x"), BinaryOp::Sub).unwrap_err(),
            "unsupported operand types for -: int and str"
        );
    }

    #[test]
    fn unary_ops() {
        assert_eq!(
            evaluate_unary(&Value::int(5), UnaryOp::Neg).unwrap(),
            Value::int(-5)
        );
        assert_eq!(
            evaluate_unary(&Value::int(0), UnaryOp::Invert).unwrap(),
            Value::int(-1)
        );
        assert!(evaluate_unary(&Value::string("x"), UnaryOp::Neg).is_err());
    }
}
