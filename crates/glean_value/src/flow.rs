//! Control-flow result of a single evaluation step.

use crate::value::Value;

/// What one evaluation step produced.
///
/// `Skip` and `Stop` are data-shaping signals, not errors: a containing
/// mapping or sequence reacts to them (omit the entry, truncate the
/// iteration) and they never carry diagnostic state. Modeling them as an
/// enum instead of sentinel values means no legitimate user value can ever
/// alias them.
#[derive(Clone, Debug, PartialEq)]
pub enum Flow {
    /// A produced value; evaluation of the enclosing spec continues.
    Value(Value),
    /// Drop this result from its container entirely.
    Skip,
    /// Halt the enclosing iteration or pipeline early, excluding the
    /// element that produced the signal.
    Stop,
}

impl Flow {
    /// Returns the carried value, or `Value::Null` for control signals that
    /// escaped all the way out of their containers.
    pub fn into_value(self) -> Value {
        match self {
            Flow::Value(v) => v,
            Flow::Skip | Flow::Stop => Value::Null,
        }
    }

    /// Returns `true` for `Skip`.
    #[inline]
    pub fn is_skip(&self) -> bool {
        matches!(self, Flow::Skip)
    }

    /// Returns `true` for `Stop`.
    #[inline]
    pub fn is_stop(&self) -> bool {
        matches!(self, Flow::Stop)
    }
}

impl From<Value> for Flow {
    fn from(v: Value) -> Self {
        Flow::Value(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn into_value_unwraps() {
        assert_eq!(Flow::Value(Value::int(1)).into_value(), Value::int(1));
        assert_eq!(Flow::Skip.into_value(), Value::Null);
        assert_eq!(Flow::Stop.into_value(), Value::Null);
    }

    #[test]
    fn predicates() {
        assert!(Flow::Skip.is_skip());
        assert!(Flow::Stop.is_stop());
        assert!(!Flow::Value(Value::Null).is_skip());
    }
}
