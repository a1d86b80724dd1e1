//! Plain attribute and item access over values.
//!
//! These helpers implement the direct (non-registry) access operations the
//! path system replays: `T.name` and `T[key]`. Failures are reported as
//! plain strings; the evaluator wraps them with path context.

use crate::value::Value;

/// Convert a signed index to unsigned, handling negative indices from the end.
fn resolve_index(i: i64, len: usize) -> Option<usize> {
    if i >= 0 {
        let idx = usize::try_from(i).ok()?;
        (idx < len).then_some(idx)
    } else {
        let back = usize::try_from(i.checked_neg()?).ok()?;
        (back <= len).then(|| len - back)
    }
}

/// Evaluate attribute access (`T.name`).
///
/// Only foreign values expose attributes; every builtin container is
/// accessed by item instead.
pub fn attr_get(value: &Value, name: &str) -> Result<Value, String> {
    match value {
        Value::Foreign(v) => v
            .attr(name)
            .ok_or_else(|| format!("no attribute '{name}' on {}", v.type_name())),
        other => Err(format!("no attribute '{name}' on {}", other.type_name())),
    }
}

/// Evaluate item access (`T[key]`).
pub fn item_get(value: &Value, key: &Value) -> Result<Value, String> {
    match (value, key) {
        (Value::Map(entries), key) => entries
            .borrow()
            .get(key)
            .cloned()
            .ok_or_else(|| format!("key not found: {key}")),
        (Value::List(items), Value::Int(i)) => {
            let items = items.borrow();
            resolve_index(*i, items.len())
                .and_then(|idx| items.get(idx).cloned())
                .ok_or_else(|| format!("index {i} out of bounds"))
        }
        (Value::Tuple(items), Value::Int(i)) => resolve_index(*i, items.len())
            .and_then(|idx| items.get(idx).cloned())
            .ok_or_else(|| format!("index {i} out of bounds")),
        (Value::Str(s), Value::Int(i)) => {
            let chars = s.chars().count();
            resolve_index(*i, chars)
                .and_then(|idx| s.chars().nth(idx))
                .map(|c| Value::string(c.to_string()))
                .ok_or_else(|| format!("index {i} out of bounds"))
        }
        (Value::List(_) | Value::Tuple(_) | Value::Str(_), key) => Err(format!(
            "{} indices must be int, got {}",
            value.type_name(),
            key.type_name()
        )),
        (value, _) => Err(format!("'{}' is not indexable", value.type_name())),
    }
}

/// Evaluate item assignment (`T[key] = item`), mutating in place.
pub fn item_set(value: &Value, key: &Value, item: Value) -> Result<(), String> {
    match (value, key) {
        (Value::Map(entries), key) => {
            entries.borrow_mut().insert(key.clone(), item);
            Ok(())
        }
        (Value::List(items), Value::Int(i)) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            match resolve_index(*i, len) {
                Some(idx) => {
                    items[idx] = item;
                    Ok(())
                }
                None => Err(format!("index {i} out of bounds")),
            }
        }
        (Value::List(_), key) => Err(format!("list indices must be int, got {}", key.type_name())),
        (value, _) => Err(format!("cannot assign into '{}'", value.type_name())),
    }
}

/// Evaluate item deletion, mutating in place and preserving order.
pub fn item_del(value: &Value, key: &Value) -> Result<(), String> {
    match (value, key) {
        (Value::Map(entries), key) => entries
            .borrow_mut()
            .shift_remove(key)
            .map(|_| ())
            .ok_or_else(|| format!("key not found: {key}")),
        (Value::List(items), Value::Int(i)) => {
            let mut items = items.borrow_mut();
            let len = items.len();
            match resolve_index(*i, len) {
                Some(idx) => {
                    items.remove(idx);
                    Ok(())
                }
                None => Err(format!("index {i} out of bounds")),
            }
        }
        (Value::Set(items), key) => items
            .borrow_mut()
            .shift_remove(key)
            .then_some(())
            .ok_or_else(|| format!("key not found: {key}")),
        (value, _) => Err(format!("cannot delete from '{}'", value.type_name())),
    }
}

/// Attribute assignment. No builtin or foreign value currently accepts it;
/// the operation exists so assignment destinations report a uniform error.
pub fn attr_set(value: &Value, name: &str, _item: Value) -> Result<(), String> {
    Err(format!(
        "cannot set attribute '{name}' on {}",
        value.type_name()
    ))
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_map() -> Value {
        Value::map(vec![
            (Value::string("a"), Value::int(1)),
            (Value::string("b"), Value::int(2)),
        ])
    }

    #[test]
    fn map_item_get() {
        let m = sample_map();
        assert_eq!(item_get(&m, &Value::string("b")).unwrap(), Value::int(2));
        assert_eq!(
            item_get(&m, &Value::string("z")).unwrap_err(),
            "key not found: 'z'"
        );
    }

    #[test]
    fn list_negative_index() {
        let l = Value::list(vec![Value::int(10), Value::int(20), Value::int(30)]);
        assert_eq!(item_get(&l, &Value::int(-1)).unwrap(), Value::int(30));
        assert!(item_get(&l, &Value::int(3)).is_err());
        assert!(item_get(&l, &Value::int(-4)).is_err());
    }

    #[test]
    fn str_index_yields_single_char() {
        let s = Value::string("abc");
        assert_eq!(item_get(&s, &Value::int(1)).unwrap(), Value::string("b"));
    }

    #[test]
    fn scalar_not_indexable() {
        assert_eq!(
            item_get(&Value::int(5), &Value::int(0)).unwrap_err(),
            "'int' is not indexable"
        );
    }

    #[test]
    fn item_set_mutates_in_place() {
        let m = sample_map();
        let alias = m.clone();
        item_set(&m, &Value::string("c"), Value::int(3)).unwrap();
        assert_eq!(item_get(&alias, &Value::string("c")).unwrap(), Value::int(3));
    }

    #[test]
    fn item_set_rejects_tuple() {
        let t = Value::tuple(vec![Value::int(1)]);
        assert!(item_set(&t, &Value::int(0), Value::int(2)).is_err());
    }

    #[test]
    fn item_del_preserves_order() {
        let m = sample_map();
        item_del(&m, &Value::string("a")).unwrap();
        assert_eq!(m.to_string(), "{'b': 2}");
    }

    #[test]
    fn attr_get_requires_foreign() {
        assert!(attr_get(&sample_map(), "a").is_err());
    }
}
