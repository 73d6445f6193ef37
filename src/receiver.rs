//! The array-like view of a receiver.
//!
//! Receivers are never validated: anything without a usable `length`
//! iterates zero times.

use crate::value::Value;

/// Property under which wrapper elements keep their underlying value.
pub const NODE_KEY: &str = "_node";

/// `receiver ? receiver.length : 0`, clamped to a usable count.
pub fn array_length(receiver: &Value) -> usize {
    match receiver {
        Value::Array(arr) => arr.borrow().len(),
        Value::Object(obj) => match obj.borrow().get("length") {
            Some(Value::Number(n)) if n.is_finite() && *n > 0.0 => n.trunc() as usize,
            _ => 0,
        },
        _ => 0,
    }
}

/// `receiver[index]`; holes and out-of-range reads are `undefined`.
pub fn element_at(receiver: &Value, index: usize) -> Value {
    match receiver {
        Value::Array(arr) => arr.borrow().get(index).cloned().unwrap_or_default(),
        Value::Object(obj) => obj.borrow().get(index.to_string().as_str()).cloned().unwrap_or_default(),
        _ => Value::Undefined,
    }
}

/// Builds an array-like object (`{ 0: .., 1: .., length: n }`) over `values`.
pub fn array_like(values: impl IntoIterator<Item = Value>) -> Value {
    let mut properties = values.into_iter().enumerate().map(|(i, v)| (i.to_string(), v)).collect::<Vec<_>>();
    let length = properties.len();
    properties.push(("length".to_string(), Value::from(length)));
    Value::object(properties)
}

/// Wraps a raw value the way wrapper collections hold their elements.
pub fn wrap_node(node: Value) -> Value {
    Value::object([(NODE_KEY, node)])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_receiver_has_no_elements() {
        assert_eq!(array_length(&Value::Undefined), 0);
        assert_eq!(array_length(&Value::Null), 0);
        assert_eq!(element_at(&Value::Null, 0), Value::Undefined);
    }

    #[test]
    fn object_without_length_is_empty() {
        let obj = Value::object([("0", Value::from(1))]);
        assert_eq!(array_length(&obj), 0);
    }

    #[test]
    fn array_like_object_reads_by_index() {
        let obj = array_like([Value::from("a"), Value::from("b")]);
        assert_eq!(array_length(&obj), 2);
        assert_eq!(element_at(&obj, 1), Value::from("b"));
        assert_eq!(element_at(&obj, 2), Value::Undefined);
    }

    #[test]
    fn fractional_length_is_truncated() {
        let obj = Value::object([("length", Value::from(2.7))]);
        assert_eq!(array_length(&obj), 2);
        let negative = Value::object([("length", Value::from(-3))]);
        assert_eq!(array_length(&negative), 0);
    }
}
