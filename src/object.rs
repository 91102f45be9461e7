//! Arrays of serialized JSON values

use serde_json::Value;

use crate::config::DEFAULT_MAX_OBJECT_SIZE;
use crate::error::{LargeArrayError, Result};
use crate::types::LargeArrayType;
use crate::varlen::{text_fingerprint, VarElement, VarLengthLargeArray};

/// A large array of JSON values that all share one kind. The maximum
/// element size counts serialized bytes.
///
/// `Value::Null` counts as a null reference and cannot be stored. Elements
/// that were never set read back as `None`.
pub type ObjectLargeArray = VarLengthLargeArray<Value>;

impl VarElement for Value {
    const TYPE: LargeArrayType = LargeArrayType::Object;
    const NULLABLE: bool = false;

    fn slot_size(max_element_size: i32) -> usize {
        max_element_size as usize
    }

    fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| LargeArrayError::invalid(e.to_string()))
    }

    fn decode(bytes: &[u8]) -> Option<Self> {
        serde_json::from_slice(bytes).ok()
    }

    fn empty() -> Option<Self> {
        None
    }

    fn class(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    fn fingerprint(&self) -> i32 {
        text_fingerprint(&self.to_string())
    }
}

impl VarLengthLargeArray<Value> {
    /// Creates an array of unset values of up to 1024 serialized bytes.
    pub fn with_length(length: i64) -> Result<Self> {
        Self::new(length, DEFAULT_MAX_OBJECT_SIZE)
    }

    /// Takes ownership of `items`, which must all be of one kind and none
    /// of them null.
    pub fn wrap_values(items: Vec<Value>) -> Result<Self> {
        Self::wrap(items.into_iter().map(Some).collect(), DEFAULT_MAX_OBJECT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_is_rejected() {
        let mut a = ObjectLargeArray::with_length(2).unwrap();
        assert!(matches!(
            a.set(0, Some(Value::Null)),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert!(matches!(
            a.set(0, None),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert_eq!(a.get(0).unwrap(), None);
    }

    #[test]
    fn first_value_fixes_the_class() {
        let mut a = ObjectLargeArray::with_length(3).unwrap();
        assert_eq!(a.element_class(), None);
        a.set(0, Some(json!({"x": 1}))).unwrap();
        assert_eq!(a.element_class(), Some("object"));
        a.set(1, Some(json!({"y": [1, 2]}))).unwrap();
        assert!(matches!(
            a.set(2, Some(json!(3))),
            Err(LargeArrayError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn heterogeneous_data_is_rejected() {
        assert!(matches!(
            ObjectLargeArray::wrap_values(vec![json!(1), json!("one")]),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        assert!(matches!(
            ObjectLargeArray::wrap_values(vec![json!(1), Value::Null]),
            Err(LargeArrayError::InvalidArgument(_))
        ));
        let a = ObjectLargeArray::wrap_values(vec![json!(1), json!(2.5)]).unwrap();
        assert_eq!(a.get(1).unwrap(), Some(json!(2.5)));
    }

    #[test]
    fn raw_slots_round_trip_values() {
        let mut a = ObjectLargeArray::new_in(3, 32, true).unwrap();
        assert!(a.is_large());
        a.set(1, Some(json!(["a", "b"]))).unwrap();
        assert_eq!(a.get(0).unwrap(), None);
        assert_eq!(a.get(1).unwrap(), Some(json!(["a", "b"])));
    }

    #[test]
    fn oversized_values_are_rejected_in_raw_slots() {
        let mut a = ObjectLargeArray::new_in(2, 8, true).unwrap();
        let big = json!("this string is far too long");
        match a.set(0, Some(big)) {
            Err(LargeArrayError::ElementTooLarge { size, max }) => {
                assert_eq!(max, 8);
                assert!(size > 8);
            }
            other => panic!("unexpected result {:?}", other),
        }
        a.set(0, Some(json!("short"))).unwrap();
        assert_eq!(a.get(0).unwrap(), Some(json!("short")));
    }

    #[test]
    fn equality_includes_class_and_capacity() {
        let a = ObjectLargeArray::wrap_values(vec![json!(true)]).unwrap();
        let b = ObjectLargeArray::wrap(vec![Some(json!(true))], 10).unwrap();
        assert_ne!(a, b);
        let c = a.try_clone().unwrap();
        assert_eq!(a, c);
        assert_eq!(a.hash_code(1.0).unwrap(), c.hash_code(1.0).unwrap());
    }
}
