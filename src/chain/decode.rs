//! Helpers for reading dynamically decoded chain values.
//!
//! Storage entries and event fields come back as `scale_value::Value<u32>`
//! (the context is the metadata type id). Newtype wrappers such as
//! `AccountId32([u8; 32])` show up as single-field composites, so the
//! helpers here look through them.

use subxt::ext::scale_value::{At, Composite, Primitive, ValueDef};

use crate::chain::types::{RobonomicsError, RobonomicsResult};

/// A decoded on-chain value.
pub type ChainValue = subxt::ext::scale_value::Value<u32>;

/// Strip single-field composite wrappers, stopping at a byte sequence.
fn unwrap_newtype(value: &ChainValue) -> &ChainValue {
    let mut current = value;
    loop {
        match &current.value {
            ValueDef::Composite(inner) if inner.len() == 1 => {
                let only = inner.values().next();
                match only {
                    Some(next) if !matches!(next.value, ValueDef::Primitive(_)) => current = next,
                    Some(next) => return next,
                    None => return current,
                }
            }
            _ => return current,
        }
    }
}

pub fn as_u128(value: &ChainValue) -> Option<u128> {
    unwrap_newtype(value).as_u128()
}

pub fn as_u64(value: &ChainValue) -> Option<u64> {
    as_u128(value).and_then(|v| u64::try_from(v).ok())
}

/// Collect a composite of `u8` primitives (through newtype wrappers) into bytes.
pub fn as_bytes(value: &ChainValue) -> Option<Vec<u8>> {
    let mut current = value;
    loop {
        match &current.value {
            ValueDef::Composite(inner) => {
                let first = inner.values().next();
                match first {
                    Some(next) if matches!(next.value, ValueDef::Composite(_)) && inner.len() == 1 => {
                        current = next;
                    }
                    _ => {
                        return inner
                            .values()
                            .map(|v| match &v.value {
                                ValueDef::Primitive(Primitive::U128(b)) => u8::try_from(*b).ok(),
                                _ => None,
                            })
                            .collect();
                    }
                }
            }
            ValueDef::Primitive(Primitive::String(s)) => return Some(s.as_bytes().to_vec()),
            _ => return None,
        }
    }
}

/// Read a 32-byte value (account id, H256).
pub fn as_array32(value: &ChainValue) -> Option<[u8; 32]> {
    as_bytes(value).and_then(|bytes| bytes.try_into().ok())
}

/// Render a 32-byte value as `0x` hex.
pub fn as_hex32(value: &ChainValue) -> Option<String> {
    as_array32(value).map(|bytes| format!("0x{}", hex::encode(bytes)))
}

pub fn as_bool(value: &ChainValue) -> Option<bool> {
    unwrap_newtype(value).as_bool()
}

/// Variant name and fields of an enum value.
pub fn as_variant(value: &ChainValue) -> Option<(&str, &Composite<u32>)> {
    match &unwrap_newtype(value).value {
        ValueDef::Variant(variant) => Some((variant.name.as_str(), &variant.values)),
        _ => None,
    }
}

/// Decode `Option<T>`: `None` for the `None` variant, the inner value otherwise.
pub fn as_option(value: &ChainValue) -> Option<&ChainValue> {
    match as_variant(value) {
        Some(("Some", fields)) => fields.values().next(),
        _ => None,
    }
}

/// Positional element of a composite (tuple, unnamed struct or sequence).
pub fn element(value: &ChainValue, index: usize) -> Option<&ChainValue> {
    match &value.value {
        ValueDef::Composite(inner) => inner.values().nth(index),
        _ => None,
    }
}

/// Elements of a sequence value.
pub fn elements(value: &ChainValue) -> Vec<&ChainValue> {
    match &value.value {
        ValueDef::Composite(inner) => inner.values().collect(),
        _ => Vec::new(),
    }
}

/// Named field lookup that reports which field was missing.
pub fn field<'a>(value: &'a ChainValue, name: &str) -> RobonomicsResult<&'a ChainValue> {
    value
        .at(name)
        .ok_or_else(|| RobonomicsError::Decode(format!("missing field '{}'", name)))
}

pub fn field_u128(value: &ChainValue, name: &str) -> RobonomicsResult<u128> {
    as_u128(field(value, name)?)
        .ok_or_else(|| RobonomicsError::Decode(format!("field '{}' is not an integer", name)))
}

pub fn field_u64(value: &ChainValue, name: &str) -> RobonomicsResult<u64> {
    as_u64(field(value, name)?)
        .ok_or_else(|| RobonomicsError::Decode(format!("field '{}' is not a u64", name)))
}

pub fn field_array32(value: &ChainValue, name: &str) -> RobonomicsResult<[u8; 32]> {
    as_array32(field(value, name)?)
        .ok_or_else(|| RobonomicsError::Decode(format!("field '{}' is not 32 bytes", name)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use subxt::dynamic::Value;

    /// Attach a dummy type id so test values look like decoded ones.
    pub(crate) fn decoded(value: Value) -> ChainValue {
        value.map_context(|_| 0u32)
    }

    pub(crate) fn account_value(bytes: [u8; 32]) -> Value {
        Value::unnamed_composite([Value::from_bytes(bytes)])
    }

    #[test]
    fn test_newtype_account_bytes() {
        let value = decoded(account_value([7; 32]));
        assert_eq!(as_array32(&value), Some([7; 32]));
        assert_eq!(as_hex32(&value).unwrap(), format!("0x{}", "07".repeat(32)));
    }

    #[test]
    fn test_plain_byte_vector() {
        let value = decoded(Value::from_bytes(b"hello"));
        assert_eq!(as_bytes(&value).unwrap(), b"hello");
        assert!(as_array32(&value).is_none());
    }

    #[test]
    fn test_single_byte_vector_is_not_unwrapped() {
        let value = decoded(Value::from_bytes([42u8]));
        assert_eq!(as_bytes(&value).unwrap(), vec![42]);
    }

    #[test]
    fn test_named_fields() {
        let value = decoded(Value::named_composite([
            ("start", Value::u128(3)),
            ("end", Value::u128(10)),
        ]));
        assert_eq!(field_u64(&value, "start").unwrap(), 3);
        assert_eq!(field_u128(&value, "end").unwrap(), 10);
        assert!(matches!(field(&value, "middle"), Err(RobonomicsError::Decode(_))));
    }

    #[test]
    fn test_option_variant() {
        let some = decoded(Value::unnamed_variant("Some", [Value::u128(5)]));
        let none = decoded(Value::unnamed_variant("None", []));
        assert_eq!(as_option(&some).and_then(as_u128), Some(5));
        assert!(as_option(&none).is_none());
    }

    #[test]
    fn test_variant_and_elements() {
        let value = decoded(Value::named_variant("Daily", [("days", Value::u128(30))]));
        let (name, fields) = as_variant(&value).unwrap();
        assert_eq!(name, "Daily");
        assert_eq!(fields.values().next().and_then(|v| v.as_u128()), Some(30));

        let tuple = decoded(Value::unnamed_composite([Value::u128(1), Value::from_bytes(b"x")]));
        assert_eq!(element(&tuple, 0).and_then(as_u64), Some(1));
        assert_eq!(elements(&tuple).len(), 2);
    }
}
