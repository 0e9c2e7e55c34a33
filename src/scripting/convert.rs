//! Marshalling between rhai values and call-slot values.

use rhai::{Array, Dynamic, FLOAT, INT, ImmutableString, Map};

use crate::api::{ForeignHandle, Value};

// Largest magnitude at which every integer is exact in an f64
const EXACT_INT: f64 = 9_007_199_254_740_992.0;

pub fn to_value(value: &Dynamic) -> Value {
    if value.is_unit() {
        return Value::Null;
    }
    if let Ok(b) = value.as_bool() {
        return Value::Bool(b);
    }
    if let Ok(n) = value.as_int() {
        return Value::Num(n as f64);
    }
    if let Ok(n) = value.as_float() {
        return Value::Num(n as f64);
    }
    if let Ok(c) = value.as_char() {
        return Value::Str(c.to_string());
    }
    if let Some(s) = value.read_lock::<ImmutableString>() {
        return Value::Str(s.to_string());
    }
    if let Some(items) = value.read_lock::<Array>() {
        return Value::List(items.iter().map(to_value).collect());
    }
    if let Some(map) = value.read_lock::<Map>() {
        return Value::Map(
            map.iter()
                .map(|(k, v)| (k.to_string(), to_value(v)))
                .collect(),
        );
    }
    if let Some(handle) = value.read_lock::<ForeignHandle>() {
        return Value::Foreign(handle.clone());
    }
    Value::Unknown(value.type_name().to_string())
}

/// Whole numbers come back as rhai integers so scripts can index with them
pub fn to_dynamic(value: Value) -> Dynamic {
    match value {
        Value::Null | Value::Unknown(_) => Dynamic::UNIT,
        Value::Bool(b) => Dynamic::from_bool(b),
        Value::Num(n) if n.fract() == 0.0 && n.abs() <= EXACT_INT => Dynamic::from_int(n as INT),
        Value::Num(n) => Dynamic::from_float(n as FLOAT),
        Value::Str(s) => Dynamic::from(s),
        Value::List(items) => Dynamic::from_array(items.into_iter().map(to_dynamic).collect()),
        Value::Map(map) => Dynamic::from_map(
            map.into_iter()
                .map(|(k, v)| (k.into(), to_dynamic(v)))
                .collect(),
        ),
        Value::Foreign(handle) => Dynamic::from(handle),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Resource, SlotType, finalize_resource};

    #[test]
    fn scalars_map_to_slot_categories() {
        assert_eq!(to_value(&Dynamic::UNIT), Value::Null);
        assert_eq!(to_value(&Dynamic::from_bool(true)), Value::Bool(true));
        assert_eq!(to_value(&Dynamic::from_int(3)), Value::Num(3.0));
        assert_eq!(to_value(&Dynamic::from_float(0.5)), Value::Num(0.5));
        assert_eq!(to_value(&Dynamic::from("hi")), Value::from("hi"));
        assert_eq!(to_value(&Dynamic::from_char('x')), Value::from("x"));
    }

    #[test]
    fn unrepresentable_values_are_unknown() {
        #[derive(Clone)]
        struct Opaque;
        let value = to_value(&Dynamic::from(Opaque));
        assert_eq!(value.slot_type(), SlotType::Unknown);
    }

    #[test]
    fn whole_numbers_return_as_integers() {
        assert_eq!(to_dynamic(Value::Num(7.0)).as_int(), Ok(7));
        assert!(to_dynamic(Value::Num(7.5)).is::<FLOAT>());
        assert!(to_dynamic(Value::Num(f64::INFINITY)).is::<FLOAT>());
        assert!(to_dynamic(Value::Unknown("Opaque".into())).is_unit());
    }

    #[test]
    fn containers_convert_recursively() {
        let mut map = std::collections::BTreeMap::new();
        map.insert("size".to_string(), Value::Num(4.0));
        map.insert("tags".to_string(), Value::List(vec![Value::from("a"), Value::Null]));

        let back = to_value(&to_dynamic(Value::Map(map.clone())));
        assert_eq!(back, Value::Map(map));
    }

    #[test]
    fn handles_keep_their_identity() {
        let handle = ForeignHandle::new("Thing", Resource::open(1u8), finalize_resource::<u8>);
        let value = to_value(&to_dynamic(Value::Foreign(handle.clone())));
        assert_eq!(value, Value::Foreign(handle));
    }
}
