use serde_json::{Number, Value};

use crate::primitives::integer_value;
use crate::reflect::{Primitive, TypeInfo, TypeKind};

/// Whether `value` is the zero value of its type.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

/// Convert an allow-listed `value` to the shape `ty` deserializes from.
///
/// Numbers and strings convert both ways, strings parse to booleans, integral
/// floats become integers and enum names match case-insensitively. `None`
/// when no conversion applies.
///
/// ```
/// use fixtura::overrides::coerce;
/// use fixtura::Reflect;
/// use serde_json::json;
///
/// assert_eq!(coerce(&json!("42"), &i32::type_info()), Some(json!(42)));
/// assert_eq!(coerce(&json!(7), &String::type_info()), Some(json!("7")));
/// assert_eq!(coerce(&json!(300), &u8::type_info()), None);
/// ```
pub fn coerce(value: &Value, ty: &TypeInfo) -> Option<Value> {
    match &ty.kind {
        TypeKind::Nullable(inner) => match value {
            Value::Null => Some(Value::Null),
            other => coerce(other, inner),
        },
        TypeKind::Primitive(primitive) => coerce_primitive(value, *primitive),
        TypeKind::Enum(info) => {
            let Value::String(name) = value else {
                return None;
            };
            info.variants
                .iter()
                .find(|v| v.eq_ignore_ascii_case(name))
                .map(|v| Value::String(v.to_string()))
        }
        TypeKind::Collection(_) | TypeKind::Complex(_) => Some(value.clone()),
    }
}

fn coerce_primitive(value: &Value, primitive: Primitive) -> Option<Value> {
    if let Some((lo, hi)) = primitive.integer_bounds() {
        let n = match value {
            Value::Number(n) => number_as_integer(n)?,
            Value::String(s) => s.trim().parse::<i128>().ok()?,
            _ => return None,
        };
        return (lo..=hi).contains(&n).then(|| integer_value(n));
    }

    match primitive {
        Primitive::Bool => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match number_as_integer(n)? {
                0 => Some(Value::Bool(false)),
                1 => Some(Value::Bool(true)),
                _ => None,
            },
            _ => None,
        },
        Primitive::F32 | Primitive::F64 => match value {
            Value::Number(_) => Some(value.clone()),
            Value::String(s) => {
                let f = s.trim().parse::<f64>().ok()?;
                Number::from_f64(f).map(Value::Number)
            }
            _ => None,
        },
        Primitive::Char => match value {
            Value::String(s) if s.chars().count() == 1 => Some(value.clone()),
            Value::Number(n) => {
                let digit = number_as_integer(n)?;
                (0..=9).contains(&digit).then(|| Value::String(digit.to_string()))
            }
            _ => None,
        },
        Primitive::String => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            Value::Bool(b) => Some(Value::String(b.to_string())),
            _ => None,
        },
        Primitive::Bytes => match value {
            Value::Array(_) => Some(value.clone()),
            Value::String(s) => Some(Value::from(s.as_bytes().to_vec())),
            _ => None,
        },
        #[cfg(feature = "decimal")]
        Primitive::Decimal => match value {
            Value::String(_) => Some(value.clone()),
            Value::Number(n) => Some(Value::String(n.to_string())),
            _ => None,
        },
        // Dates and uuids are validated by their deserializer.
        _ => match value {
            Value::String(_) => Some(value.clone()),
            _ => None,
        },
    }
}

fn number_as_integer(n: &Number) -> Option<i128> {
    if let Some(i) = n.as_i64() {
        return Some(i as i128);
    }
    if let Some(u) = n.as_u64() {
        return Some(u as i128);
    }
    let f = n.as_f64()?;
    (f.fract() == 0.0 && f.abs() < 1e18).then_some(f as i128)
}
