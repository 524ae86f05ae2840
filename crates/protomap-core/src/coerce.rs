//! Range-checked conversion of caller values into wire scalars

use protomap_schema::ScalarType;
use protomap_wire::{MapKey, RawValue};

use crate::value::FieldValue;

/// Integral view of a numeric value; floats qualify only without a fraction
#[allow(clippy::cast_possible_truncation)]
fn integral(value: &FieldValue) -> Option<i128> {
    match value {
        FieldValue::I32(v) => Some(i128::from(*v)),
        FieldValue::I64(v) => Some(i128::from(*v)),
        FieldValue::U32(v) => Some(i128::from(*v)),
        FieldValue::U64(v) => Some(i128::from(*v)),
        FieldValue::F64(v) if v.fract() == 0.0 && v.abs() < 1e30 => Some(*v as i128),
        FieldValue::F32(v) if v.fract() == 0.0 && v.abs() < 1e30 => Some(*v as i128),
        _ => None,
    }
}

fn int<T: TryFrom<i128>>(value: &FieldValue, ty: ScalarType) -> Result<T, String> {
    let n = integral(value).ok_or_else(|| mismatch(value, ty))?;
    T::try_from(n).map_err(|_| format!("{n} is out of range for {ty}"))
}

fn mismatch(value: &FieldValue, ty: ScalarType) -> String {
    format!("expected {ty}, found {}", value.kind())
}

/// Convert `value` to the storage of scalar type `ty`
///
/// Integer targets take any integral number in range. Float targets take
/// floats and integers. Everything else must match exactly.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub(crate) fn scalar(value: &FieldValue, ty: ScalarType) -> Result<RawValue, String> {
    let raw = match ty {
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => RawValue::I32(int(value, ty)?),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => RawValue::I64(int(value, ty)?),
        ScalarType::Uint32 | ScalarType::Fixed32 => RawValue::U32(int(value, ty)?),
        ScalarType::Uint64 | ScalarType::Fixed64 => RawValue::U64(int(value, ty)?),
        ScalarType::Float => RawValue::F32(match value {
            FieldValue::F32(v) => *v,
            FieldValue::F64(v) => *v as f32,
            other => integral(other).ok_or_else(|| mismatch(other, ty))? as f32,
        }),
        ScalarType::Double => RawValue::F64(match value {
            FieldValue::F32(v) => f64::from(*v),
            FieldValue::F64(v) => *v,
            other => integral(other).ok_or_else(|| mismatch(other, ty))? as f64,
        }),
        ScalarType::Bool => match value {
            FieldValue::Bool(v) => RawValue::Bool(*v),
            other => return Err(mismatch(other, ty)),
        },
        ScalarType::String => match value {
            FieldValue::String(v) => RawValue::String(v.clone()),
            other => return Err(mismatch(other, ty)),
        },
        ScalarType::Bytes => match value {
            FieldValue::Bytes(v) => RawValue::Bytes(v.clone()),
            other => return Err(mismatch(other, ty)),
        },
    };
    Ok(raw)
}

/// Enum number from a number-like value
pub(crate) fn enum_number(value: &FieldValue) -> Result<i32, String> {
    let n = integral(value).ok_or_else(|| format!("expected enum, found {}", value.kind()))?;
    i32::try_from(n).map_err(|_| format!("{n} is out of range for an enum"))
}

/// Convert a map key to key type `ty`, parsing string keys of other types
pub(crate) fn map_key(key: &MapKey, ty: ScalarType) -> Result<MapKey, String> {
    match key {
        MapKey::String(text) if ty != ScalarType::String => {
            MapKey::parse(ty, text).ok_or_else(|| format!("cannot parse '{text}' as {ty} key"))
        }
        other => {
            let value = FieldValue::from_raw_scalar(other.to_value());
            let raw = scalar(&value, ty)?;
            MapKey::from_value(raw).ok_or_else(|| format!("{ty} cannot key a map"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn widens_and_narrows_integers_in_range() {
        assert_eq!(scalar(&FieldValue::I64(7), ScalarType::Int32), Ok(RawValue::I32(7)));
        assert_eq!(scalar(&FieldValue::I32(7), ScalarType::Uint64), Ok(RawValue::U64(7)));
        assert_eq!(scalar(&FieldValue::U64(1 << 40), ScalarType::Sint64), Ok(RawValue::I64(1 << 40)));
    }

    #[test]
    fn rejects_out_of_range() {
        let err = scalar(&FieldValue::I64(i64::from(i32::MAX) + 1), ScalarType::Int32).unwrap_err();
        assert!(err.contains("out of range"));
        assert!(scalar(&FieldValue::I32(-1), ScalarType::Uint32).is_err());
        assert!(scalar(&FieldValue::U64(u64::MAX), ScalarType::Int64).is_err());
    }

    #[test]
    fn integral_floats_coerce_to_ints() {
        assert_eq!(scalar(&FieldValue::F64(3.0), ScalarType::Int32), Ok(RawValue::I32(3)));
        assert!(scalar(&FieldValue::F64(3.5), ScalarType::Int32).is_err());
    }

    #[test]
    fn float_targets_take_ints() {
        assert_eq!(scalar(&FieldValue::I32(2), ScalarType::Double), Ok(RawValue::F64(2.0)));
        assert_eq!(scalar(&FieldValue::F64(0.5), ScalarType::Float), Ok(RawValue::F32(0.5)));
    }

    #[test]
    fn exact_types_must_match() {
        assert!(scalar(&FieldValue::I32(1), ScalarType::Bool).is_err());
        assert!(scalar(&FieldValue::Bool(true), ScalarType::String).is_err());
        let err = scalar(&FieldValue::String(Arc::from("x")), ScalarType::Bytes).unwrap_err();
        assert_eq!(err, "expected bytes, found string");
    }

    #[test]
    fn enum_numbers() {
        assert_eq!(enum_number(&FieldValue::U32(2)), Ok(2));
        assert!(enum_number(&FieldValue::I64(i64::MAX)).is_err());
        assert!(enum_number(&FieldValue::Bool(true)).is_err());
    }

    #[test]
    fn map_keys_parse_and_convert() {
        let text = MapKey::String(Arc::from("42"));
        assert_eq!(map_key(&text, ScalarType::Int32), Ok(MapKey::I32(42)));
        assert_eq!(map_key(&MapKey::I64(5), ScalarType::Uint32), Ok(MapKey::U32(5)));
        assert_eq!(map_key(&text, ScalarType::String), Ok(text.clone()));
        assert!(map_key(&MapKey::String(Arc::from("x")), ScalarType::Bool).is_err());
    }
}
