//! Protobuf binary wire codec
//!
//! proto3 encoding built on `prost`'s key and varint primitives. Fields are
//! written in ascending tag order followed by any preserved unknown fields.
//! Repeated numeric scalars and enums are written packed and read either way.
//! Decoding normalizes the input the way a proto3 runtime does: a repeated
//! singular message merges, a later one-of member replaces its siblings, and a
//! non-one-of scalar equal to its default is not stored.

use prost::bytes::{Buf, BufMut, Bytes};
use prost::encoding::{decode_key, decode_varint, encode_key, encode_varint, WireType};
use protomap_schema::{FieldDescriptor, FieldType, Label, MessageSchema, ScalarType, SchemaInspector};
use std::sync::Arc;

use crate::codec::Codec;
use crate::error::WireError;
use crate::raw::{MapKey, RawField, RawMessage, RawValue};

/// Nesting depth accepted by default
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Protobuf binary codec
#[derive(Debug, Clone, Copy)]
pub struct ProtoCodec {
    recursion_limit: u32,
}

impl Default for ProtoCodec {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
        }
    }
}

impl ProtoCodec {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the nesting limit
    #[inline]
    #[must_use]
    pub fn with_recursion_limit(mut self, limit: u32) -> Self {
        self.recursion_limit = limit;
        self
    }

    #[inline]
    #[must_use]
    pub fn recursion_limit(&self) -> u32 {
        self.recursion_limit
    }

    fn session<'a>(&self, inspector: &'a dyn SchemaInspector) -> Session<'a> {
        Session {
            inspector,
            limit: self.recursion_limit,
        }
    }
}

impl Codec for ProtoCodec {
    fn name(&self) -> &str {
        "proto"
    }

    fn encode(
        &self,
        message: &RawMessage,
        schema: &MessageSchema,
        inspector: &dyn SchemaInspector,
    ) -> Result<Vec<u8>, WireError> {
        tracing::trace!(schema = schema.name(), fields = message.len(), "encoding message");
        let mut buf = Vec::new();
        self.session(inspector)
            .encode_message(message, schema, &mut buf, 0)?;
        Ok(buf)
    }

    fn decode(
        &self,
        bytes: &[u8],
        schema: &MessageSchema,
        inspector: &dyn SchemaInspector,
    ) -> Result<RawMessage, WireError> {
        tracing::trace!(schema = schema.name(), len = bytes.len(), "decoding message");
        let mut message = RawMessage::new();
        self.session(inspector)
            .decode_into(&mut message, bytes, schema, 0)?;
        Ok(message)
    }
}

fn scalar_wire_type(ty: ScalarType) -> WireType {
    match ty {
        ScalarType::Double | ScalarType::Fixed64 | ScalarType::Sfixed64 => WireType::SixtyFourBit,
        ScalarType::Float | ScalarType::Fixed32 | ScalarType::Sfixed32 => WireType::ThirtyTwoBit,
        ScalarType::String | ScalarType::Bytes => WireType::LengthDelimited,
        _ => WireType::Varint,
    }
}

fn wire_type_of(ty: &FieldType) -> WireType {
    match ty {
        FieldType::Scalar(scalar) => scalar_wire_type(*scalar),
        FieldType::Enum(_) => WireType::Varint,
        FieldType::Message(_) => WireType::LengthDelimited,
    }
}

fn is_packed(ty: &FieldType) -> bool {
    match ty {
        FieldType::Scalar(scalar) => scalar.is_packable(),
        FieldType::Enum(_) => true,
        FieldType::Message(_) => false,
    }
}

fn mismatch(schema: &MessageSchema, field: &FieldDescriptor, value: &RawValue) -> WireError {
    WireError::ValueKindMismatch {
        schema: schema.name().to_string(),
        field: field.name().to_string(),
        expected: field.field_type().to_string(),
        found: value.kind(),
    }
}

fn truncated(schema: &MessageSchema) -> WireError {
    WireError::Truncated {
        schema: schema.name().to_string(),
    }
}

fn need(cursor: &[u8], n: usize, schema: &MessageSchema) -> Result<(), WireError> {
    if cursor.len() < n {
        return Err(truncated(schema));
    }
    Ok(())
}

fn take_len<'b>(cursor: &mut &'b [u8], schema: &MessageSchema) -> Result<&'b [u8], WireError> {
    let len = decode_varint(cursor)?;
    let data: &'b [u8] = *cursor;
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| len <= data.len())
        .ok_or_else(|| truncated(schema))?;
    let (head, tail) = data.split_at(len);
    *cursor = tail;
    Ok(head)
}

fn skip(tag: u32, wire_type: WireType, cursor: &mut &[u8], schema: &MessageSchema) -> Result<(), WireError> {
    match wire_type {
        WireType::Varint => {
            decode_varint(cursor)?;
        }
        WireType::SixtyFourBit => {
            need(cursor, 8, schema)?;
            cursor.advance(8);
        }
        WireType::ThirtyTwoBit => {
            need(cursor, 4, schema)?;
            cursor.advance(4);
        }
        WireType::LengthDelimited => {
            take_len(cursor, schema)?;
        }
        WireType::StartGroup | WireType::EndGroup => return Err(WireError::UnsupportedGroup { tag }),
    }
    Ok(())
}

fn check_wire_type(
    actual: WireType,
    expected: WireType,
    schema: &MessageSchema,
    field: &FieldDescriptor,
) -> Result<(), WireError> {
    if actual != expected {
        return Err(WireError::UnexpectedWireType {
            schema: schema.name().to_string(),
            field: field.name().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

#[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn write_scalar(ty: ScalarType, value: &RawValue, buf: &mut Vec<u8>) -> bool {
    match (ty, value) {
        (ScalarType::Double, RawValue::F64(v)) => buf.put_f64_le(*v),
        (ScalarType::Float, RawValue::F32(v)) => buf.put_f32_le(*v),
        (ScalarType::Int32, RawValue::I32(v)) => encode_varint(i64::from(*v) as u64, buf),
        (ScalarType::Sint32, RawValue::I32(v)) => {
            let v = *v;
            encode_varint(u64::from(((v << 1) ^ (v >> 31)) as u32), buf);
        }
        (ScalarType::Sfixed32, RawValue::I32(v)) => buf.put_i32_le(*v),
        (ScalarType::Int64, RawValue::I64(v)) => encode_varint(*v as u64, buf),
        (ScalarType::Sint64, RawValue::I64(v)) => {
            let v = *v;
            encode_varint(((v << 1) ^ (v >> 63)) as u64, buf);
        }
        (ScalarType::Sfixed64, RawValue::I64(v)) => buf.put_i64_le(*v),
        (ScalarType::Uint32, RawValue::U32(v)) => encode_varint(u64::from(*v), buf),
        (ScalarType::Fixed32, RawValue::U32(v)) => buf.put_u32_le(*v),
        (ScalarType::Uint64, RawValue::U64(v)) => encode_varint(*v, buf),
        (ScalarType::Fixed64, RawValue::U64(v)) => buf.put_u64_le(*v),
        (ScalarType::Bool, RawValue::Bool(v)) => encode_varint(u64::from(*v), buf),
        (ScalarType::String, RawValue::String(v)) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v.as_bytes());
        }
        (ScalarType::Bytes, RawValue::Bytes(v)) => {
            encode_varint(v.len() as u64, buf);
            buf.put_slice(v);
        }
        _ => return false,
    }
    true
}

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
fn read_scalar(
    ty: ScalarType,
    cursor: &mut &[u8],
    schema: &MessageSchema,
    field: &FieldDescriptor,
) -> Result<RawValue, WireError> {
    let value = match ty {
        ScalarType::Double => {
            need(cursor, 8, schema)?;
            RawValue::F64(cursor.get_f64_le())
        }
        ScalarType::Float => {
            need(cursor, 4, schema)?;
            RawValue::F32(cursor.get_f32_le())
        }
        ScalarType::Fixed64 => {
            need(cursor, 8, schema)?;
            RawValue::U64(cursor.get_u64_le())
        }
        ScalarType::Sfixed64 => {
            need(cursor, 8, schema)?;
            RawValue::I64(cursor.get_i64_le())
        }
        ScalarType::Fixed32 => {
            need(cursor, 4, schema)?;
            RawValue::U32(cursor.get_u32_le())
        }
        ScalarType::Sfixed32 => {
            need(cursor, 4, schema)?;
            RawValue::I32(cursor.get_i32_le())
        }
        ScalarType::Int32 => RawValue::I32(decode_varint(cursor)? as i32),
        ScalarType::Int64 => RawValue::I64(decode_varint(cursor)? as i64),
        ScalarType::Uint32 => RawValue::U32(decode_varint(cursor)? as u32),
        ScalarType::Uint64 => RawValue::U64(decode_varint(cursor)?),
        ScalarType::Sint32 => {
            let n = decode_varint(cursor)? as u32;
            RawValue::I32(((n >> 1) as i32) ^ -((n & 1) as i32))
        }
        ScalarType::Sint64 => {
            let n = decode_varint(cursor)?;
            RawValue::I64(((n >> 1) as i64) ^ -((n & 1) as i64))
        }
        ScalarType::Bool => RawValue::Bool(decode_varint(cursor)? != 0),
        ScalarType::String => {
            let data = take_len(cursor, schema)?;
            let text = std::str::from_utf8(data).map_err(|_| WireError::InvalidUtf8 {
                schema: schema.name().to_string(),
                field: field.name().to_string(),
            })?;
            RawValue::String(Arc::from(text))
        }
        ScalarType::Bytes => RawValue::Bytes(Bytes::copy_from_slice(take_len(cursor, schema)?)),
    };
    Ok(value)
}

fn default_value(ty: &FieldType) -> RawValue {
    match ty {
        FieldType::Scalar(scalar) => RawValue::default_for(*scalar),
        FieldType::Enum(_) => RawValue::Enum(0),
        FieldType::Message(_) => RawValue::Message(RawMessage::new()),
    }
}

/// One encode or decode call
struct Session<'a> {
    inspector: &'a dyn SchemaInspector,
    limit: u32,
}

impl Session<'_> {
    fn nested(&self, name: &str) -> Result<&MessageSchema, WireError> {
        self.inspector
            .message(name)
            .ok_or_else(|| WireError::UnknownSchema(name.to_string()))
    }

    fn enter(&self, depth: u32) -> Result<(), WireError> {
        if depth > self.limit {
            return Err(WireError::RecursionLimit { limit: self.limit });
        }
        Ok(())
    }

    fn encode_message(
        &self,
        message: &RawMessage,
        schema: &MessageSchema,
        buf: &mut Vec<u8>,
        depth: u32,
    ) -> Result<(), WireError> {
        self.enter(depth)?;
        for (tag, stored) in message.fields() {
            let field = schema.field_by_tag(tag).ok_or_else(|| WireError::UndeclaredTag {
                schema: schema.name().to_string(),
                tag,
            })?;
            let ty = field.field_type();
            match stored {
                RawField::Single(value) => self.encode_value(schema, field, ty, tag, value, buf, depth)?,
                RawField::List(values) if values.is_empty() => {}
                RawField::List(values) if is_packed(ty) => {
                    let mut packed = Vec::new();
                    for value in values {
                        self.write_payload(schema, field, ty, value, &mut packed, depth)?;
                    }
                    encode_key(tag, WireType::LengthDelimited, buf);
                    encode_varint(packed.len() as u64, buf);
                    buf.put_slice(&packed);
                }
                RawField::List(values) => {
                    for value in values {
                        self.encode_value(schema, field, ty, tag, value, buf, depth)?;
                    }
                }
                RawField::Map(entries) => {
                    let Label::Map { key: key_ty } = field.label() else {
                        return Err(WireError::ValueKindMismatch {
                            schema: schema.name().to_string(),
                            field: field.name().to_string(),
                            expected: field.field_type().to_string(),
                            found: "map",
                        });
                    };
                    let key_field_ty = FieldType::Scalar(key_ty);
                    for (key, value) in entries {
                        let mut entry = Vec::new();
                        self.encode_value(schema, field, &key_field_ty, 1, &key.to_value(), &mut entry, depth)?;
                        self.encode_value(schema, field, ty, 2, value, &mut entry, depth)?;
                        encode_key(tag, WireType::LengthDelimited, buf);
                        encode_varint(entry.len() as u64, buf);
                        buf.put_slice(&entry);
                    }
                }
            }
        }
        buf.put_slice(message.unknown());
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn encode_value(
        &self,
        schema: &MessageSchema,
        field: &FieldDescriptor,
        ty: &FieldType,
        tag: u32,
        value: &RawValue,
        buf: &mut Vec<u8>,
        depth: u32,
    ) -> Result<(), WireError> {
        encode_key(tag, wire_type_of(ty), buf);
        self.write_payload(schema, field, ty, value, buf, depth)
    }

    #[allow(clippy::cast_sign_loss)]
    fn write_payload(
        &self,
        schema: &MessageSchema,
        field: &FieldDescriptor,
        ty: &FieldType,
        value: &RawValue,
        buf: &mut Vec<u8>,
        depth: u32,
    ) -> Result<(), WireError> {
        match (ty, value) {
            (FieldType::Scalar(scalar), value) => {
                if !write_scalar(*scalar, value, buf) {
                    return Err(mismatch(schema, field, value));
                }
            }
            (FieldType::Enum(_), RawValue::Enum(number)) => {
                encode_varint(i64::from(*number) as u64, buf);
            }
            (FieldType::Message(name), RawValue::Message(message)) => {
                let nested = self.nested(name)?;
                let mut body = Vec::new();
                self.encode_message(message, nested, &mut body, depth + 1)?;
                encode_varint(body.len() as u64, buf);
                buf.put_slice(&body);
            }
            (_, value) => return Err(mismatch(schema, field, value)),
        }
        Ok(())
    }

    fn decode_into(
        &self,
        message: &mut RawMessage,
        bytes: &[u8],
        schema: &MessageSchema,
        depth: u32,
    ) -> Result<(), WireError> {
        self.enter(depth)?;
        let mut cursor = bytes;
        let mut unknown = Vec::new();

        while !cursor.is_empty() {
            let start = bytes.len() - cursor.len();
            let (tag, wire_type) = decode_key(&mut cursor)?;
            let Some(field) = schema.field_by_tag(tag) else {
                skip(tag, wire_type, &mut cursor, schema)?;
                let end = bytes.len() - cursor.len();
                unknown.extend_from_slice(&bytes[start..end]);
                continue;
            };
            self.decode_field(message, field, wire_type, &mut cursor, schema, depth)?;
        }

        if !unknown.is_empty() {
            let mut merged = message.unknown().to_vec();
            merged.extend_from_slice(&unknown);
            message.set_unknown(Bytes::from(merged));
        }
        Ok(())
    }

    fn decode_field(
        &self,
        message: &mut RawMessage,
        field: &FieldDescriptor,
        wire_type: WireType,
        cursor: &mut &[u8],
        schema: &MessageSchema,
        depth: u32,
    ) -> Result<(), WireError> {
        let tag = field.tag();
        let ty = field.field_type();

        match field.label() {
            Label::Map { key } => {
                check_wire_type(wire_type, WireType::LengthDelimited, schema, field)?;
                let entry = take_len(cursor, schema)?;
                let (key, value) = self.decode_entry(entry, key, field, schema, depth)?;
                message.insert_entry(tag, key, value);
            }
            Label::Repeated if wire_type == WireType::LengthDelimited && is_packed(ty) => {
                let mut packed = take_len(cursor, schema)?;
                while !packed.is_empty() {
                    let value = self.read_value(ty, &mut packed, schema, field, depth, None)?;
                    message.push(tag, value);
                }
            }
            Label::Repeated => {
                check_wire_type(wire_type, wire_type_of(ty), schema, field)?;
                let value = self.read_value(ty, cursor, schema, field, depth, None)?;
                message.push(tag, value);
            }
            Label::Singular => {
                check_wire_type(wire_type, wire_type_of(ty), schema, field)?;
                let base = message.single(tag).and_then(RawValue::as_message).cloned();
                let value = self.read_value(ty, cursor, schema, field, depth, base)?;
                if let Some(group) = field.one_of() {
                    for sibling in schema.one_of_members(group) {
                        if sibling.tag() != tag {
                            message.remove(sibling.tag());
                        }
                    }
                    message.set(tag, RawField::Single(value));
                } else if value.is_default() {
                    message.remove(tag);
                } else {
                    message.set(tag, RawField::Single(value));
                }
            }
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn read_value(
        &self,
        ty: &FieldType,
        cursor: &mut &[u8],
        schema: &MessageSchema,
        field: &FieldDescriptor,
        depth: u32,
        base: Option<RawMessage>,
    ) -> Result<RawValue, WireError> {
        match ty {
            FieldType::Scalar(scalar) => read_scalar(*scalar, cursor, schema, field),
            FieldType::Enum(_) => Ok(RawValue::Enum(decode_varint(cursor)? as i32)),
            FieldType::Message(name) => {
                let nested = self.nested(name)?;
                let body = take_len(cursor, schema)?;
                let mut inner = base.unwrap_or_default();
                self.decode_into(&mut inner, body, nested, depth + 1)?;
                Ok(RawValue::Message(inner))
            }
        }
    }

    fn decode_entry(
        &self,
        mut entry: &[u8],
        key_ty: ScalarType,
        field: &FieldDescriptor,
        schema: &MessageSchema,
        depth: u32,
    ) -> Result<(MapKey, RawValue), WireError> {
        let mut key = None;
        let mut value: Option<RawValue> = None;

        while !entry.is_empty() {
            let (tag, wire_type) = decode_key(&mut entry)?;
            match tag {
                1 => {
                    check_wire_type(wire_type, scalar_wire_type(key_ty), schema, field)?;
                    key = Some(read_scalar(key_ty, &mut entry, schema, field)?);
                }
                2 => {
                    check_wire_type(wire_type, wire_type_of(field.field_type()), schema, field)?;
                    let base = match value.take() {
                        Some(RawValue::Message(message)) => Some(message),
                        _ => None,
                    };
                    value = Some(self.read_value(field.field_type(), &mut entry, schema, field, depth, base)?);
                }
                _ => skip(tag, wire_type, &mut entry, schema)?,
            }
        }

        let key = match key {
            Some(raw) => MapKey::from_value(raw),
            None => MapKey::default_for(key_ty),
        }
        .ok_or_else(|| WireError::ValueKindMismatch {
            schema: schema.name().to_string(),
            field: field.name().to_string(),
            expected: "map key".to_string(),
            found: key_ty.name(),
        })?;
        let value = value.unwrap_or_else(|| default_value(field.field_type()));
        Ok((key, value))
    }
}
