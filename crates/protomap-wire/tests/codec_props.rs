use proptest::prelude::*;
use protomap_schema::{FieldDescriptor, MessageSchema, ScalarType, SchemaInspector, SchemaPool};
use protomap_wire::{Bytes, Codec, MapKey, ProtoCodec, RawField, RawMessage, RawValue, Vector};
use std::sync::Arc;

fn pool() -> SchemaPool {
    let mut schema = MessageSchema::new("Scalars");
    for (i, ty) in ScalarType::ALL.into_iter().enumerate() {
        let tag = i as u32 + 1;
        schema = schema.with_field(FieldDescriptor::scalar(format!("{ty}_value"), tag, ty));
    }
    schema = schema
        .with_field(FieldDescriptor::scalar("packed", 20, ScalarType::Sint64).repeated())
        .with_field(FieldDescriptor::scalar("words", 21, ScalarType::String).repeated())
        .with_field(FieldDescriptor::scalar("counts", 22, ScalarType::Uint32).map_key(ScalarType::Int64))
        .with_field(FieldDescriptor::message("child", 23, "Scalars"));
    SchemaPool::builder().message(schema).build().unwrap()
}

fn scalar_strategy(ty: ScalarType) -> BoxedStrategy<RawValue> {
    match ty {
        ScalarType::Double => any::<f64>().prop_map(RawValue::F64).boxed(),
        ScalarType::Float => any::<f32>().prop_map(RawValue::F32).boxed(),
        ScalarType::Int32 | ScalarType::Sint32 | ScalarType::Sfixed32 => any::<i32>().prop_map(RawValue::I32).boxed(),
        ScalarType::Int64 | ScalarType::Sint64 | ScalarType::Sfixed64 => any::<i64>().prop_map(RawValue::I64).boxed(),
        ScalarType::Uint32 | ScalarType::Fixed32 => any::<u32>().prop_map(RawValue::U32).boxed(),
        ScalarType::Uint64 | ScalarType::Fixed64 => any::<u64>().prop_map(RawValue::U64).boxed(),
        ScalarType::Bool => any::<bool>().prop_map(RawValue::Bool).boxed(),
        ScalarType::String => ".{0,12}".prop_map(|s| RawValue::String(Arc::from(s.as_str()))).boxed(),
        ScalarType::Bytes => proptest::collection::vec(any::<u8>(), 0..12)
            .prop_map(|b| RawValue::Bytes(Bytes::from(b)))
            .boxed(),
    }
}

/// Messages as the codec itself would produce them: no stored defaults
fn message_strategy() -> impl Strategy<Value = RawMessage> {
    let scalars: Vec<BoxedStrategy<Option<RawValue>>> = ScalarType::ALL
        .into_iter()
        .map(|ty| proptest::option::of(scalar_strategy(ty)).boxed())
        .collect();
    (
        scalars,
        proptest::collection::vec(any::<i64>(), 0..6),
        proptest::collection::vec(".{0,6}", 0..4),
        proptest::collection::btree_map(any::<i64>(), any::<u32>(), 0..4),
    )
        .prop_map(|(scalars, packed, words, counts)| {
            let mut msg = RawMessage::new();
            for (i, value) in scalars.into_iter().enumerate() {
                if let Some(value) = value.filter(|v| !v.is_default()) {
                    msg.set(i as u32 + 1, RawField::Single(value));
                }
            }
            if !packed.is_empty() {
                msg.set(20, RawField::List(packed.into_iter().map(RawValue::I64).collect::<Vector<_>>()));
            }
            for word in words {
                msg.push(21, RawValue::String(Arc::from(word.as_str())));
            }
            for (k, v) in counts {
                msg.insert_entry(22, MapKey::I64(k), RawValue::U32(v));
            }
            msg
        })
}

proptest! {
    #[test]
    fn prop_decode_inverts_encode(msg in message_strategy(), nested in message_strategy()) {
        let pool = pool();
        let schema = pool.require_message("Scalars").unwrap();
        let codec = ProtoCodec::new();

        let msg = msg.with(23, RawField::Single(RawValue::Message(nested)));
        let bytes = codec.encode(&msg, schema, &pool).unwrap();
        let decoded = codec.decode(&bytes, schema, &pool).unwrap();
        prop_assert_eq!(&decoded, &msg);
        prop_assert_eq!(codec.encode(&decoded, schema, &pool).unwrap(), bytes);
    }

    #[test]
    fn prop_garbage_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..64)) {
        let pool = pool();
        let schema = pool.require_message("Scalars").unwrap();
        let _ = ProtoCodec::new().decode(&bytes, schema, &pool);
    }
}
