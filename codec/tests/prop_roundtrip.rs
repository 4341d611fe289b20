use codec::{decode, encode, sign_extend, Extensions};
use proptest::prelude::*;
use schema::{Endian, FieldDef, Primitive, RecordShape, Shape, Value};

const INTEGERS: [Primitive; 9] = [
    Primitive::Bool,
    Primitive::U8,
    Primitive::U16,
    Primitive::U32,
    Primitive::U64,
    Primitive::I8,
    Primitive::I16,
    Primitive::I32,
    Primitive::I64,
];

#[derive(Clone, Debug)]
struct Column {
    primitive: Primitive,
    width: Option<u32>,
    endian: Endian,
    raw: u64,
}

fn endian_strategy() -> impl Strategy<Value = Endian> {
    prop_oneof![Just(Endian::Little), Just(Endian::Big)]
}

fn column_strategy() -> impl Strategy<Value = Column> {
    (
        prop::sample::select(INTEGERS.to_vec()),
        any::<bool>(),
        1u32..=64,
        endian_strategy(),
        any::<u64>(),
    )
        .prop_map(|(primitive, packed, width, endian, raw)| {
            let min = if primitive.is_signed() { 2 } else { 1 };
            let width = packed.then(|| width.clamp(min, primitive.bit_width()));
            Column {
                primitive,
                width,
                endian,
                raw,
            }
        })
}

fn masked(raw: u64, width: u32) -> u64 {
    if width == 64 {
        raw
    } else {
        raw & ((1u64 << width) - 1)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn column_value(column: &Column) -> Value {
    let width = column.width.unwrap_or_else(|| column.primitive.bit_width());
    let raw = masked(column.raw, width);
    match column.primitive {
        Primitive::Bool => Value::Bool(raw & 1 == 1),
        Primitive::U8 => Value::U8(raw as u8),
        Primitive::U16 => Value::U16(raw as u16),
        Primitive::U32 => Value::U32(raw as u32),
        Primitive::U64 => Value::U64(raw),
        Primitive::I8 => Value::I8(sign_extend(raw, width) as i8),
        Primitive::I16 => Value::I16(sign_extend(raw, width) as i16),
        Primitive::I32 => Value::I32(sign_extend(raw, width) as i32),
        _ => Value::I64(sign_extend(raw, width)),
    }
}

fn column_shape(columns: &[Column]) -> Shape {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            let field = FieldDef::new(format!("c{i}"), column.primitive).endian(column.endian);
            match column.width {
                Some(width) => field.bits(u64::from(width)),
                None => field,
            }
        })
        .collect();
    Shape::Record(RecordShape::new("Columns", fields).unwrap())
}

proptest! {
    #[test]
    fn packed_columns_roundtrip(columns in prop::collection::vec(column_strategy(), 1..24)) {
        let shape = column_shape(&columns);
        let value = Value::record(columns.iter().map(column_value));

        let bytes = encode(&value, &shape, &Extensions::new()).unwrap();
        let bits: u32 = columns
            .iter()
            .map(|c| c.width.unwrap_or_else(|| c.primitive.bit_width()))
            .sum();
        prop_assert_eq!(bytes.len(), bits.div_ceil(8) as usize);
        prop_assert_eq!(decode(&bytes, &shape, &Extensions::new()).unwrap(), value);
    }

    #[test]
    fn sized_sequence_roundtrips(
        count in 0u8..32,
        items in prop::collection::vec(any::<u16>(), 0..48),
        tail in any::<u32>(),
    ) {
        let shape = Shape::Record(
            RecordShape::new(
                "Framed",
                vec![
                    FieldDef::new("count", Shape::U8),
                    FieldDef::new("items", Shape::sequence(Shape::U16)).size("count"),
                    FieldDef::new("tail", Shape::U32).endian(Endian::Big),
                ],
            )
            .unwrap(),
        );
        let value = Value::record([
            Value::U8(count),
            Value::from(items.clone()),
            Value::U32(tail),
        ]);

        let bytes = encode(&value, &shape, &Extensions::new()).unwrap();
        prop_assert_eq!(bytes.len(), 1 + 2 * usize::from(count) + 4);

        let mut expected = items;
        expected.resize(usize::from(count), 0);
        prop_assert_eq!(
            decode(&bytes, &shape, &Extensions::new()).unwrap(),
            Value::record([Value::U8(count), Value::from(expected), Value::U32(tail)])
        );
    }

    #[test]
    fn fixed_text_is_always_strlen_bytes(text in "[a-zA-Z0-9 ]{0,24}", len in 0u64..16) {
        let shape = Shape::Record(
            RecordShape::new("Label", vec![FieldDef::new("text", Shape::Text).strlen(len)])
                .unwrap(),
        );
        let bytes = encode(&Value::record([Value::from(text.as_str())]), &shape, &Extensions::new())
            .unwrap();
        let width = usize::try_from(len).unwrap();
        let expected = format!("{:<width$}", &text[..text.len().min(width)]);
        prop_assert_eq!(bytes, expected.into_bytes());
    }

    #[test]
    fn arbitrary_input_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let shape = Shape::Record(
            RecordShape::new(
                "Anything",
                vec![
                    FieldDef::new("n", Shape::U8).bits("5"),
                    FieldDef::new("items", Shape::sequence(Shape::I16)).size("n"),
                    FieldDef::new("name", Shape::Text).strlen("n"),
                    FieldDef::new("rest", Shape::sequence(Shape::U8)),
                ],
            )
            .unwrap(),
        );
        let _ = decode(&bytes, &shape, &Extensions::new());
    }
}
