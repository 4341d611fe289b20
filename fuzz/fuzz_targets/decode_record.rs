#![no_main]

use codec::{Codec, CodecLimits, Extensions};
use libfuzzer_sys::fuzz_target;
use schema::{Endian, FieldDef, RecordShape, Shape};

fn shape() -> Option<Shape> {
    let inner = RecordShape::new(
        "Inner",
        vec![
            FieldDef::new("flag", Shape::BOOL).bits("1"),
            FieldDef::new("level", Shape::I8).bits("7"),
            FieldDef::new("items", Shape::sequence(Shape::U16)).size("count"),
        ],
    )
    .ok()?;
    let outer = RecordShape::new(
        "Outer",
        vec![
            FieldDef::new("count", Shape::U8).bits("3"),
            FieldDef::new("width", Shape::U8).bits("5"),
            FieldDef::new("packed", Shape::U32).bits("width").endian(Endian::Big),
            FieldDef::new("inner", Shape::array(2, Shape::Record(inner))),
            FieldDef::new("label", Shape::Text).strlen("count"),
            FieldDef::new("rest", Shape::sequence(Shape::U8)),
        ],
    )
    .ok()?;
    Some(Shape::Record(outer))
}

fuzz_target!(|data: &[u8]| {
    let Some(shape) = shape() else {
        return;
    };
    let codec = Codec::new(Extensions::new()).with_limits(CodecLimits::for_testing());

    // Anything that decodes must encode again.
    if let Ok(value) = codec.decode(data, &shape) {
        assert!(codec.encode(&value, &shape).is_ok());
    }
});
