#![no_main]

use libfuzzer_sys::fuzz_target;
use schema::{Annotations, FieldDef, RecordShape, Shape};

fuzz_target!(|data: &[u8]| {
    let Ok(tag) = std::str::from_utf8(data) else {
        return;
    };
    let _ = tag.parse::<Annotations>();

    for shape in [Shape::I16, Shape::F32, Shape::sequence(Shape::U8), Shape::Text] {
        if let Ok(field) = FieldDef::tagged("f", shape, tag) {
            let _ = RecordShape::new("Tagged", vec![FieldDef::new("N", Shape::U8), field]);
        }
    }
});
