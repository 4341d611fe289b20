//! Deterministic shape hashing.

use blake3::Hasher;

use crate::{Annotations, FieldDef, Shape, SizeSpec};

/// Computes a deterministic hash of a shape and every annotation in it.
///
/// Two peers that agree on the hash agree on the wire layout. Marshalers and
/// extensions are not code that can be hashed; only their identities are.
#[must_use]
pub fn shape_hash(shape: &Shape) -> u64 {
    let mut hasher = Hasher::new();
    write_shape(&mut hasher, shape);

    let hash = hasher.finalize();
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(prefix)
}

fn write_shape(hasher: &mut Hasher, shape: &Shape) {
    match shape {
        Shape::Primitive(primitive) => {
            write_u8(hasher, 0);
            write_str(hasher, primitive.name());
        }
        Shape::Text => write_u8(hasher, 1),
        Shape::Array { len, element } => {
            write_u8(hasher, 2);
            write_u64(hasher, *len as u64);
            write_shape(hasher, element);
        }
        Shape::Sequence(element) => {
            write_u8(hasher, 3);
            write_shape(hasher, element);
        }
        Shape::Optional(inner) => {
            write_u8(hasher, 4);
            write_shape(hasher, inner);
        }
        Shape::Record(record) => {
            write_u8(hasher, 5);
            write_str(hasher, record.id().as_str());
            write_u8(hasher, u8::from(record.marshaler().is_some()));
            write_u64(hasher, record.fields().len() as u64);
            for field in record.fields() {
                write_field(hasher, field);
            }
        }
        Shape::SelfDescribing(custom) => {
            write_u8(hasher, 6);
            write_str(hasher, custom.id().as_str());
        }
        Shape::Open(open) => {
            write_u8(hasher, 7);
            write_str(hasher, open.id().as_str());
        }
        Shape::Opaque { type_name } => {
            write_u8(hasher, 8);
            write_str(hasher, type_name);
        }
    }
}

fn write_field(hasher: &mut Hasher, field: &FieldDef) {
    write_str(hasher, field.name());
    write_annotations(hasher, field.annotations());
    write_shape(hasher, field.shape());
}

fn write_annotations(hasher: &mut Hasher, annotations: &Annotations) {
    write_str(hasher, annotations.endian.as_str());
    for spec in [&annotations.bits, &annotations.size, &annotations.strlen] {
        write_size_spec(hasher, spec.as_ref());
    }
    write_u8(hasher, u8::from(annotations.omit));
}

fn write_size_spec(hasher: &mut Hasher, spec: Option<&SizeSpec>) {
    match spec {
        None => write_u8(hasher, 0),
        Some(SizeSpec::Literal(value)) => {
            write_u8(hasher, 1);
            write_u64(hasher, *value);
        }
        Some(SizeSpec::Reference(name)) => {
            write_u8(hasher, 2);
            write_str(hasher, name);
        }
    }
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u64(hasher: &mut Hasher, value: u64) {
    hasher.update(&value.to_le_bytes());
}

fn write_str(hasher: &mut Hasher, value: &str) {
    write_u64(hasher, value.len() as u64);
    hasher.update(value.as_bytes());
}
