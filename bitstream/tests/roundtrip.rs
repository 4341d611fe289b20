use bitstream::{BitBuffer, BitError, Endian};

#[test]
fn byte_and_bit_views_agree() {
    let mut buffer = BitBuffer::new();
    buffer.write_bytes(&[0x45, 0x00]);
    buffer.reset_to_start();

    let mut low_nibble = [false; 4];
    assert_eq!(buffer.read_bits(&mut low_nibble), 4);
    assert_eq!(low_nibble, [true, false, true, false]);

    let mut high_nibble = [false; 4];
    assert_eq!(buffer.read_bits(&mut high_nibble), 4);
    assert_eq!(high_nibble, [false, false, true, false]);
}

#[test]
fn overwrite_in_place_keeps_length() {
    let mut buffer = BitBuffer::from_bytes(&[0xFF, 0xFF]).unwrap();
    buffer.write_uint(0, 1, Endian::Little).unwrap();
    assert_eq!(buffer.len(), 16);
    assert_eq!(buffer.to_bytes(), vec![0x00, 0xFF]);
}

#[test]
fn read_past_end_reports_end_of_data() {
    let mut buffer = BitBuffer::from_bytes(&[0xAB]).unwrap();
    let mut out = [0u8; 1];
    assert_eq!(buffer.read_bytes(&mut out).unwrap(), 1);
    assert!(matches!(
        buffer.read_bytes(&mut out),
        Err(BitError::EndOfData { available: 0, .. })
    ));
}

#[test]
fn mixed_width_uints_roundtrip() {
    let mut buffer = BitBuffer::new();
    buffer.write_uint(0xBEEF, 2, Endian::Big).unwrap();
    buffer.write_bit(true);
    buffer.write_uint(0x0102_0304_0506_0708, 8, Endian::Little).unwrap();
    let bytes = buffer.to_bytes();
    assert_eq!(bytes.len(), 11);

    let mut reader = BitBuffer::from_bytes(&bytes).unwrap();
    assert_eq!(reader.read_uint(2, Endian::Big).unwrap(), 0xBEEF);
    assert_eq!(reader.read_bit(), Some(true));
    assert_eq!(
        reader.read_uint(8, Endian::Little).unwrap(),
        0x0102_0304_0506_0708
    );
}
