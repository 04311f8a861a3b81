use baca::types::{
    error::DatabaseError,
    varint::{decode_signed_big_endian, decode_varint, encode_varint},
};

#[test]
fn test_varint_single_byte_values() {
    assert_eq!(decode_varint(&[0x00], 0).unwrap(), (0, 1));
    assert_eq!(decode_varint(&[0x7f], 0).unwrap(), (127, 1));
    assert_eq!(encode_varint(0), vec![0x00]);
    assert_eq!(encode_varint(127), vec![0x7f]);
}

#[test]
fn test_varint_two_byte_boundary() {
    assert_eq!(encode_varint(128), vec![0x81, 0x00]);
    assert_eq!(decode_varint(&[0x81, 0x00], 0).unwrap(), (128, 2));
    assert_eq!(decode_varint(&[0xff, 0x7f], 0).unwrap(), (16383, 2));
}

#[test]
fn test_varint_width_grows_every_seven_bits() {
    for bytes in 1..=8u32 {
        let largest = (1u64 << (7 * bytes)) - 1;
        let encoded = encode_varint(largest);
        assert_eq!(encoded.len(), bytes as usize, "largest {bytes}-byte value");
        assert_eq!(decode_varint(&encoded, 0).unwrap(), (largest, bytes as usize));

        let next = largest + 1;
        let expected_len = if bytes == 8 { 9 } else { bytes as usize + 1 };
        let encoded = encode_varint(next);
        assert_eq!(encoded.len(), expected_len, "smallest value past {bytes} bytes");
        assert_eq!(decode_varint(&encoded, 0).unwrap(), (next, expected_len));
    }
}

#[test]
fn test_varint_nine_byte_form_uses_all_bits_of_last_byte() {
    let encoded = encode_varint(u64::MAX);
    assert_eq!(encoded, vec![0xff; 9]);
    assert_eq!(decode_varint(&encoded, 0).unwrap(), (u64::MAX, 9));

    // The ninth byte carries no continuation flag even when its high bit is set.
    let mut buffer = encode_varint(u64::MAX);
    buffer.push(0x01);
    assert_eq!(decode_varint(&buffer, 0).unwrap(), (u64::MAX, 9));
}

#[test]
fn test_varint_round_trip_for_selected_values() {
    let values = [
        0,
        1,
        127,
        128,
        240,
        2287,
        16384,
        1 << 35,
        (1 << 56) - 1,
        1 << 56,
        i64::MAX as u64,
        u64::MAX - 1,
    ];
    for value in values {
        let encoded = encode_varint(value);
        assert_eq!(decode_varint(&encoded, 0).unwrap(), (value, encoded.len()));
    }
}

#[test]
fn test_varint_decodes_at_offset() {
    let mut buffer = vec![0xaa, 0xbb];
    buffer.extend(encode_varint(1 << 35));
    buffer.push(0x05);
    let (value, consumed) = decode_varint(&buffer, 2).unwrap();
    assert_eq!(value, 1 << 35);
    assert_eq!(decode_varint(&buffer, 2 + consumed).unwrap(), (5, 1));
}

#[test]
fn test_varint_truncated_input() {
    assert!(matches!(
        decode_varint(&[0x81], 0),
        Err(DatabaseError::TruncatedInput { .. })
    ));
    assert!(matches!(
        decode_varint(&[0xff; 8], 0),
        Err(DatabaseError::TruncatedInput { .. })
    ));
    assert!(matches!(
        decode_varint(&[0x01], 1),
        Err(DatabaseError::TruncatedInput { .. })
    ));
}

#[test]
fn test_signed_positive_values() {
    assert_eq!(decode_signed_big_endian(&[0x01]).unwrap(), 1);
    assert_eq!(decode_signed_big_endian(&[0x7f]).unwrap(), 127);
    assert_eq!(decode_signed_big_endian(&[0x00, 0x02]).unwrap(), 2);
    assert_eq!(decode_signed_big_endian(&[0x01, 0x00, 0x00]).unwrap(), 65536);
    assert_eq!(
        decode_signed_big_endian(&i64::MAX.to_be_bytes()).unwrap(),
        i64::MAX
    );
}

#[test]
fn test_signed_negative_values_are_sign_extended() {
    assert_eq!(decode_signed_big_endian(&[0xff]).unwrap(), -1);
    assert_eq!(decode_signed_big_endian(&[0x80]).unwrap(), -128);
    assert_eq!(decode_signed_big_endian(&[0xff, 0xfe]).unwrap(), -2);
    assert_eq!(decode_signed_big_endian(&[0x80, 0x00, 0x00]).unwrap(), -8_388_608);
    assert_eq!(
        decode_signed_big_endian(&[0xff, 0xff, 0xff, 0xff, 0xff, 0x85]).unwrap(),
        -123
    );
    assert_eq!(
        decode_signed_big_endian(&i64::MIN.to_be_bytes()).unwrap(),
        i64::MIN
    );
}

#[test]
fn test_signed_invalid_width() {
    assert!(matches!(
        decode_signed_big_endian(&[]),
        Err(DatabaseError::InvalidWidth { width: 0 })
    ));
    assert!(matches!(
        decode_signed_big_endian(&[0; 9]),
        Err(DatabaseError::InvalidWidth { width: 9 })
    ));
}
