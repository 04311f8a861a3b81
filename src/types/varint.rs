//! Integer codecs of the file format.
//!
//! Varints are 1-9 bytes, big-endian, seven payload bits per byte with the
//! high bit as a continuation flag. The ninth byte, if reached, contributes
//! all eight bits. Fixed-width integers inside records are big-endian two's
//! complement of 1 to 8 bytes.

use crate::types::{
    MAX_VARINT_LEN,
    error::{DatabaseError, Result},
};

const CONTINUATION_BIT: u8 = 0x80;
const PAYLOAD_BITS: u8 = 0x7f;

/// Decodes a varint starting at `offset`, returning the value and the number
/// of bytes consumed.
pub fn decode_varint(buffer: &[u8], offset: usize) -> Result<(u64, usize)> {
    let mut value = 0u64;

    for i in 0..MAX_VARINT_LEN - 1 {
        let byte = *buffer
            .get(offset + i)
            .ok_or_else(|| DatabaseError::truncated(buffer.len(), offset, i + 1))?;
        value = (value << 7) | u64::from(byte & PAYLOAD_BITS);
        if byte & CONTINUATION_BIT == 0 {
            return Ok((value, i + 1));
        }
    }

    let last = *buffer
        .get(offset + MAX_VARINT_LEN - 1)
        .ok_or_else(|| DatabaseError::truncated(buffer.len(), offset, MAX_VARINT_LEN))?;
    value = (value << 8) | u64::from(last);
    Ok((value, MAX_VARINT_LEN))
}

/// Encodes `value` in the shortest varint form.
pub fn encode_varint(value: u64) -> Vec<u8> {
    // Values needing more than 56 bits take the 9-byte form.
    if value > 0x00ff_ffff_ffff_ffff {
        let mut buffer = Vec::with_capacity(MAX_VARINT_LEN);
        let high = value >> 8;
        for i in (0..8).rev() {
            buffer.push(((high >> (7 * i)) as u8 & PAYLOAD_BITS) | CONTINUATION_BIT);
        }
        buffer.push(value as u8);
        return buffer;
    }

    let mut groups = Vec::with_capacity(MAX_VARINT_LEN - 1);
    let mut remaining = value;
    loop {
        groups.push((remaining as u8) & PAYLOAD_BITS);
        remaining >>= 7;
        if remaining == 0 {
            break;
        }
    }
    groups.reverse();
    let last = groups.len() - 1;
    for group in &mut groups[..last] {
        *group |= CONTINUATION_BIT;
    }
    groups
}

/// Interprets 1-8 bytes as a big-endian two's-complement integer.
pub fn decode_signed_big_endian(bytes: &[u8]) -> Result<i64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(DatabaseError::InvalidWidth { width: bytes.len() });
    }

    let negative = bytes[0] & 0x80 != 0;
    let mut raw = [if negative { 0xff } else { 0x00 }; 8];
    raw[8 - bytes.len()..].copy_from_slice(bytes);
    Ok(i64::from_be_bytes(raw))
}

pub(crate) fn slice_at(buffer: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| buffer.get(offset..end))
        .ok_or_else(|| DatabaseError::truncated(buffer.len(), offset, len))
}

pub(crate) fn read_u16_be(buffer: &[u8], offset: usize) -> Result<u16> {
    let bytes = slice_at(buffer, offset, 2)?;
    Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32_be(buffer: &[u8], offset: usize) -> Result<u32> {
    let bytes = slice_at(buffer, offset, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
