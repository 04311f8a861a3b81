use bytes::Bytes;

use crate::types::{
    error::{DatabaseError, Result},
    value::Value,
    varint::{decode_signed_big_endian, decode_varint},
};

/// Column kind declared by a record header entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerialType {
    Null,
    Int8,
    Int16,
    Int24,
    Int32,
    Int48,
    Int64,
    Float64,
    Zero,
    One,
    Reserved(u64),
    Blob(usize),
    Text(usize),
}

impl SerialType {
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => SerialType::Null,
            1 => SerialType::Int8,
            2 => SerialType::Int16,
            3 => SerialType::Int24,
            4 => SerialType::Int32,
            5 => SerialType::Int48,
            6 => SerialType::Int64,
            7 => SerialType::Float64,
            8 => SerialType::Zero,
            9 => SerialType::One,
            10 | 11 => SerialType::Reserved(code),
            n if n % 2 == 0 => SerialType::Blob(((n - 12) / 2) as usize),
            n => SerialType::Text(((n - 13) / 2) as usize),
        }
    }

    pub fn code(&self) -> u64 {
        match *self {
            SerialType::Null => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 5,
            SerialType::Int64 => 6,
            SerialType::Float64 => 7,
            SerialType::Zero => 8,
            SerialType::One => 9,
            SerialType::Reserved(code) => code,
            SerialType::Blob(len) => len as u64 * 2 + 12,
            SerialType::Text(len) => len as u64 * 2 + 13,
        }
    }

    /// Number of content bytes a column of this type occupies.
    pub fn content_width(&self) -> usize {
        match *self {
            SerialType::Null | SerialType::Zero | SerialType::One | SerialType::Reserved(_) => 0,
            SerialType::Int8 => 1,
            SerialType::Int16 => 2,
            SerialType::Int24 => 3,
            SerialType::Int32 => 4,
            SerialType::Int48 => 6,
            SerialType::Int64 | SerialType::Float64 => 8,
            SerialType::Blob(len) | SerialType::Text(len) => len,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SerialType::Null | SerialType::Reserved(_) => "null",
            SerialType::Int8
            | SerialType::Int16
            | SerialType::Int24
            | SerialType::Int32
            | SerialType::Int48
            | SerialType::Int64
            | SerialType::Zero
            | SerialType::One => "integer",
            SerialType::Float64 => "real",
            SerialType::Blob(_) => "blob",
            SerialType::Text(_) => "text",
        }
    }
}

pub fn serial_type_width(code: u64) -> usize {
    SerialType::from_code(code).content_width()
}

/// One column of a record: its declared type and a view of its content bytes
/// inside the owning page buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub serial_type: SerialType,
    pub data: Bytes,
}

impl Column {
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_null(&self) -> bool {
        matches!(self.serial_type, SerialType::Null | SerialType::Reserved(_))
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self.serial_type {
            SerialType::Zero => Ok(0),
            SerialType::One => Ok(1),
            SerialType::Int8
            | SerialType::Int16
            | SerialType::Int24
            | SerialType::Int32
            | SerialType::Int48
            | SerialType::Int64 => decode_signed_big_endian(&self.data),
            other => Err(DatabaseError::TypeMismatch {
                expected: "integer".to_string(),
                actual: other.name().to_string(),
            }),
        }
    }

    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn to_value(&self) -> Result<Value> {
        Ok(match self.serial_type {
            SerialType::Null | SerialType::Reserved(_) => Value::Null,
            SerialType::Float64 => {
                let raw = <[u8; 8]>::try_from(self.as_bytes()).map_err(|_| {
                    DatabaseError::InvalidWidth {
                        width: self.data.len(),
                    }
                })?;
                Value::Real(f64::from_be_bytes(raw))
            }
            SerialType::Text(_) => Value::Text(self.as_text()),
            SerialType::Blob(_) => Value::Blob(self.data.to_vec()),
            _ => Value::Integer(self.as_integer()?),
        })
    }
}

/// A decoded row payload: one column per serial-type header entry, in
/// declared order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub columns: Vec<Column>,
}

impl Record {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, index: usize) -> Option<&Column> {
        self.columns.get(index)
    }

    pub fn last(&self) -> Option<&Column> {
        self.columns.last()
    }
}

/// Decodes the record starting at `offset`. Returns the record and the
/// number of bytes consumed (header plus content).
pub fn decode_record(buffer: &Bytes, offset: usize) -> Result<(Record, usize)> {
    let (header_length, length_size) = decode_varint(buffer, offset)?;
    let header_length = usize::try_from(header_length)
        .map_err(|_| DatabaseError::malformed(format!("record header length {header_length}")))?;
    if header_length < length_size {
        return Err(DatabaseError::malformed(format!(
            "record header length {header_length} shorter than its own varint"
        )));
    }

    let header_end = offset
        .checked_add(header_length)
        .filter(|end| *end <= buffer.len())
        .ok_or_else(|| DatabaseError::truncated(buffer.len(), offset, header_length))?;

    let mut serial_types = Vec::new();
    let mut cursor = offset + length_size;
    while cursor < header_end {
        let (code, size) = decode_varint(&buffer[..header_end], cursor).map_err(|_| {
            DatabaseError::malformed(format!(
                "serial type at offset {cursor} crosses header end {header_end}"
            ))
        })?;
        serial_types.push(SerialType::from_code(code));
        cursor += size;
    }

    let mut columns = Vec::with_capacity(serial_types.len());
    let mut content = header_end;
    for serial_type in serial_types {
        let width = serial_type.content_width();
        let end = content
            .checked_add(width)
            .filter(|end| *end <= buffer.len())
            .ok_or_else(|| DatabaseError::truncated(buffer.len(), content, width))?;
        columns.push(Column {
            serial_type,
            data: buffer.slice(content..end),
        });
        content = end;
    }

    tracing::trace!(offset, columns = columns.len(), "decoded record");
    Ok((Record { columns }, content - offset))
}
