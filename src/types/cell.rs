use bytes::Bytes;

use crate::types::{
    PageNumber, RowId,
    error::{DatabaseError, Result},
    page::PageType,
    record::{Column, Record, decode_record},
    varint::{decode_varint, read_u32_be},
};

/// One on-page cell. The owning page's type decides the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    TableLeaf(TableLeafCell),
    TableInterior(TableInteriorCell),
    IndexLeaf(IndexLeafCell),
    IndexInterior(IndexInteriorCell),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableLeafCell {
    pub row_id: RowId,
    pub record: Record,
}

/// Separator of a table tree: every row id under `left_child` is `<= key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableInteriorCell {
    pub left_child: PageNumber,
    pub key: RowId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexLeafCell {
    pub record: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexInteriorCell {
    pub left_child: PageNumber,
    pub record: Record,
}

/// Key columns followed by the referenced table row id, shared by both index
/// cell variants.
pub trait IndexEntry {
    fn record(&self) -> &Record;

    fn key(&self) -> Option<&Column> {
        self.record().column(0)
    }

    fn row_id(&self) -> Result<RowId> {
        self.record()
            .last()
            .ok_or_else(|| DatabaseError::malformed("index record without columns"))?
            .as_integer()
    }
}

impl IndexEntry for IndexLeafCell {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl IndexEntry for IndexInteriorCell {
    fn record(&self) -> &Record {
        &self.record
    }
}

impl Cell {
    /// Decodes the cell at `offset` of `page`, a full page buffer.
    pub fn decode(page_type: PageType, page: &Bytes, offset: usize) -> Result<Cell> {
        let cell = match page_type {
            PageType::LeafTable => Cell::TableLeaf(decode_table_leaf(page, offset)?),
            PageType::InteriorTable => Cell::TableInterior(decode_table_interior(page, offset)?),
            PageType::LeafIndex => Cell::IndexLeaf(IndexLeafCell {
                record: decode_payload(page, offset)?.0,
            }),
            PageType::InteriorIndex => {
                let left_child = read_u32_be(page, offset)?;
                let (record, _) = decode_payload(page, offset + 4)?;
                Cell::IndexInterior(IndexInteriorCell { left_child, record })
            }
        };
        Ok(cell)
    }

    pub fn left_child(&self) -> Option<PageNumber> {
        match self {
            Cell::TableInterior(cell) => Some(cell.left_child),
            Cell::IndexInterior(cell) => Some(cell.left_child),
            Cell::TableLeaf(_) | Cell::IndexLeaf(_) => None,
        }
    }
}

fn decode_table_leaf(page: &Bytes, offset: usize) -> Result<TableLeafCell> {
    let (payload_size, payload_len) = decode_varint(page, offset)?;
    let (row_id, row_id_len) = decode_varint(page, offset + payload_len)?;
    let payload = payload_view(page, offset + payload_len + row_id_len, payload_size)?;
    let (record, _) = decode_record(&payload, 0)?;
    Ok(TableLeafCell {
        row_id: row_id as RowId,
        record,
    })
}

fn decode_table_interior(page: &Bytes, offset: usize) -> Result<TableInteriorCell> {
    let left_child = read_u32_be(page, offset)?;
    let (key, _) = decode_varint(page, offset + 4)?;
    Ok(TableInteriorCell {
        left_child,
        key: key as RowId,
    })
}

/// Reads a `payload size` varint followed by that many bytes of record.
fn decode_payload(page: &Bytes, offset: usize) -> Result<(Record, usize)> {
    let (payload_size, payload_len) = decode_varint(page, offset)?;
    let payload = payload_view(page, offset + payload_len, payload_size)?;
    decode_record(&payload, 0)
}

/// Payloads spilling onto overflow pages do not fit inside the page buffer
/// and are reported as truncated.
fn payload_view(page: &Bytes, start: usize, payload_size: u64) -> Result<Bytes> {
    let size = usize::try_from(payload_size)
        .map_err(|_| DatabaseError::truncated(page.len(), start, usize::MAX))?;
    let end = start
        .checked_add(size)
        .filter(|end| *end <= page.len())
        .ok_or_else(|| DatabaseError::truncated(page.len(), start, size))?;
    Ok(page.slice(start..end))
}
