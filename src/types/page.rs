use bytes::Bytes;

use crate::types::{
    CELL_POINTER_SIZE, DATABASE_HEADER_SIZE, INTERIOR_PAGE_HEADER_SIZE, LEAF_PAGE_HEADER_SIZE,
    MAX_PAGE_SIZE, PageNumber, SCHEMA_ROOT_PAGE,
    cell::Cell,
    error::{DatabaseError, Result},
    varint::{read_u16_be, read_u32_be, slice_at},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageType {
    InteriorIndex = 2,
    InteriorTable = 5,
    LeafIndex = 10,
    LeafTable = 13,
}

impl PageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            2 => Some(PageType::InteriorIndex),
            5 => Some(PageType::InteriorTable),
            10 => Some(PageType::LeafIndex),
            13 => Some(PageType::LeafTable),
            _ => None,
        }
    }

    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    pub fn is_interior(&self) -> bool {
        matches!(self, PageType::InteriorIndex | PageType::InteriorTable)
    }

    pub fn is_table(&self) -> bool {
        matches!(self, PageType::InteriorTable | PageType::LeafTable)
    }

    pub fn header_size(&self) -> usize {
        if self.is_interior() {
            INTERIOR_PAGE_HEADER_SIZE
        } else {
            LEAF_PAGE_HEADER_SIZE
        }
    }
}

/*
 * B-tree page layout (page 1 is preceded by the 100-byte file header)
 * ┌───────────────────────────────────────────────────────────────────┐
 * │ type(1) | first_freeblock(2) | cell_count(2) | content_start(2) | │
 * │ fragmented_free_bytes(1) | right_most_pointer(4, interior only)   │
 * ├───────────────────────────────────────────────────────────────────┤
 * │ CELL POINTER ARRAY: cell_count x u16, offsets from page start     │
 * ├───────────────────────────────────────────────────────────────────┤
 * │ UNALLOCATED SPACE                                                 │
 * ├───────────────────────────────────────────────────────────────────┤
 * │ CELL CONTENT AREA (cells in any order, freeblocks in between)     │
 * └───────────────────────────────────────────────────────────────────┘
 */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub first_freeblock: u16,
    pub cell_count: u16,
    /// Start of the cell content area; a stored 0 means 65536.
    pub cell_content_start: u32,
    pub fragmented_free_bytes: u8,
    pub right_most_pointer: Option<PageNumber>,
}

impl PageHeader {
    /// Parses the b-tree header of `page_number` from its full page buffer.
    pub fn parse(page_number: PageNumber, page: &[u8]) -> Result<Self> {
        let offset = header_offset(page_number);
        let type_byte = *page.get(offset).ok_or_else(|| {
            DatabaseError::malformed(format!("page {page_number} has no b-tree header"))
        })?;
        let page_type = PageType::from_u8(type_byte).ok_or(DatabaseError::UnknownPageType {
            page_number,
            type_byte,
        })?;

        if offset + page_type.header_size() > page.len() {
            return Err(DatabaseError::malformed(format!(
                "page {page_number} is too small for a {}-byte header",
                page_type.header_size()
            )));
        }

        let content_start = read_u16_be(page, offset + 5)?;
        let right_most_pointer = if page_type.is_interior() {
            Some(read_u32_be(page, offset + LEAF_PAGE_HEADER_SIZE)?)
        } else {
            None
        };

        Ok(Self {
            page_type,
            first_freeblock: read_u16_be(page, offset + 1)?,
            cell_count: read_u16_be(page, offset + 3)?,
            cell_content_start: if content_start == 0 {
                MAX_PAGE_SIZE as u32
            } else {
                u32::from(content_start)
            },
            fragmented_free_bytes: page[offset + 7],
            right_most_pointer,
        })
    }

    /// Offset of the cell pointer array within the page.
    pub fn cell_pointer_offset(&self, page_number: PageNumber) -> usize {
        header_offset(page_number) + self.page_type.header_size()
    }
}

fn header_offset(page_number: PageNumber) -> usize {
    if page_number == SCHEMA_ROOT_PAGE {
        DATABASE_HEADER_SIZE
    } else {
        0
    }
}

/// A fully decoded page. Cells keep pointer-array order, which is storage
/// order and not necessarily key order.
#[derive(Debug, Clone)]
pub struct Page {
    pub page_number: PageNumber,
    pub header: PageHeader,
    pub cell_pointers: Vec<u16>,
    pub cells: Vec<Cell>,
}

impl Page {
    pub fn parse(page_number: PageNumber, data: Bytes) -> Result<Self> {
        let header = PageHeader::parse(page_number, &data)?;
        let pointer_start = header.cell_pointer_offset(page_number);
        let pointer_len = usize::from(header.cell_count) * CELL_POINTER_SIZE;
        let pointer_bytes = slice_at(&data, pointer_start, pointer_len).map_err(|_| {
            DatabaseError::malformed(format!(
                "page {page_number}: {} cell pointers overrun the page",
                header.cell_count
            ))
        })?;

        let cell_pointers: Vec<u16> = pointer_bytes
            .chunks_exact(CELL_POINTER_SIZE)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();

        let mut cells = Vec::with_capacity(cell_pointers.len());
        for &pointer in &cell_pointers {
            let pointer = usize::from(pointer);
            if pointer >= data.len() {
                return Err(DatabaseError::truncated(data.len(), pointer, 1));
            }
            cells.push(Cell::decode(header.page_type, &data, pointer)?);
        }

        Ok(Self {
            page_number,
            header,
            cell_pointers,
            cells,
        })
    }

    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
