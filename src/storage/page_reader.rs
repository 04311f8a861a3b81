use std::io::{Read, Seek, SeekFrom};

use bytes::Bytes;

use crate::types::{
    PageNumber,
    error::{DatabaseError, Result},
    page::{Page, PageHeader},
};

/// Byte offset of `page_number` (1-based) in the file.
pub fn page_offset(page_number: PageNumber, page_size: usize) -> Result<u64> {
    if page_number == 0 {
        return Err(DatabaseError::PageOutOfRange { page_number });
    }
    Ok(u64::from(page_number - 1) * page_size as u64)
}

/// Reads one page into a freshly owned buffer and decodes every cell.
pub fn read_page<R: Read + Seek>(
    reader: &mut R,
    page_number: PageNumber,
    page_size: usize,
) -> Result<Page> {
    let data = read_page_bytes(reader, page_number, page_size)?;
    let page = Page::parse(page_number, data)?;
    tracing::debug!(
        page_number,
        page_type = ?page.page_type(),
        cells = page.cell_count(),
        "read page"
    );
    Ok(page)
}

/// Reads only the b-tree header of a page; no cell is decoded.
pub fn peek_page_header<R: Read + Seek>(
    reader: &mut R,
    page_number: PageNumber,
    page_size: usize,
) -> Result<PageHeader> {
    let data = read_page_bytes(reader, page_number, page_size)?;
    PageHeader::parse(page_number, &data)
}

/// Reads the raw bytes of one page; nothing is parsed.
pub(crate) fn read_page_bytes<R: Read + Seek>(
    reader: &mut R,
    page_number: PageNumber,
    page_size: usize,
) -> Result<Bytes> {
    let offset = page_offset(page_number, page_size)?;
    reader.seek(SeekFrom::Start(offset))?;

    let mut buffer = Vec::with_capacity(page_size);
    reader.by_ref().take(page_size as u64).read_to_end(&mut buffer)?;
    if buffer.len() < page_size {
        return Err(DatabaseError::ShortRead {
            offset,
            expected: page_size,
            actual: buffer.len(),
        });
    }

    Ok(Bytes::from(buffer))
}
