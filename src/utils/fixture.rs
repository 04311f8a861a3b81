//! Builders for small, well-formed database images used by tests and benches.

use std::{cmp::Ordering, io::Write, path::Path};

use tempfile::NamedTempFile;

use crate::{
    storage::{header::DatabaseHeader, storage_manager::StorageManager},
    types::{
        CELL_POINTER_SIZE, DATABASE_HEADER_SIZE, MAX_PAGE_SIZE, PageNumber, RowId,
        error::{DatabaseError, Result},
        page::PageType,
        value::Value,
        varint::encode_varint,
    },
};

/// Serialises `values` as a record payload: header length, serial types,
/// then column content. Integers use the narrowest serial type.
pub fn encode_record(values: &[Value]) -> Vec<u8> {
    let mut serial_types = Vec::new();
    let mut content = Vec::new();

    for value in values {
        match value {
            Value::Null => serial_types.extend(encode_varint(0)),
            Value::Integer(0) => serial_types.extend(encode_varint(8)),
            Value::Integer(1) => serial_types.extend(encode_varint(9)),
            Value::Integer(n) => {
                let (code, width) = integer_serial_type(*n);
                serial_types.extend(encode_varint(code));
                content.extend_from_slice(&n.to_be_bytes()[8 - width..]);
            }
            Value::Real(r) => {
                serial_types.extend(encode_varint(7));
                content.extend_from_slice(&r.to_be_bytes());
            }
            Value::Text(text) => {
                serial_types.extend(encode_varint(text.len() as u64 * 2 + 13));
                content.extend_from_slice(text.as_bytes());
            }
            Value::Blob(blob) => {
                serial_types.extend(encode_varint(blob.len() as u64 * 2 + 12));
                content.extend_from_slice(blob);
            }
        }
    }

    // The header length counts its own varint.
    let mut header_len = serial_types.len() + 1;
    while encode_varint(header_len as u64).len() + serial_types.len() != header_len {
        header_len = encode_varint(header_len as u64).len() + serial_types.len();
    }

    let mut record = encode_varint(header_len as u64);
    record.extend(serial_types);
    record.extend(content);
    record
}

fn integer_serial_type(n: i64) -> (u64, usize) {
    match n {
        -0x80..=0x7f => (1, 1),
        -0x8000..=0x7fff => (2, 2),
        -0x80_0000..=0x7f_ffff => (3, 3),
        -0x8000_0000..=0x7fff_ffff => (4, 4),
        -0x8000_0000_0000..=0x7fff_ffff_ffff => (5, 6),
        _ => (6, 8),
    }
}

struct SchemaRow {
    object_type: String,
    name: String,
    table_name: String,
    root_page: PageNumber,
    create_statement: String,
}

/// Writes a database image page by page. Page 1 is reserved for the schema
/// table and written by [`DatabaseBuilder::build`].
pub struct DatabaseBuilder {
    page_size: usize,
    pages: Vec<Vec<u8>>,
    schema: Vec<SchemaRow>,
}

impl DatabaseBuilder {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            pages: vec![Vec::new()],
            schema: Vec::new(),
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Page number the next added page will receive.
    pub fn next_page_number(&self) -> PageNumber {
        self.pages.len() as PageNumber + 1
    }

    /// Appends `bytes` as a page, zero padded to the page size.
    pub fn add_raw_page(&mut self, mut bytes: Vec<u8>) -> PageNumber {
        bytes.resize(self.page_size, 0);
        self.pages.push(bytes);
        self.pages.len() as PageNumber
    }

    pub fn add_schema_entry(
        &mut self,
        object_type: &str,
        name: &str,
        table_name: &str,
        root_page: PageNumber,
        create_statement: &str,
    ) {
        self.schema.push(SchemaRow {
            object_type: object_type.to_string(),
            name: name.to_string(),
            table_name: table_name.to_string(),
            root_page,
            create_statement: create_statement.to_string(),
        });
    }

    /// Writes a table b-tree holding `rows` (sorted by row id here) and
    /// registers it in the schema. Leaves hold at most `fanout` rows and
    /// interior pages at most `fanout` children.
    pub fn add_table(
        &mut self,
        name: &str,
        create_statement: &str,
        mut rows: Vec<(RowId, Vec<Value>)>,
        fanout: usize,
    ) -> Result<PageNumber> {
        let fanout = fanout.max(2);
        rows.sort_by_key(|(row_id, _)| *row_id);

        let mut level = Vec::new();
        for chunk in rows.chunks(fanout) {
            let cells = chunk
                .iter()
                .map(|(row_id, values)| table_leaf_cell(*row_id, values))
                .collect::<Vec<_>>();
            let page = self.encode_page(PageType::LeafTable, &cells, None)?;
            let max_key = chunk.last().map(|(row_id, _)| *row_id).unwrap_or_default();
            level.push((self.add_raw_page(page), max_key));
        }
        if level.is_empty() {
            let page = self.encode_page(PageType::LeafTable, &[], None)?;
            level.push((self.add_raw_page(page), 0));
        }

        while level.len() > 1 {
            let mut parents = Vec::new();
            for group in level.chunks(fanout) {
                let Some((&(right_most, max_key), children)) = group.split_last() else {
                    continue;
                };
                let page = self.table_interior_page(children, right_most)?;
                parents.push((self.add_raw_page(page), max_key));
            }
            level = parents;
        }

        let root = level[0].0;
        self.add_schema_entry("table", name, name, root, create_statement);
        Ok(root)
    }

    /// Writes an index b-tree over `entries` (key, row id) and registers it.
    /// Entries are sorted by key, then row id. Interior pages carry real
    /// entries as separators, as the format requires.
    pub fn add_index(
        &mut self,
        name: &str,
        table_name: &str,
        create_statement: &str,
        mut entries: Vec<(Value, RowId)>,
        fanout: usize,
    ) -> Result<PageNumber> {
        let fanout = fanout.max(2);
        entries.sort_by(|a, b| match a.0.key_cmp(&b.0) {
            Ordering::Equal => a.1.cmp(&b.1),
            other => other,
        });
        let root = self.write_index_subtree(&entries, fanout)?;
        self.add_schema_entry("index", name, table_name, root, create_statement);
        Ok(root)
    }

    fn write_index_subtree(
        &mut self,
        entries: &[(Value, RowId)],
        fanout: usize,
    ) -> Result<PageNumber> {
        if entries.len() <= fanout {
            let cells = entries
                .iter()
                .map(|(key, row_id)| index_leaf_cell(key, *row_id))
                .collect::<Vec<_>>();
            let page = self.encode_page(PageType::LeafIndex, &cells, None)?;
            return Ok(self.add_raw_page(page));
        }

        // `separators` entries go up; the rest split evenly into one more
        // group than there are separators.
        let separators = fanout.min((entries.len() - 1) / 2).max(1);
        let groups = separators + 1;
        let grouped = entries.len() - separators;
        let mut cells = Vec::with_capacity(separators);
        let mut start = 0;
        for group in 0..groups {
            let len = grouped / groups + usize::from(group < grouped % groups);
            let child = self.write_index_subtree(&entries[start..start + len], fanout)?;
            start += len;
            if group == separators {
                let page = self.encode_page(PageType::InteriorIndex, &cells, Some(child))?;
                return Ok(self.add_raw_page(page));
            }
            let (key, row_id) = &entries[start];
            cells.push(index_interior_cell(child, key, *row_id));
            start += 1;
        }

        Err(DatabaseError::malformed("index fixture produced no right-most child"))
    }

    /// Encodes an interior table page whose cells point at `children`
    /// (page, max row id) with `right_most` as the right-most pointer.
    pub fn table_interior_page(
        &self,
        children: &[(PageNumber, RowId)],
        right_most: PageNumber,
    ) -> Result<Vec<u8>> {
        let cells = children
            .iter()
            .map(|(page, key)| {
                let mut cell = page.to_be_bytes().to_vec();
                cell.extend(encode_varint(*key as u64));
                cell
            })
            .collect::<Vec<_>>();
        self.encode_page(PageType::InteriorTable, &cells, Some(right_most))
    }

    /// Lays out one b-tree page. Cell content grows down from the end of the
    /// page in the order given; pointers keep that order.
    fn encode_page(
        &self,
        page_type: PageType,
        cells: &[Vec<u8>],
        right_most: Option<PageNumber>,
    ) -> Result<Vec<u8>> {
        self.encode_page_at(0, page_type, cells, right_most)
    }

    fn encode_page_at(
        &self,
        header_offset: usize,
        page_type: PageType,
        cells: &[Vec<u8>],
        right_most: Option<PageNumber>,
    ) -> Result<Vec<u8>> {
        let mut page = vec![0u8; self.page_size];
        let pointer_start = header_offset + page_type.header_size();
        let pointer_end = pointer_start + cells.len() * CELL_POINTER_SIZE;

        let mut content_start = self.page_size;
        for (i, cell) in cells.iter().enumerate() {
            if content_start < pointer_end + cell.len() {
                return Err(DatabaseError::malformed(format!(
                    "{} cells do not fit in a {}-byte page",
                    cells.len(),
                    self.page_size
                )));
            }
            content_start -= cell.len();
            page[content_start..content_start + cell.len()].copy_from_slice(cell);
            let pointer = pointer_start + i * CELL_POINTER_SIZE;
            page[pointer..pointer + CELL_POINTER_SIZE]
                .copy_from_slice(&(content_start as u16).to_be_bytes());
        }

        page[header_offset] = page_type.as_u8();
        page[header_offset + 3..header_offset + 5]
            .copy_from_slice(&(cells.len() as u16).to_be_bytes());
        // 65536 does not fit in the field and is stored as 0.
        let stored_start = if content_start == MAX_PAGE_SIZE {
            0
        } else {
            content_start as u16
        };
        page[header_offset + 5..header_offset + 7].copy_from_slice(&stored_start.to_be_bytes());
        if let Some(right_most) = right_most {
            page[header_offset + 8..header_offset + 12].copy_from_slice(&right_most.to_be_bytes());
        }

        Ok(page)
    }

    /// Writes page 1 (file header plus schema table leaf) and returns the
    /// whole image.
    pub fn build(mut self) -> Result<Vec<u8>> {
        let cells = self
            .schema
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let record = encode_record(&[
                    Value::Text(row.object_type.clone()),
                    Value::Text(row.name.clone()),
                    Value::Text(row.table_name.clone()),
                    Value::Integer(i64::from(row.root_page)),
                    Value::Text(row.create_statement.clone()),
                ]);
                table_leaf_payload(i as RowId + 1, record)
            })
            .collect::<Vec<_>>();

        let mut first =
            self.encode_page_at(DATABASE_HEADER_SIZE, PageType::LeafTable, &cells, None)?;
        let mut header = DatabaseHeader::with_page_size(self.page_size);
        header.database_size_pages = self.pages.len() as u32;
        first[..DATABASE_HEADER_SIZE].copy_from_slice(&header.to_bytes());
        self.pages[0] = first;

        Ok(self.pages.concat())
    }
}

fn table_leaf_cell(row_id: RowId, values: &[Value]) -> Vec<u8> {
    table_leaf_payload(row_id, encode_record(values))
}

fn table_leaf_payload(row_id: RowId, payload: Vec<u8>) -> Vec<u8> {
    let mut cell = encode_varint(payload.len() as u64);
    cell.extend(encode_varint(row_id as u64));
    cell.extend(payload);
    cell
}

fn index_leaf_cell(key: &Value, row_id: RowId) -> Vec<u8> {
    let payload = encode_record(&[key.clone(), Value::Integer(row_id)]);
    let mut cell = encode_varint(payload.len() as u64);
    cell.extend(payload);
    cell
}

fn index_interior_cell(left_child: PageNumber, key: &Value, row_id: RowId) -> Vec<u8> {
    let mut cell = left_child.to_be_bytes().to_vec();
    cell.extend(index_leaf_cell(key, row_id));
    cell
}

/// A database image persisted to a temporary file, removed on drop.
pub struct TempDatabase {
    file: NamedTempFile,
}

impl TempDatabase {
    pub fn new(image: &[u8]) -> Result<Self> {
        Self::with_prefix("baca", image)
    }

    pub fn with_prefix(prefix: &str, image: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(".db")
            .tempfile()?;
        file.write_all(image)?;
        file.flush()?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn open(&self) -> Result<StorageManager> {
        StorageManager::open(self.path())
    }
}
