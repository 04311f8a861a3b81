use std::{
    cmp::Ordering,
    collections::HashSet,
    io::{Read, Seek},
};

use crate::{
    storage::page_reader::{read_page, read_page_bytes},
    types::{
        PageNumber, RowId,
        cell::{Cell, IndexEntry},
        error::{DatabaseError, Result},
        page::{Page, PageHeader, PageType},
        row::Row,
        value::Value,
    },
};

/// Read-only traversal over table and index b-trees.
///
/// Every page is re-read from `reader` when visited; nothing is cached
/// between calls. Each public traversal tracks the pages it has visited and
/// fails with [`DatabaseError::CyclicPageReference`] instead of looping on a
/// malformed file.
pub struct BTree<'a, R> {
    reader: &'a mut R,
    page_size: usize,
    visited: HashSet<PageNumber>,
}

/// Cursor over an ascending list of sought row ids.
struct IdCursor<'a> {
    ids: &'a [RowId],
    position: usize,
}

impl<'a> IdCursor<'a> {
    fn new(ids: &'a [RowId]) -> Self {
        Self { ids, position: 0 }
    }

    fn head(&self) -> Option<RowId> {
        self.ids.get(self.position).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn is_exhausted(&self) -> bool {
        self.position >= self.ids.len()
    }
}

impl<'a, R: Read + Seek> BTree<'a, R> {
    pub fn new(reader: &'a mut R, page_size: usize) -> Self {
        Self {
            reader,
            page_size,
            visited: HashSet::new(),
        }
    }

    fn begin(&mut self) {
        self.visited.clear();
    }

    fn mark_visited(&mut self, page_number: PageNumber) -> Result<()> {
        if !self.visited.insert(page_number) {
            return Err(DatabaseError::CyclicPageReference { page_number });
        }
        Ok(())
    }

    fn load_page(&mut self, page_number: PageNumber) -> Result<Page> {
        self.mark_visited(page_number)?;
        read_page(self.reader, page_number, self.page_size)
    }

    /// Returns every row of the table tree rooted at `root_page` in ascending
    /// row id order.
    pub fn scan_all(&mut self, root_page: PageNumber) -> Result<Vec<Row>> {
        self.begin();
        let mut rows = Vec::new();
        self.scan_page(root_page, &mut rows)?;
        Ok(rows)
    }

    fn scan_page(&mut self, page_number: PageNumber, rows: &mut Vec<Row>) -> Result<()> {
        let page = self.load_page(page_number)?;
        match page.page_type() {
            PageType::LeafTable => {
                rows.extend(page.cells.into_iter().filter_map(|cell| match cell {
                    Cell::TableLeaf(leaf) => Some(Row::from(leaf)),
                    _ => None,
                }));
                Ok(())
            }
            PageType::InteriorTable => {
                for cell in &page.cells {
                    if let Cell::TableInterior(interior) = cell {
                        self.scan_page(interior.left_child, rows)?;
                    }
                }
                self.scan_page(right_most(&page)?, rows)
            }
            other => Err(not_a_table_page(page_number, other)),
        }
    }

    /// Returns the rows whose row id appears in `ids`, which must be sorted
    /// ascending. Ids with no row are skipped; subtrees whose key range
    /// cannot hold the next sought id are never read.
    pub fn fetch_by_ids(&mut self, root_page: PageNumber, ids: &[RowId]) -> Result<Vec<Row>> {
        self.begin();
        let mut rows = Vec::with_capacity(ids.len());
        let mut cursor = IdCursor::new(ids);
        if !cursor.is_exhausted() {
            self.fetch_page(root_page, &mut cursor, &mut rows)?;
        }
        Ok(rows)
    }

    fn fetch_page(
        &mut self,
        page_number: PageNumber,
        cursor: &mut IdCursor<'_>,
        rows: &mut Vec<Row>,
    ) -> Result<()> {
        let page = self.load_page(page_number)?;
        match page.page_type() {
            PageType::LeafTable => {
                for cell in page.cells {
                    let Cell::TableLeaf(leaf) = cell else {
                        continue;
                    };
                    // Ids below this row were not found in any earlier leaf.
                    while cursor.head().is_some_and(|id| id < leaf.row_id) {
                        cursor.advance();
                    }
                    match cursor.head() {
                        Some(id) if id == leaf.row_id => {
                            rows.push(Row::from(leaf));
                            cursor.advance();
                        }
                        Some(_) => {}
                        None => break,
                    }
                }
                Ok(())
            }
            PageType::InteriorTable => {
                for cell in &page.cells {
                    let Cell::TableInterior(interior) = cell else {
                        continue;
                    };
                    match cursor.head() {
                        Some(id) if id <= interior.key => {
                            self.fetch_page(interior.left_child, cursor, rows)?;
                        }
                        Some(id) => {
                            tracing::trace!(
                                page_number = interior.left_child,
                                next_id = id,
                                key = interior.key,
                                "pruned subtree"
                            );
                        }
                        None => return Ok(()),
                    }
                }
                if !cursor.is_exhausted() {
                    self.fetch_page(right_most(&page)?, cursor, rows)?;
                }
                Ok(())
            }
            other => Err(not_a_table_page(page_number, other)),
        }
    }

    /// Returns the table row ids referenced by index entries whose leading key
    /// column equals `target`, sorted ascending without duplicates.
    pub fn seek_index(&mut self, index_root: PageNumber, target: &Value) -> Result<Vec<RowId>> {
        self.begin();
        let mut row_ids = Vec::new();
        self.seek_page(index_root, target, &mut row_ids)?;
        row_ids.sort_unstable();
        row_ids.dedup();
        tracing::debug!(index_root, matches = row_ids.len(), "index seek finished");
        Ok(row_ids)
    }

    fn seek_page(
        &mut self,
        page_number: PageNumber,
        target: &Value,
        row_ids: &mut Vec<RowId>,
    ) -> Result<()> {
        let page = self.load_page(page_number)?;
        match page.page_type() {
            PageType::LeafIndex => {
                for cell in &page.cells {
                    if let Cell::IndexLeaf(entry) = cell {
                        if compare_key(target, entry)? == Ordering::Equal {
                            row_ids.push(entry.row_id()?);
                        }
                    }
                }
                Ok(())
            }
            PageType::InteriorIndex => {
                for cell in &page.cells {
                    let Cell::IndexInterior(entry) = cell else {
                        continue;
                    };
                    match compare_key(target, entry)? {
                        Ordering::Less => {
                            // Every later separator is larger still.
                            return self.seek_page(entry.left_child, target, row_ids);
                        }
                        Ordering::Equal => {
                            self.seek_page(entry.left_child, target, row_ids)?;
                            row_ids.push(entry.row_id()?);
                        }
                        Ordering::Greater => {}
                    }
                }
                self.seek_page(right_most(&page)?, target, row_ids)
            }
            other => Err(DatabaseError::malformed(format!(
                "page {page_number} is a {other:?} page inside an index tree"
            ))),
        }
    }

    /// Counts the rows of a table tree from page headers alone: leaf cell
    /// counts are summed and row records are never decoded.
    pub fn count_rows(&mut self, root_page: PageNumber) -> Result<u64> {
        self.begin();
        self.count_page(root_page)
    }

    fn count_page(&mut self, page_number: PageNumber) -> Result<u64> {
        self.mark_visited(page_number)?;
        // One read per page: leaves stop at the header, interior pages reuse
        // the same buffer for their child pointers.
        let data = read_page_bytes(self.reader, page_number, self.page_size)?;
        let header = PageHeader::parse(page_number, &data)?;
        match header.page_type {
            PageType::LeafTable => Ok(u64::from(header.cell_count)),
            PageType::InteriorTable => {
                let page = Page::parse(page_number, data)?;
                let mut total = 0;
                for child in page.cells.iter().filter_map(Cell::left_child) {
                    total += self.count_page(child)?;
                }
                Ok(total + self.count_page(right_most(&page)?)?)
            }
            other => Err(not_a_table_page(page_number, other)),
        }
    }
}

fn compare_key<E: IndexEntry>(target: &Value, entry: &E) -> Result<Ordering> {
    let key = entry
        .key()
        .ok_or_else(|| DatabaseError::malformed("index record without key column"))?
        .to_value()?;
    Ok(target.key_cmp(&key))
}

fn right_most(page: &Page) -> Result<PageNumber> {
    page.header.right_most_pointer.ok_or_else(|| {
        DatabaseError::malformed(format!(
            "interior page {} has no right-most pointer",
            page.page_number
        ))
    })
}

fn not_a_table_page(page_number: PageNumber, page_type: PageType) -> DatabaseError {
    DatabaseError::malformed(format!(
        "page {page_number} is a {page_type:?} page inside a table tree"
    ))
}
