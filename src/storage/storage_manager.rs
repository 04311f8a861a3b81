use std::{
    fs::{File, OpenOptions},
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use crate::{
    storage::{
        btree::BTree,
        header::DatabaseHeader,
        page_reader::{peek_page_header, read_page},
        schema::SchemaCatalog,
    },
    types::{
        DATABASE_HEADER_SIZE, PageNumber,
        error::{DatabaseError, Result},
        page::{Page, PageHeader},
    },
};

/// Owns the open database handle for the duration of one top-level command.
pub struct StorageManager<R = File> {
    reader: R,
    header: DatabaseHeader,
}

impl StorageManager<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "opening database");
        let file = OpenOptions::new().read(true).open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> StorageManager<R> {
    pub fn from_reader(mut reader: R) -> Result<Self> {
        let mut header_buffer = Vec::with_capacity(DATABASE_HEADER_SIZE);
        reader.seek(SeekFrom::Start(0))?;
        reader
            .by_ref()
            .take(DATABASE_HEADER_SIZE as u64)
            .read_to_end(&mut header_buffer)?;
        let header = DatabaseHeader::from_bytes(&header_buffer)?;
        if header.file_format_read_version > 2 {
            return Err(DatabaseError::malformed(format!(
                "unsupported read version {}",
                header.file_format_read_version
            )));
        }
        Ok(Self { reader, header })
    }

    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    pub fn page_size(&self) -> usize {
        self.header.page_size()
    }

    pub fn read_page(&mut self, page_number: PageNumber) -> Result<Page> {
        let page_size = self.page_size();
        read_page(&mut self.reader, page_number, page_size)
    }

    pub fn peek_page_header(&mut self, page_number: PageNumber) -> Result<PageHeader> {
        let page_size = self.page_size();
        peek_page_header(&mut self.reader, page_number, page_size)
    }

    pub fn btree(&mut self) -> BTree<'_, R> {
        let page_size = self.page_size();
        BTree::new(&mut self.reader, page_size)
    }

    pub fn load_catalog(&mut self) -> Result<SchemaCatalog> {
        SchemaCatalog::load(&mut self.btree())
    }
}
