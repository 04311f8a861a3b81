use crate::{
    storage::{SQLITE_MAGIC, USABLE_PAGE_SIZES},
    types::{
        DATABASE_HEADER_SIZE, MAX_PAGE_SIZE,
        error::{DatabaseError, Result},
    },
};

/// The 100-byte file header at the start of page 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseHeader {
    pub magic: [u8; 16],
    /// Raw on-disk value; 1 stands for 65536. Use [`DatabaseHeader::page_size`].
    pub raw_page_size: u16,
    pub file_format_write_version: u8,
    pub file_format_read_version: u8,
    pub reserved_space: u8,
    pub max_embedded_payload_fraction: u8,
    pub min_embedded_payload_fraction: u8,
    pub leaf_payload_fraction: u8,
    pub file_change_counter: u32,
    pub database_size_pages: u32,
    pub freelist_trunk_page: u32,
    pub freelist_pages_count: u32,
    pub schema_cookie: u32,
    pub schema_format_number: u32,
    pub default_page_cache_size: u32,
    pub largest_root_btree_page: u32,
    pub text_encoding: u32,
    pub user_version: u32,
    pub incremental_vacuum_mode: u32,
    pub application_id: u32,
    pub reserved: [u8; 20],
    pub version_valid_for: u32,
    pub sqlite_version_number: u32,
}

impl Default for DatabaseHeader {
    fn default() -> Self {
        Self {
            magic: *SQLITE_MAGIC,
            raw_page_size: 4096,
            file_format_write_version: 1,
            file_format_read_version: 1,
            reserved_space: 0,
            max_embedded_payload_fraction: 64,
            min_embedded_payload_fraction: 32,
            leaf_payload_fraction: 32,
            file_change_counter: 1,
            database_size_pages: 1,
            freelist_trunk_page: 0,
            freelist_pages_count: 0,
            schema_cookie: 1,
            schema_format_number: 4,
            default_page_cache_size: 0,
            largest_root_btree_page: 0,
            text_encoding: 1,
            user_version: 0,
            incremental_vacuum_mode: 0,
            application_id: 0,
            reserved: [0; 20],
            version_valid_for: 1,
            sqlite_version_number: 3_045_000,
        }
    }
}

impl DatabaseHeader {
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            raw_page_size: encode_page_size(page_size),
            ..Self::default()
        }
    }

    /// Page size in bytes with the 65536 sentinel resolved.
    pub fn page_size(&self) -> usize {
        if self.raw_page_size == 1 {
            MAX_PAGE_SIZE
        } else {
            usize::from(self.raw_page_size)
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(DATABASE_HEADER_SIZE);

        buffer.extend_from_slice(&self.magic);
        buffer.extend_from_slice(&self.raw_page_size.to_be_bytes());
        buffer.push(self.file_format_write_version);
        buffer.push(self.file_format_read_version);
        buffer.push(self.reserved_space);
        buffer.push(self.max_embedded_payload_fraction);
        buffer.push(self.min_embedded_payload_fraction);
        buffer.push(self.leaf_payload_fraction);
        for field in [
            self.file_change_counter,
            self.database_size_pages,
            self.freelist_trunk_page,
            self.freelist_pages_count,
            self.schema_cookie,
            self.schema_format_number,
            self.default_page_cache_size,
            self.largest_root_btree_page,
            self.text_encoding,
            self.user_version,
            self.incremental_vacuum_mode,
            self.application_id,
        ] {
            buffer.extend_from_slice(&field.to_be_bytes());
        }
        buffer.extend_from_slice(&self.reserved);
        buffer.extend_from_slice(&self.version_valid_for.to_be_bytes());
        buffer.extend_from_slice(&self.sqlite_version_number.to_be_bytes());

        buffer
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < DATABASE_HEADER_SIZE {
            return Err(DatabaseError::ShortRead {
                offset: 0,
                expected: DATABASE_HEADER_SIZE,
                actual: bytes.len(),
            });
        }

        let mut magic = [0u8; 16];
        magic.copy_from_slice(&bytes[0..16]);
        if &magic != SQLITE_MAGIC {
            return Err(DatabaseError::malformed("not a SQLite 3 database file"));
        }

        let raw_page_size = u16::from_be_bytes([bytes[16], bytes[17]]);
        if raw_page_size != 1 && !USABLE_PAGE_SIZES.contains(&usize::from(raw_page_size)) {
            return Err(DatabaseError::malformed(format!(
                "unsupported page size: {raw_page_size}"
            )));
        }

        let u32_at = |offset: usize| {
            u32::from_be_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let mut reserved = [0u8; 20];
        reserved.copy_from_slice(&bytes[72..92]);

        Ok(Self {
            magic,
            raw_page_size,
            file_format_write_version: bytes[18],
            file_format_read_version: bytes[19],
            reserved_space: bytes[20],
            max_embedded_payload_fraction: bytes[21],
            min_embedded_payload_fraction: bytes[22],
            leaf_payload_fraction: bytes[23],
            file_change_counter: u32_at(24),
            database_size_pages: u32_at(28),
            freelist_trunk_page: u32_at(32),
            freelist_pages_count: u32_at(36),
            schema_cookie: u32_at(40),
            schema_format_number: u32_at(44),
            default_page_cache_size: u32_at(48),
            largest_root_btree_page: u32_at(52),
            text_encoding: u32_at(56),
            user_version: u32_at(60),
            incremental_vacuum_mode: u32_at(64),
            application_id: u32_at(68),
            reserved,
            version_valid_for: u32_at(92),
            sqlite_version_number: u32_at(96),
        })
    }
}

fn encode_page_size(page_size: usize) -> u16 {
    if page_size == MAX_PAGE_SIZE {
        1
    } else {
        page_size as u16
    }
}
