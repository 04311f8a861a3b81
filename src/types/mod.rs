pub mod cell;
pub mod error;
pub mod page;
pub mod record;
pub mod row;
pub mod value;
pub mod varint;

// Common type aliases
pub type PageNumber = u32;
pub type RowId = i64;

// Constants following the SQLite file format
pub const DATABASE_HEADER_SIZE: usize = 100; // File header, prefixed to page 1
pub const LEAF_PAGE_HEADER_SIZE: usize = 8;
pub const INTERIOR_PAGE_HEADER_SIZE: usize = 12; // Leaf header + right-most pointer (4 bytes)
pub const CELL_POINTER_SIZE: usize = 2;

pub const MIN_PAGE_SIZE: usize = 512;
pub const MAX_PAGE_SIZE: usize = 65536;
pub const MAX_VARINT_LEN: usize = 9;

pub const SCHEMA_ROOT_PAGE: PageNumber = 1;
