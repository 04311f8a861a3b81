pub mod btree;
pub mod header;
pub mod page_reader;
pub mod schema;
pub mod storage_manager;

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";
const USABLE_PAGE_SIZES: [usize; 7] = [512, 1024, 2048, 4096, 8192, 16384, 32768];
