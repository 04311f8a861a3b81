use std::io::{Read, Seek};

use crate::{
    storage::storage_manager::StorageManager,
    types::{SCHEMA_ROOT_PAGE, error::Result},
};

/// Meta commands answered from the file header and the schema table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DotCommand {
    DbInfo,
    Tables,
    Schema,
}

impl DotCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            ".dbinfo" => Some(DotCommand::DbInfo),
            ".tables" => Some(DotCommand::Tables),
            ".schema" => Some(DotCommand::Schema),
            _ => None,
        }
    }

    pub fn execute<R: Read + Seek>(&self, storage: &mut StorageManager<R>) -> Result<String> {
        tracing::debug!(command = ?self, "executing dot command");
        match self {
            DotCommand::DbInfo => {
                // Every schema row sits on page 1 for small databases, so its
                // cell count is the number of schema objects.
                let header = storage.peek_page_header(SCHEMA_ROOT_PAGE)?;
                Ok(format!(
                    "database page size: {}\nnumber of tables: {}",
                    storage.page_size(),
                    header.cell_count
                ))
            }
            DotCommand::Tables => {
                let catalog = storage.load_catalog()?;
                Ok(catalog.table_names().join(" "))
            }
            DotCommand::Schema => {
                let catalog = storage.load_catalog()?;
                Ok(catalog
                    .entries()
                    .iter()
                    .filter(|entry| !entry.create_statement.is_empty())
                    .map(|entry| format!("{};", entry.create_statement))
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
        }
    }
}
