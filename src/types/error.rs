use thiserror::Error;

use crate::{planner::error::PlannerError, types::PageNumber};

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Short read at offset {offset}: expected {expected} bytes, got {actual}")]
    ShortRead {
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Unknown page type 0x{type_byte:02x} on page {page_number}")]
    UnknownPageType {
        page_number: PageNumber,
        type_byte: u8,
    },

    #[error("Truncated input: need {needed} bytes at offset {offset}, {available} available")]
    TruncatedInput {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Schema entry not found: {object_type} '{name}'")]
    SchemaEntryNotFound { object_type: String, name: String },

    #[error("Cyclic page reference: page {page_number} reached twice in one traversal")]
    CyclicPageReference { page_number: PageNumber },

    #[error("Invalid integer width: {width} bytes (expected 1..=8)")]
    InvalidWidth { width: usize },

    #[error("Page {page_number} is out of range")]
    PageOutOfRange { page_number: PageNumber },

    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("Column '{name}' not found in table '{table}'")]
    ColumnNotFound { name: String, table: String },

    #[error(transparent)]
    Planner(#[from] PlannerError),
}

impl DatabaseError {
    pub(crate) fn truncated(buffer_len: usize, offset: usize, needed: usize) -> Self {
        DatabaseError::TruncatedInput {
            offset,
            needed,
            available: buffer_len.saturating_sub(offset),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        DatabaseError::MalformedHeader {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
