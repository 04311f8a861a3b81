use crate::types::{
    RowId,
    cell::TableLeafCell,
    error::Result,
    record::{Column, Record},
    value::Value,
};

/// A table row as produced by the b-tree engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub row_id: RowId,
    pub record: Record,
}

impl Row {
    pub fn new(row_id: RowId, record: Record) -> Self {
        Self { row_id, record }
    }

    pub fn column(&self, column_index: usize) -> Option<&Column> {
        self.record.column(column_index)
    }

    /// Value of the column at `column_index`. A missing trailing column reads
    /// as NULL, which is how the format represents columns added after the
    /// row was written.
    pub fn value(&self, column_index: usize) -> Result<Value> {
        match self.record.column(column_index) {
            Some(column) => column.to_value(),
            None => Ok(Value::Null),
        }
    }

    pub fn values(&self) -> Result<Vec<Value>> {
        self.record.columns.iter().map(Column::to_value).collect()
    }
}

impl From<TableLeafCell> for Row {
    fn from(cell: TableLeafCell) -> Self {
        Row::new(cell.row_id, cell.record)
    }
}
