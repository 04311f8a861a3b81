use crate::{
    planner::logical_plan::EqualityFilter,
    storage::schema::TableSchema,
    types::{
        error::{DatabaseError, Result},
        row::Row,
        value::{Affinity, Value},
    },
};

/// Names SQLite accepts for the row id when no column shadows them.
const ROWID_NAMES: [&str; 3] = ["rowid", "oid", "_rowid_"];

/// Where a named column's value comes from in a decoded row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    /// The b-tree key, either an `INTEGER PRIMARY KEY` column or `rowid`.
    RowId,
    Record(usize),
}

impl ColumnSource {
    pub fn resolve(name: &str, schema: &TableSchema) -> Result<Self> {
        match schema.column_index(name) {
            Some(position) if schema.columns[position].is_rowid_alias => Ok(ColumnSource::RowId),
            Some(position) => Ok(ColumnSource::Record(position)),
            None if ROWID_NAMES.iter().any(|alias| alias.eq_ignore_ascii_case(name)) => {
                Ok(ColumnSource::RowId)
            }
            None => Err(DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: schema.table_name.clone(),
            }),
        }
    }

    pub fn read(&self, row: &Row) -> Result<Value> {
        match self {
            ColumnSource::RowId => Ok(Value::Integer(row.row_id)),
            ColumnSource::Record(position) => row.value(*position),
        }
    }
}

/// A bound `column = literal` filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub column_name: String,
    pub source: ColumnSource,
    pub value: Value,
}

impl Predicate {
    /// Resolves the filter column and converts the literal to the column's
    /// affinity, so scans and index seeks compare the same value.
    pub fn bind(filter: &EqualityFilter, schema: &TableSchema) -> Result<Self> {
        let source = ColumnSource::resolve(&filter.column, schema)?;
        let affinity = match source {
            ColumnSource::RowId => Affinity::Integer,
            ColumnSource::Record(position) => {
                Affinity::from_declared_type(&schema.columns[position].declared_type)
            }
        };
        Ok(Self {
            column_name: filter.column.clone(),
            source,
            value: filter.value.clone().with_affinity(affinity),
        })
    }

    pub fn evaluate(&self, row: &Row) -> Result<bool> {
        Ok(self.source.read(row)?.sql_eq(&self.value))
    }

    /// The literal as a row id, when this filter pins the b-tree key.
    pub fn row_id(&self) -> Option<i64> {
        match self.source {
            ColumnSource::RowId => self.value.as_integer(),
            ColumnSource::Record(_) => None,
        }
    }
}
