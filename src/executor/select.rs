use std::{
    fmt,
    io::{Read, Seek},
};

use crate::{
    executor::predicate::{ColumnSource, Predicate},
    planner::logical_plan::{Projection, SelectPlan},
    storage::{
        schema::{SchemaCatalog, TableSchema},
        storage_manager::StorageManager,
    },
    types::{PageNumber, RowId, error::Result, row::Row, value::Value},
};

/// How a select reaches its rows.
#[derive(Debug, Clone, PartialEq)]
pub enum AccessPath {
    /// Sum leaf cell counts without decoding any record.
    CountRows,
    /// Point lookup of one row id in the table tree.
    RowIdLookup(RowId),
    /// Seek the index, then fetch the referenced rows from the table tree.
    IndexSeek {
        index_name: String,
        index_root: PageNumber,
        key: Value,
    },
    /// Read every row and keep those the predicate accepts.
    FullScan,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    Rows(Vec<Vec<String>>),
    Count(u64),
}

impl fmt::Display for QueryOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutput::Count(count) => write!(f, "{count}"),
            QueryOutput::Rows(rows) => {
                for (i, row) in rows.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    f.write_str(&row.join("|"))?;
                }
                Ok(())
            }
        }
    }
}

pub struct SelectExecutor<'a, R> {
    storage: &'a mut StorageManager<R>,
    catalog: SchemaCatalog,
}

impl<'a, R: Read + Seek> SelectExecutor<'a, R> {
    pub fn new(storage: &'a mut StorageManager<R>) -> Result<Self> {
        let catalog = storage.load_catalog()?;
        Ok(Self { storage, catalog })
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    /// Chooses the cheapest way to answer `plan`.
    pub fn access_path(&self, plan: &SelectPlan, predicate: Option<&Predicate>) -> AccessPath {
        let Some(predicate) = predicate else {
            return if plan.is_count() {
                AccessPath::CountRows
            } else {
                AccessPath::FullScan
            };
        };

        if let Some(row_id) = predicate.row_id() {
            return AccessPath::RowIdLookup(row_id);
        }

        if predicate.value.is_null() {
            // `col = NULL` matches nothing, the scan returns the empty set.
            return AccessPath::FullScan;
        }

        match self
            .catalog
            .index_for_column(&plan.table_name, &predicate.column_name)
            .and_then(|(entry, schema)| Some((entry.root_page_number().ok()?, schema)))
        {
            Some((index_root, schema)) => AccessPath::IndexSeek {
                index_name: schema.index_name,
                index_root,
                key: predicate.value.clone(),
            },
            None => AccessPath::FullScan,
        }
    }

    pub fn execute(&mut self, plan: &SelectPlan) -> Result<QueryOutput> {
        let entry = self.catalog.table(&plan.table_name)?;
        let table_root = entry.root_page_number()?;
        let schema = TableSchema::from_create_statement(&entry.create_statement)?;

        let predicate = plan
            .filter
            .as_ref()
            .map(|filter| Predicate::bind(filter, &schema))
            .transpose()?;
        let projection = self.projection_sources(plan, &schema)?;
        let path = self.access_path(plan, predicate.as_ref());
        tracing::debug!(table = %plan.table_name, table_root, ?path, "executing select");

        let mut btree = self.storage.btree();
        let rows = match &path {
            AccessPath::CountRows => return Ok(QueryOutput::Count(btree.count_rows(table_root)?)),
            AccessPath::RowIdLookup(row_id) => btree.fetch_by_ids(table_root, &[*row_id])?,
            AccessPath::IndexSeek {
                index_root, key, ..
            } => {
                let row_ids = btree.seek_index(*index_root, key)?;
                btree.fetch_by_ids(table_root, &row_ids)?
            }
            AccessPath::FullScan => {
                let rows = btree.scan_all(table_root)?;
                match &predicate {
                    Some(predicate) => filter_rows(rows, predicate)?,
                    None => rows,
                }
            }
        };

        if plan.is_count() {
            return Ok(QueryOutput::Count(rows.len() as u64));
        }

        rows.iter()
            .map(|row| {
                projection
                    .iter()
                    .map(|source| source.read(row).map(|value| value.to_string()))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()
            .map(QueryOutput::Rows)
    }

    fn projection_sources(
        &self,
        plan: &SelectPlan,
        schema: &TableSchema,
    ) -> Result<Vec<ColumnSource>> {
        match &plan.projection {
            Projection::CountRows => Ok(Vec::new()),
            Projection::Wildcard => schema
                .columns
                .iter()
                .map(|column| ColumnSource::resolve(&column.name, schema))
                .collect(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| ColumnSource::resolve(name, schema))
                .collect(),
        }
    }
}

fn filter_rows(rows: Vec<Row>, predicate: &Predicate) -> Result<Vec<Row>> {
    let mut kept = Vec::new();
    for row in rows {
        if predicate.evaluate(&row)? {
            kept.push(row);
        }
    }
    Ok(kept)
}
