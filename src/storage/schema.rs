use std::{
    collections::HashMap,
    fmt,
    io::{Read, Seek},
};

use sqlparser::{
    ast::{ColumnOption, Expr, OrderByExpr, Statement, TableConstraint},
    dialect::SQLiteDialect,
    parser::Parser,
};

use crate::{
    storage::btree::BTree,
    types::{
        PageNumber, SCHEMA_ROOT_PAGE,
        error::{DatabaseError, Result},
        row::Row,
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Table,
    Index,
    View,
    Trigger,
    Other(String),
}

impl ObjectType {
    pub fn parse(value: &str) -> Self {
        match value {
            "table" => ObjectType::Table,
            "index" => ObjectType::Index,
            "view" => ObjectType::View,
            "trigger" => ObjectType::Trigger,
            other => ObjectType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ObjectType::Table => "table",
            ObjectType::Index => "index",
            ObjectType::View => "view",
            ObjectType::Trigger => "trigger",
            ObjectType::Other(other) => other,
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the schema table stored on page 1.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub object_type: ObjectType,
    pub object_name: String,
    pub table_name: String,
    pub root_page: i64,
    pub create_statement: String,
}

impl SchemaEntry {
    /// Decodes the five leading columns: type, name, tbl_name, rootpage, sql.
    pub fn from_row(row: &Row) -> Result<Self> {
        if row.record.len() < 5 {
            return Err(DatabaseError::malformed(format!(
                "schema row {} has {} columns, expected 5",
                row.row_id,
                row.record.len()
            )));
        }
        let text = |index: usize| -> String {
            row.column(index)
                .map(|column| column.as_text())
                .unwrap_or_default()
        };
        let root_page = match row.column(3) {
            Some(column) if !column.is_null() => column.as_integer()?,
            _ => 0,
        };

        Ok(Self {
            object_type: ObjectType::parse(&text(0)),
            object_name: text(1),
            table_name: text(2),
            root_page,
            create_statement: text(4),
        })
    }

    pub fn root_page_number(&self) -> Result<PageNumber> {
        PageNumber::try_from(self.root_page)
            .ok()
            .filter(|page| *page > 0)
            .ok_or_else(|| {
                DatabaseError::malformed(format!(
                    "{} '{}' has invalid root page {}",
                    self.object_type, self.object_name, self.root_page
                ))
            })
    }
}

/// Name lookup over the schema table, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    entries: Vec<SchemaEntry>,
    lookup: HashMap<(ObjectType, String), usize>,
}

impl SchemaCatalog {
    /// Scans page 1 and indexes every schema row.
    pub fn load<R: Read + Seek>(btree: &mut BTree<'_, R>) -> Result<Self> {
        let rows = btree.scan_all(SCHEMA_ROOT_PAGE)?;
        let entries = rows
            .iter()
            .map(SchemaEntry::from_row)
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!(entries = entries.len(), "loaded schema catalog");
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<SchemaEntry>) -> Self {
        let lookup = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                (
                    (entry.object_type.clone(), entry.object_name.to_lowercase()),
                    i,
                )
            })
            .collect();
        Self { entries, lookup }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn entry(&self, object_type: &ObjectType, name: &str) -> Result<&SchemaEntry> {
        self.lookup
            .get(&(object_type.clone(), name.to_lowercase()))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| DatabaseError::SchemaEntryNotFound {
                object_type: object_type.to_string(),
                name: name.to_string(),
            })
    }

    pub fn table(&self, name: &str) -> Result<&SchemaEntry> {
        self.entry(&ObjectType::Table, name)
    }

    pub fn table_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.object_type == ObjectType::Table)
            .map(|entry| entry.object_name.as_str())
            .collect()
    }

    pub fn indexes_on<'s, 't>(
        &'s self,
        table: &'t str,
    ) -> impl Iterator<Item = &'s SchemaEntry> + use<'s, 't> {
        self.entries.iter().filter(move |entry| {
            entry.object_type == ObjectType::Index && entry.table_name.eq_ignore_ascii_case(table)
        })
    }

    /// First index on `table` whose leading column is `column` and whose key
    /// order matches [`Value::key_cmp`](crate::types::value::Value::key_cmp).
    /// Automatic indexes carry no create statement and are skipped, as are
    /// descending or collated leading columns.
    pub fn index_for_column<'s>(
        &'s self,
        table: &str,
        column: &str,
    ) -> Option<(&'s SchemaEntry, IndexSchema)> {
        self.entries
            .iter()
            .filter(|entry| {
                entry.object_type == ObjectType::Index && entry.table_name.eq_ignore_ascii_case(table)
            })
            .find_map(|entry| {
                let schema = IndexSchema::from_create_statement(&entry.create_statement)?;
                let leading = schema.columns.first()?;
                (leading.name.eq_ignore_ascii_case(column) && leading.is_binary_ascending())
                    .then_some((entry, schema))
            })
    }
}

/// Represents a column definition recovered from a `CREATE TABLE` statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: String,
    pub position: usize,
    pub declared_type: String,
    /// `INTEGER PRIMARY KEY`: the record slot holds NULL, the value is the row id.
    pub is_rowid_alias: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub table_name: String,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn from_create_statement(sql: &str) -> Result<Self> {
        match Parser::parse_sql(&SQLiteDialect {}, sql) {
            Ok(statements) => match statements.into_iter().next() {
                Some(Statement::CreateTable(create)) => {
                    let primary_key: Vec<String> = create
                        .constraints
                        .iter()
                        .filter_map(|constraint| match constraint {
                            TableConstraint::PrimaryKey { columns, .. } => {
                                Some(columns.iter().map(|c| c.value.to_lowercase()).collect())
                            }
                            _ => None,
                        })
                        .next()
                        .unwrap_or_default();

                    let columns = create
                        .columns
                        .iter()
                        .enumerate()
                        .map(|(position, column)| {
                            let declared_type = column.data_type.to_string();
                            let inline_primary = column.options.iter().any(|option| {
                                matches!(option.option, ColumnOption::Unique { is_primary: true, .. })
                            });
                            let table_primary = primary_key.len() == 1
                                && primary_key[0] == column.name.value.to_lowercase();
                            ColumnSchema {
                                name: column.name.value.clone(),
                                position,
                                is_rowid_alias: declared_type.eq_ignore_ascii_case("integer")
                                    && (inline_primary || table_primary),
                                declared_type,
                            }
                        })
                        .collect();

                    Ok(Self {
                        table_name: unquote(&create.name.to_string()),
                        columns,
                    })
                }
                _ => Err(DatabaseError::malformed(format!(
                    "not a CREATE TABLE statement: {sql}"
                ))),
            },
            Err(err) => {
                tracing::debug!(%err, "sqlparser rejected create statement, splitting by hand");
                Self::from_column_list(sql)
            }
        }
    }

    /// Lenient reading of `CREATE TABLE name (col type ..., ...)`.
    fn from_column_list(sql: &str) -> Result<Self> {
        let (head, body) = parenthesised(sql)
            .ok_or_else(|| DatabaseError::malformed(format!("no column list in: {sql}")))?;
        let table_name = head
            .split_whitespace()
            .last()
            .map(unquote)
            .unwrap_or_default();

        let columns = split_top_level(body)
            .into_iter()
            .filter(|definition| !is_table_constraint(definition))
            .enumerate()
            .map(|(position, definition)| {
                let mut words = definition.split_whitespace();
                let name = words.next().map(unquote).unwrap_or_default();
                let declared_type = words.next().unwrap_or_default().to_string();
                let rest = definition.to_lowercase();
                ColumnSchema {
                    name,
                    position,
                    is_rowid_alias: declared_type.eq_ignore_ascii_case("integer")
                        && rest.contains("primary key"),
                    declared_type,
                }
            })
            .collect();

        Ok(Self {
            table_name,
            columns,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|column| column.name.eq_ignore_ascii_case(name))
    }

    pub fn column(&self, name: &str) -> Result<&ColumnSchema> {
        self.column_index(name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| DatabaseError::ColumnNotFound {
                name: name.to_string(),
                table: self.table_name.clone(),
            })
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }
}

/// One key column of an index, with its sort direction and collation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub name: String,
    pub descending: bool,
    pub collation: Option<String>,
}

impl IndexColumn {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            descending: false,
            collation: None,
        }
    }

    /// Ascending with the default `BINARY` collation.
    pub fn is_binary_ascending(&self) -> bool {
        !self.descending
            && self
                .collation
                .as_deref()
                .is_none_or(|collation| collation.eq_ignore_ascii_case("binary"))
    }

    fn from_order_by(column: &OrderByExpr) -> Self {
        let (expr, collation) = match &column.expr {
            Expr::Collate { expr, collation } => (expr.as_ref(), Some(unquote(&collation.to_string()))),
            expr => (expr, None),
        };
        Self {
            name: unquote(&expr.to_string()),
            descending: column.asc == Some(false),
            collation,
        }
    }

    /// Lenient reading of `name [COLLATE c] [ASC|DESC]`.
    fn from_definition(definition: &str) -> Option<Self> {
        let words: Vec<&str> = definition.split_whitespace().collect();
        let name = unquote(words.first()?);
        let collation = words
            .iter()
            .position(|word| word.eq_ignore_ascii_case("collate"))
            .and_then(|i| words.get(i + 1))
            .map(|word| unquote(word));
        Some(Self {
            name,
            descending: words.iter().any(|word| word.eq_ignore_ascii_case("desc")),
            collation,
        })
    }
}

/// Indexed columns recovered from a `CREATE INDEX` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub index_name: String,
    pub table_name: String,
    pub columns: Vec<IndexColumn>,
}

impl IndexSchema {
    pub fn from_create_statement(sql: &str) -> Option<Self> {
        if sql.trim().is_empty() {
            return None;
        }
        match Parser::parse_sql(&SQLiteDialect {}, sql) {
            Ok(statements) => match statements.into_iter().next() {
                Some(Statement::CreateIndex(create)) => Some(Self {
                    index_name: create
                        .name
                        .map(|name| unquote(&name.to_string()))
                        .unwrap_or_default(),
                    table_name: unquote(&create.table_name.to_string()),
                    columns: create.columns.iter().map(IndexColumn::from_order_by).collect(),
                }),
                _ => None,
            },
            Err(_) => {
                let (head, body) = parenthesised(sql)?;
                let mut words = head.split_whitespace().rev();
                let table_name = words.next().map(unquote)?;
                let index_name = head
                    .split_whitespace()
                    .skip_while(|word| !word.eq_ignore_ascii_case("index"))
                    .nth(1)
                    .map(unquote)
                    .unwrap_or_default();
                Some(Self {
                    index_name,
                    table_name,
                    columns: split_top_level(body)
                        .into_iter()
                        .filter_map(IndexColumn::from_definition)
                        .collect(),
                })
            }
        }
    }
}

/// Splits `prefix ( body )` at the first opening and last closing paren.
fn parenthesised(sql: &str) -> Option<(&str, &str)> {
    let open = sql.find('(')?;
    let close = sql.rfind(')')?;
    (open < close).then(|| (&sql[..open], &sql[open + 1..close]))
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(body[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}

fn is_table_constraint(definition: &str) -> bool {
    let first = definition
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first.as_str(),
        "PRIMARY" | "UNIQUE" | "CHECK" | "FOREIGN" | "CONSTRAINT"
    )
}

fn unquote(name: &str) -> String {
    name.trim()
        .trim_matches(|c| matches!(c, '"' | '`' | '\'' | '[' | ']'))
        .to_string()
}
