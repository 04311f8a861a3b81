use std::io::Cursor;

use baca::{
    executor::{
        dot_command::DotCommand,
        predicate::{ColumnSource, Predicate},
        run_command,
        select::{AccessPath, QueryOutput, SelectExecutor},
    },
    planner::{error::PlannerError, logical_plan::EqualityFilter, parser::SqlParser},
    storage::{schema::TableSchema, storage_manager::StorageManager},
    types::{RowId, error::DatabaseError, record::decode_record, row::Row, value::Value},
    utils::fixture::{DatabaseBuilder, TempDatabase, encode_record},
};
use bytes::Bytes;

const COUNTRIES: [&str; 5] = ["chad", "eritrea", "peru", "tonga", "yemen"];

type MemoryStorage = StorageManager<Cursor<Vec<u8>>>;

fn apples_storage() -> MemoryStorage {
    let mut builder = DatabaseBuilder::new(4096);
    builder
        .add_table(
            "apples",
            "CREATE TABLE apples (id integer primary key autoincrement, name text)",
            vec![
                (1, vec![Value::Null, Value::Text("fuji".to_string())]),
                (2, vec![Value::Null, Value::Text("honeycrisp".to_string())]),
            ],
            4,
        )
        .unwrap();
    StorageManager::from_reader(Cursor::new(builder.build().unwrap())).unwrap()
}

fn company_rows() -> Vec<(RowId, Vec<Value>)> {
    (1..=200)
        .map(|id| {
            (
                id,
                vec![
                    Value::Null,
                    Value::Text(format!("company {id}")),
                    Value::Text(COUNTRIES[(id as usize * 7) % COUNTRIES.len()].to_string()),
                ],
            )
        })
        .collect()
}

fn companies_storage(with_index: bool) -> MemoryStorage {
    let mut builder = DatabaseBuilder::new(1024);
    let rows = company_rows();
    let entries = rows
        .iter()
        .map(|(id, values)| (values[2].clone(), *id))
        .collect();
    builder
        .add_table(
            "companies",
            "CREATE TABLE companies (id integer primary key, name text, country text)",
            rows,
            8,
        )
        .unwrap();
    if with_index {
        builder
            .add_index(
                "idx_companies_country",
                "companies",
                "CREATE INDEX idx_companies_country on companies (country)",
                entries,
                8,
            )
            .unwrap();
    }
    StorageManager::from_reader(Cursor::new(builder.build().unwrap())).unwrap()
}

fn rows_of(output: QueryOutput) -> Vec<Vec<String>> {
    match output {
        QueryOutput::Rows(rows) => rows,
        QueryOutput::Count(count) => panic!("expected rows, got count {count}"),
    }
}

#[test]
fn test_apples_select_by_id() -> Result<(), DatabaseError> {
    let mut storage = apples_storage();
    let plan = SqlParser::new().parse_sql("SELECT name FROM apples WHERE id = 2")?;
    let output = SelectExecutor::new(&mut storage)?.execute(&plan)?;
    assert_eq!(output, QueryOutput::Rows(vec![vec!["honeycrisp".to_string()]]));
    Ok(())
}

#[test]
fn test_run_command_renders_pipe_joined_rows() -> Result<(), DatabaseError> {
    let mut storage = apples_storage();
    assert_eq!(
        run_command(&mut storage, "SELECT id, name FROM apples")?,
        "1|fuji\n2|honeycrisp"
    );
    assert_eq!(
        run_command(&mut storage, "SELECT * FROM apples")?,
        "1|fuji\n2|honeycrisp"
    );
    assert_eq!(run_command(&mut storage, "SELECT COUNT(*) FROM apples")?, "2");
    Ok(())
}

#[test]
fn test_run_command_from_file() -> Result<(), DatabaseError> {
    let mut builder = DatabaseBuilder::new(4096);
    builder
        .add_table(
            "apples",
            "CREATE TABLE apples (id integer primary key, name text)",
            vec![(1, vec![Value::Null, Value::Text("fuji".to_string())])],
            4,
        )
        .unwrap();
    let temp = TempDatabase::new(&builder.build().unwrap())?;
    let mut storage = temp.open()?;
    assert_eq!(run_command(&mut storage, "SELECT name FROM apples")?, "fuji");
    Ok(())
}

#[test]
fn test_access_path_selection() -> Result<(), DatabaseError> {
    let mut storage = companies_storage(true);
    let executor = SelectExecutor::new(&mut storage)?;
    let parser = SqlParser::new();
    let schema = TableSchema::from_create_statement(
        &executor.catalog().table("companies")?.create_statement,
    )?;
    let path_for = |sql: &str| -> Result<AccessPath, DatabaseError> {
        let plan = parser.parse_sql(sql)?;
        let predicate = plan
            .filter
            .as_ref()
            .map(|filter| Predicate::bind(filter, &schema))
            .transpose()?;
        Ok(executor.access_path(&plan, predicate.as_ref()))
    };

    assert_eq!(path_for("SELECT COUNT(*) FROM companies")?, AccessPath::CountRows);
    assert_eq!(path_for("SELECT name FROM companies")?, AccessPath::FullScan);
    assert_eq!(
        path_for("SELECT name FROM companies WHERE id = 42")?,
        AccessPath::RowIdLookup(42)
    );
    assert_eq!(
        path_for("SELECT name FROM companies WHERE rowid = 7")?,
        AccessPath::RowIdLookup(7)
    );
    assert!(matches!(
        path_for("SELECT id FROM companies WHERE country = 'peru'")?,
        AccessPath::IndexSeek { ref index_name, .. } if index_name == "idx_companies_country"
    ));
    assert_eq!(
        path_for("SELECT id FROM companies WHERE name = 'company 3'")?,
        AccessPath::FullScan
    );
    Ok(())
}

#[test]
fn test_index_seek_matches_full_scan() -> Result<(), DatabaseError> {
    let mut indexed = companies_storage(true);
    let mut plain = companies_storage(false);

    for country in COUNTRIES {
        let sql = format!("SELECT id, name FROM companies WHERE country = '{country}'");
        let with_index = rows_of(SelectExecutor::new(&mut indexed)?.execute(
            &SqlParser::new().parse_sql(&sql)?,
        )?);
        let without_index = rows_of(SelectExecutor::new(&mut plain)?.execute(
            &SqlParser::new().parse_sql(&sql)?,
        )?);
        assert_eq!(with_index.len(), 40, "{country}");
        assert_eq!(with_index, without_index, "{country}");
    }
    Ok(())
}

#[test]
fn test_count_with_filter_counts_matches() -> Result<(), DatabaseError> {
    let mut storage = companies_storage(true);
    assert_eq!(
        run_command(&mut storage, "SELECT COUNT(*) FROM companies WHERE country = 'tonga'")?,
        "40"
    );
    assert_eq!(run_command(&mut storage, "SELECT COUNT(*) FROM companies")?, "200");
    Ok(())
}

#[test]
fn test_rowid_lookup_of_missing_row_is_empty() -> Result<(), DatabaseError> {
    let mut storage = companies_storage(false);
    assert_eq!(
        run_command(&mut storage, "SELECT name FROM companies WHERE id = 999")?,
        ""
    );
    assert_eq!(
        run_command(&mut storage, "SELECT name FROM companies WHERE id = 150")?,
        "company 150"
    );
    Ok(())
}

#[test]
fn test_null_filter_matches_nothing() -> Result<(), DatabaseError> {
    let mut storage = companies_storage(true);
    assert_eq!(
        run_command(&mut storage, "SELECT id FROM companies WHERE country = NULL")?,
        ""
    );
    Ok(())
}

#[test]
fn test_unknown_table_and_column() {
    let mut storage = apples_storage();
    assert!(matches!(
        run_command(&mut storage, "SELECT name FROM pears"),
        Err(DatabaseError::SchemaEntryNotFound { .. })
    ));
    assert!(matches!(
        run_command(&mut storage, "SELECT colour FROM apples"),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
    assert!(matches!(
        run_command(&mut storage, "SELECT name FROM apples WHERE colour = 'red'"),
        Err(DatabaseError::ColumnNotFound { .. })
    ));
}

#[test]
fn test_planner_errors_surface_through_run_command() {
    let mut storage = apples_storage();
    assert!(matches!(
        run_command(&mut storage, "DROP TABLE apples"),
        Err(DatabaseError::Planner(PlannerError::UnsupportedStatement(_)))
    ));
    assert!(matches!(
        run_command(&mut storage, ".indexes"),
        Err(DatabaseError::Planner(PlannerError::UnsupportedStatement(_)))
    ));
}

#[test]
fn test_dbinfo() -> Result<(), DatabaseError> {
    let mut storage = companies_storage(true);
    assert_eq!(
        DotCommand::DbInfo.execute(&mut storage)?,
        "database page size: 1024\nnumber of tables: 2"
    );
    Ok(())
}

#[test]
fn test_tables_and_schema() -> Result<(), DatabaseError> {
    let mut storage = companies_storage(true);
    assert_eq!(run_command(&mut storage, ".tables")?, "companies");
    assert_eq!(
        run_command(&mut storage, ".schema")?,
        "CREATE TABLE companies (id integer primary key, name text, country text);\n\
         CREATE INDEX idx_companies_country on companies (country);"
    );
    assert_eq!(DotCommand::parse(" .TABLES "), Some(DotCommand::Tables));
    assert_eq!(DotCommand::parse(".dump"), None);
    Ok(())
}

#[test]
fn test_predicate_binding() -> Result<(), DatabaseError> {
    let schema =
        TableSchema::from_create_statement("CREATE TABLE t (id integer primary key, n real)")?;
    let row = {
        let payload = encode_record(&[Value::Null, Value::Real(3.0)]);
        let (record, _) = decode_record(&Bytes::from(payload), 0)?;
        Row::new(9, record)
    };

    let by_id = Predicate::bind(
        &EqualityFilter {
            column: "ID".to_string(),
            value: Value::Integer(9),
        },
        &schema,
    )?;
    assert_eq!(by_id.source, ColumnSource::RowId);
    assert_eq!(by_id.row_id(), Some(9));
    assert!(by_id.evaluate(&row)?);

    let by_real = Predicate::bind(
        &EqualityFilter {
            column: "n".to_string(),
            value: Value::Integer(3),
        },
        &schema,
    )?;
    assert_eq!(by_real.source, ColumnSource::Record(1));
    assert_eq!(by_real.row_id(), None);
    assert!(by_real.evaluate(&row)?);
    Ok(())
}

#[test]
fn test_query_output_display() {
    let rows = QueryOutput::Rows(vec![
        vec!["1".to_string(), "a".to_string()],
        vec!["2".to_string(), String::new()],
    ]);
    assert_eq!(rows.to_string(), "1|a\n2|");
    assert_eq!(QueryOutput::Count(5).to_string(), "5");
    assert_eq!(QueryOutput::Rows(Vec::new()).to_string(), "");
}

fn remainder_storage(index_sql: Option<&str>) -> MemoryStorage {
    let rows: Vec<(RowId, Vec<Value>)> = (1..=20)
        .map(|id| (id, vec![Value::Null, Value::Integer(id % 5), Value::Text((id % 5).to_string())]))
        .collect();
    let mut builder = DatabaseBuilder::new(1024);
    if let Some(sql) = index_sql {
        let entries = rows.iter().map(|(id, values)| (values[1].clone(), *id)).collect();
        builder.add_index("idx_t_n", "t", sql, entries, 4).unwrap();
    }
    builder
        .add_table(
            "t",
            "CREATE TABLE t (id integer primary key, n integer, s text)",
            rows,
            4,
        )
        .unwrap();
    StorageManager::from_reader(Cursor::new(builder.build().unwrap())).unwrap()
}

#[test]
fn test_text_literal_on_integer_column_same_with_or_without_index() -> Result<(), DatabaseError> {
    let mut indexed = remainder_storage(Some("CREATE INDEX idx_t_n ON t (n)"));
    let mut plain = remainder_storage(None);
    for sql in [
        "SELECT id FROM t WHERE n = '3'",
        "SELECT id FROM t WHERE n = 3",
        "SELECT id FROM t WHERE n = 3.0",
    ] {
        assert_eq!(run_command(&mut plain, sql)?, "3\n8\n13\n18", "{sql}");
        assert_eq!(run_command(&mut indexed, sql)?, "3\n8\n13\n18", "{sql}");
    }
    assert_eq!(run_command(&mut indexed, "SELECT id FROM t WHERE n = 'x'")?, "");
    Ok(())
}

#[test]
fn test_integer_literal_on_text_column_matches_text() -> Result<(), DatabaseError> {
    let mut storage = remainder_storage(None);
    assert_eq!(run_command(&mut storage, "SELECT id FROM t WHERE s = 4")?, "4\n9\n14\n19");
    assert_eq!(run_command(&mut storage, "SELECT id FROM t WHERE id = '12'")?, "12");
    Ok(())
}

#[test]
fn test_descending_index_falls_back_to_scan() -> Result<(), DatabaseError> {
    let mut storage = remainder_storage(Some("CREATE INDEX idx_t_n ON t (n DESC)"));
    let executor = SelectExecutor::new(&mut storage)?;
    let schema =
        TableSchema::from_create_statement(&executor.catalog().table("t")?.create_statement)?;
    let plan = SqlParser::new().parse_sql("SELECT id FROM t WHERE n = 2")?;
    let predicate = Predicate::bind(plan.filter.as_ref().unwrap(), &schema)?;
    assert_eq!(executor.access_path(&plan, Some(&predicate)), AccessPath::FullScan);
    assert_eq!(run_command(&mut storage, "SELECT id FROM t WHERE n = 2")?, "2\n7\n12\n17");
    Ok(())
}
