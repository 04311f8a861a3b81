pub mod dot_command;
pub mod predicate;
pub mod select;

use std::io::{Read, Seek};

use crate::{
    executor::{dot_command::DotCommand, select::SelectExecutor},
    planner::{error::PlannerError, parser::SqlParser},
    storage::storage_manager::StorageManager,
    types::error::Result,
};

/// Answers one command line: a dot command or a single `SELECT`.
pub fn run_command<R: Read + Seek>(storage: &mut StorageManager<R>, input: &str) -> Result<String> {
    let input = input.trim();
    if input.starts_with('.') {
        let command = DotCommand::parse(input)
            .ok_or_else(|| PlannerError::UnsupportedStatement(input.to_string()))?;
        return command.execute(storage);
    }

    let plan = SqlParser::new().parse_sql(input)?;
    let output = SelectExecutor::new(storage)?.execute(&plan)?;
    Ok(output.to_string())
}
