use std::{io::Write, process::ExitCode};

use baca::{
    executor::run_command,
    storage::storage_manager::StorageManager,
    types::error::{DatabaseError, Result},
};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing_subscriber::EnvFilter;

const HISTORY_FILE: &str = ".baca_history";
const LOG_ENV: &str = "BACA_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn usage() -> &'static str {
    "usage: baca <database-path> [.dbinfo | .tables | .schema | SELECT ...]"
}

fn read_multiline_command(rl: &mut DefaultEditor) -> rustyline::Result<String> {
    let mut input = String::new();
    let mut prompt = "baca> ";

    loop {
        let line = rl.readline(prompt)?;
        let trimmed_line = line.trim_end();

        // A trailing backslash continues the command on the next line.
        match trimmed_line.strip_suffix('\\') {
            Some(head) => {
                input.push_str(head);
                input.push(' ');
                prompt = "   -> ";
            }
            None => {
                input.push_str(trimmed_line);
                return Ok(input);
            }
        }
    }
}

/// Returns false once the shell should exit.
fn process_command(storage: &mut StorageManager, command: &str) -> bool {
    match command.trim().to_lowercase().as_str() {
        "exit" | "quit" | "q" | ".exit" | ".quit" => return false,
        "help" | "h" | ".help" => {
            println!(
                r#"
Available commands:
  .dbinfo          - Page size and number of schema objects
  .tables          - Names of all tables
  .schema          - CREATE statements of all schema objects
  SELECT ...       - Single-table select with an optional `col = literal` filter
  help, h          - Show this help message
  clear            - Clear the screen
  exit, quit, q    - Leave the shell

Use '\' at the end of a line for multiline input.
Use Up/Down arrows to navigate command history.
"#
            );
        }
        "clear" => {
            print!("\x1B[2J\x1B[1;1H");
            let _ = std::io::stdout().flush();
        }
        "" => {}
        _ => match run_command(storage, command) {
            Ok(output) if output.is_empty() => {}
            Ok(output) => println!("{output}"),
            Err(err) => eprintln!("Error: {err}"),
        },
    }

    true
}

fn repl(storage: &mut StorageManager) -> rustyline::Result<()> {
    let mut rl = DefaultEditor::new()?;
    if rl.load_history(HISTORY_FILE).is_err() {
        tracing::debug!(file = HISTORY_FILE, "no previous history");
    }

    loop {
        match read_multiline_command(&mut rl) {
            Ok(input) => {
                let command = input.trim();
                if command.is_empty() {
                    continue;
                }
                rl.add_history_entry(command)?;
                if !process_command(storage, command) {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        }
    }

    rl.save_history(HISTORY_FILE)
}

fn run(path: &str, command: &[String]) -> Result<()> {
    let mut storage = StorageManager::open(path)?;

    if !command.is_empty() {
        let command = command.join(" ");
        let output = run_command(&mut storage, &command)?;
        if !output.is_empty() {
            println!("{output}");
        }
        return Ok(());
    }

    repl(&mut storage).map_err(|err| DatabaseError::Io(std::io::Error::other(err.to_string())))
}

fn main() -> ExitCode {
    init_tracing();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((path, command)) = args.split_first() else {
        eprintln!("{}", usage());
        return ExitCode::FAILURE;
    };

    match run(path, command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
