//! ArcDB catalog - interactive shell

use anyhow::{Context as _, Result};
use arcdb_catalog::sql::{parse_statement, Statement};
use arcdb_catalog::{AlterRequest, CatalogConfig, Context, OrdinaryDatabase};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::env;
use std::fs;
use tracing_subscriber::EnvFilter;

/// Print welcome banner
fn print_banner(database: &OrdinaryDatabase) {
    println!(
        r#"
 ArcDB catalog shell
 Database '{}' at {}
 Type '.help' for help, '.quit' to exit
"#,
        database.name(),
        database.metadata_path().display()
    );
}

/// Print help message
fn print_help() {
    println!(
        r#"
Commands:
  .help                 Show this help message
  .quit                 Exit
  .tables               List attached tables
  .dictionaries         List attached dictionaries
  .show <name>          Print the stored definition of a table or dictionary
  .alter <statement>    Rewrite a table's metadata to match a definition

Example:
  .alter ATTACH TABLE hits (id UInt64, url String) ENGINE = MergeTree() ORDER BY id
"#
    );
}

fn print_names(kind: &str, names: Vec<String>) {
    if names.is_empty() {
        println!("No {} found.", kind);
        return;
    }
    println!("{}:", kind);
    for name in names {
        println!("  {}", name);
    }
}

fn show(database: &OrdinaryDatabase, name: &str) {
    match fs::read_to_string(database.object_metadata_path(name)) {
        Ok(text) => print!("{}", text),
        Err(e) => eprintln!("Error: cannot read definition of '{}': {}", name, e),
    }
}

fn alter(database: &OrdinaryDatabase, context: &Context, sql: &str) {
    let statement = match parse_statement(sql) {
        Ok(Statement::CreateTable(statement)) => statement,
        Ok(Statement::CreateDictionary(_)) => {
            eprintln!("Error: dictionaries cannot be altered");
            return;
        }
        Err(e) => {
            eprintln!("Parse error: {}", e);
            return;
        }
    };

    let request = AlterRequest::from_statement(&statement);
    match database.alter_table(context, &request) {
        Ok(()) => println!("Table '{}' altered.", request.table_name),
        Err(e) => eprintln!("Error: {}", e),
    }
}

/// Handle a dot command. Returns false when the shell should exit.
fn handle_command(line: &str, database: &OrdinaryDatabase, context: &Context) -> bool {
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        ".help" => print_help(),
        ".quit" | ".exit" => {
            println!("Goodbye!");
            return false;
        }
        ".tables" => print_names("Tables", database.table_names()),
        ".dictionaries" => print_names("Dictionaries", database.dictionary_names()),
        ".show" if !rest.is_empty() => show(database, rest),
        ".alter" if !rest.is_empty() => alter(database, context, rest),
        ".show" | ".alter" => eprintln!("Usage: {} <argument>", command),
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Type '.help' for available commands.");
        }
    }
    true
}

fn open_database() -> Result<(OrdinaryDatabase, Context)> {
    let args: Vec<String> = env::args().collect();
    let mut config = CatalogConfig::new();
    let mut name = "default".to_string();

    // Simple argument parsing
    for i in 1..args.len() {
        let value = args.get(i + 1);
        match (args[i].as_str(), value) {
            ("--config", Some(path)) => {
                config = CatalogConfig::from_json_file(path)
                    .with_context(|| format!("cannot load config {}", path))?
            }
            ("--metadata", Some(path)) => config = config.metadata_root(path),
            ("--data", Some(path)) => config = config.data_root(path),
            ("--database", Some(value)) => name = value.clone(),
            _ => {}
        }
    }

    let database = OrdinaryDatabase::new(name, &config)?;
    let context = Context::new(config);
    let summary = database
        .load_stored_objects(&context)
        .context("cannot load stored objects")?;
    println!(
        "Loaded {} table(s) and {} dictionary(ies).",
        summary.tables, summary.dictionaries
    );

    Ok((database, context))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let (database, context) = open_database()?;
    print_banner(&database);

    let mut rl = DefaultEditor::new()?;

    loop {
        let line = match rl.readline("catalog> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let _ = rl.add_history_entry(trimmed);

        if !trimmed.starts_with('.') {
            eprintln!("Commands start with '.'; type '.help' for available commands.");
            continue;
        }
        if !handle_command(trimmed, &database, &context) {
            break;
        }
    }

    Ok(())
}
