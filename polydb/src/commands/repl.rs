//! A line-oriented REPL for poking at a running engine interactively.
//! Tokenizes the same way a SQL client would (whitespace-separated,
//! case-insensitive keywords, optional trailing semicolon) but only
//! recognizes the small set of introspection commands below — statement
//! parsing itself is a collaborator this engine never implements.

use std::io::{self, BufRead, Write};

use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, PartialEq)]
enum ReplCommand {
    Help,
    ShowNamespaces,
    ShowAdapters,
    ShowTables { namespace: String },
    Exit,
}

impl TryFrom<&str> for ReplCommand {
    type Error = String;

    fn try_from(input: &str) -> std::result::Result<Self, Self::Error> {
        let trimmed = input.trim().strip_suffix(';').unwrap_or(input.trim());
        let tokens: Vec<&str> = trimmed.split_whitespace().collect();
        let lower: Vec<String> = tokens.iter().map(|t| t.to_ascii_lowercase()).collect();
        let lower: Vec<&str> = lower.iter().map(String::as_str).collect();

        match lower.as_slice() {
            [] => Err("no command specified".to_string()),
            ["help"] => Ok(Self::Help),
            ["show", "namespaces"] => Ok(Self::ShowNamespaces),
            ["show", "adapters"] => Ok(Self::ShowAdapters),
            ["show", "tables", "from", _] => Ok(Self::ShowTables { namespace: tokens[3].to_string() }),
            ["exit"] | ["quit"] => Ok(Self::Exit),
            _ => Err(format!("unrecognized command: {input}")),
        }
    }
}

impl ReplCommand {
    fn help() -> &'static str {
        "Available commands:\n\
         HELP\n\
         SHOW NAMESPACES\n\
         SHOW ADAPTERS\n\
         SHOW TABLES FROM <namespace>\n\
         EXIT | QUIT\n"
    }
}

#[derive(Debug, clap::Parser)]
pub struct Config {}

pub async fn command(engine: &Engine, _config: Config) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("polydb> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match ReplCommand::try_from(line.as_str()) {
            Ok(ReplCommand::Exit) => break,
            Ok(ReplCommand::Help) => println!("{}", ReplCommand::help()),
            Ok(ReplCommand::ShowNamespaces) => {
                let snapshot = engine.catalog().current_snapshot();
                for ns in snapshot.all_namespaces().values() {
                    println!("{} ({:?})", ns.name, ns.kind);
                }
            }
            Ok(ReplCommand::ShowAdapters) => {
                let snapshot = engine.catalog().current_snapshot();
                for adapter in snapshot.adapters() {
                    println!("{} persistent={}", adapter.unique_name, adapter.is_persistent);
                }
            }
            Ok(ReplCommand::ShowTables { namespace }) => {
                let snapshot = engine.catalog().current_snapshot();
                match snapshot.namespace_by_name(&namespace) {
                    Ok(ns) => {
                        for (_, entity) in snapshot.all_entities() {
                            if entity.namespace_id == ns.id {
                                println!("{}", entity.name);
                            }
                        }
                    }
                    Err(e) => println!("error: {e}"),
                }
            }
            Err(message) => println!("error: {message}"),
        }
    }
    Ok(())
}
