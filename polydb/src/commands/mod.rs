//! Subcommand dispatch for the `polydb` binary, one module per DDL surface
//! area plus the interactive REPL.

pub mod adapter;
pub mod namespace;
pub mod repl;
pub mod table;
mod types;

use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// CREATE/DROP NAMESPACE
    Namespace(namespace::Config),
    /// CREATE/ALTER/DROP/TRUNCATE TABLE
    Table(table::Config),
    /// ALTER ADAPTERS ADD/DROP
    Adapter(adapter::Config),
    /// Interactive session for ad hoc introspection
    Repl(repl::Config),
}

pub async fn command(engine: &Engine, config: Config) -> Result<()> {
    match config.command {
        Command::Namespace(config) => namespace::command(engine, config).await,
        Command::Table(config) => table::command(engine, config).await,
        Command::Adapter(config) => adapter::command(engine, config).await,
        Command::Repl(config) => repl::command(engine, config).await,
    }
}
