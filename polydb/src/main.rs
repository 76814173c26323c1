//! `polydb`: CLI entry point wiring a [`polydb::Engine`] to the structured
//! DDL subcommands in [`polydb::commands`].
//!
//! Exit codes follow [`polydb::error::Error::exit_code`]: 0 success, 1 usage,
//! 2 catalog error, 3 adapter error, 4 deadlock.

use clap::Parser;
use observability_deps::tracing::error;

use polydb::commands;
use polydb::config::EngineConfig;
use polydb::engine::Engine;

#[derive(Debug, Parser)]
#[clap(name = "polydb", about = "Polystore catalog, router and DDL orchestrator")]
struct Args {
    /// Path to a TOML config file; falls back to engine defaults if absent.
    #[clap(long, env = "POLYDB_CONFIG")]
    config: Option<String>,

    /// Overrides `catalog_path` from the config file.
    #[clap(long, env = "POLYDB_CATALOG")]
    catalog: Option<String>,

    #[clap(flatten)]
    command: commands::Config,
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

fn load_config(args: &Args) -> polydb::error::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(catalog) = &args.catalog {
        config.catalog_path = Some(catalog.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    let exit_code = match run(args).await {
        Ok(()) => 0,
        Err(err) => {
            error!(%err, "polydb exiting with error");
            eprintln!("error: {err}");
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

async fn run(args: Args) -> polydb::error::Result<()> {
    let config = load_config(&args)?;
    let engine = Engine::new(config)?;
    let result = commands::command(&engine, args.command).await;
    engine.persist()?;
    result
}
