//! `polydb namespace create|drop`, covering `CREATE NAMESPACE` / `DROP
//! NAMESPACE ... [IF EXISTS]`.

use crate::commands::types::parse_namespace_kind;
use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// CREATE NAMESPACE <name>
    Create {
        name: String,
        #[clap(long, default_value = "relational")]
        kind: String,
        #[clap(long, default_value = "admin")]
        owner: String,
        #[clap(long)]
        if_not_exists: bool,
    },
    /// DROP NAMESPACE <name> [IF EXISTS]
    Drop {
        name: String,
        #[clap(long)]
        if_exists: bool,
    },
}

pub async fn command(engine: &Engine, config: Config) -> Result<()> {
    match config.command {
        Command::Create { name, kind, owner, if_not_exists } => {
            let kind = parse_namespace_kind(&kind)?;
            let id = engine.ddl().create_namespace(&name, kind, &owner, if_not_exists).await?;
            println!("namespace {name} created (id {})", id.get());
        }
        Command::Drop { name, if_exists } => {
            engine.ddl().drop_namespace(&name, if_exists).await?;
            println!("namespace {name} dropped");
        }
    }
    Ok(())
}
