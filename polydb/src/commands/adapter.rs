//! `polydb adapter register|drop`, covering `ALTER ADAPTERS ADD ... USING
//! '<class>' AS {'Store'|'Source'} WITH '<json-config>'` / `ALTER ADAPTERS
//! DROP <n>`. Registering only records the catalog descriptor; wiring up a
//! live `Arc<dyn Adapter>` handle for it is left to an embedder, since the
//! concrete backend classes are collaborators outside this engine.

use catalog_types::DeployMode;

use crate::commands::types::parse_index_method;
use crate::engine::Engine;
use crate::error::Result;

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Parser)]
enum Command {
    /// ALTER ADAPTERS ADD <name> AS {Store|Source}
    Register {
        name: String,
        #[clap(long, default_value = "store")]
        kind: String,
        #[clap(long, default_value = "embedded")]
        deploy_mode: String,
        #[clap(long = "index-method")]
        index_methods: Vec<String>,
    },
    /// ALTER ADAPTERS DROP <name>
    Drop { name: String },
}

fn parse_deploy_mode(s: &str) -> Result<DeployMode> {
    use crate::error::Error;
    match s.to_ascii_lowercase().as_str() {
        "embedded" => Ok(DeployMode::Embedded),
        "docker" => Ok(DeployMode::Docker),
        "remote" => Ok(DeployMode::Remote),
        other => Err(Error::Usage { message: format!("unknown deploy mode \"{other}\"") }),
    }
}

pub async fn command(engine: &Engine, config: Config) -> Result<()> {
    match config.command {
        Command::Register { name, kind, deploy_mode, index_methods } => {
            let is_persistent = kind.eq_ignore_ascii_case("store");
            let is_data_read_only = kind.eq_ignore_ascii_case("source");
            let deploy_mode = parse_deploy_mode(&deploy_mode)?;
            let methods: Vec<_> = index_methods.iter().map(|m| parse_index_method(m)).collect::<Result<_>>()?;
            let id = engine.ddl().register_adapter_descriptor(&name, is_persistent, deploy_mode, methods, is_data_read_only)?;
            println!("adapter {name} registered (id {})", id.get());
        }
        Command::Drop { name } => {
            engine.ddl().drop_adapter_descriptor(&name)?;
            println!("adapter {name} dropped");
        }
    }
    Ok(())
}
