//! `fleetdesk`: command-line client for the logistics admin API.
//!
//! Manages contexts and drives the same CRUD and shipment sessions the
//! dashboard uses, so validation and messages match.

mod commands;
mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fleetdesk_client::{ApiClient, Resource};
use tracing::debug;

use commands::Output;

/// fleetdesk CLI tool.
#[derive(Parser, Debug)]
#[command(name = "fleetdesk", about = "Logistics admin CLI client")]
struct Cli {
    /// Path to client config file (default: ~/.fleetdesk/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// API base URL, overriding the current context.
    #[arg(long, global = true, env = "FLEETDESK_API_URL")]
    server: Option<String>,

    /// Output format.
    #[arg(long = "output", short = 'o', global = true, value_enum, default_value_t = Output::Table)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage named API endpoints.
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// List the resources the API exposes.
    Resources,

    /// List records, optionally searched and filtered.
    List {
        /// Resource type (e.g. materials, vehicle-types).
        resource: Resource,
        #[arg(long)]
        search: Option<String>,
        /// Equality filter, `key=value`. Repeatable.
        #[arg(long = "filter")]
        filters: Vec<String>,
    },

    /// Show one record.
    Get { resource: Resource, id: i64 },

    /// Create a record from `--set key=value` fields.
    Create {
        resource: Resource,
        #[arg(long = "set", required = true)]
        values: Vec<String>,
    },

    /// Update a record (PATCH). Unset fields keep their values.
    Update {
        resource: Resource,
        id: i64,
        #[arg(long = "set", required = true)]
        values: Vec<String>,
    },

    /// Delete a record.
    Delete {
        resource: Resource,
        id: i64,
        /// Skip confirmation.
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },

    /// Shipments with their route legs.
    Shipments {
        #[command(subcommand)]
        action: ShipmentAction,
    },

    /// Show version.
    Version,
}

#[derive(Subcommand, Debug)]
enum ContextAction {
    /// Create or update a context.
    Set {
        name: String,
        #[arg(long)]
        server: String,
    },
    /// List all contexts.
    List,
    /// Switch to a context.
    Use { name: String },
    /// Delete a context.
    Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum ShipmentAction {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        transporter: Option<i64>,
        #[arg(long)]
        vehicle: Option<i64>,
        #[arg(long)]
        material: Option<i64>,
    },
    /// Create a shipment from a plan file.
    Create {
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    /// Replace a shipment's transporter, vehicle and legs from a plan file.
    Update {
        id: i64,
        #[arg(short = 'f', long = "file")]
        file: PathBuf,
    },
    Delete {
        id: i64,
        #[arg(long = "yes", short = 'y')]
        yes: bool,
    },
}

/// Confirmation prompt on stderr, skipped with `--yes`.
fn confirmer(yes: bool) -> impl FnOnce(&str) -> anyhow::Result<bool> {
    move |prompt: &str| {
        if yes {
            return Ok(true);
        }
        eprint!("{} [y/N]: ", prompt);
        let mut s = String::new();
        std::io::stdin().read_line(&mut s)?;
        Ok(s.trim().eq_ignore_ascii_case("y"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(config::ClientConfig::default_path);
    let output = cli.output;
    let server = cli.server;
    let client = || -> anyhow::Result<ApiClient> {
        let config = config::ClientConfig::load(&config_path)?;
        let base_url = config.resolve_server(server.as_deref());
        debug!(%base_url, "using api");
        Ok(ApiClient::http(&base_url)?)
    };

    match cli.command {
        Commands::Context { action } => match action {
            ContextAction::Set { name, server } => commands::context::set(&name, &server, &config_path)?,
            ContextAction::List => commands::context::list(&config_path)?,
            ContextAction::Use { name } => commands::context::use_context(&name, &config_path)?,
            ContextAction::Delete { name } => commands::context::delete(&name, &config_path)?,
        },

        Commands::Resources => commands::resource::resources(),

        Commands::List { resource, search, filters } => {
            let filters = commands::parse_pairs(&filters)?;
            commands::resource::list(client()?, resource, search.as_deref(), &filters, output).await?;
        }

        Commands::Get { resource, id } => {
            commands::resource::get(client()?, resource, id, output).await?;
        }

        Commands::Create { resource, values } => {
            let values = commands::parse_pairs(&values)?;
            commands::resource::create(client()?, resource, &values).await?;
        }

        Commands::Update { resource, id, values } => {
            let values = commands::parse_pairs(&values)?;
            commands::resource::update(client()?, resource, id, &values).await?;
        }

        Commands::Delete { resource, id, yes } => {
            if !commands::resource::delete(client()?, resource, id, confirmer(yes)).await? {
                println!("Cancelled.");
            }
        }

        Commands::Shipments { action } => match action {
            ShipmentAction::List { search, transporter, vehicle, material } => {
                let filters = commands::shipment::filters(transporter, vehicle, material);
                commands::shipment::list(client()?, search.as_deref(), &filters, output).await?;
            }
            ShipmentAction::Create { file } => {
                let plan = commands::shipment::ShipmentPlan::load(&file)?;
                commands::shipment::save(client()?, None, &plan).await?;
            }
            ShipmentAction::Update { id, file } => {
                let plan = commands::shipment::ShipmentPlan::load(&file)?;
                commands::shipment::save(client()?, Some(id), &plan).await?;
            }
            ShipmentAction::Delete { id, yes } => {
                if !commands::shipment::delete(client()?, id, confirmer(yes)).await? {
                    println!("Cancelled.");
                }
            }
        },

        Commands::Version => {
            println!("fleetdesk cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resource_aliases_parse() {
        let cli = Cli::try_parse_from(["fleetdesk", "list", "vehicle-type", "--filter", "name=Tipper"]).unwrap();
        match cli.command {
            Commands::List { resource, filters, .. } => {
                assert_eq!(resource, Resource::VehicleTypes);
                assert_eq!(filters, vec!["name=Tipper"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(Cli::try_parse_from(["fleetdesk", "get", "spaceships", "1"]).is_err());
    }

    #[test]
    fn output_flag_is_global() {
        let cli = Cli::try_parse_from(["fleetdesk", "shipments", "list", "-o", "json"]).unwrap();
        assert_eq!(cli.output, Output::Json);
    }
}
