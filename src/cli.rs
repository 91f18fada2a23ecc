use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;
use spotle::api;
use spotle::config::{ConfigBuilder, DatabaseLocation};
use spotle::errors::Result;

#[derive(Parser)]
#[command(name = "spotle")]
#[command(version, about = "REST API serving artist listener statistics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the artist table if needed and start the HTTP API
    Serve {
        /// Address to bind (overrides HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Database file (overrides SPOTLE_DB_PATH)
        #[arg(long, conflicts_with = "in_memory")]
        database: Option<PathBuf>,
        /// Keep all data in memory; nothing survives a restart
        #[arg(long)]
        in_memory: bool,
    },
    /// Create the artist table and exit
    InitDb {
        /// Database file (overrides SPOTLE_DB_PATH)
        #[arg(long)]
        database: Option<PathBuf>,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            host,
            port,
            database,
            in_memory,
        } => {
            let location = if in_memory {
                Some(DatabaseLocation::InMemory)
            } else {
                database.map(DatabaseLocation::File)
            };
            serve(host, port, location).await?;
        }
        Commands::InitDb { database } => {
            init_db(database.map(DatabaseLocation::File)).await?;
        }
    }
    Ok(())
}

async fn serve(
    host: Option<String>,
    port: Option<u16>,
    database: Option<DatabaseLocation>,
) -> Result<()> {
    info!("Building config ...");
    let config = ConfigBuilder::new()
        .host(host)
        .port(port)
        .database(database)
        .build()?;

    info!("Opening artist storage ...");
    let storage = config.database.open().await?;
    storage.init_db().await?;

    api::serve(&config.server, Arc::new(storage)).await
}

async fn init_db(database: Option<DatabaseLocation>) -> Result<()> {
    let config = ConfigBuilder::new().database(database).build()?;
    let storage = config.database.open().await?;
    storage.init_db().await?;
    info!("Artist table ready ({:?})", config.database);
    Ok(())
}
