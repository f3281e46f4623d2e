//! Command-line front end for `arango-core`.
//!
//! ```bash
//! # Print the server version (defaults to http://localhost:8529)
//! arango --username root version
//!
//! # Create and drop a database
//! arango create-db shop --user admin
//! arango drop-db shop
//! ```
//!
//! Connection settings come from `ARANGO_*` environment variables, then from
//! the flags below.

use anyhow::{Context, Result};
use arango_core::{ArangoClient, ClientConfig, DatabaseApi, DatabaseUser};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arango")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Transfer protocol (http or https).
    #[arg(long)]
    protocol: Option<String>,

    /// Server host name.
    #[arg(long)]
    host: Option<String>,

    /// Server port.
    #[arg(short, long)]
    port: Option<u16>,

    #[arg(short, long)]
    username: Option<String>,

    #[arg(long)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the server version.
    Version,

    /// List databases visible to the user and on the server.
    Databases,

    /// Create a database.
    CreateDb {
        name: String,

        /// Users to create with the database (repeatable).
        #[arg(long = "user")]
        users: Vec<String>,
    },

    /// Delete a database.
    DropDb { name: String },

    /// List the collections of a database.
    Collections {
        /// Database to inspect; the default database when omitted.
        #[arg(long)]
        db: Option<String>,
    },
}

impl Cli {
    fn config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_env()?;
        if let Some(protocol) = &self.protocol {
            config.protocol = protocol.clone();
        }
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(username) = &self.username {
            config.username = Some(username.clone());
        }
        if let Some(password) = &self.password {
            config.password = Some(password.clone());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let url = config.base_url();
    let client = ArangoClient::connect(config).with_context(|| format!("connecting to {url}"))?;

    match cli.command {
        Commands::Version => {
            println!("{}", client.version()?);
        }
        Commands::Databases => {
            let list = client.databases()?;
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
        Commands::CreateDb { name, users } => {
            let users: Vec<DatabaseUser> = users.into_iter().map(DatabaseUser::new).collect();
            client.create_database(&name, Some(users.as_slice()))?;
            println!("created {name}");
        }
        Commands::DropDb { name } => {
            client.delete_database(&name)?;
            println!("deleted {name}");
        }
        Commands::Collections { db } => {
            let names = match db {
                Some(db) => client.db(&db)?.collection_names()?,
                None => client.collection_names()?,
            };
            for name in names {
                println!("{name}");
            }
        }
    }

    Ok(())
}
