//! bx - Command-line tool for the Bitrix24 REST API
//!
//! Lists permissions, CRM smart processes and items, and manages Disk
//! storages, folders and files through an incoming webhook.

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bitrix_client::BitrixClient;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{Config, MergedConfig};
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "bx")]
#[command(author, version, about = "Bitrix24 REST API CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "BITRIX_CONFIG")]
    config: Option<PathBuf>,

    /// REST endpoint, e.g. https://example.bitrix24.ru/rest
    #[arg(long, env = "BITRIX_BASE_URL")]
    base_url: Option<String>,

    /// Account (user) id of the webhook
    #[arg(long, env = "BITRIX_USER_ID")]
    user_id: Option<String>,

    /// Webhook access token
    #[arg(long, env = "BITRIX_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List REST methods
    Methods {
        /// Only methods of this scope (crm, disk, ...)
        #[arg(long)]
        scope: Option<String>,

        /// Only methods the token may call
        #[arg(long)]
        brief: bool,
    },

    /// List permission scopes
    Scope,

    /// List methods with typed bindings in this client
    Catalog,

    /// List Disk storages
    Storages {
        /// Filter as KEY=VALUE (repeatable)
        #[arg(long)]
        filter: Vec<String>,

        /// Page offset
        #[arg(long)]
        start: Option<u64>,
    },

    /// Show a storage
    Storage {
        /// Storage ID
        id: String,
    },

    /// Show a folder
    Folder {
        /// Folder ID
        id: i64,
    },

    /// List a folder's contents
    Children {
        /// Folder ID
        id: i64,

        /// Filter as KEY=VALUE (repeatable)
        #[arg(long)]
        filter: Vec<String>,

        /// Page offset
        #[arg(long)]
        start: Option<u64>,
    },

    /// Create a folder in a storage root
    Mkdir {
        /// Storage ID
        storage_id: String,

        /// Folder name
        name: String,
    },

    /// Create a folder inside a folder
    Mksubdir {
        /// Parent folder ID
        folder_id: i64,

        /// Folder name
        name: String,
    },

    /// Show a file
    File {
        /// File ID
        id: i64,
    },

    /// Delete a folder and everything in it
    Rmtree {
        /// Folder ID
        id: i64,
    },

    /// Upload a local file into a folder
    Upload {
        /// Target folder ID
        folder_id: i64,

        /// Local file path
        path: PathBuf,

        /// MIME type of the file part
        #[arg(long)]
        content_type: Option<String>,
    },

    /// List smart-process types
    Types {
        /// Sort as FIELD=ASC|DESC (repeatable)
        #[arg(long)]
        order: Vec<String>,

        /// Filter as KEY=VALUE (repeatable)
        #[arg(long)]
        filter: Vec<String>,

        /// Page offset
        #[arg(long)]
        start: Option<u64>,
    },

    /// List CRM items of an entity type
    Items {
        /// Entity type ID (1 = lead, 2 = deal, smart processes from `types`)
        entity_type_id: i64,

        /// Field to return (repeatable, `*` for all)
        #[arg(long)]
        select: Vec<String>,

        /// Filter as KEY=VALUE (repeatable)
        #[arg(long)]
        filter: Vec<String>,

        /// Sort as FIELD=ASC|DESC (repeatable)
        #[arg(long)]
        order: Vec<String>,

        /// Page offset
        #[arg(long)]
        start: Option<u64>,

        /// Return user fields under their UF_* names
        #[arg(long)]
        original_names: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    if let Err(e) = run(&cli) {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    // Load config file
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let format = cli.output.or(config.output).unwrap_or_default();
    let no_color = cli.no_color || config.no_color.unwrap_or(false);
    let ctx = &OutputContext::new(format, no_color, cli.quiet);

    // Commands that need no account
    if let Commands::Catalog = cli.command {
        commands::catalog(ctx);
        return Ok(());
    }

    // Merge CLI args with config
    let merged = config.merge_with_args(
        cli.base_url.as_deref(),
        cli.user_id.as_deref(),
        cli.token.as_deref(),
    )?;
    debug!("Using {} as user {}", merged.base_url, merged.user_id);
    let client = create_client(&merged)?;

    match &cli.command {
        Commands::Catalog => commands::catalog(ctx),

        Commands::Methods { scope, brief } => {
            commands::methods(&client, scope.as_deref(), *brief, ctx)?;
        }

        Commands::Scope => commands::scope(&client, ctx)?,

        Commands::Storages { filter, start } => {
            commands::storages(&client, filter, *start, ctx)?;
        }

        Commands::Storage { id } => commands::storage(&client, id, ctx)?,

        Commands::Folder { id } => commands::folder(&client, *id, ctx)?,

        Commands::Children { id, filter, start } => {
            commands::children(&client, *id, filter, *start, ctx)?;
        }

        Commands::Mkdir { storage_id, name } => {
            commands::mkdir(&client, storage_id, name, ctx)?;
        }

        Commands::Mksubdir { folder_id, name } => {
            commands::mksubdir(&client, *folder_id, name, ctx)?;
        }

        Commands::File { id } => commands::file(&client, *id, ctx)?,

        Commands::Rmtree { id } => commands::rmtree(&client, *id, ctx)?,

        Commands::Upload {
            folder_id,
            path,
            content_type,
        } => {
            commands::upload(&client, *folder_id, path, content_type.as_deref(), ctx)?;
        }

        Commands::Types {
            order,
            filter,
            start,
        } => {
            commands::types(&client, order, filter, *start, ctx)?;
        }

        Commands::Items {
            entity_type_id,
            select,
            filter,
            order,
            start,
            original_names,
        } => {
            let args = commands::crm::ItemsArgs {
                entity_type_id: *entity_type_id,
                select,
                filter,
                order,
                start: *start,
                original_names: *original_names,
            };
            commands::items(&client, args, ctx)?;
        }
    }

    Ok(())
}

/// Create a Bitrix24 client from the resolved configuration
fn create_client(merged: &MergedConfig) -> Result<BitrixClient> {
    BitrixClient::new(merged.client_config(), merged.credentials())
        .context("Failed to create Bitrix24 client")
}
