//! ParcelHub CLI - Database migrations and management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! parcelhub-cli migrate
//!
//! # Create empty rows for every courier credential
//! parcelhub-cli settings seed
//!
//! # Set a courier credential
//! parcelhub-cli settings set steadfast_api_key abc123
//!
//! # Block a phone number
//! parcelhub-cli blacklist add --kind phone --value 01700000000 --reason "fake orders"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `settings seed|set|list` - Manage grouped settings
//! - `blacklist add|list|remove` - Manage the fraud blacklist

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "parcelhub-cli")]
#[command(author, version, about = "ParcelHub CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Manage grouped settings (courier credentials)
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Manage the fraud blacklist
    Blacklist {
        #[command(subcommand)]
        action: BlacklistAction,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Insert an empty row for every known courier key (existing values are kept)
    Seed,
    /// Set a value
    Set {
        key: String,
        value: String,

        /// Settings group
        #[arg(short, long, default_value = "courier")]
        group: String,
    },
    /// List a group (secrets are masked)
    List {
        /// Settings group
        #[arg(short, long, default_value = "courier")]
        group: String,
    },
}

#[derive(Subcommand)]
enum BlacklistAction {
    /// Add an entry
    Add {
        /// Identifier kind (`phone`, `ip`, `email`)
        #[arg(short, long)]
        kind: String,

        /// Identifier value
        #[arg(short, long)]
        value: String,

        /// Why it was blocked
        #[arg(short, long)]
        reason: Option<String>,
    },
    /// List entries, newest first
    List,
    /// Remove an entry by ID
    Remove { id: i64 },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CliError> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Settings { action } => match action {
            SettingsAction::Seed => commands::settings::seed().await?,
            SettingsAction::Set { key, value, group } => {
                commands::settings::set(&key, &value, &group).await?;
            }
            SettingsAction::List { group } => commands::settings::list(&group).await?,
        },
        Commands::Blacklist { action } => match action {
            BlacklistAction::Add {
                kind,
                value,
                reason,
            } => commands::blacklist::add(&kind, &value, reason).await?,
            BlacklistAction::List => commands::blacklist::list().await?,
            BlacklistAction::Remove { id } => commands::blacklist::remove(id).await?,
        },
    }
    Ok(())
}
