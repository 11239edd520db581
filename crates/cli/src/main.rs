//! Calmly CLI - database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! calmly-cli migrate
//!
//! # List registered institutions
//! calmly-cli institutions
//!
//! # Delete a user's stored chat transcript
//! calmly-cli chat clear -e student@example.edu
//! ```
//!
//! # Environment Variables
//!
//! - `CALMLY_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "calmly-cli")]
#[command(author, version, about = "Calmly CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// List registered institutions
    Institutions,
    /// Manage stored chat transcripts
    Chat {
        #[command(subcommand)]
        action: ChatAction,
    },
}

#[derive(Subcommand)]
enum ChatAction {
    /// Delete the stored transcript of one user
    Clear {
        /// Account e-mail address
        #[arg(short, long)]
        email: String,
    },
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
        Commands::Institutions => commands::institutions::list().await?,
        Commands::Chat { action } => match action {
            ChatAction::Clear { email } => commands::chat::clear(&email).await?,
        },
    }
    Ok(())
}
