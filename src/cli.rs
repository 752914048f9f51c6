//! Command-line arguments for the `fdpsheet` and `create-account` binaries.
//! Parse them after [`crate::config::load_dotenv`] so `env` fallbacks see
//! values from `.env`.

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "fdpsheet")]
#[command(about = "Spreadsheet documents stored in a personal storage pod", long_about = None)]
pub struct Cli {
    #[arg(short, long, env = "FDPSHEET_USERNAME")]
    pub username: String,
    #[arg(short, long, env = "FDPSHEET_PASSWORD", hide_env_values = true)]
    pub password: String,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List saved documents
    Files,
    /// Print the non-empty cells of a document
    Show { name: String },
    /// Set one cell (e.g. `B3`) and save, creating the document if needed
    Set {
        name: String,
        cell: String,
        value: String,
    },
}

/// Creates, funds and registers a storage network account.
#[derive(Debug, Parser)]
#[command(name = "create-account")]
pub struct CreateAccountArgs {
    pub username: String,
    pub password: String,
    pub postage_stamp_id: String,
}
