//! console-ctl: command-line driver for the admin console session core.
//!
//! Runs the same session lifecycle the console UI runs, against a real
//! backend, using the token persisted under `~/.admin-console/`.
//!
//! ## Subcommands
//!
//! - `token`: Adopt a token issued by the sign-in flow and validate it
//! - `status`: Refresh the stored session and print a snapshot
//! - `watch`: Keep the session refreshed until it ends
//! - `logout`: End the session
//! - `list`: Fetch one page of a list resource with filters

mod auth;
mod context;
mod list;
mod logging;

use clap::{Parser, Subcommand};
use console_core::StorageConfig;
use thiserror::Error;

#[derive(Parser)]
#[command(name = "console-ctl")]
#[command(about = "Admin console session driver")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store an access token from the sign-in flow and validate it
    Token {
        #[arg(value_name = "TOKEN")]
        token: String,
    },

    /// Refresh the stored session and print its state as JSON
    Status,

    /// Keep refreshing the session until it ends
    Watch,

    /// Invalidate the session remotely (best effort) and locally
    Logout,

    /// Fetch one page of a list resource
    List {
        /// Filter category (one per list page, e.g. "orders")
        #[arg(value_name = "CATEGORY")]
        category: String,

        /// Endpoint path relative to the API base URL
        #[arg(value_name = "PATH")]
        path: String,

        #[arg(long, default_value_t = 1)]
        page: u32,

        /// Page size (defaults to the configured page limit)
        #[arg(long)]
        limit: Option<u32>,

        /// Set a filter, as key=value (repeatable)
        #[arg(long = "filter", value_name = "KEY=VALUE")]
        filters: Vec<String>,

        /// Toggle one element of a multi-select filter, as key=value (repeatable)
        #[arg(long = "toggle", value_name = "KEY=VALUE")]
        toggles: Vec<String>,

        /// Clear a filter key (repeatable)
        #[arg(long = "clear", value_name = "KEY")]
        clears: Vec<String>,
    },
}

#[derive(Error, Debug)]
pub enum CtlError {
    #[error(transparent)]
    Console(#[from] console_core::ConsoleError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Session ended with status {0:?}")]
    NotSignedIn(console_core::SessionStatus),

    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

fn main() {
    let storage = StorageConfig::from_home();
    let _logging_guard = logging::init(storage.as_ref().ok());
    let cli = Cli::parse();

    let storage = match storage {
        Ok(storage) => storage,
        Err(e) => {
            tracing::error!(error = %e, "console-ctl cannot locate storage");
            std::process::exit(1);
        }
    };
    let ctx = match context::Context::load(storage) {
        Ok(ctx) => ctx,
        Err(e) => {
            tracing::error!(error = %e, "console-ctl configuration failed");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Token { token } => auth::adopt(&ctx, &token),
        Commands::Status => auth::status(&ctx),
        Commands::Watch => auth::watch(&ctx),
        Commands::Logout => auth::logout(&ctx),
        Commands::List {
            category,
            path,
            page,
            limit,
            filters,
            toggles,
            clears,
        } => list::run(
            &ctx,
            &list::ListArgs {
                category,
                path,
                page,
                limit,
                filters,
                toggles,
                clears,
            },
        ),
    };

    if let Err(e) = result {
        tracing::error!(error = %e, "console-ctl command failed");
        std::process::exit(1);
    }
}
