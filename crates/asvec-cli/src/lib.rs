//! # asvec
//!
//! Administration tool for Aerospike Vector Search clusters.
//!
//! The binary is a thin wrapper around [`run`], which parses an argument
//! vector and executes one command against a [`Session`]. Tests drive the
//! same entry point with an in-memory cluster and captured output.
//!
//! ## Commands
//!
//! | Command | Purpose |
//! |---------|---------|
//! | `index create/update/drop/gc/ls` | Index lifecycle and status |
//! | `user create/drop/grant/revoke/new-password/ls` | User management |
//! | `role ls` | Available roles |
//! | `node ls` | Per-node cluster facts and visibility warnings |
//! | `query` | Nearest-neighbor search, optionally interactive |

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod flags;
pub mod interactive;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod topology;
pub mod view;
pub mod watch;

use clap::Parser;

pub use cli::Cli;
pub use commands::Session;
pub use error::{CliError, Result};

use cli::Commands;

/// Parses `argv` and runs the command it names. Returns the process exit
/// code.
pub async fn run(argv: Vec<String>, session: &mut Session<'_>) -> i32 {
    let cli = match Cli::try_parse_from(&argv) {
        Ok(cli) => cli,
        Err(e) => {
            let rendered = e.render().to_string();
            if e.use_stderr() {
                session.view.write_err_raw(&rendered);
                return 1;
            }
            session.view.write_raw(&rendered);
            return 0;
        }
    };

    if cli.no_color {
        session.view.set_color(false);
    }
    logging::init(cli.log_level, session.view.color());
    session.argv = argv;

    let Cli { command, client, .. } = cli;
    let result = match command {
        Commands::Index(cmd) => commands::index::run(session, &client, cmd).await,
        Commands::User(cmd) => commands::user::run(session, &client, cmd).await,
        Commands::Role(cmd) => commands::role::run(session, &client, cmd).await,
        Commands::Node(cmd) => commands::node::run(session, &client, cmd).await,
        Commands::Query(args) => commands::query::run(session, &client, args).await,
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            session.view.error(e);
            1
        }
    }
}
