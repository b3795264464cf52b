// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "printgate")]
#[command(author, version, about = "Relay authenticated HTTP print jobs to a raw-TCP receipt printer", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP relay server
    Serve {
        /// JSON config file; defaults are used when omitted
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Address to listen on (overrides the config file)
        #[arg(long, env = "PRINTGATE_LISTEN")]
        listen: Option<String>,

        /// Printer host:port (overrides the config file)
        #[arg(long, env = "PRINTGATE_PRINTER")]
        printer: Option<String>,
    },

    /// Manage the users file
    Users {
        /// Users file to edit; created empty if missing
        #[arg(long, value_name = "FILE", default_value = "users.json")]
        file: PathBuf,

        #[command(subcommand)]
        action: UserCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Add a user, or reset an existing user's password
    Add { username: String, password: String },
    /// Delete a user; their live token stops working immediately
    Delete { username: String },
    /// List usernames
    List,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_users_add() {
        let cli = Cli::try_parse_from(["printgate", "users", "--file", "u.json", "add", "till-1", "pw"])
            .unwrap();
        match cli.command {
            Commands::Users { file, action: UserCommand::Add { username, password } } => {
                assert_eq!(file, PathBuf::from("u.json"));
                assert_eq!(username, "till-1");
                assert_eq!(password, "pw");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from(["printgate", "serve", "--printer", "10.0.0.7:9100"]).unwrap();
        match cli.command {
            Commands::Serve { config, printer, .. } => {
                assert!(config.is_none());
                assert_eq!(printer.as_deref(), Some("10.0.0.7:9100"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
