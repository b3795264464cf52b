// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Printgate: authenticated HTTP relay for raw-TCP receipt printers.
//
// Entry point. Initialises logging, then either runs the server or edits the
// users file.

mod cli;
mod server;
mod users;

use std::process::ExitCode;

use clap::Parser;
use printgate_core::config::RelayConfig;
use printgate_core::error::Result;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "printgate exited with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve {
            config,
            listen,
            printer,
        } => {
            let mut relay_config = match config {
                Some(path) => RelayConfig::load(path)?,
                None => RelayConfig::default(),
            };
            if let Some(listen) = listen {
                relay_config.listen_addr = listen;
            }
            if let Some(printer) = printer {
                relay_config.printer_address = printer;
            }
            relay_config.validate()?;
            server::serve(relay_config).await
        }
        Commands::Users { file, action } => users::run(&file, action),
    }
}
