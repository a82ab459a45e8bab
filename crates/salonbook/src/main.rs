// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Salonbook - admin assistant for salon back offices.
//!
//! This is the binary entry point.

mod providers;
mod serve;

use clap::{Parser, Subcommand};
use salonbook_config::SalonbookConfig;

/// Salonbook - admin assistant for salon back offices.
#[derive(Parser, Debug)]
#[command(name = "salonbook", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP gateway.
    Serve,
    /// Show the fallback chains and which providers have credentials.
    Providers,
    /// Print the effective configuration with secrets redacted.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match salonbook_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            salonbook_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Providers) => providers::run_providers(&config).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("salonbook: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &SalonbookConfig) -> Result<(), salonbook_core::SalonError> {
    let rendered = toml::to_string_pretty(&config.redacted())
        .map_err(|e| salonbook_core::SalonError::Config(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}
