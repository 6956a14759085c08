// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Herald - bulk personalized messaging campaigns.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use herald_config::model::HeraldConfig;

/// Herald - bulk personalized messaging campaigns.
#[derive(Parser, Debug)]
#[command(name = "herald", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the XDG hierarchy.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the control-plane server.
    Serve,
    /// Inspect Herald configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Validate the configuration and print it with secrets redacted.
    Check,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("herald: use --help for available commands");
        return;
    };

    let config = match herald_config::load_and_validate_from(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            herald_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match command {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Config {
            action: ConfigCommands::Check,
        } => match config_check(&config) {
            Ok(rendered) => {
                eprintln!("herald: configuration is valid");
                print!("{rendered}");
            }
            Err(e) => {
                herald_config::render_errors(&[e]);
                std::process::exit(1);
            }
        },
    }
}

fn config_check(config: &HeraldConfig) -> Result<String, herald_config::ConfigError> {
    herald_config::to_redacted_toml(config)
}
