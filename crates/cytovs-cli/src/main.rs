//! Cytovs CLI - Main entry point

use clap::Parser;
use cytovs_cli::{Cli, Commands};
use cytovs_core::logging::{init_logging, LogConfig, LogLevel};
use std::process;
use tracing::error;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Handle markdown help generation
    if cli.markdown_help {
        println!("{}", clap_markdown::help_markdown::<Cli>());
        return;
    }

    // Ensure a command is provided
    let Some(command) = &cli.command else {
        eprintln!("Error: A subcommand is required");
        eprintln!();
        eprintln!("For more information, try '--help'.");
        process::exit(2);
    };

    // Warnings only unless verbose; environment variables take precedence
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };
    let base_config = LogConfig {
        level,
        ..Default::default()
    };
    let log_config = base_config.clone().with_env_overrides().unwrap_or(base_config);

    // The CLI works without logging
    let _ = init_logging(&log_config);

    if let Err(e) = execute_command(&cli, command).await {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, command: &Commands) -> cytovs_cli::Result<()> {
    let config_path = cli.config.as_deref();

    match command {
        Commands::Run(args) => cytovs_cli::commands::run::run(config_path, args).await,

        Commands::Classify(args) => cytovs_cli::commands::classify::run(config_path, args).await,

        Commands::Ping { cytoscape_url } => {
            cytovs_cli::commands::ping::run(config_path, cytoscape_url.clone()).await
        }
    }
}
