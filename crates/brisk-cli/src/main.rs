// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

use brisk_cli::commands;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brisk")]
#[command(author = "Maravilla Labs")]
#[command(version)]
#[command(about = "File-routed frontend dev server with live reload", long_about = None)]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Verbose mode: print every compiled file and cycle detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: only show errors (useful for CI)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start development server with live reload
    Dev {
        /// Port to run the dev server on (defaults to brisk.toml)
        #[arg(short, long)]
        port: Option<u16>,
        /// Host to bind to (defaults to brisk.toml)
        #[arg(long)]
        host: Option<String>,
    },
    /// Compile the project once into the output directory
    Compile,
    /// Watch files and recompile on change (no server)
    Watch,
    /// Print the route table, or the match for a single path
    Routes {
        /// URL path to resolve against the table
        path: Option<String>,
    },
    /// Bundle the project for production
    Build {
        /// Output directory (defaults to brisk.toml)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level)
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    match cli.command {
        Commands::Dev { port, host } => {
            commands::dev::run(host, port, cli.verbose, cli.quiet).await
        }
        Commands::Compile => {
            commands::compile::run(cli.verbose, cli.quiet).await
        }
        Commands::Watch => {
            commands::watch::run(cli.quiet).await
        }
        Commands::Routes { path } => {
            commands::routes::run(path.as_deref()).await
        }
        Commands::Build { output } => {
            commands::build::run(output, cli.quiet).await
        }
    }
}
