// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Fabstir PII Redactor CLI
#[derive(Parser, Debug)]
#[command(name = "pii-redact-cli")]
#[command(version)]
#[command(about = "Detect and redact PII in scanned images", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// OCR an image, black out detected PII and write a PNG
    Redact(commands::RedactArgs),

    /// Classify existing OCR output (JSON) without an image
    Detect(commands::DetectArgs),

    /// Run the HTTP API
    Serve(commands::ServeArgs),

    /// Print version and feature information
    Version,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Redact(args) => commands::redact(args).await,
        Commands::Detect(args) => commands::detect(args).map(|_| ()),
        Commands::Serve(args) => commands::serve(args).await,
        Commands::Version => {
            println!(
                "{}",
                serde_json::to_string_pretty(&crate::version::get_version_info())?
            );
            Ok(())
        }
    }
}
