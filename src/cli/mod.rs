//! CLI module for Mediverse
//!
//! Subcommands:
//! - `serve`: run the HTTP API (default)
//! - `check-config`: print the effective configuration with secrets masked

pub mod check_config;
pub mod serve;

use clap::{Parser, Subcommand};

/// Mediverse - medical question gateway
#[derive(Parser)]
#[command(name = "mediverse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server (default)
    Serve,

    /// Print the effective configuration with secrets redacted
    CheckConfig,
}

impl Cli {
    pub fn command(&self) -> &Command {
        self.command.as_ref().unwrap_or(&Command::Serve)
    }
}
