//! Command line client for unireq

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use unireq::Method;

mod config;
mod env_vars;
mod sub_commands;

use crate::config::Settings;

/// Send JSON requests through a unireq adapter
#[derive(Parser)]
#[command(name = "unireq", author = env!("CARGO_PKG_AUTHORS"), version = env!("CARGO_PKG_VERSION"))]
#[command(about, long_about = None)]
struct Cli {
    /// Use <file> as the config file instead of ~/.unireq/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Logging level
    #[arg(short, long, default_value = "error")]
    log_level: Level,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a resource
    Get(sub_commands::send::SendSubCommand),
    /// POST a JSON body
    Post(sub_commands::send::SendSubCommand),
    /// PUT a JSON body
    Put(sub_commands::send::SendSubCommand),
    /// PATCH a JSON body
    Patch(sub_commands::send::SendSubCommand),
    /// DELETE a resource
    Delete(sub_commands::send::SendSubCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Cli = Cli::parse();
    let default_filter = args.log_level;

    let hyper_filter = "hyper=warn";
    let rustls_filter = "rustls=warn";

    let env_filter = EnvFilter::new(format!(
        "{},{},{}",
        default_filter, hyper_filter, rustls_filter
    ));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::new(args.config.as_ref())?.from_env()?;

    let (method, sub_command_args) = match &args.command {
        Commands::Get(sub_command_args) => (Method::Get, sub_command_args),
        Commands::Post(sub_command_args) => (Method::Post, sub_command_args),
        Commands::Put(sub_command_args) => (Method::Put, sub_command_args),
        Commands::Patch(sub_command_args) => (Method::Patch, sub_command_args),
        Commands::Delete(sub_command_args) => (Method::Delete, sub_command_args),
    };

    sub_commands::send::send(settings, method, sub_command_args).await
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_repeated_query_and_headers() {
        let args = Cli::try_parse_from([
            "unireq",
            "--log-level",
            "debug",
            "get",
            "https://api.example.com/items",
            "-q",
            "tag=a",
            "-q",
            "tag=b",
            "-H",
            "X-Trace: 1",
            "--adapter",
            "axios",
        ])
        .expect("valid arguments");

        assert_eq!(args.log_level, Level::DEBUG);
        assert!(matches!(args.command, Commands::Get(_)));
    }

    #[test]
    fn test_rejects_unknown_adapter() {
        let result = Cli::try_parse_from([
            "unireq",
            "delete",
            "https://api.example.com/items/1",
            "--adapter",
            "curl",
        ]);
        assert!(result.is_err());
    }
}
