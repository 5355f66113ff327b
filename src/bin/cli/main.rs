mod client;
mod commands;
mod output;

use assetdesk::config;
use clap::{Parser, Subcommand};
use client::AssetdeskClient;
use output::{OutputConfig, OutputFormat};
use std::process;

/// Server used when neither a flag, the environment nor the config file names one
const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// CLI for the assetdesk back office
#[derive(Parser, Debug)]
#[clap(name = "assetdesk-cli", about = "CLI for the assetdesk asset management server")]
struct Cli {
    /// Server URL to connect to
    #[clap(long, env = "ASSETDESK_URL", global = true)]
    server_url: Option<String>,

    /// Session token printed by `login`
    #[clap(long, env = "ASSETDESK_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sign in and print a session token
    Login(commands::auth::LoginArgs),
    /// Browse assets
    #[command(subcommand)]
    Asset(commands::asset::AssetCommands),
    /// Browse inventory
    #[command(subcommand)]
    Inventory(commands::inventory::InventoryCommands),
    /// Reports for managers
    #[command(subcommand)]
    Report(commands::report::ReportCommands),
    /// Headline figures
    Dashboard,
    /// Trigger the notification sweep
    #[command(subcommand)]
    Cron(commands::cron::CronCommands),
}

/// Resolves the server URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default
fn resolve_server_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    // Try reading from config file
    if let Some(dir) = config::get_config_dir_path() {
        let config_path = dir.join(config::CONFIG_FILE_NAME);
        if let Ok(update) = config::config_from_file(Some(config_path)) {
            if let Some(url) = update.server_url {
                return url;
            }
        }
    }

    DEFAULT_SERVER_URL.to_string()
}

/// Formats an error for human-readable stderr output
fn format_error(err: &dyn std::error::Error) -> String {
    let err_string = err.to_string();

    if err_string.contains("error sending request")
        || err_string.contains("connection refused")
        || err_string.contains("Connection refused")
        || err_string.contains("tcp connect error")
    {
        return format!("Could not connect to server. Is assetdesk running?\n  {}", err_string);
    }

    err_string
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let server_url = resolve_server_url(cli.server_url);
    let client = AssetdeskClient::new(server_url, cli.token);
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Login(args) => commands::auth::login(&client, args, &output_config).await,
        Commands::Asset(cmd) => commands::asset::execute(&client, cmd, &output_config).await,
        Commands::Inventory(cmd) => commands::inventory::execute(&client, cmd, &output_config).await,
        Commands::Report(cmd) => commands::report::execute(&client, cmd, &output_config).await,
        Commands::Dashboard => commands::report::dashboard(&client, &output_config).await,
        Commands::Cron(cmd) => commands::cron::execute(&client, cmd, &output_config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", format_error(e.as_ref()));
        process::exit(1);
    }
}
