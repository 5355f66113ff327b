use assetdesk::models::AssetStatus;
use clap::Subcommand;

use crate::client::AssetdeskClient;
use crate::output::{self, OutputConfig};

/// Asset commands
#[derive(Subcommand, Debug)]
pub enum AssetCommands {
    /// List assets, newest first
    List {
        /// Only assets in this status (available, checked_out, in_maintenance, retired)
        #[clap(long)]
        status: Option<AssetStatus>,
        /// Match against name or serial number
        #[clap(long)]
        search: Option<String>,
    },
    /// Show a specific asset
    Show {
        /// The asset ID
        id: String,
    },
}

/// Executes an asset command
pub async fn execute(
    client: &AssetdeskClient,
    cmd: AssetCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        AssetCommands::List { status, search } => {
            let assets = client.list_assets(status, search.as_deref()).await?;
            output::print_assets(&assets, config);
        }
        AssetCommands::Show { id } => {
            let asset = client.get_asset(&id).await?;
            output::print_asset(&asset, config);
        }
    }
    Ok(())
}
