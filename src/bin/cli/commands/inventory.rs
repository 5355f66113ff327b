use clap::Subcommand;

use crate::client::AssetdeskClient;
use crate::output::{self, OutputConfig};

/// Inventory commands
#[derive(Subcommand, Debug)]
pub enum InventoryCommands {
    /// List inventory items
    List {
        /// Only items at or below their minimum quantity
        #[clap(long)]
        low_stock: bool,
    },
}

/// Executes an inventory command
pub async fn execute(
    client: &AssetdeskClient,
    cmd: InventoryCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        InventoryCommands::List { low_stock } => {
            let items = client.list_inventory(low_stock).await?;
            output::print_inventory(&items, config);
        }
    }
    Ok(())
}
