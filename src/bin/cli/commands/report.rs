use clap::Subcommand;

use crate::client::AssetdeskClient;
use crate::output::{self, OutputConfig};

/// Report commands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Current value of every asset
    Depreciation,
    /// Open checkouts past their expected return
    Overdue,
}

/// Executes a report command
pub async fn execute(
    client: &AssetdeskClient,
    cmd: ReportCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ReportCommands::Depreciation => {
            let report = client.depreciation_report().await?;
            output::print_depreciation(&report, config);
        }
        ReportCommands::Overdue => {
            let rows = client.overdue_checkouts().await?;
            output::print_overdue(&rows, config);
        }
    }
    Ok(())
}

/// Prints the dashboard
pub async fn dashboard(
    client: &AssetdeskClient,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = client.dashboard().await?;
    output::print_dashboard(&dashboard, config);
    Ok(())
}
