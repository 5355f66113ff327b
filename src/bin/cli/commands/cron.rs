use clap::Subcommand;

use crate::client::AssetdeskClient;
use crate::output::{self, OutputConfig};

/// Sweep commands
#[derive(Subcommand, Debug)]
pub enum CronCommands {
    /// Run the notification sweep once on the server
    Run,
}

/// Executes a cron command
pub async fn execute(
    client: &AssetdeskClient,
    cmd: CronCommands,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        CronCommands::Run => {
            let report = client.run_cron().await?;
            output::print_sweep(&report, config);
        }
    }
    Ok(())
}
