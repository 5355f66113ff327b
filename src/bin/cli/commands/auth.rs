use clap::Args;

use crate::client::AssetdeskClient;
use crate::output::{self, OutputConfig};

/// Credentials for signing in
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Account email address
    #[clap(long)]
    pub email: String,
    /// Account password
    #[clap(long, env = "ASSETDESK_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Signs in and prints the session token
pub async fn login(
    client: &AssetdeskClient,
    args: LoginArgs,
    config: &OutputConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client.login(args.email, args.password).await?;
    output::print_login(&response, config);
    Ok(())
}
