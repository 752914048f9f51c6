use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use fdpsheet::cli::CreateAccountArgs;
use fdpsheet::config::{self, NetworkConfig, ProvisionConfig};
use fdpsheet::network::local::LocalNetwork;
use fdpsheet::provision;

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = config::load_dotenv();
    config::init_logging();
    env_file.log();
    let args = CreateAccountArgs::parse();

    let network_config = NetworkConfig::from_env();
    let provision_config = match ProvisionConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        bee_url = %network_config.bee_url,
        rpc_url = %provision_config.rpc_url,
        data_dir = %network_config.data_dir.display(),
        "provisioning account"
    );

    let network = match LocalNetwork::open(&network_config.data_dir, Some(args.postage_stamp_id)) {
        Ok(network) => network,
        Err(err) => {
            error!(%err, "failed to open network directory");
            return ExitCode::FAILURE;
        }
    };

    match provision::create_account(
        &network,
        &network,
        &args.username,
        &args.password,
        &provision_config,
    )
    .await
    {
        Ok(_) => {
            info!("Account created");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(%err, "account creation failed");
            ExitCode::FAILURE
        }
    }
}
