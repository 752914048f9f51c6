use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use fdpsheet::cli::{Cli, Command};
use fdpsheet::config::{self, NetworkConfig};
use fdpsheet::editor::{Editor, EditorError};
use fdpsheet::network::local::{LocalNetwork, LocalPodSession};
use fdpsheet::state::grid;

#[tokio::main]
async fn main() -> ExitCode {
    let env_file = config::load_dotenv();
    config::init_logging();
    env_file.log();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, EditorError> {
    let network_config = NetworkConfig::from_env();
    let network = LocalNetwork::open(&network_config.data_dir, network_config.postage_stamp_id)
        .map_err(|err| EditorError::Storage(err.into()))?;

    let mut editor = Editor::<LocalPodSession>::new();
    editor.login(&network, &cli.username, &cli.password).await?;

    match cli.command {
        Command::Files => {
            for name in editor.existing_files() {
                println!("{name}");
            }
        }
        Command::Show { name } => {
            editor.open_file(&name).await?;
            if let Some(sheet) = editor.sheet() {
                for (row, col, cell) in sheet.non_empty_cells() {
                    let label = grid::cell_label(row, col).unwrap_or_default();
                    println!("{label}\t{}", cell.value);
                }
            }
        }
        Command::Set { name, cell, value } => {
            let Some((row, col)) = grid::parse_cell_label(&cell) else {
                eprintln!("'{cell}' is not a cell between A1 and Z100");
                return Ok(ExitCode::from(2));
            };
            if editor.existing_files().iter().any(|existing| *existing == name) {
                editor.open_file(&name).await?;
            }
            editor.sheet_mut()?.set_value(row, col, value);
            editor.save_file(&name).await?;
        }
    }

    Ok(ExitCode::SUCCESS)
}
