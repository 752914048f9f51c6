use clap::Parser;
use tempfile::tempdir;

use fdpsheet::cli::{Cli, Command, CreateAccountArgs};
use fdpsheet::config::{self, EnvFile, NetworkConfig};

#[test]
fn test_credentials_from_env_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join(".env");
    std::fs::write(
        &path,
        "FDPSHEET_USERNAME=alice\nFDPSHEET_PASSWORD=secret\nFDPSHEET_POSTAGE_STAMP_ID=stamp1\n",
    )
    .unwrap();

    assert!(matches!(config::load_dotenv_from(&path), EnvFile::Loaded(loaded) if loaded == path));

    let cli = Cli::try_parse_from(["fdpsheet", "files"]).unwrap();
    assert_eq!(cli.username, "alice");
    assert_eq!(cli.password, "secret");
    assert_eq!(cli.command, Command::Files);
    assert_eq!(
        NetworkConfig::from_env().postage_stamp_id.as_deref(),
        Some("stamp1")
    );
}

#[test]
fn test_missing_env_file() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        config::load_dotenv_from(dir.path().join(".env")),
        EnvFile::NotFound
    ));
}

#[test]
fn test_set_command() {
    let cli = Cli::try_parse_from(["fdpsheet", "-u", "bob", "-p", "pw", "set", "budget", "B3", "42"]).unwrap();
    assert_eq!(cli.username, "bob");
    assert_eq!(
        cli.command,
        Command::Set {
            name: "budget".to_string(),
            cell: "B3".to_string(),
            value: "42".to_string(),
        }
    );
}

#[test]
fn test_create_account_requires_three_arguments() {
    let args = CreateAccountArgs::try_parse_from(["create-account", "alice", "secret", "stamp1"]).unwrap();
    assert_eq!(args.username, "alice");
    assert_eq!(args.postage_stamp_id, "stamp1");

    let err = CreateAccountArgs::try_parse_from(["create-account", "alice", "secret"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
}
