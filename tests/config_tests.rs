use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use fdpsheet::config::{
    ConfigError, NetworkConfig, ProvisionConfig, DEFAULT_BEE_URL, DEFAULT_DATA_DIR,
    DEFAULT_FUNDING_AMOUNT_WEI, DEFAULT_FUNDING_KEY, DEFAULT_RPC_URL,
};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: BTreeMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn test_network_defaults() {
    let config = NetworkConfig::from_lookup(lookup(&[]));
    assert_eq!(config.bee_url, DEFAULT_BEE_URL);
    assert_eq!(config.postage_stamp_id, None);
    assert_eq!(config.data_dir, PathBuf::from(DEFAULT_DATA_DIR));
}

#[test]
fn test_network_overrides() {
    let config = NetworkConfig::from_lookup(lookup(&[
        ("FDPSHEET_BEE_URL", "http://bee:1633"),
        ("FDPSHEET_POSTAGE_STAMP_ID", "abc123"),
        ("FDPSHEET_DATA_DIR", "/var/lib/fdpsheet"),
    ]));
    assert_eq!(config.bee_url, "http://bee:1633");
    assert_eq!(config.postage_stamp_id.as_deref(), Some("abc123"));
    assert_eq!(config.data_dir, PathBuf::from("/var/lib/fdpsheet"));
}

#[test]
fn test_empty_postage_stamp_is_unset() {
    let config = NetworkConfig::from_lookup(lookup(&[("FDPSHEET_POSTAGE_STAMP_ID", "")]));
    assert_eq!(config.postage_stamp_id, None);
}

#[test]
fn test_provision_defaults() {
    let config = ProvisionConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, ProvisionConfig::default());
    assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
    assert_eq!(config.funding_key, DEFAULT_FUNDING_KEY);
    assert_eq!(config.funding_amount_wei, DEFAULT_FUNDING_AMOUNT_WEI);
}

#[test]
fn test_provision_overrides() {
    let config = ProvisionConfig::from_lookup(lookup(&[
        ("FDPSHEET_RPC_URL", "http://chain:8545"),
        ("FDPSHEET_FUNDING_KEY", "0xabc"),
        ("FDPSHEET_CONFIRM_TIMEOUT_SECS", "5"),
        ("FDPSHEET_CONFIRM_POLL_MILLIS", "20"),
    ]))
    .unwrap();
    assert_eq!(config.rpc_url, "http://chain:8545");
    assert_eq!(config.funding_key, "0xabc");
    assert_eq!(config.confirm_timeout, Duration::from_secs(5));
    assert_eq!(config.confirm_poll_interval, Duration::from_millis(20));
}

#[test]
fn test_provision_rejects_bad_numbers() {
    for value in ["0", "-1", "soon"] {
        let err = ProvisionConfig::from_lookup(lookup(&[("FDPSHEET_CONFIRM_TIMEOUT_SECS", value)]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                name: "FDPSHEET_CONFIRM_TIMEOUT_SECS",
                value: value.to_string(),
            }
        );
    }
}
