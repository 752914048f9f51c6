use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::ProvisionConfig;
use crate::network::{AccountClient, AccountError, FundingLedger, LedgerError, TxHandle, Wallet};

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("account error: {0}")]
    Account(#[from] AccountError),
    #[error("funding error: {0}")]
    Ledger(#[from] LedgerError),
    #[error("funding transaction {tx} was not confirmed within {timeout:?}")]
    ConfirmationTimeout { tx: String, timeout: Duration },
}

/// Creates a wallet, funds it from `config.funding_key`, waits for the
/// transfer to confirm and registers `username` against it.
pub async fn create_account<A, L>(
    account: &A,
    ledger: &L,
    username: &str,
    password: &str,
    config: &ProvisionConfig,
) -> Result<Wallet, ProvisionError>
where
    A: AccountClient,
    L: FundingLedger,
{
    let wallet = account.create_wallet();
    info!(address = %wallet.address, "created wallet");

    let tx = ledger
        .transfer(&config.funding_key, &wallet.address, config.funding_amount_wei)
        .await?;
    info!(tx = %tx.id, amount_wei = config.funding_amount_wei, "submitted funding transfer");

    wait_for_confirmation(ledger, &tx, config.confirm_poll_interval, config.confirm_timeout).await?;

    let request = account.create_registration_request(&wallet, username, password);
    account.register(&request).await?;
    info!(username, address = %wallet.address, "registered account");

    Ok(wallet)
}

pub async fn wait_for_confirmation<L: FundingLedger>(
    ledger: &L,
    tx: &TxHandle,
    poll_interval: Duration,
    timeout: Duration,
) -> Result<(), ProvisionError> {
    let deadline = Instant::now() + timeout;
    loop {
        if ledger.is_confirmed(tx).await? {
            debug!(tx = %tx.id, "transfer confirmed");
            return Ok(());
        }
        if Instant::now() >= deadline {
            return Err(ProvisionError::ConfirmationTimeout {
                tx: tx.id.clone(),
                timeout,
            });
        }
        sleep(poll_interval).await;
    }
}
