//! Contracts for the storage network and chain the editor talks to.
//!
//! Pod and file operations, account login/registration and wallet funding
//! are owned by external services. The editor and the provisioning flow only
//! depend on the traits below; [`local::LocalNetwork`] implements all of
//! them on top of a directory for development and tests.

pub mod local;

use std::fmt;
use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("pod '{0}' does not exist")]
    PodNotFound(String),
    #[error("pod '{0}' already exists")]
    PodExists(String),
    #[error("'{path}' not found in pod '{pod}'")]
    FileNotFound { pod: String, path: String },
    #[error("invalid pod name '{0}'")]
    InvalidPodName(String),
    #[error("invalid path '{0}'")]
    InvalidPath(String),
    #[error("a postage stamp is required to upload data")]
    MissingPostageStamp,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("authentication failed")]
    Authentication,
    #[error("username '{0}' is already registered")]
    UsernameTaken(String),
    #[error("wallet {0} has no funds to pay for registration")]
    Unfunded(String),
    #[error("invalid registration request: {0}")]
    InvalidRequest(&'static str),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("account store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("funding key is not a 32-byte hex string")]
    InvalidKey,
    #[error("invalid address '{0}'")]
    InvalidAddress(String),
    #[error("unknown transaction {0}")]
    UnknownTransaction(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("ledger is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DirectoryListing {
    pub files: Vec<String>,
    pub directories: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Wallet {
    pub address: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationRequest {
    pub username: String,
    pub password: String,
    pub address: String,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxHandle {
    pub id: String,
}

/// Pod and file operations of a logged-in account. Paths are absolute
/// within the pod (`"/budget.json"`).
#[allow(async_fn_in_trait)]
pub trait PodStorage {
    async fn list_pods(&self) -> Result<Vec<String>, StorageError>;
    async fn create_pod(&self, pod: &str) -> Result<(), StorageError>;
    async fn read_directory(&self, pod: &str, path: &str) -> Result<DirectoryListing, StorageError>;
    async fn download_data(&self, pod: &str, path: &str) -> Result<Vec<u8>, StorageError>;
    async fn upload_data(&self, pod: &str, path: &str, data: &[u8]) -> Result<(), StorageError>;
    /// Fails with [`StorageError::FileNotFound`] when nothing is stored at `path`.
    async fn delete(&self, pod: &str, path: &str) -> Result<(), StorageError>;
}

#[allow(async_fn_in_trait)]
pub trait AccountClient {
    type Session: PodStorage;

    async fn login(&self, username: &str, password: &str) -> Result<Self::Session, AccountError>;
    fn create_wallet(&self) -> Wallet;
    fn create_registration_request(
        &self,
        wallet: &Wallet,
        username: &str,
        password: &str,
    ) -> RegistrationRequest;
    async fn register(&self, request: &RegistrationRequest) -> Result<(), AccountError>;
}

#[allow(async_fn_in_trait)]
pub trait FundingLedger {
    async fn transfer(&self, from_key: &str, to: &str, amount_wei: u128)
        -> Result<TxHandle, LedgerError>;
    async fn is_confirmed(&self, tx: &TxHandle) -> Result<bool, LedgerError>;
}
