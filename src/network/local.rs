use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::io::{atomic_write, TEMP_FILE_PREFIX};
use crate::network::{
    AccountClient, AccountError, DirectoryListing, FundingLedger, LedgerError, PodStorage,
    RegistrationRequest, StorageError, TxHandle, Wallet,
};

const ACCOUNTS_FILE: &str = "accounts.json";
const LEDGER_FILE: &str = "ledger.json";
const PODS_DIR: &str = "pods";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct AccountRecord {
    address: String,
    password_hash: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    balances: BTreeMap<String, u128>,
    #[serde(default)]
    transactions: BTreeMap<String, TransferRecord>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransferRecord {
    to: String,
    amount_wei: u128,
}

/// Directory-backed stand-in for the storage network, its account registry
/// and the funding chain.
///
/// Layout under `root`:
/// - `accounts.json`: username -> wallet address and Argon2 password hash
/// - `ledger.json`: wallet balances and funding transfers
/// - `pods/<username>/<pod>/...`: pod contents
#[derive(Debug)]
pub struct LocalNetwork {
    root: PathBuf,
    postage_stamp_id: Option<String>,
    store_lock: Mutex<()>,
}

impl LocalNetwork {
    pub fn open(root: impl AsRef<Path>, postage_stamp_id: Option<String>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join(PODS_DIR))?;
        Ok(Self {
            root,
            postage_stamp_id,
            store_lock: Mutex::new(()),
        })
    }

    pub fn balance(&self, address: &str) -> Result<u128, LedgerError> {
        let ledger: LedgerFile = read_store::<_, LedgerError>(&self.root.join(LEDGER_FILE))?;
        Ok(ledger.balances.get(address).copied().unwrap_or(0))
    }

    fn user_dir(&self, username: &str) -> PathBuf {
        self.root.join(PODS_DIR).join(username)
    }
}

impl AccountClient for LocalNetwork {
    type Session = LocalPodSession;

    async fn login(&self, username: &str, password: &str) -> Result<LocalPodSession, AccountError> {
        let accounts: BTreeMap<String, AccountRecord> =
            read_store::<_, AccountError>(&self.root.join(ACCOUNTS_FILE))?;
        let record = accounts.get(username).ok_or(AccountError::Authentication)?;
        if !verify_password(password, &record.password_hash) {
            return Err(AccountError::Authentication);
        }

        debug!(username, address = %record.address, "local login");
        Ok(LocalPodSession {
            user_dir: self.user_dir(username),
            postage_stamp_id: self.postage_stamp_id.clone(),
        })
    }

    fn create_wallet(&self) -> Wallet {
        Wallet {
            address: random_address(),
        }
    }

    fn create_registration_request(
        &self,
        wallet: &Wallet,
        username: &str,
        password: &str,
    ) -> RegistrationRequest {
        RegistrationRequest {
            username: username.to_string(),
            password: password.to_string(),
            address: wallet.address.clone(),
        }
    }

    async fn register(&self, request: &RegistrationRequest) -> Result<(), AccountError> {
        if !is_valid_segment(&request.username) {
            return Err(AccountError::InvalidRequest("username must be a plain name"));
        }
        if request.password.is_empty() {
            return Err(AccountError::InvalidRequest("password is required"));
        }

        let _guard = self.store_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let accounts_path = self.root.join(ACCOUNTS_FILE);
        let mut accounts: BTreeMap<String, AccountRecord> =
            read_store::<_, AccountError>(&accounts_path)?;
        if accounts.contains_key(&request.username) {
            return Err(AccountError::UsernameTaken(request.username.clone()));
        }

        let ledger: LedgerFile = read_store::<_, AccountError>(&self.root.join(LEDGER_FILE))?;
        if ledger.balances.get(&request.address).copied().unwrap_or(0) == 0 {
            return Err(AccountError::Unfunded(request.address.clone()));
        }

        let password_hash = hash_password(&request.password)?;
        accounts.insert(
            request.username.clone(),
            AccountRecord {
                address: request.address.clone(),
                password_hash,
            },
        );
        write_store::<_, AccountError>(&accounts_path, &accounts)?;
        fs::create_dir_all(self.user_dir(&request.username))?;

        info!(username = %request.username, address = %request.address, "registered account");
        Ok(())
    }
}

impl FundingLedger for LocalNetwork {
    async fn transfer(
        &self,
        from_key: &str,
        to: &str,
        amount_wei: u128,
    ) -> Result<TxHandle, LedgerError> {
        if !is_prefixed_hex(from_key, 64) {
            return Err(LedgerError::InvalidKey);
        }
        if !is_prefixed_hex(to, 40) {
            return Err(LedgerError::InvalidAddress(to.to_string()));
        }

        let _guard = self.store_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let ledger_path = self.root.join(LEDGER_FILE);
        let mut ledger: LedgerFile = read_store::<_, LedgerError>(&ledger_path)?;

        let id = format!("0x{}", Uuid::new_v4().simple());
        let balance = ledger.balances.entry(to.to_string()).or_insert(0);
        *balance = balance.saturating_add(amount_wei);
        ledger.transactions.insert(
            id.clone(),
            TransferRecord {
                to: to.to_string(),
                amount_wei,
            },
        );
        write_store::<_, LedgerError>(&ledger_path, &ledger)?;

        debug!(tx = %id, to, amount_wei, "recorded funding transfer");
        Ok(TxHandle { id })
    }

    async fn is_confirmed(&self, tx: &TxHandle) -> Result<bool, LedgerError> {
        let ledger: LedgerFile = read_store::<_, LedgerError>(&self.root.join(LEDGER_FILE))?;
        if ledger.transactions.contains_key(&tx.id) {
            Ok(true)
        } else {
            Err(LedgerError::UnknownTransaction(tx.id.clone()))
        }
    }
}

/// Pods of one logged-in user.
#[derive(Clone, Debug)]
pub struct LocalPodSession {
    user_dir: PathBuf,
    postage_stamp_id: Option<String>,
}

impl LocalPodSession {
    fn pod_dir(&self, pod: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_segment(pod) {
            return Err(StorageError::InvalidPodName(pod.to_string()));
        }
        Ok(self.user_dir.join(pod))
    }

    fn existing_pod_dir(&self, pod: &str) -> Result<PathBuf, StorageError> {
        let dir = self.pod_dir(pod)?;
        if !dir.is_dir() {
            return Err(StorageError::PodNotFound(pod.to_string()));
        }
        Ok(dir)
    }
}

impl PodStorage for LocalPodSession {
    async fn list_pods(&self) -> Result<Vec<String>, StorageError> {
        let entries = match fs::read_dir(&self.user_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut pods = Vec::new();
        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                pods.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        pods.sort();
        Ok(pods)
    }

    async fn create_pod(&self, pod: &str) -> Result<(), StorageError> {
        let dir = self.pod_dir(pod)?;
        if dir.exists() {
            return Err(StorageError::PodExists(pod.to_string()));
        }
        fs::create_dir_all(dir)?;
        info!(pod, "created pod");
        Ok(())
    }

    async fn read_directory(&self, pod: &str, path: &str) -> Result<DirectoryListing, StorageError> {
        let dir = resolve(&self.existing_pod_dir(pod)?, path)?;
        if !dir.is_dir() {
            return Err(not_found(pod, path));
        }

        let mut listing = DirectoryListing::default();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(TEMP_FILE_PREFIX) {
                continue;
            }
            if entry.file_type()?.is_dir() {
                listing.directories.push(name);
            } else {
                listing.files.push(name);
            }
        }
        listing.files.sort();
        listing.directories.sort();
        Ok(listing)
    }

    async fn download_data(&self, pod: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let file = resolve(&self.existing_pod_dir(pod)?, path)?;
        if !file.is_file() {
            return Err(not_found(pod, path));
        }
        Ok(fs::read(file)?)
    }

    async fn upload_data(&self, pod: &str, path: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.postage_stamp_id.as_deref().map_or(true, str::is_empty) {
            return Err(StorageError::MissingPostageStamp);
        }

        let pod_dir = self.existing_pod_dir(pod)?;
        let file = resolve(&pod_dir, path)?;
        if file == pod_dir {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&file, data)?;
        debug!(pod, path, bytes = data.len(), "uploaded data");
        Ok(())
    }

    async fn delete(&self, pod: &str, path: &str) -> Result<(), StorageError> {
        let file = resolve(&self.existing_pod_dir(pod)?, path)?;
        if !file.is_file() {
            return Err(not_found(pod, path));
        }
        fs::remove_file(file)?;
        debug!(pod, path, "deleted file");
        Ok(())
    }
}

fn not_found(pod: &str, path: &str) -> StorageError {
    StorageError::FileNotFound {
        pod: pod.to_string(),
        path: path.to_string(),
    }
}

/// Maps an absolute pod path onto the pod directory, rejecting traversal.
fn resolve(pod_dir: &Path, path: &str) -> Result<PathBuf, StorageError> {
    let relative = path
        .strip_prefix('/')
        .ok_or_else(|| StorageError::InvalidPath(path.to_string()))?;

    let mut resolved = pod_dir.to_path_buf();
    for segment in relative.split('/').filter(|segment| !segment.is_empty()) {
        if !is_valid_segment(segment) {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        resolved.push(segment);
    }
    Ok(resolved)
}

fn is_valid_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\'])
}

fn is_prefixed_hex(value: &str, digits: usize) -> bool {
    value
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == digits && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

fn random_address() -> String {
    let high = Uuid::new_v4().simple().to_string();
    let low = Uuid::new_v4().simple().to_string();
    format!("0x{high}{}", &low[..8])
}

fn hash_password(password: &str) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AccountError::Hashing(err.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

fn read_store<T, E>(path: &Path) -> Result<T, E>
where
    T: DeserializeOwned + Default,
    E: From<io::Error> + From<serde_json::Error>,
{
    match fs::read_to_string(path) {
        Ok(content) => Ok(serde_json::from_str(&content)?),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(T::default()),
        Err(err) => Err(err.into()),
    }
}

fn write_store<T, E>(path: &Path, value: &T) -> Result<(), E>
where
    T: Serialize,
    E: From<io::Error> + From<serde_json::Error>,
{
    let content = serde_json::to_vec_pretty(value)?;
    atomic_write(path, &content)?;
    Ok(())
}
