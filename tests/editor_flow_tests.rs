use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io;
use std::time::Duration;

use serde_json::{json, Value};

use fdpsheet::config::ProvisionConfig;
use fdpsheet::editor::{Editor, EditorError, APP_POD_NAME};
use fdpsheet::network::local::{LocalNetwork, LocalPodSession};
use fdpsheet::network::{AccountClient, DirectoryListing, PodStorage, StorageError};
use fdpsheet::provision;
use fdpsheet::state::session::{SessionState, LOGIN_ERROR_MESSAGE};

fn fast_config() -> ProvisionConfig {
    ProvisionConfig {
        confirm_poll_interval: Duration::from_millis(1),
        confirm_timeout: Duration::from_millis(50),
        ..ProvisionConfig::default()
    }
}

async fn network_with_user(dir: &tempfile::TempDir) -> LocalNetwork {
    let network = LocalNetwork::open(dir.path(), Some("stamp-0001".to_string())).unwrap();
    provision::create_account(&network, &network, "alice", "secret", &fast_config())
        .await
        .unwrap();
    network
}

async fn logged_in_editor(network: &LocalNetwork) -> Editor<LocalPodSession> {
    let mut editor = Editor::new();
    editor.login(network, "alice", "secret").await.unwrap();
    editor
}

#[tokio::test]
async fn test_login_failure_reports_fixed_message() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;

    let mut editor = Editor::<LocalPodSession>::new();
    let err = editor.login(&network, "alice", "wrong").await.unwrap_err();

    assert!(matches!(err, EditorError::LoginFailed));
    assert_eq!(err.to_string(), LOGIN_ERROR_MESSAGE);
    assert_eq!(editor.session().login_error(), Some(LOGIN_ERROR_MESSAGE));
    assert!(editor.sheet().is_none());
}

#[tokio::test]
async fn test_login_with_missing_credentials_skips_network() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;

    let mut editor = Editor::<LocalPodSession>::new();
    let err = editor.login(&network, "alice", "").await.unwrap_err();
    assert!(matches!(err, EditorError::Session(_)));
    assert_eq!(editor.session().login_error(), None);
}

#[tokio::test]
async fn test_fresh_account_has_no_pod_and_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;
    let editor = logged_in_editor(&network).await;

    let context = editor.context().unwrap();
    assert!(!context.pod_exists);
    assert!(editor.existing_files().is_empty());
    assert_eq!(editor.current_file(), None);
    assert!(matches!(editor.session().state(), SessionState::Editing(_)));
}

#[tokio::test]
async fn test_save_then_reopen_in_new_session() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;

    let mut editor = logged_in_editor(&network).await;
    editor.sheet_mut().unwrap().set_value(1, 1, "b2");
    editor.save_file("budget").await.unwrap();

    assert!(editor.context().unwrap().pod_exists);
    assert_eq!(editor.current_file(), Some("budget"));
    assert_eq!(editor.existing_files(), ["budget".to_string()]);

    let session = network.login("alice", "secret").await.unwrap();
    let stored = session.download_data(APP_POD_NAME, "/budget.json").await.unwrap();
    let stored: Value = serde_json::from_slice(&stored).unwrap();
    assert_eq!(
        stored,
        json!({"data": [
            [{"value": ""}, {"value": ""}],
            [{"value": ""}, {"value": "b2"}],
        ]})
    );

    let mut reopened = logged_in_editor(&network).await;
    assert_eq!(reopened.existing_files(), ["budget".to_string()]);
    reopened.open_file("budget").await.unwrap();
    assert_eq!(reopened.current_file(), Some("budget"));
    assert_eq!(reopened.sheet().unwrap().value(1, 1), "b2");
    assert_eq!(reopened.sheet().unwrap(), editor.sheet().unwrap());
}

#[tokio::test]
async fn test_save_overwrites_without_duplicating_listing() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;
    let mut editor = logged_in_editor(&network).await;

    editor.sheet_mut().unwrap().set_value(0, 0, "v1");
    editor.save_file("notes").await.unwrap();
    editor.sheet_mut().unwrap().set_value(0, 0, "v2");
    editor.save_file("notes").await.unwrap();

    assert_eq!(editor.existing_files(), ["notes".to_string()]);

    let mut reopened = logged_in_editor(&network).await;
    reopened.open_file("notes").await.unwrap();
    assert_eq!(reopened.sheet().unwrap().value(0, 0), "v2");
}

#[tokio::test]
async fn test_listing_ignores_non_document_files() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;

    let session = network.login("alice", "secret").await.unwrap();
    session.create_pod(APP_POD_NAME).await.unwrap();
    session.upload_data(APP_POD_NAME, "/b.json", br#"{"data":[]}"#).await.unwrap();
    session.upload_data(APP_POD_NAME, "/A.JSON", br#"{"data":[]}"#).await.unwrap();
    session.upload_data(APP_POD_NAME, "/readme.txt", b"hi").await.unwrap();

    let editor = logged_in_editor(&network).await;
    assert!(editor.context().unwrap().pod_exists);
    assert_eq!(editor.existing_files(), ["A".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn test_open_missing_file_returns_to_editing() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;
    let mut editor = logged_in_editor(&network).await;
    editor.sheet_mut().unwrap().set_value(0, 0, "unsaved");

    let err = editor.open_file("missing").await.unwrap_err();
    assert!(matches!(err, EditorError::Storage(StorageError::PodNotFound(_))));
    assert!(matches!(editor.session().state(), SessionState::Editing(_)));
    assert_eq!(editor.sheet().unwrap().value(0, 0), "unsaved");
}

#[tokio::test]
async fn test_open_corrupt_document() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;
    let session = network.login("alice", "secret").await.unwrap();
    session.create_pod(APP_POD_NAME).await.unwrap();
    session.upload_data(APP_POD_NAME, "/broken.json", b"{").await.unwrap();

    let mut editor = logged_in_editor(&network).await;
    let err = editor.open_file("broken").await.unwrap_err();
    assert!(matches!(err, EditorError::Document(_)));
    assert_eq!(editor.current_file(), None);
}

#[tokio::test]
async fn test_save_requires_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;
    let mut editor = logged_in_editor(&network).await;

    assert!(matches!(editor.save_file("").await, Err(EditorError::EmptyFileName)));
    assert!(matches!(editor.session().state(), SessionState::Editing(_)));
}

#[tokio::test]
async fn test_failed_upload_enters_save_failed() {
    let dir = tempfile::tempdir().unwrap();
    network_with_user(&dir).await;
    let unstamped = LocalNetwork::open(dir.path(), None).unwrap();

    let mut editor = logged_in_editor(&unstamped).await;
    let err = editor.save_file("budget").await.unwrap_err();

    assert!(matches!(err, EditorError::Storage(StorageError::MissingPostageStamp)));
    assert!(matches!(editor.session().state(), SessionState::SaveFailed(_)));
    assert!(editor.context().unwrap().pod_exists);
    assert!(editor.existing_files().is_empty());
    assert_eq!(editor.current_file(), None);
}

#[tokio::test]
async fn test_operations_require_login() {
    let mut editor = Editor::<LocalPodSession>::new();
    assert!(matches!(editor.open_file("x").await, Err(EditorError::NotLoggedIn)));
    assert!(matches!(editor.save_file("x").await, Err(EditorError::NotLoggedIn)));
    assert!(matches!(editor.refresh_files().await, Err(EditorError::NotLoggedIn)));
    assert!(editor.sheet_mut().is_err());
}

#[tokio::test]
async fn test_logout_drops_document() {
    let dir = tempfile::tempdir().unwrap();
    let network = network_with_user(&dir).await;
    let mut editor = logged_in_editor(&network).await;
    editor.sheet_mut().unwrap().set_value(0, 0, "x");

    editor.logout();
    assert!(editor.sheet().is_none());
    assert!(matches!(editor.open_file("x").await, Err(EditorError::NotLoggedIn)));
}

/// In-memory pod store whose deletes always fail.
#[derive(Default)]
struct StickyStorage {
    pods: RefCell<BTreeMap<String, BTreeMap<String, Vec<u8>>>>,
    listing_fails: bool,
}

impl PodStorage for StickyStorage {
    async fn list_pods(&self) -> Result<Vec<String>, StorageError> {
        if self.listing_fails {
            return Err(StorageError::Io(io::Error::other("network down")));
        }
        Ok(self.pods.borrow().keys().cloned().collect())
    }

    async fn create_pod(&self, pod: &str) -> Result<(), StorageError> {
        self.pods.borrow_mut().insert(pod.to_string(), BTreeMap::new());
        Ok(())
    }

    async fn read_directory(&self, pod: &str, _path: &str) -> Result<DirectoryListing, StorageError> {
        let pods = self.pods.borrow();
        let files = pods.get(pod).ok_or_else(|| StorageError::PodNotFound(pod.to_string()))?;
        Ok(DirectoryListing {
            files: files.keys().map(|path| path.trim_start_matches('/').to_string()).collect(),
            directories: Vec::new(),
        })
    }

    async fn download_data(&self, pod: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        self.pods
            .borrow()
            .get(pod)
            .and_then(|files| files.get(path))
            .cloned()
            .ok_or_else(|| StorageError::FileNotFound {
                pod: pod.to_string(),
                path: path.to_string(),
            })
    }

    async fn upload_data(&self, pod: &str, path: &str, data: &[u8]) -> Result<(), StorageError> {
        self.pods
            .borrow_mut()
            .get_mut(pod)
            .ok_or_else(|| StorageError::PodNotFound(pod.to_string()))?
            .insert(path.to_string(), data.to_vec());
        Ok(())
    }

    async fn delete(&self, _pod: &str, _path: &str) -> Result<(), StorageError> {
        Err(StorageError::Io(io::Error::other("network down")))
    }
}

#[derive(Default)]
struct StickyAccount {
    listing_fails: bool,
}

impl AccountClient for StickyAccount {
    type Session = StickyStorage;

    async fn login(
        &self,
        _username: &str,
        _password: &str,
    ) -> Result<StickyStorage, fdpsheet::network::AccountError> {
        Ok(StickyStorage {
            listing_fails: self.listing_fails,
            ..StickyStorage::default()
        })
    }

    fn create_wallet(&self) -> fdpsheet::network::Wallet {
        unreachable!("the editor never creates wallets")
    }

    fn create_registration_request(
        &self,
        _wallet: &fdpsheet::network::Wallet,
        _username: &str,
        _password: &str,
    ) -> fdpsheet::network::RegistrationRequest {
        unreachable!("the editor never registers")
    }

    async fn register(
        &self,
        _request: &fdpsheet::network::RegistrationRequest,
    ) -> Result<(), fdpsheet::network::AccountError> {
        unreachable!("the editor never registers")
    }
}

#[tokio::test]
async fn test_save_tolerates_delete_failure() {
    let mut editor = Editor::<StickyStorage>::new();
    editor.login(&StickyAccount::default(), "alice", "secret").await.unwrap();
    editor.sheet_mut().unwrap().set_value(0, 0, "kept");

    editor.save_file("doc").await.unwrap();
    editor.save_file("doc").await.unwrap();

    assert_eq!(editor.existing_files(), ["doc".to_string()]);
    assert!(matches!(editor.session().state(), SessionState::Editing(_)));

    editor.open_file("doc").await.unwrap();
    assert_eq!(editor.sheet().unwrap().value(0, 0), "kept");
}

#[tokio::test]
async fn test_login_succeeds_when_listing_fails() {
    let account = StickyAccount { listing_fails: true };
    let mut editor = Editor::<StickyStorage>::new();

    editor.login(&account, "alice", "secret").await.unwrap();

    assert!(editor.existing_files().is_empty());
    assert!(matches!(editor.session().state(), SessionState::Editing(_)));
    assert!(matches!(editor.refresh_files().await, Err(EditorError::Storage(_))));
}
