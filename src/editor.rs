use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::io::document_io::{self, DocumentError};
use crate::network::{AccountClient, PodStorage, StorageError};
use crate::state::session::{
    EditorContext, LoadingAction, Session, SessionError, LOGIN_ERROR_MESSAGE,
};
use crate::state::sheet::Sheet;

/// Pod holding every document the editor saves.
pub const APP_POD_NAME: &str = "fdp-spreadsheet-dapp-pod";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("{}", LOGIN_ERROR_MESSAGE)]
    LoginFailed,
    #[error("not logged in")]
    NotLoggedIn,
    #[error("file name is required")]
    EmptyFileName,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Login, file listing, load and save for one user, driving [`Session`].
#[derive(Debug)]
pub struct Editor<S> {
    session: Session,
    storage: Option<S>,
}

impl<S> Default for Editor<S> {
    fn default() -> Self {
        Self {
            session: Session::new(),
            storage: None,
        }
    }
}

impl<S: PodStorage> Editor<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn context(&self) -> Option<&EditorContext> {
        self.session.context()
    }

    pub fn sheet(&self) -> Option<&Sheet> {
        self.context().map(|context| &context.sheet)
    }

    pub fn sheet_mut(&mut self) -> Result<&mut Sheet, EditorError> {
        Ok(self.session.sheet_mut()?)
    }

    pub fn current_file(&self) -> Option<&str> {
        self.context()?.file_name.as_deref()
    }

    pub fn existing_files(&self) -> &[String] {
        self.context()
            .map(|context| context.existing_files.as_slice())
            .unwrap_or(&[])
    }

    /// Authenticates and lists the documents already saved. Any account
    /// failure is reported as [`EditorError::LoginFailed`].
    pub async fn login<A>(&mut self, account: &A, username: &str, password: &str) -> Result<(), EditorError>
    where
        A: AccountClient<Session = S>,
    {
        self.session.begin_login(username, password)?;

        match account.login(username, password).await {
            Ok(storage) => {
                self.session.login_succeeded()?;
                self.storage = Some(storage);
                info!(username, "logged in");
            }
            Err(err) => {
                error!(%err, username, "login failed");
                self.session.login_failed()?;
                return Err(EditorError::LoginFailed);
            }
        }

        if let Err(err) = self.refresh_files().await {
            debug!(%err, "continuing without a file listing");
        }
        Ok(())
    }

    pub async fn refresh_files(&mut self) -> Result<(), EditorError> {
        let storage = self.storage.as_ref().ok_or(EditorError::NotLoggedIn)?;
        self.session.begin_loading(LoadingAction::ListFiles)?;

        let result = list_documents(storage).await;
        match result {
            Ok(listing) => {
                let context = self.session.loading_context_mut()?;
                context.pod_exists = listing.is_some();
                if let Some(files) = listing {
                    context.existing_files = files;
                }
                self.session.finish_loading(true)?;
                Ok(())
            }
            Err(err) => {
                error!(%err, "failed to list documents");
                self.session.finish_loading(false)?;
                Err(err)
            }
        }
    }

    pub async fn open_file(&mut self, file_name: &str) -> Result<(), EditorError> {
        let storage = self.storage.as_ref().ok_or(EditorError::NotLoggedIn)?;
        self.session.begin_loading(LoadingAction::OpenFile)?;

        let result = download_document(storage, file_name).await;
        match result {
            Ok(sheet) => {
                let context = self.session.loading_context_mut()?;
                context.sheet = sheet;
                context.file_name = Some(file_name.to_string());
                self.session.finish_loading(true)?;
                info!(file_name, "opened document");
                Ok(())
            }
            Err(err) => {
                error!(%err, file_name, "failed to open document");
                self.session.finish_loading(false)?;
                Err(err)
            }
        }
    }

    /// Stores the trimmed sheet as `/<file_name>.json`, replacing any previous
    /// version. A failure leaves the session in `SaveFailed`.
    pub async fn save_file(&mut self, file_name: &str) -> Result<(), EditorError> {
        if file_name.is_empty() {
            return Err(EditorError::EmptyFileName);
        }
        let storage = self.storage.as_ref().ok_or(EditorError::NotLoggedIn)?;
        self.session.begin_loading(LoadingAction::SaveFile)?;

        let context = self.session.loading_context_mut()?;
        let result = upload_document(storage, &mut context.pod_exists, &context.sheet, file_name).await;
        match result {
            Ok(()) => {
                context.file_name = Some(file_name.to_string());
                if !context.existing_files.iter().any(|name| name == file_name) {
                    context.existing_files.push(file_name.to_string());
                }
                self.session.finish_loading(true)?;
                info!(file_name, "saved document");
                Ok(())
            }
            Err(err) => {
                error!(%err, file_name, "failed to save document");
                self.session.finish_loading(false)?;
                Err(err)
            }
        }
    }

    pub fn logout(&mut self) {
        self.storage = None;
        self.session.logout();
    }
}

/// `None` when the application pod has not been created yet.
async fn list_documents<S: PodStorage>(storage: &S) -> Result<Option<Vec<String>>, EditorError> {
    let pods = storage.list_pods().await?;
    if !pods.iter().any(|pod| pod == APP_POD_NAME) {
        return Ok(None);
    }

    let listing = storage.read_directory(APP_POD_NAME, "/").await?;
    Ok(Some(
        listing
            .files
            .iter()
            .filter_map(|entry| document_io::file_name_from_entry(entry))
            .map(str::to_string)
            .collect(),
    ))
}

async fn download_document<S: PodStorage>(storage: &S, file_name: &str) -> Result<Sheet, EditorError> {
    let bytes = storage
        .download_data(APP_POD_NAME, &document_io::document_path(file_name))
        .await?;
    Ok(document_io::decode_document(&bytes)?)
}

async fn upload_document<S: PodStorage>(
    storage: &S,
    pod_exists: &mut bool,
    sheet: &Sheet,
    file_name: &str,
) -> Result<(), EditorError> {
    let content = document_io::encode_document(sheet)?;

    if !*pod_exists {
        storage.create_pod(APP_POD_NAME).await?;
        *pod_exists = true;
    }

    let path = document_io::document_path(file_name);
    if let Err(err) = storage.delete(APP_POD_NAME, &path).await {
        warn!(%err, path = %path, "no previous document removed");
    }

    storage.upload_data(APP_POD_NAME, &path, &content).await?;
    Ok(())
}
