use thiserror::Error;

use crate::state::sheet::Sheet;

/// Shown after any failed login, whatever the underlying cause.
pub const LOGIN_ERROR_MESSAGE: &str = "Couldn't log in. Check your username and password.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("username and password are required")]
    MissingCredentials,
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Everything the editor knows once a user is logged in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditorContext {
    pub sheet: Sheet,
    pub file_name: Option<String>,
    pub existing_files: Vec<String>,
    pub pod_exists: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadingAction {
    ListFiles,
    OpenFile,
    SaveFile,
}

#[derive(Clone, Debug, PartialEq)]
pub enum SessionState {
    LoggedOut { login_failed: bool },
    Authenticating { username: String },
    Editing(EditorContext),
    Loading {
        context: EditorContext,
        action: LoadingAction,
    },
    SaveFailed(EditorContext),
}

impl Default for SessionState {
    fn default() -> Self {
        Self::LoggedOut {
            login_failed: false,
        }
    }
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoggedOut { .. } => "logged out",
            Self::Authenticating { .. } => "authenticating",
            Self::Editing(_) => "editing",
            Self::Loading { .. } => "loading",
            Self::SaveFailed(_) => "save failed",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Session {
    state: SessionState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Loading { .. })
    }

    pub fn login_error(&self) -> Option<&'static str> {
        match self.state {
            SessionState::LoggedOut { login_failed: true } => Some(LOGIN_ERROR_MESSAGE),
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&EditorContext> {
        match &self.state {
            SessionState::Editing(context)
            | SessionState::SaveFailed(context)
            | SessionState::Loading { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Mutable access for the operation currently holding the loading state.
    pub fn loading_context_mut(&mut self) -> Result<&mut EditorContext, SessionError> {
        let state = self.state.name();
        match &mut self.state {
            SessionState::Loading { context, .. } => Ok(context),
            _ => Err(invalid("update the document", state)),
        }
    }

    /// Editing a cell clears a previous save failure.
    pub fn sheet_mut(&mut self) -> Result<&mut Sheet, SessionError> {
        if let SessionState::SaveFailed(_) = self.state {
            if let SessionState::SaveFailed(context) = std::mem::take(&mut self.state) {
                self.state = SessionState::Editing(context);
            }
        }

        let state = self.state.name();
        match &mut self.state {
            SessionState::Editing(context) => Ok(&mut context.sheet),
            _ => Err(invalid("edit the sheet", state)),
        }
    }

    pub fn begin_login(&mut self, username: &str, password: &str) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::LoggedOut { .. }) {
            return Err(invalid("log in", self.state.name()));
        }

        if username.is_empty() || password.is_empty() {
            self.state = SessionState::LoggedOut {
                login_failed: false,
            };
            return Err(SessionError::MissingCredentials);
        }

        self.state = SessionState::Authenticating {
            username: username.to_string(),
        };
        Ok(())
    }

    pub fn login_succeeded(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Authenticating { .. } => {
                self.state = SessionState::Editing(EditorContext::default());
                Ok(())
            }
            _ => Err(invalid("complete login", self.state.name())),
        }
    }

    pub fn login_failed(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Authenticating { .. } => {
                self.state = SessionState::LoggedOut { login_failed: true };
                Ok(())
            }
            _ => Err(invalid("fail login", self.state.name())),
        }
    }

    pub fn begin_loading(&mut self, action: LoadingAction) -> Result<(), SessionError> {
        match std::mem::take(&mut self.state) {
            SessionState::Editing(context) | SessionState::SaveFailed(context) => {
                self.state = SessionState::Loading { context, action };
                Ok(())
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(invalid("start loading", state))
            }
        }
    }

    /// A failed save lands in `SaveFailed`; every other outcome returns to editing.
    pub fn finish_loading(&mut self, succeeded: bool) -> Result<(), SessionError> {
        match std::mem::take(&mut self.state) {
            SessionState::Loading { context, action } => {
                self.state = if !succeeded && action == LoadingAction::SaveFile {
                    SessionState::SaveFailed(context)
                } else {
                    SessionState::Editing(context)
                };
                Ok(())
            }
            other => {
                let state = other.name();
                self.state = other;
                Err(invalid("finish loading", state))
            }
        }
    }

    pub fn logout(&mut self) {
        self.state = SessionState::default();
    }
}

fn invalid(action: &'static str, state: &'static str) -> SessionError {
    SessionError::InvalidTransition { action, state }
}
