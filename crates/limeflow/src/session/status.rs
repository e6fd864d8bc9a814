#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Welcome,
    Edit,
    Present,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Loading,
    Success,
    Error,
    Synced,
}

/// Outcome of the most recent remote call. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: SyncState,
    pub message: String,
}

impl SyncStatus {
    pub fn idle() -> Self {
        Self::new(SyncState::Idle, "")
    }

    pub fn loading(message: impl Into<String>) -> Self {
        Self::new(SyncState::Loading, message)
    }

    pub fn synced(message: impl Into<String>) -> Self {
        Self::new(SyncState::Synced, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(SyncState::Error, message)
    }

    fn new(state: SyncState, message: impl Into<String>) -> Self {
        Self {
            state,
            message: message.into(),
        }
    }
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self::idle()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub endpoint: String,
    pub mode: Mode,
    /// Set from the launch URL and fixed for the life of the session.
    pub read_only: bool,
}

impl SessionConfig {
    pub fn has_endpoint(&self) -> bool {
        !self.endpoint.trim().is_empty()
    }
}

/// Terminal states the surfaces cannot recover from without a reload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FatalError {
    #[error("the presentation link failed to load: {0}")]
    LinkFailed(String),
}
