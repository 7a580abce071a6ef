use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::AppError;
use crate::models::User;

/// The one record kept on disk between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user: User,
    /// Cookie header that resumes the server-side session.
    #[serde(default)]
    pub cookie: Option<String>,
}

/// Holds the authenticated user. Read-only after login until [`clear`](Self::clear).
pub struct SessionStore {
    path: PathBuf,
    current: Option<SessionRecord>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the persisted record. A missing or unreadable file means logged out.
    pub fn init(&mut self) -> Option<&SessionRecord> {
        self.current = match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<SessionRecord>(&text) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read session file {}: {}", self.path.display(), e);
                None
            }
        };
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&SessionRecord> {
        self.current.as_ref()
    }

    pub fn user(&self) -> Option<&User> {
        self.current.as_ref().map(|r| &r.user)
    }

    pub fn set(&mut self, record: SessionRecord) -> Result<(), AppError> {
        let text = serde_json::to_string_pretty(&record)
            .map_err(|e| AppError::Session(format!("Failed to encode session: {}", e)))?;
        fs::write(&self.path, text)
            .map_err(|e| AppError::Session(format!("Failed to write {}: {}", self.path.display(), e)))?;
        debug!("Session saved for {}", record.user.username);
        self.current = Some(record);
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        self.current = None;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Session(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
