//! Persisted login session and the credentials derived from it.
//!
//! The session file is the only client state that outlives a process:
//!
//! ```text
//! <state dir>/
//!   session.json        # token, display name, email, login time
//!   session.json.lock   # held while reading or writing
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

pub const SESSION_FILE: &str = "session.json";

/// Bearer token attached to every authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token: String,
}

impl Credentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

// Keep tokens out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials").field("token", &"***").finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub display_name: String,
    #[serde(default)]
    pub email: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(token: impl Into<String>, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            display_name: display_name.into(),
            email: email.into(),
            logged_in_at: Utc::now(),
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.token.clone())
    }
}

/// Reads and writes `session.json` in one state directory.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        Self {
            path: state_dir.as_ref().join(SESSION_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Option<Session>> {
        let Some(data) = lock::read_locked(&self.path, DEFAULT_LOCK_TIMEOUT_MS)? else {
            return Ok(None);
        };
        let session: Session = serde_json::from_slice(&data)?;
        if session.token.trim().is_empty() {
            tracing::warn!(path = %self.path.display(), "ignoring session without a token");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// The stored session, or `NotAuthenticated`.
    pub fn require(&self) -> Result<Session> {
        self.load()?.ok_or(Error::NotAuthenticated)
    }

    pub fn save(&self, session: &Session) -> Result<()> {
        let json = serde_json::to_string_pretty(session)?;
        lock::write_atomic_locked(&self.path, json.as_bytes(), DEFAULT_LOCK_TIMEOUT_MS)?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    /// Delete the session file; returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        lock::remove_locked(&self.path, DEFAULT_LOCK_TIMEOUT_MS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        assert!(store.load().unwrap().is_none());
        assert!(matches!(store.require(), Err(Error::NotAuthenticated)));

        let session = Session::new("tok-1", "Ada", "ada@example.com");
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session.clone()));
        assert_eq!(store.require().unwrap().credentials().token(), "tok-1");

        assert!(store.clear().unwrap());
        assert!(store.load().unwrap().is_none());
        assert!(!store.clear().unwrap());
    }

    #[test]
    fn blank_token_counts_as_logged_out() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&Session::new("  ", "Ada", "")).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn debug_hides_token() {
        let rendered = format!("{:?}", Credentials::new("secret"));
        assert!(!rendered.contains("secret"));
    }
}
