// Per-shell session bookkeeping
mod process;

pub use process::{current_owner_pid, LivenessCheck, OsLivenessCheck};

use crate::error::{AwswError, Result};
use crate::models::Session;
use crate::store::{self, FileLock};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::PathBuf;

type SessionMap = BTreeMap<u32, Session>;

/// Which shell process uses which profile, shared by every invocation.
///
/// Stored as one JSON object keyed by owner pid. Each mutation is a locked
/// read-modify-write that replaces the whole file.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    fn load(&self) -> Result<SessionMap> {
        let Some(contents) = store::read_optional(&self.path)? else {
            return Ok(SessionMap::new());
        };
        if contents.trim().is_empty() {
            return Ok(SessionMap::new());
        }

        match serde_json::from_str(&contents) {
            Ok(sessions) => Ok(sessions),
            Err(e) => {
                tracing::warn!(
                    "Ignoring unreadable session store {}: {}",
                    self.path.display(),
                    e
                );
                Ok(SessionMap::new())
            }
        }
    }

    fn persist(&self, sessions: &SessionMap) -> Result<()> {
        let json = serde_json::to_string_pretty(sessions)?;
        store::write_atomic(&self.path, json.as_bytes())
    }

    /// Record the profile for `owner_pid`, replacing any previous session
    pub fn save_session(
        &self,
        owner_pid: u32,
        profile_name: &str,
        account_id: &str,
        account_name: &str,
        role_name: &str,
    ) -> Result<Session> {
        let session = Session {
            owner_pid,
            profile_name: profile_name.to_string(),
            account_id: account_id.to_string(),
            account_name: account_name.to_string(),
            role_name: role_name.to_string(),
            created_at: Utc::now(),
        };

        let _lock = FileLock::acquire(&self.path)?;
        let mut sessions = self.load()?;
        if let Some(previous) = sessions.insert(owner_pid, session.clone()) {
            tracing::debug!(
                "Replacing session {} for shell {}",
                previous.profile_name,
                owner_pid
            );
        }
        self.persist(&sessions)?;

        tracing::info!("Bound shell {} to profile {}", owner_pid, profile_name);
        Ok(session)
    }

    pub fn get_session(&self, owner_pid: u32) -> Result<Session> {
        self.load()?
            .remove(&owner_pid)
            .ok_or(AwswError::SessionNotFound(owner_pid))
    }

    /// All sessions ordered by owner pid
    pub fn list_sessions(&self) -> Result<Vec<Session>> {
        Ok(self.load()?.into_values().collect())
    }

    /// Returns whether a session was removed
    pub fn remove_session(&self, owner_pid: u32) -> Result<bool> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut sessions = self.load()?;
        if sessions.remove(&owner_pid).is_none() {
            return Ok(false);
        }
        self.persist(&sessions)?;
        Ok(true)
    }

    /// Drop sessions whose owner process has exited
    pub fn cleanup_stale(&self) -> Result<usize> {
        self.cleanup_stale_with(&OsLivenessCheck)
    }

    pub fn cleanup_stale_with(&self, check: &dyn LivenessCheck) -> Result<usize> {
        let _lock = FileLock::acquire(&self.path)?;
        let mut sessions = self.load()?;

        let before = sessions.len();
        sessions.retain(|pid, session| {
            let alive = check.is_alive(*pid);
            if !alive {
                tracing::debug!(
                    "Removing stale session {} of exited shell {}",
                    session.profile_name,
                    pid
                );
            }
            alive
        });
        let removed = before - sessions.len();

        if removed > 0 {
            self.persist(&sessions)?;
            tracing::info!("Removed {} stale sessions", removed);
        }
        Ok(removed)
    }
}
