use crate::error::Result;
use crate::models::Account;
use crate::select::names_match;
use crate::store;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Last successful account listing, kept for quick lookups by other commands.
///
/// Advisory only: it may be stale and is never used to authorize anything.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CachedAccounts {
    pub updated_at: DateTime<Utc>,
    pub accounts: Vec<Account>,
}

pub struct AccountCache {
    path: PathBuf,
}

impl AccountCache {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn save(&self, accounts: &[Account]) -> Result<()> {
        let cached = CachedAccounts {
            updated_at: Utc::now(),
            accounts: accounts.to_vec(),
        };
        let json = serde_json::to_string_pretty(&cached)?;
        store::write_atomic(&self.path, json.as_bytes())
    }

    /// Missing or unreadable cache yields `None`
    pub fn load(&self) -> Option<CachedAccounts> {
        let contents = match store::read_optional(&self.path) {
            Ok(contents) => contents?,
            Err(e) => {
                tracing::debug!("Account cache unreadable: {}", e);
                return None;
            }
        };

        serde_json::from_str(&contents)
            .map_err(|e| tracing::debug!("Ignoring corrupt account cache: {}", e))
            .ok()
    }

    /// Case-insensitive lookup by display name
    pub fn find_by_name(&self, name: &str) -> Option<Account> {
        self.load()?
            .accounts
            .into_iter()
            .find(|a| names_match(&a.display_name, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = AccountCache::new(dir.path().join("accounts.json"));

        assert!(cache.load().is_none());

        let accounts = vec![Account::new("111", "Dev"), Account::new("222", "Prod")];
        cache.save(&accounts).unwrap();

        let loaded = cache.load().unwrap();
        assert_eq!(loaded.accounts, accounts);
        assert_eq!(cache.find_by_name("prod"), Some(Account::new("222", "Prod")));
        assert_eq!(cache.find_by_name("stage"), None);
    }

    #[test]
    fn test_corrupt_cache_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "[").unwrap();

        assert!(AccountCache::new(path).load().is_none());
    }
}
