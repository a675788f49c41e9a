use crate::error::{AuthError, AwswError, Result};
use crate::models::{SsoInstance, SsoToken};
use crate::store;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Bearer token cache, one JSON file per SSO start URL
///
/// Reading never touches the network. Every way a cached token can be
/// unusable (no file, corrupt file, expired) is reported the same way, as
/// [`AuthError::NoActiveSession`].
pub struct TokenCache {
    cache_dir: PathBuf,
}

impl TokenCache {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn cache_key(&self, instance: &SsoInstance) -> String {
        let mut hasher = Sha256::new();
        hasher.update(instance.start_url.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        digest[..16].to_string()
    }

    fn cache_file_path(&self, instance: &SsoInstance) -> PathBuf {
        self.cache_dir
            .join(format!("{}.json", self.cache_key(instance)))
    }

    /// Get the cached token if it is present, readable and unexpired
    pub fn get_token(&self, instance: &SsoInstance) -> Result<SsoToken> {
        let cache_file = self.cache_file_path(instance);

        let contents = match store::read_optional(&cache_file) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                tracing::debug!("No cached token at {}", cache_file.display());
                return Err(AuthError::NoActiveSession.into());
            }
            Err(e) => {
                tracing::debug!("Unreadable token cache: {}", e);
                return Err(AuthError::NoActiveSession.into());
            }
        };

        let token: SsoToken = match serde_json::from_str(&contents) {
            Ok(token) => token,
            Err(e) => {
                tracing::debug!(
                    "Ignoring unparseable token cache {}: {}",
                    cache_file.display(),
                    e
                );
                return Err(AuthError::NoActiveSession.into());
            }
        };

        if token.is_expired() {
            tracing::debug!("Cached token expired at {}", token.expires_at);
            return Err(AuthError::NoActiveSession.into());
        }

        Ok(token)
    }

    /// Save token to cache, replacing any previous token for the instance
    pub fn save_token(&self, instance: &SsoInstance, token: &SsoToken) -> Result<()> {
        let cache_file = self.cache_file_path(instance);
        let json = serde_json::to_string_pretty(token)?;
        store::write_atomic(&cache_file, json.as_bytes())?;
        tracing::debug!("Saved token to {}", cache_file.display());
        Ok(())
    }

    /// Remove token from cache (logout)
    pub fn remove_token(&self, instance: &SsoInstance) -> Result<()> {
        let cache_file = self.cache_file_path(instance);

        match fs::remove_file(&cache_file) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AwswError::Persistence(format!(
                "Failed to remove cache file: {}",
                e
            ))),
        }
    }
}
