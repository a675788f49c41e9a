// AWS SSO OIDC authentication module
mod oidc;
mod token_cache;

pub use oidc::OidcClient;
pub use token_cache::TokenCache;

use crate::error::Result;
use crate::models::{SsoInstance, SsoToken};
use async_trait::async_trait;

/// Source of bearer tokens for the login workflow
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Read the cached token; never performs network I/O
    fn cached_token(&self, instance: &SsoInstance) -> Result<SsoToken>;

    /// Run the provider handshake and replace the cached token
    async fn authenticate(&self, instance: &SsoInstance) -> Result<SsoToken>;
}

/// Token provider backed by the on-disk cache and the OIDC device flow
pub struct AuthManager {
    token_cache: TokenCache,
    headless: bool,
}

impl AuthManager {
    pub fn new(token_cache: TokenCache, headless: bool) -> Self {
        Self {
            token_cache,
            headless,
        }
    }

    /// Remove token from cache (logout)
    pub fn remove_token(&self, instance: &SsoInstance) -> Result<()> {
        self.token_cache.remove_token(instance)
    }
}

#[async_trait]
impl TokenProvider for AuthManager {
    fn cached_token(&self, instance: &SsoInstance) -> Result<SsoToken> {
        self.token_cache.get_token(instance)
    }

    async fn authenticate(&self, instance: &SsoInstance) -> Result<SsoToken> {
        tracing::info!("Starting SSO device authorization for {}", instance.start_url);

        let oidc_client = OidcClient::new(&instance.region).await;
        let token = oidc_client
            .perform_device_flow(&instance.start_url, self.headless)
            .await?;

        self.token_cache.save_token(instance, &token)?;
        Ok(token)
    }
}
