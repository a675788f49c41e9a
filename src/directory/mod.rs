// Account and role discovery
mod account_cache;
mod portal;

pub use account_cache::{AccountCache, CachedAccounts};
pub use portal::SdkPortal;

use crate::error::{AwswError, Result};
use crate::models::{Account, Role, RoleCredentials, SsoToken};
use async_trait::async_trait;
use std::collections::HashSet;
use std::future::Future;

/// One page of a listing plus the cursor for the next page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

/// Provider-facing boundary of the SSO portal
///
/// Implementations classify failures into tagged errors: a rejected bearer
/// token is `AuthError::Rejected`, anything else is `AwswError::Directory`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SsoPortal: Send + Sync {
    async fn list_accounts_page(
        &self,
        access_token: &str,
        next_token: Option<String>,
    ) -> Result<Page<Account>>;

    async fn list_roles_page(
        &self,
        access_token: &str,
        account_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<Role>>;

    async fn get_role_credentials(
        &self,
        access_token: &str,
        account_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials>;
}

/// Follow continuation cursors until the provider stops returning one
///
/// Pages are fetched one after another and concatenated in page order. The
/// first failing page aborts the whole listing.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut items = Vec::new();
    let mut next_token: Option<String> = None;
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages = 0usize;

    loop {
        let page = fetch(next_token.take()).await?;
        pages += 1;
        items.extend(page.items);

        match page.next_token {
            None => break,
            Some(token) if !seen.insert(token.clone()) => {
                return Err(AwswError::Directory(format!(
                    "pagination cursor '{}' repeated after {} pages",
                    token, pages
                )));
            }
            Some(token) => next_token = Some(token),
        }
    }

    tracing::debug!("Collected {} items over {} pages", items.len(), pages);
    Ok(items)
}

/// Aggregated, sorted view of what a token may access
pub struct Directory<P> {
    portal: P,
}

impl<P: SsoPortal> Directory<P> {
    pub fn new(portal: P) -> Self {
        Self { portal }
    }

    /// All accounts, stable-sorted by display name
    pub async fn list_accounts(&self, token: &SsoToken) -> Result<Vec<Account>> {
        let mut accounts = collect_pages(|next| {
            self.portal
                .list_accounts_page(&token.access_token, next)
        })
        .await?;

        accounts.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        tracing::info!("Found {} accounts", accounts.len());
        Ok(accounts)
    }

    /// All roles of one account, stable-sorted by name
    pub async fn list_roles(&self, token: &SsoToken, account_id: &str) -> Result<Vec<Role>> {
        let mut roles = collect_pages(|next| {
            self.portal
                .list_roles_page(&token.access_token, account_id, next)
        })
        .await?;

        roles.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!("Found {} roles in account {}", roles.len(), account_id);
        Ok(roles)
    }

    /// Credentials for one role; the provider picks the duration
    pub async fn get_role_credentials(
        &self,
        token: &SsoToken,
        account_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials> {
        self.portal
            .get_role_credentials(&token.access_token, account_id, role_name)
            .await
    }
}
