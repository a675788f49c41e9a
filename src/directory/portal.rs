use super::{Page, SsoPortal};
use crate::error::{AuthError, AwswError, Result};
use crate::models::{Account, Role, RoleCredentials};
use async_trait::async_trait;
use aws_sdk_sso::error::DisplayErrorContext;
use aws_sdk_sso::operation::get_role_credentials::GetRoleCredentialsError;
use aws_sdk_sso::operation::list_account_roles::ListAccountRolesError;
use aws_sdk_sso::operation::list_accounts::ListAccountsError;
use aws_sdk_sso::Client as SsoClient;
use chrono::{TimeZone, Utc};

/// The AWS SSO portal API
pub struct SdkPortal {
    client: SsoClient,
}

impl SdkPortal {
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;

        Self {
            client: SsoClient::new(&config),
        }
    }
}

fn rejected(action: &str) -> AwswError {
    AuthError::Rejected(format!("{} returned UnauthorizedException", action)).into()
}

fn provider_failure<E>(action: &str, err: &E) -> AwswError
where
    E: std::error::Error + 'static,
{
    AwswError::Directory(format!("Failed to {}: {}", action, DisplayErrorContext(err)))
}

#[async_trait]
impl SsoPortal for SdkPortal {
    async fn list_accounts_page(
        &self,
        access_token: &str,
        next_token: Option<String>,
    ) -> Result<Page<Account>> {
        let response = self
            .client
            .list_accounts()
            .access_token(access_token)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(ListAccountsError::UnauthorizedException(_)) => rejected("ListAccounts"),
                _ => provider_failure("list accounts", &e),
            })?;

        let mut items = Vec::new();
        for account in response.account_list() {
            let Some(id) = account.account_id() else {
                tracing::warn!("Skipping account without an id");
                continue;
            };
            let name = account.account_name().unwrap_or(id);
            items.push(Account::new(id, name));
        }

        Ok(Page {
            items,
            next_token: response.next_token().map(|s| s.to_string()),
        })
    }

    async fn list_roles_page(
        &self,
        access_token: &str,
        account_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<Role>> {
        let response = self
            .client
            .list_account_roles()
            .access_token(access_token)
            .account_id(account_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(ListAccountRolesError::UnauthorizedException(_)) => {
                    rejected("ListAccountRoles")
                }
                _ => provider_failure("list account roles", &e),
            })?;

        let items = response
            .role_list()
            .iter()
            .filter_map(|role| role.role_name())
            .map(Role::new)
            .collect();

        Ok(Page {
            items,
            next_token: response.next_token().map(|s| s.to_string()),
        })
    }

    async fn get_role_credentials(
        &self,
        access_token: &str,
        account_id: &str,
        role_name: &str,
    ) -> Result<RoleCredentials> {
        let response = self
            .client
            .get_role_credentials()
            .access_token(access_token)
            .account_id(account_id)
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(GetRoleCredentialsError::UnauthorizedException(_)) => {
                    rejected("GetRoleCredentials")
                }
                _ => provider_failure("get role credentials", &e),
            })?;

        let missing = |field: &str| AwswError::Directory(format!("No {} in credentials", field));

        let role_creds = response
            .role_credentials()
            .ok_or_else(|| missing("role_credentials"))?;

        let expiration = Utc
            .timestamp_millis_opt(role_creds.expiration())
            .single()
            .ok_or_else(|| AwswError::Directory("Invalid expiration timestamp".to_string()))?;

        Ok(RoleCredentials {
            access_key_id: role_creds
                .access_key_id()
                .ok_or_else(|| missing("access_key_id"))?
                .to_string(),
            secret_access_key: role_creds
                .secret_access_key()
                .ok_or_else(|| missing("secret_access_key"))?
                .to_string(),
            session_token: role_creds
                .session_token()
                .ok_or_else(|| missing("session_token"))?
                .to_string(),
            expiration,
        })
    }
}
