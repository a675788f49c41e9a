// Login workflow: token, account, role, credentials, profile, session
use crate::auth::TokenProvider;
use crate::config::{Config, Paths};
use crate::directory::{AccountCache, Directory, SsoPortal};
use crate::error::Result;
use crate::models::{Account, Role, SsoInstance, SsoToken};
use crate::profile::ProfileWriter;
use crate::select::{self, Candidate, Chooser, Selection};
use crate::session::SessionStore;
use chrono::{DateTime, Utc};

/// What the operator asked for on the command line
#[derive(Debug, Clone, Default)]
pub struct LoginRequest {
    /// Skip the cached token and authenticate first
    pub force: bool,
    pub account: Option<String>,
    pub role: Option<String>,
    /// Shell process the resulting session belongs to
    pub owner_pid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub profile_name: String,
    pub region: String,
    pub account: Account,
    pub role: Role,
    pub expiration: DateTime<Utc>,
}

impl LoginOutcome {
    /// Shell lines that activate the profile, meant for `eval`
    pub fn export_lines(&self) -> [String; 2] {
        [
            format!("export AWS_PROFILE={}", self.profile_name),
            format!("export AWS_REGION={}", self.region),
        ]
    }
}

pub struct LoginWorkflow<'a, T, P> {
    instance: SsoInstance,
    region: String,
    tokens: T,
    directory: Directory<P>,
    chooser: &'a dyn Chooser,
    account_cache: AccountCache,
    profiles: ProfileWriter,
    sessions: SessionStore,
}

impl<'a, T: TokenProvider, P: SsoPortal> LoginWorkflow<'a, T, P> {
    pub fn new(
        config: &Config,
        paths: &Paths,
        tokens: T,
        portal: P,
        chooser: &'a dyn Chooser,
    ) -> Result<Self> {
        let instance = config.sso_instance()?;
        let region = config
            .default_region()
            .unwrap_or(&instance.region)
            .to_string();

        Ok(Self {
            profiles: ProfileWriter::new(
                paths,
                Some(region.clone()),
                config.profile_defaults.output.clone(),
            ),
            instance,
            region,
            tokens,
            directory: Directory::new(portal),
            chooser,
            account_cache: AccountCache::new(paths.accounts_file()),
            sessions: SessionStore::new(paths.sessions_file()),
        })
    }

    pub async fn run(&self, request: &LoginRequest) -> Result<LoginOutcome> {
        let (token, accounts) = self.resolve_accounts(request.force).await?;

        if let Err(e) = self.account_cache.save(&accounts) {
            tracing::warn!("Failed to update account cache: {}", e);
        }

        let account = report(select::select_account(
            accounts,
            request.account.as_deref(),
            self.chooser,
        )?);

        let roles = self.directory.list_roles(&token, &account.id).await?;
        let role = report(select::select_role(
            roles,
            &account,
            request.role.as_deref(),
            self.chooser,
        )?);

        let creds = self
            .directory
            .get_role_credentials(&token, &account.id, &role.name)
            .await?;

        let profile_name =
            self.profiles
                .write_profile(&account.display_name, &account.id, &role.name, &creds)?;

        if let Err(e) = self.sessions.save_session(
            request.owner_pid,
            &profile_name,
            &account.id,
            &account.display_name,
            &role.name,
        ) {
            tracing::warn!("Failed to record session: {}", e);
        }

        match self.sessions.cleanup_stale() {
            Ok(0) => {}
            Ok(removed) => tracing::debug!("Cleaned up {} stale sessions", removed),
            Err(e) => tracing::warn!("Stale session cleanup failed: {}", e),
        }

        eprintln!(
            "✓ Credentials for {} / {} valid for {}",
            account.display_name,
            role.name,
            creds.expiration_display()
        );

        Ok(LoginOutcome {
            profile_name,
            region: self.region.clone(),
            account,
            role,
            expiration: creds.expiration,
        })
    }

    /// Accounts visible to a working token
    ///
    /// A missing or rejected cached token leads to exactly one
    /// authentication followed by one more listing attempt.
    async fn resolve_accounts(&self, force: bool) -> Result<(SsoToken, Vec<Account>)> {
        let cached = if force {
            tracing::debug!("Forced login, ignoring cached token");
            None
        } else {
            match self.tokens.cached_token(&self.instance) {
                Ok(token) => Some(token),
                Err(e) if e.is_auth() => {
                    tracing::debug!("No usable cached token: {}", e);
                    None
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(token) = cached {
            match self.directory.list_accounts(&token).await {
                Ok(accounts) => return Ok((token, accounts)),
                Err(e) if e.is_auth() => {
                    tracing::warn!("Cached SSO token no longer accepted, re-authenticating: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        let token = self.tokens.authenticate(&self.instance).await?;
        eprintln!("✓ Login successful, token expires in {}", token.expiration_display());

        let accounts = self.directory.list_accounts(&token).await?;
        Ok((token, accounts))
    }
}

fn report<C: Candidate>(selection: Selection<C>) -> C {
    let verb = if selection.was_matched() {
        "Found"
    } else {
        "✓ Selected"
    };
    let item = selection.into_inner();
    eprintln!("{} {}: {}", verb, C::KIND, item.label());
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockTokenProvider;
    use crate::config::SsoConfig;
    use crate::directory::{MockSsoPortal, Page};
    use crate::error::{AuthError, AwswError, SelectionError};
    use crate::models::RoleCredentials;
    use crate::select::MockChooser;
    use chrono::Duration;

    fn config() -> Config {
        Config {
            sso: SsoConfig {
                start_url: Some("https://example.awsapps.com/start".to_string()),
                region: Some("us-east-1".to_string()),
            },
            ..Default::default()
        }
    }

    fn token(value: &str) -> SsoToken {
        SsoToken {
            access_token: value.to_string(),
            expires_at: Utc::now() + Duration::hours(8),
            region: Some("us-east-1".to_string()),
            start_url: None,
        }
    }

    fn request(account: Option<&str>, role: Option<&str>) -> LoginRequest {
        LoginRequest {
            force: false,
            account: account.map(String::from),
            role: role.map(String::from),
            owner_pid: std::process::id(),
        }
    }

    /// Portal with Dev/111 and Prod/222, each offering ReadOnly and Admin
    fn portal(expected_token: &'static str) -> MockSsoPortal {
        let mut portal = MockSsoPortal::new();
        portal
            .expect_list_accounts_page()
            .withf(move |access_token, _| access_token == expected_token)
            .returning(|_, next| match next.as_deref() {
                None => Ok(Page {
                    items: vec![Account::new("222", "Prod")],
                    next_token: Some("p2".to_string()),
                }),
                Some(_) => Ok(Page {
                    items: vec![Account::new("111", "Dev")],
                    next_token: None,
                }),
            });
        portal.expect_list_roles_page().returning(|_, _, _| {
            Ok(Page {
                items: vec![Role::new("ReadOnly"), Role::new("Admin")],
                next_token: None,
            })
        });
        portal
            .expect_get_role_credentials()
            .returning(|_, account_id, _| {
                Ok(RoleCredentials {
                    access_key_id: format!("AKIA{}", account_id),
                    secret_access_key: "secret".to_string(),
                    session_token: "session".to_string(),
                    expiration: Utc::now() + Duration::hours(1),
                })
            });
        portal
    }

    fn cached(value: &'static str) -> MockTokenProvider {
        let mut tokens = MockTokenProvider::new();
        tokens
            .expect_cached_token()
            .returning(move |_| Ok(token(value)));
        tokens
    }

    #[tokio::test]
    async fn test_hint_match_and_role_picker() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());

        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .withf(|prompt, options| {
                prompt == "Select role for Dev:"
                    && options == ["Admin".to_string(), "ReadOnly".to_string()]
            })
            .times(1)
            .returning(|_, _| Ok(Some(0)));

        let mut tokens = cached("cached");
        tokens.expect_authenticate().times(0);

        let workflow =
            LoginWorkflow::new(&config(), &paths, tokens, portal("cached"), &chooser).unwrap();
        let outcome = workflow.run(&request(Some("dev"), None)).await.unwrap();

        assert_eq!(outcome.profile_name, "dev-admin");
        assert_eq!(outcome.account, Account::new("111", "Dev"));
        assert_eq!(outcome.role, Role::new("Admin"));
        assert_eq!(
            outcome.export_lines(),
            [
                "export AWS_PROFILE=dev-admin".to_string(),
                "export AWS_REGION=us-east-1".to_string(),
            ]
        );

        let credentials = std::fs::read_to_string(&paths.aws_credentials).unwrap();
        assert!(credentials.contains("[dev-admin]"));
        assert!(credentials.contains("aws_access_key_id = AKIA111"));

        let session = SessionStore::new(paths.sessions_file())
            .get_session(std::process::id())
            .unwrap();
        assert_eq!(session.profile_name, "dev-admin");
        assert_eq!(session.account_id, "111");

        let accounts = AccountCache::new(paths.accounts_file()).load().unwrap();
        assert_eq!(accounts.accounts.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_cached_token_reauthenticates_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let chooser = MockChooser::new();

        let mut portal = portal("fresh");
        portal
            .expect_list_accounts_page()
            .withf(|access_token, _| access_token == "stale")
            .times(1)
            .returning(|_, _| Err(AuthError::Rejected("UnauthorizedException".to_string()).into()));

        let mut tokens = cached("stale");
        tokens
            .expect_authenticate()
            .times(1)
            .returning(|_| Ok(token("fresh")));

        let workflow = LoginWorkflow::new(&config(), &paths, tokens, portal, &chooser).unwrap();
        let outcome = workflow
            .run(&request(Some("PROD"), Some("readonly")))
            .await
            .unwrap();

        assert_eq!(outcome.profile_name, "prod-readonly");
    }

    #[tokio::test]
    async fn test_missing_token_authenticates_first() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let chooser = MockChooser::new();

        let mut tokens = MockTokenProvider::new();
        tokens
            .expect_cached_token()
            .returning(|_| Err(AuthError::NoActiveSession.into()));
        tokens
            .expect_authenticate()
            .times(1)
            .returning(|_| Ok(token("fresh")));

        let workflow =
            LoginWorkflow::new(&config(), &paths, tokens, portal("fresh"), &chooser).unwrap();
        let outcome = workflow
            .run(&request(Some("Dev"), Some("Admin")))
            .await
            .unwrap();

        assert_eq!(outcome.profile_name, "dev-admin");
    }

    #[tokio::test]
    async fn test_force_skips_cached_token() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let chooser = MockChooser::new();

        let mut tokens = MockTokenProvider::new();
        tokens.expect_cached_token().times(0);
        tokens
            .expect_authenticate()
            .times(1)
            .returning(|_| Ok(token("fresh")));

        let workflow =
            LoginWorkflow::new(&config(), &paths, tokens, portal("fresh"), &chooser).unwrap();
        let mut req = request(Some("Dev"), Some("Admin"));
        req.force = true;

        assert!(workflow.run(&req).await.is_ok());
    }

    #[tokio::test]
    async fn test_directory_failure_is_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let chooser = MockChooser::new();

        let mut portal = MockSsoPortal::new();
        portal
            .expect_list_accounts_page()
            .returning(|_, _| Err(AwswError::Directory("throttled".to_string())));

        let mut tokens = cached("cached");
        tokens.expect_authenticate().times(0);

        let workflow = LoginWorkflow::new(&config(), &paths, tokens, portal, &chooser).unwrap();
        let err = workflow.run(&request(None, None)).await.unwrap_err();

        assert!(matches!(err, AwswError::Directory(_)));
        assert!(!paths.aws_credentials.exists());
    }

    #[tokio::test]
    async fn test_second_rejection_surfaces_auth_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let chooser = MockChooser::new();

        let mut portal = MockSsoPortal::new();
        portal
            .expect_list_accounts_page()
            .times(2)
            .returning(|_, _| Err(AuthError::Rejected("denied".to_string()).into()));

        let mut tokens = cached("cached");
        tokens
            .expect_authenticate()
            .times(1)
            .returning(|_| Ok(token("fresh")));

        let workflow = LoginWorkflow::new(&config(), &paths, tokens, portal, &chooser).unwrap();
        let err = workflow.run(&request(None, None)).await.unwrap_err();

        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_aborted_account_choice_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());

        let mut chooser = MockChooser::new();
        chooser
            .expect_choose()
            .withf(|prompt, options| {
                prompt.starts_with("Account 'staging' not found.")
                    && options == ["Dev (111)".to_string(), "Prod (222)".to_string()]
            })
            .returning(|_, _| Ok(None));

        let workflow =
            LoginWorkflow::new(&config(), &paths, cached("cached"), portal("cached"), &chooser)
                .unwrap();
        let err = workflow
            .run(&request(Some("staging"), None))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AwswError::Selection(SelectionError::Aborted("account"))
        ));
        assert!(!paths.aws_credentials.exists());
        assert!(SessionStore::new(paths.sessions_file())
            .list_sessions()
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_profile_region_prefers_profile_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(dir.path());
        let chooser = MockChooser::new();

        let mut config = config();
        config.profile_defaults.region = Some("eu-central-1".to_string());

        let mut portal = MockSsoPortal::new();
        portal
            .expect_list_accounts_page()
            .returning(|_, _| {
                Ok(Page {
                    items: vec![Account::new("111", "Dev")],
                    next_token: None,
                })
            });
        portal
            .expect_list_roles_page()
            .withf(|access_token, account_id, next| {
                access_token == "cached" && account_id == "111" && next.is_none()
            })
            .returning(|_, _, _| {
                Ok(Page {
                    items: vec![Role::new("Admin")],
                    next_token: None,
                })
            });
        portal.expect_get_role_credentials().returning(|_, _, _| {
            Ok(RoleCredentials {
                access_key_id: "AKIA".to_string(),
                secret_access_key: "secret".to_string(),
                session_token: "session".to_string(),
                expiration: Utc::now() + Duration::hours(1),
            })
        });

        let workflow =
            LoginWorkflow::new(&config, &paths, cached("cached"), portal, &chooser).unwrap();
        let outcome = workflow
            .run(&request(Some("Dev"), Some("Admin")))
            .await
            .unwrap();

        assert_eq!(outcome.region, "eu-central-1");
        let aws_config = std::fs::read_to_string(&paths.aws_config).unwrap();
        assert!(aws_config.contains("[profile dev-admin]\nregion = eu-central-1\n"));
    }

    #[test]
    fn test_missing_start_url_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let chooser = MockChooser::new();

        let result = LoginWorkflow::new(
            &Config::default(),
            &Paths::rooted(dir.path()),
            MockTokenProvider::new(),
            MockSsoPortal::new(),
            &chooser,
        );
        assert!(matches!(result, Err(AwswError::Config(_))));
    }
}
