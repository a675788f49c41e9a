use thiserror::Error;

/// Failures of the bearer token: missing, expired, or refused by the provider.
///
/// Every variant is recoverable by running the device authorization again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("No active SSO session - run 'awsw login'")]
    NoActiveSession,

    #[error("SSO token rejected by provider: {0}")]
    Rejected(String),

    #[error("Authorization expired - device flow was not completed in time")]
    AuthorizationExpired,

    #[error("SSO authentication failed: {0}")]
    Provider(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("No accounts found")]
    NoAccounts,

    #[error("No roles found for account {0}")]
    NoRoles(String),

    #[error("No {0} selected")]
    Aborted(&'static str),
}

#[derive(Error, Debug)]
pub enum AwswError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Directory lookup failed: {0}")]
    Directory(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No session recorded for shell process {0}")]
    SessionNotFound(u32),

    #[error("{0}")]
    AccountCache(String),

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl AwswError {
    /// True when re-authenticating could resolve the failure.
    pub fn is_auth(&self) -> bool {
        matches!(self, AwswError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, AwswError>;
