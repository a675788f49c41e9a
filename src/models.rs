use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The identity center instance a token belongs to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SsoInstance {
    pub start_url: String,
    pub region: String,
}

/// Cached SSO-OIDC bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoToken {
    #[serde(rename = "accessToken", alias = "access_token")]
    pub access_token: String,

    #[serde(rename = "expiresAt", alias = "expires_at")]
    pub expires_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(
        rename = "startUrl",
        alias = "start_url",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_url: Option<String>,
}

impl SsoToken {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    pub fn expires_in_seconds(&self) -> i64 {
        (self.expires_at - Utc::now()).num_seconds().max(0)
    }

    pub fn expires_in_minutes(&self) -> i64 {
        self.expires_in_seconds() / 60
    }

    /// Format expiration time as human-readable string
    pub fn expiration_display(&self) -> String {
        let mins = self.expires_in_minutes();

        if mins >= 60 {
            let hours = mins / 60;
            let remaining_mins = mins % 60;
            if remaining_mins > 0 {
                format!("{}h {}m", hours, remaining_mins)
            } else {
                format!("{}h", hours)
            }
        } else if mins > 0 {
            format!("{} minutes", mins)
        } else {
            "EXPIRED".to_string()
        }
    }
}

/// An AWS account visible to the token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Account {
    pub id: String,
    pub display_name: String,
}

impl Account {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }
}

/// A permission set assignable within one account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Role {
    pub name: String,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// AWS temporary credentials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl RoleCredentials {
    /// Format expiration time as human-readable string
    pub fn expiration_display(&self) -> String {
        crate::expiry::format_time_remaining(&self.expiration)
    }
}

/// Binding between one interactive shell and the profile it uses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub owner_pid: u32,
    pub profile_name: String,
    pub account_id: String,
    pub account_name: String,
    pub role_name: String,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.account_name, self.role_name)
    }

    pub fn full_display(&self) -> String {
        format!(
            "{} ({}): {}",
            self.account_name, self.account_id, self.role_name
        )
    }
}
