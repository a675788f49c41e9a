// Profile materialization into the shared AWS credentials and config files
mod ini;

use crate::config::Paths;
use crate::error::{AwswError, Result};
use crate::models::RoleCredentials;
use crate::store::{self, FileLock};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

const MANAGED_MARKER: &str = "# Managed by awsw";

/// Deterministic profile name for an account/role pair, e.g. `dev-admin`
///
/// Each part is lowercased and every run of characters outside
/// `[a-z0-9]` becomes a single `-`.
pub fn profile_name(account_name: &str, role_name: &str) -> String {
    format!(
        "{}-{}",
        slug(account_name, "account"),
        slug(role_name, "role")
    )
}

fn slug(value: &str, fallback: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    let trimmed = out.trim_matches('-');
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Name used when the plain name already belongs to someone else
fn disambiguated_name(base: &str, account_id: &str, role_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(account_id.as_bytes());
    hasher.update(b"/");
    hasher.update(role_name.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    format!("{}-{}", base, &digest[..8])
}

/// A profile section written by this tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedProfile {
    pub profile_name: String,
    pub account_id: String,
    pub role_name: String,
    pub expiration: Option<DateTime<Utc>>,
}

impl ManagedProfile {
    fn from_section(section: &ini::Section) -> Option<Self> {
        if !section.has_comment(MANAGED_MARKER) {
            return None;
        }
        Some(Self {
            profile_name: section.name.clone(),
            account_id: section.comment_value("Account")?.to_string(),
            role_name: section.comment_value("Role")?.to_string(),
            expiration: section
                .comment_value("Expiration")
                .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
        })
    }

    fn belongs_to(&self, account_id: &str, role_name: &str) -> bool {
        self.account_id == account_id && self.role_name == role_name
    }
}

/// Writes role credentials as named profiles, leaving other entries alone
pub struct ProfileWriter {
    credentials_path: PathBuf,
    config_path: PathBuf,
    region: Option<String>,
    output: Option<String>,
}

impl ProfileWriter {
    pub fn new(paths: &Paths, region: Option<String>, output: Option<String>) -> Self {
        Self {
            credentials_path: paths.aws_credentials.clone(),
            config_path: paths.aws_config.clone(),
            region,
            output,
        }
    }

    /// Write or overwrite the profile for an account/role, returning its name
    pub fn write_profile(
        &self,
        account_name: &str,
        account_id: &str,
        role_name: &str,
        creds: &RoleCredentials,
    ) -> Result<String> {
        // Always credentials first, then config
        let _credentials_lock = FileLock::acquire(&self.credentials_path)?;
        let _config_lock = FileLock::acquire(&self.config_path)?;

        let credentials = store::read_optional(&self.credentials_path)?.unwrap_or_default();
        let config = store::read_optional(&self.config_path)?.unwrap_or_default();

        let name = resolve_name(&credentials, &config, account_name, account_id, role_name)?;

        let comments = vec![
            MANAGED_MARKER.to_string(),
            format!("# Account: {}", account_id),
            format!("# Role: {}", role_name),
            format!("# Expiration: {}", creds.expiration.to_rfc3339()),
        ];

        let updated = ini::update_section(
            &credentials,
            &name,
            &[
                ("aws_access_key_id", creds.access_key_id.as_str()),
                ("aws_secret_access_key", creds.secret_access_key.as_str()),
                ("aws_session_token", creds.session_token.as_str()),
            ],
            Some(comments.as_slice()),
        );
        store::write_atomic(&self.credentials_path, updated.as_bytes())?;

        self.write_config_section(&config, &name)?;

        tracing::info!(
            "Wrote profile '{}' to {}",
            name,
            self.credentials_path.display()
        );
        Ok(name)
    }

    fn write_config_section(&self, existing: &str, profile_name: &str) -> Result<()> {
        let mut entries: Vec<(&str, &str)> = Vec::new();
        if let Some(region) = self.region.as_deref() {
            entries.push(("region", region));
        }
        if let Some(output) = self.output.as_deref() {
            entries.push(("output", output));
        }
        if entries.is_empty() {
            return Ok(());
        }

        let marker = [MANAGED_MARKER.to_string()];
        let updated = ini::update_section(
            existing,
            &config_section_name(profile_name),
            &entries,
            Some(marker.as_slice()),
        );
        store::write_atomic(&self.config_path, updated.as_bytes())
    }

    /// All profiles carrying the managed marker
    pub fn managed_profiles(&self) -> Result<Vec<ManagedProfile>> {
        let content = store::read_optional(&self.credentials_path)?.unwrap_or_default();
        Ok(ini::parse_sections(&content)
            .iter()
            .filter_map(ManagedProfile::from_section)
            .collect())
    }

    pub fn find_profile(&self, profile_name: &str) -> Result<Option<ManagedProfile>> {
        Ok(self
            .managed_profiles()?
            .into_iter()
            .find(|p| p.profile_name == profile_name))
    }
}

fn config_section_name(profile_name: &str) -> String {
    if profile_name == "default" {
        profile_name.to_string()
    } else {
        format!("profile {}", profile_name)
    }
}

/// Pick the derived name, or its disambiguated form when the derived name is
/// held by an unmanaged entry or by a different account/role in either file
fn resolve_name(
    credentials: &str,
    config: &str,
    account_name: &str,
    account_id: &str,
    role_name: &str,
) -> Result<String> {
    let credential_sections = ini::parse_sections(credentials);
    let config_sections = ini::parse_sections(config);

    let base = profile_name(account_name, role_name);
    let candidates = [
        base.clone(),
        disambiguated_name(&base, account_id, role_name),
    ];

    for candidate in candidates {
        if is_available(
            &candidate,
            &credential_sections,
            &config_sections,
            account_id,
            role_name,
        ) {
            return Ok(candidate);
        }
        tracing::debug!("Profile name '{}' is taken, trying next", candidate);
    }

    Err(AwswError::Persistence(format!(
        "profile name '{}' and its fallback are used by other entries",
        base
    )))
}

/// A name is free when neither file has it, or every section using it is ours
///
/// A config section counts as ours when it carries the marker, or when the
/// credentials section of the same name is managed for this account/role.
fn is_available(
    name: &str,
    credential_sections: &[ini::Section],
    config_sections: &[ini::Section],
    account_id: &str,
    role_name: &str,
) -> bool {
    let owns_credentials = match credential_sections.iter().find(|s| s.name == name) {
        None => false,
        Some(section) => match ManagedProfile::from_section(section) {
            Some(profile) if profile.belongs_to(account_id, role_name) => true,
            _ => return false,
        },
    };

    let config_name = config_section_name(name);
    match config_sections.iter().find(|s| s.name == config_name) {
        None => true,
        Some(section) => owns_credentials || section.has_comment(MANAGED_MARKER),
    }
}
