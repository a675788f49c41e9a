// Configuration management
use crate::error::{AwswError, Result};
use crate::models::SsoInstance;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "awsw";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub sso: SsoConfig,
    #[serde(default)]
    pub profile_defaults: ProfileDefaults,
    /// Never try to open a browser during device authorization
    #[serde(default)]
    pub headless: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct SsoConfig {
    pub start_url: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ProfileDefaults {
    /// Region exported alongside AWS_PROFILE and written to ~/.aws/config.
    /// Falls back to the SSO region when unset.
    pub region: Option<String>,
    pub output: Option<String>,
}

/// Values given on the command line; they win over file and environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub start_url: Option<String>,
    pub region: Option<String>,
    pub headless: bool,
}

impl Config {
    /// Get the config directory path
    ///
    /// Priority:
    /// 1. XDG_CONFIG_HOME/awsw (if env var is set)
    /// 2. ~/.config/awsw (if ~/.config exists)
    /// 3. ~/.awsw (fallback on Unix, doesn't create ~/.config)
    /// 4. Platform default on Windows
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            return Ok(PathBuf::from(xdg_config).join(APP_DIR));
        }

        #[cfg(unix)]
        {
            if let Some(home_dir) = dirs::home_dir() {
                let xdg_config = home_dir.join(".config");

                if xdg_config.exists() {
                    return Ok(xdg_config.join(APP_DIR));
                }

                return Ok(home_dir.join(format!(".{}", APP_DIR)));
            }
        }

        #[cfg(not(unix))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                return Ok(config_dir.join(APP_DIR));
            }
        }

        Err(AwswError::Config(
            "Could not determine config directory".to_string(),
        ))
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, environment variables, and CLI overrides
    pub fn load(overrides: &Overrides) -> Result<Self> {
        let config = Self::load_file(&Self::config_file_path()?)?;
        Ok(config.apply_env().apply_overrides(overrides))
    }

    fn load_file(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Config::default());
        }

        tracing::debug!("Loading config from: {}", config_path.display());
        let contents = fs::read_to_string(config_path)
            .map_err(|e| AwswError::Config(format!("Failed to read config file: {}", e)))?;

        Ok(toml::from_str(&contents)?)
    }

    fn apply_env(mut self) -> Self {
        if let Ok(start_url) = std::env::var("AWS_SSO_START_URL") {
            tracing::debug!("Using AWS_SSO_START_URL from environment: {}", start_url);
            self.sso.start_url = Some(start_url);
        }

        if let Ok(region) = std::env::var("AWS_SSO_REGION") {
            tracing::debug!("Using AWS_SSO_REGION from environment: {}", region);
            self.sso.region = Some(region);
        }

        if self.profile_defaults.region.is_none() {
            if let Ok(region) = std::env::var("AWS_REGION") {
                self.profile_defaults.region = Some(region);
            }
        }

        self
    }

    fn apply_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(start_url) = &overrides.start_url {
            self.sso.start_url = Some(start_url.clone());
        }
        if let Some(region) = &overrides.region {
            self.sso.region = Some(region.clone());
        }
        self.headless |= overrides.headless;
        self
    }

    /// Create a sample config file with comments
    pub fn create_sample() -> Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        let config_path = Self::config_file_path()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                AwswError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        if config_path.exists() {
            return Err(AwswError::Config(format!(
                "Config file already exists at: {}",
                config_path.display()
            )));
        }

        let sample_config = r#"# awsw configuration
# Location priority:
#   1. $XDG_CONFIG_HOME/awsw/config.toml (if XDG_CONFIG_HOME is set)
#   2. ~/.config/awsw/config.toml (if ~/.config exists)
#   3. ~/.awsw/config.toml (fallback)
#
# Environment variables override this file:
#   AWS_SSO_START_URL, AWS_SSO_REGION, AWS_REGION

# Never open a browser during login (useful over SSH)
headless = false

[sso]
# Example: start_url = "https://my-org.awsapps.com/start"
start_url = ""
# Example: region = "us-east-1"
region = ""

[profile_defaults]
# Region written to profiles and exported as AWS_REGION.
# If not set, uses the SSO region.
# region = "us-west-2"

# Default output format for AWS CLI (json, yaml, yaml-stream, text, table)
# output = "json"
"#;

        fs::write(&config_path, sample_config)
            .map_err(|e| AwswError::Config(format!("Failed to write sample config: {}", e)))?;

        Ok(config_path)
    }

    /// Get the SSO instance, returning an error if incomplete
    pub fn sso_instance(&self) -> Result<SsoInstance> {
        let start_url = self
            .sso
            .start_url
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AwswError::Config(
                    "no SSO configuration found: set sso.start_url in the config file, \
                     AWS_SSO_START_URL, or --start-url (try 'awsw config init')"
                        .to_string(),
                )
            })?;

        let region = self
            .sso
            .region
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AwswError::Config(
                    "SSO region not configured: set sso.region in the config file, \
                     AWS_SSO_REGION, or --region"
                        .to_string(),
                )
            })?;

        Ok(SsoInstance {
            start_url: start_url.to_string(),
            region: region.to_string(),
        })
    }

    /// Region for written profiles and the AWS_REGION export
    pub fn default_region(&self) -> Option<&str> {
        self.profile_defaults
            .region
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.sso.region.as_deref())
    }
}

/// On-disk locations of every file this tool reads or writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub state_dir: PathBuf,
    pub aws_credentials: PathBuf,
    pub aws_config: PathBuf,
}

impl Paths {
    /// Resolve locations from the environment
    ///
    /// State lives in $AWSW_STATE_DIR, else the platform state directory,
    /// else the local data directory. AWS files honour
    /// AWS_SHARED_CREDENTIALS_FILE and AWS_CONFIG_FILE like the AWS CLI.
    pub fn resolve() -> Result<Self> {
        let state_dir = match std::env::var_os("AWSW_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .map(|d| d.join(APP_DIR))
                .ok_or_else(|| {
                    AwswError::Config("Could not determine state directory".to_string())
                })?,
        };

        let home = dirs::home_dir()
            .ok_or_else(|| AwswError::Config("Could not determine home directory".to_string()))?;

        let aws_credentials = std::env::var_os("AWS_SHARED_CREDENTIALS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".aws").join("credentials"));
        let aws_config = std::env::var_os("AWS_CONFIG_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".aws").join("config"));

        Ok(Self {
            state_dir,
            aws_credentials,
            aws_config,
        })
    }

    /// Every file under one root; used by tests and sandboxes
    pub fn rooted(root: &Path) -> Self {
        Self {
            state_dir: root.join("state"),
            aws_credentials: root.join(".aws").join("credentials"),
            aws_config: root.join(".aws").join("config"),
        }
    }

    pub fn token_dir(&self) -> PathBuf {
        self.state_dir.join("sso")
    }

    pub fn sessions_file(&self) -> PathBuf {
        self.state_dir.join("sessions.json")
    }

    pub fn accounts_file(&self) -> PathBuf {
        self.state_dir.join("accounts.json")
    }
}
