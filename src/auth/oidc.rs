use crate::error::{AuthError, Result};
use crate::models::SsoToken;
use aws_sdk_ssooidc::operation::create_token::CreateTokenError;
use aws_sdk_ssooidc::Client as SsoOidcClient;
use chrono::{Duration, Utc};
use std::time::Duration as StdDuration;
use tokio::time::sleep;

const CLIENT_NAME: &str = "awsw";
const CLIENT_TYPE: &str = "public";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const POLL_INTERVAL_SECONDS: u64 = 5;
const SLOW_DOWN_SECONDS: u64 = 5;

/// Device authorization information from StartDeviceAuthorization
#[derive(Debug, Clone)]
pub struct DeviceAuthorizationInfo {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: Option<String>,
    pub interval: Option<i32>,
}

/// OIDC client for the SSO device authorization flow
pub struct OidcClient {
    client: SsoOidcClient,
    region: String,
}

impl OidcClient {
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .no_credentials()
            .load()
            .await;

        Self {
            client: SsoOidcClient::new(&config),
            region: region.to_string(),
        }
    }

    async fn register_client(&self) -> Result<(String, String)> {
        tracing::debug!("Registering client with SSO-OIDC");

        let response = self
            .client
            .register_client()
            .client_name(CLIENT_NAME)
            .client_type(CLIENT_TYPE)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Failed to register client: {}", e)))?;

        let client_id = response
            .client_id()
            .ok_or_else(|| AuthError::Provider("No client_id in response".to_string()))?
            .to_string();

        let client_secret = response
            .client_secret()
            .ok_or_else(|| AuthError::Provider("No client_secret in response".to_string()))?
            .to_string();

        Ok((client_id, client_secret))
    }

    async fn start_device_authorization(
        &self,
        client_id: &str,
        client_secret: &str,
        start_url: &str,
    ) -> Result<DeviceAuthorizationInfo> {
        tracing::debug!("Starting device authorization for: {}", start_url);

        let response = self
            .client
            .start_device_authorization()
            .client_id(client_id)
            .client_secret(client_secret)
            .start_url(start_url)
            .send()
            .await
            .map_err(|e| {
                AuthError::Provider(format!("Failed to start device authorization: {}", e))
            })?;

        let missing = |field: &str| AuthError::Provider(format!("No {} in response", field));

        Ok(DeviceAuthorizationInfo {
            device_code: response
                .device_code()
                .ok_or_else(|| missing("device_code"))?
                .to_string(),
            user_code: response
                .user_code()
                .ok_or_else(|| missing("user_code"))?
                .to_string(),
            verification_uri: response
                .verification_uri()
                .ok_or_else(|| missing("verification_uri"))?
                .to_string(),
            verification_uri_complete: response.verification_uri_complete().map(|s| s.to_string()),
            interval: Some(response.interval()).filter(|i| *i > 0),
        })
    }

    async fn poll_for_token(
        &self,
        client_id: &str,
        client_secret: &str,
        device_code: &str,
        poll_interval: u64,
    ) -> Result<SsoToken> {
        tracing::debug!("Polling for token with interval: {}s", poll_interval);
        let mut interval = poll_interval;

        loop {
            let outcome = self
                .client
                .create_token()
                .client_id(client_id)
                .client_secret(client_secret)
                .grant_type(DEVICE_GRANT_TYPE)
                .device_code(device_code)
                .send()
                .await;

            let err = match outcome {
                Ok(response) => {
                    let access_token = response
                        .access_token()
                        .ok_or_else(|| {
                            AuthError::Provider("No access_token in response".to_string())
                        })?
                        .to_string();

                    let expires_in = response.expires_in();
                    tracing::debug!("Token received, expires in {} seconds", expires_in);

                    return Ok(SsoToken {
                        access_token,
                        expires_at: Utc::now() + Duration::seconds(expires_in as i64),
                        region: Some(self.region.clone()),
                        start_url: None,
                    });
                }
                Err(err) => err,
            };

            match err.as_service_error() {
                Some(CreateTokenError::AuthorizationPendingException(_)) => {
                    sleep(StdDuration::from_secs(interval)).await;
                }
                Some(CreateTokenError::SlowDownException(_)) => {
                    interval += SLOW_DOWN_SECONDS;
                    tracing::debug!("SlowDown requested, poll interval now {}s", interval);
                    sleep(StdDuration::from_secs(interval)).await;
                }
                Some(CreateTokenError::ExpiredTokenException(_)) => {
                    return Err(AuthError::AuthorizationExpired.into());
                }
                Some(CreateTokenError::AccessDeniedException(_)) => {
                    return Err(AuthError::Rejected("device authorization denied".to_string()).into());
                }
                _ => {
                    return Err(
                        AuthError::Provider(format!("Token creation failed: {}", err)).into(),
                    );
                }
            }
        }
    }

    /// Perform complete device flow authentication
    pub async fn perform_device_flow(&self, start_url: &str, headless: bool) -> Result<SsoToken> {
        let (client_id, client_secret) = self.register_client().await?;

        let auth_info = self
            .start_device_authorization(&client_id, &client_secret, start_url)
            .await?;

        display_authorization_prompt(&auth_info, headless);

        let poll_interval = auth_info
            .interval
            .map(|i| i as u64)
            .unwrap_or(POLL_INTERVAL_SECONDS);

        let mut token = self
            .poll_for_token(
                &client_id,
                &client_secret,
                &auth_info.device_code,
                poll_interval,
            )
            .await?;
        token.start_url = Some(start_url.to_string());
        Ok(token)
    }
}

/// Show the verification URL and code on stderr, opening a browser unless headless
fn display_authorization_prompt(auth_info: &DeviceAuthorizationInfo, headless: bool) {
    eprintln!("\n=== AWS SSO Login ===");

    if headless {
        eprintln!("Running in headless mode - please open browser manually:");
        eprintln!();
        eprintln!("Visit: {}", auth_info.verification_uri);
        eprintln!("Enter code: {}", auth_info.user_code);
        eprintln!();
    } else {
        eprintln!("Opening browser to: {}", auth_info.verification_uri);
        eprintln!("\nIf browser doesn't open automatically, visit:");
        eprintln!("  {}", auth_info.verification_uri);
        eprintln!("\nAnd enter code: {}\n", auth_info.user_code);

        let url_to_open = auth_info
            .verification_uri_complete
            .as_ref()
            .unwrap_or(&auth_info.verification_uri);

        if let Err(e) = webbrowser::open(url_to_open) {
            eprintln!("Could not open browser automatically: {}", e);
            eprintln!("Please open the URL manually.\n");
        }
    }

    eprintln!("Waiting for authorization...");
}
