use std::fmt;

use anyhow::{Context, Result, anyhow};
use aws_config::Region;
use aws_sdk_sts::{Client, error::DisplayErrorContext, types};
use aws_smithy_types::{DateTime, date_time::Format};
use log::debug;

use crate::config::Config;

/// Temporary credentials issued by STS.
#[derive(Clone, PartialEq)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime,
}

impl SessionCredentials {
    /// Expiration as an RFC 3339 timestamp.
    pub fn expires_at(&self) -> String {
        self.expiration
            .fmt(Format::DateTime)
            .unwrap_or_else(|_| "unknown".to_string())
    }
}

impl From<&types::Credentials> for SessionCredentials {
    fn from(credentials: &types::Credentials) -> Self {
        Self {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: *credentials.expiration(),
        }
    }
}

impl fmt::Debug for SessionCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("expiration", &self.expires_at())
            .finish()
    }
}

/// Calls STS `GetSessionToken` on behalf of the configured profile.
pub struct SessionExchanger {
    region: String,
    profile: String,
    mfa_device: String,
    duration: u32,
}

impl SessionExchanger {
    /// Captures the region, profile, MFA device and duration from `config`.
    ///
    /// No AWS configuration is loaded until [`get_session_token`] is called.
    ///
    /// [`get_session_token`]: SessionExchanger::get_session_token
    pub fn new(config: &Config) -> Self {
        Self {
            region: config.region.clone(),
            profile: config.profile.clone(),
            mfa_device: config.serial_number.clone(),
            duration: config.duration,
        }
    }

    /// Exchanges an MFA code for temporary session credentials.
    ///
    /// The long-term credentials signing the request are resolved by the SDK
    /// from the shared-config profile, with the region forced to the
    /// configured one. The call is made once; there is no retry.
    ///
    /// # Arguments
    ///
    /// * `token` - Current code shown by the MFA device
    ///
    /// # Returns
    ///
    /// * `Ok(SessionCredentials)` - Access key, secret key, session token and expiry
    /// * `Err(anyhow::Error)` - The request could not be made or was rejected
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// * The duration does not fit in the `i32` STS expects
    /// * STS rejects the request (wrong or expired code, unknown device,
    ///   duration outside 900-129600 seconds, missing source credentials)
    /// * The network call fails
    /// * The response carries no credentials
    pub async fn get_session_token(&self, token: &str) -> Result<SessionCredentials> {
        let duration = i32::try_from(self.duration)
            .with_context(|| format!("Session duration out of range: {}s", self.duration))?;

        debug!(
            "GetSessionToken - Profile: {}, Region: {}, Device: {}",
            self.profile, self.region, self.mfa_device
        );

        let config = aws_config::from_env()
            .region(Region::new(self.region.clone()))
            .profile_name(&self.profile)
            .load()
            .await;

        Client::new(&config)
            .get_session_token()
            .duration_seconds(duration)
            .serial_number(&self.mfa_device)
            .token_code(token)
            .send()
            .await
            .map_err(|e| anyhow!("could not get session token: {}", DisplayErrorContext(&e)))?
            .credentials()
            .map(SessionCredentials::from)
            .context("No credentials returned")
    }
}
