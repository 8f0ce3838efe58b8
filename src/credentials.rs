use crate::consts::{ACCESS_KEY_ID_ENV_VAR, ACCESS_KEY_SECRET_ENV_VAR, SECURITY_TOKEN_ENV_VAR};
use crate::sts_client::{IdentityApi, StsError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::fmt;
use std::sync::Arc;
use thiserror::Error as ThisError;
use tokio::sync::Mutex;

/// An access key pair, optionally temporary.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field(
                "security_token",
                &self.security_token.as_ref().map(|_| "***"),
            )
            .finish()
    }
}

/// Credentials bound to the account they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountCredentials {
    pub account_id: String,
    pub credentials: Credentials,
}

#[derive(ThisError, Debug)]
pub enum CredentialsError {
    #[error("Alibaba Cloud credentials are not configured: {0} is not set")]
    Missing(&'static str),
    #[error("Failed to assume role {role_arn}: {source}")]
    AssumeRole {
        role_arn: String,
        #[source]
        source: StsError,
    },
}

#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn credentials(&self) -> Result<Credentials, CredentialsError>;
}

/// Reads the access key from the process environment on every call.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentialProvider;

fn non_empty_var(name: &'static str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let access_key_id = non_empty_var(ACCESS_KEY_ID_ENV_VAR)
            .ok_or(CredentialsError::Missing(ACCESS_KEY_ID_ENV_VAR))?;
        let access_key_secret = non_empty_var(ACCESS_KEY_SECRET_ENV_VAR)
            .ok_or(CredentialsError::Missing(ACCESS_KEY_SECRET_ENV_VAR))?;

        Ok(Credentials {
            access_key_id,
            access_key_secret,
            security_token: non_empty_var(SECURITY_TOKEN_ENV_VAR),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StaticCredentialProvider {
    credentials: Credentials,
}

impl StaticCredentialProvider {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn credentials(&self) -> Result<Credentials, CredentialsError> {
        Ok(self.credentials.clone())
    }
}

const ASSUME_ROLE_SESSION_NAME: &str = "fc-mcp-server";
const ASSUME_ROLE_DURATION_SECONDS: u32 = 3600;

/// Temporary credentials are refreshed this long before they expire.
const REFRESH_MARGIN_SECONDS: i64 = 300;

struct CachedCredentials {
    credentials: Credentials,
    expiration: DateTime<Utc>,
}

/// Exchanges the credentials of `source` for temporary credentials of a RAM role.
pub struct AssumeRoleCredentialProvider {
    source: Arc<dyn CredentialProvider>,
    sts: Arc<dyn IdentityApi>,
    role_arn: String,
    cache: Mutex<Option<CachedCredentials>>,
}

impl AssumeRoleCredentialProvider {
    pub fn new(
        source: Arc<dyn CredentialProvider>,
        sts: Arc<dyn IdentityApi>,
        role_arn: String,
    ) -> Self {
        Self {
            source,
            sts,
            role_arn,
            cache: Mutex::new(None),
        }
    }
}

#[async_trait]
impl CredentialProvider for AssumeRoleCredentialProvider {
    async fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.as_ref() {
            if cached.expiration - Duration::seconds(REFRESH_MARGIN_SECONDS) > Utc::now() {
                return Ok(cached.credentials.clone());
            }
        }

        let source = self.source.credentials().await?;

        tracing::info!(role_arn = %self.role_arn, "Assuming role.");

        let assumed = self
            .sts
            .assume_role(
                &source,
                &self.role_arn,
                ASSUME_ROLE_SESSION_NAME,
                ASSUME_ROLE_DURATION_SECONDS,
            )
            .await
            .map_err(|source| CredentialsError::AssumeRole {
                role_arn: self.role_arn.clone(),
                source,
            })?;

        // an unparsable expiration is treated as already expired
        let expiration = DateTime::parse_from_rfc3339(&assumed.expiration)
            .map(|expiration| expiration.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let credentials = Credentials {
            access_key_id: assumed.access_key_id,
            access_key_secret: assumed.access_key_secret,
            security_token: Some(assumed.security_token),
        };

        *cache = Some(CachedCredentials {
            credentials: credentials.clone(),
            expiration,
        });

        Ok(credentials)
    }
}
