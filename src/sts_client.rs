use crate::acs::{AcsClient, AcsError, AcsRequest, ApiError};
use crate::consts::STS_API_VERSION;
use crate::credentials::Credentials;
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Error as SerdeJsonError;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum StsError {
    #[error("Request error: {0}")]
    RequestError(
        #[source]
        #[from]
        AcsError,
    ),
    #[error("STS: {0}")]
    ApiError(
        #[source]
        #[from]
        ApiError,
    ),
    #[error("Deserializing error: {0}")]
    DeserializingError(#[source] SerdeJsonError),
    #[error("STS: caller identity carries no account id")]
    EmptyAccountId,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct CallerIdentity {
    pub account_id: String,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub identity_type: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct AssumedCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: String,
    pub expiration: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "PascalCase")]
struct AssumeRoleResponse {
    credentials: AssumedCredentials,
}

/// The security token service: who am I, and role assumption.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn get_caller_identity(&self, credentials: &Credentials)
        -> Result<CallerIdentity, StsError>;

    async fn assume_role(
        &self,
        credentials: &Credentials,
        role_arn: &str,
        session_name: &str,
        duration_seconds: u32,
    ) -> Result<AssumedCredentials, StsError>;
}

pub struct StsClient {
    client: AcsClient,
    host: String,
}

impl StsClient {
    pub fn new(client: AcsClient, region: &str) -> Self {
        Self {
            client,
            host: format!("sts.{region}.aliyuncs.com"),
        }
    }

    fn request(&self, action: &str) -> AcsRequest {
        AcsRequest::new(Method::POST, self.host.clone(), action, STS_API_VERSION)
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        credentials: &Credentials,
        request: AcsRequest,
    ) -> Result<T, StsError> {
        let text = self
            .client
            .send(credentials, request)
            .await?
            .into_result()?;

        serde_json::from_str(&text).map_err(StsError::DeserializingError)
    }
}

#[async_trait]
impl IdentityApi for StsClient {
    async fn get_caller_identity(
        &self,
        credentials: &Credentials,
    ) -> Result<CallerIdentity, StsError> {
        let identity: CallerIdentity = self
            .call(credentials, self.request("GetCallerIdentity"))
            .await?;

        if identity.account_id.is_empty() {
            return Err(StsError::EmptyAccountId);
        }

        Ok(identity)
    }

    async fn assume_role(
        &self,
        credentials: &Credentials,
        role_arn: &str,
        session_name: &str,
        duration_seconds: u32,
    ) -> Result<AssumedCredentials, StsError> {
        let request = self
            .request("AssumeRole")
            .query("RoleArn", role_arn)
            .query("RoleSessionName", session_name)
            .query("DurationSeconds", duration_seconds);

        let response: AssumeRoleResponse = self.call(credentials, request).await?;

        Ok(response.credentials)
    }
}
