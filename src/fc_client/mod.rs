use crate::acs::{AcsClient, AcsError, AcsRequest, ApiError};
use crate::consts::FC_API_VERSION;
use crate::credentials::Credentials;
use crate::request::domains::{CreateCustomDomainConfig, CustomDomainConfig};
use crate::request::functions::ListFunctionsRequest;
use crate::request::versions::ListVersionsRequest;
use crate::request::Region;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::{Error as SerdeJsonError, Value};
use thiserror::Error as ThisError;

mod bodies;

use bodies::{CreateCustomDomainBody, PublishVersionBody};

pub type FcResult<T> = Result<T, FcError>;

#[derive(ThisError, Debug)]
pub enum FcError {
    #[error("Request error: {0}")]
    RequestError(
        #[source]
        #[from]
        AcsError,
    ),
    #[error("Serializing error: {0}")]
    SerializingError(#[source] SerdeJsonError),
    #[error("Deserializing error: {0}")]
    DeserializingError(#[source] SerdeJsonError),
    #[error("Function Compute: not found: {0}")]
    NotFound(#[source] ApiError),
    #[error("Function Compute: bad request: {0}")]
    BadRequest(#[source] ApiError),
    #[error("Function Compute: forbidden: {0}")]
    Forbidden(#[source] ApiError),
    #[error("Function Compute: conflict: {0}")]
    Conflict(#[source] ApiError),
    #[error("Function Compute: {0}")]
    Unexpected(#[source] ApiError),
}

impl From<ApiError> for FcError {
    fn from(error: ApiError) -> Self {
        match error.status {
            StatusCode::NOT_FOUND => FcError::NotFound(error),
            StatusCode::BAD_REQUEST => FcError::BadRequest(error),
            StatusCode::FORBIDDEN => FcError::Forbidden(error),
            StatusCode::CONFLICT => FcError::Conflict(error),
            _ => FcError::Unexpected(error),
        }
    }
}

impl FcError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FcError::NotFound(_))
    }
}

/// The Function Compute 3.0 control plane.
///
/// Responses are handed back as raw JSON, they are only ever rendered to the caller.
#[async_trait]
pub trait FunctionComputeApi: Send + Sync {
    async fn get_function(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
    ) -> FcResult<Value>;

    async fn list_functions(
        &self,
        credentials: &Credentials,
        request: &ListFunctionsRequest,
    ) -> FcResult<Value>;

    async fn delete_function(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
    ) -> FcResult<()>;

    async fn get_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        domain: &str,
    ) -> FcResult<Value>;

    async fn create_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        config: &CreateCustomDomainConfig,
    ) -> FcResult<Value>;

    async fn update_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        domain: &str,
        config: &CustomDomainConfig,
    ) -> FcResult<Value>;

    async fn delete_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        domain: &str,
    ) -> FcResult<()>;

    async fn publish_function_version(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
        description: Option<&str>,
    ) -> FcResult<Value>;

    async fn list_function_versions(
        &self,
        credentials: &Credentials,
        request: &ListVersionsRequest,
    ) -> FcResult<Value>;

    async fn delete_function_version(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
        version_id: &str,
    ) -> FcResult<()>;
}

pub struct FcClient {
    client: AcsClient,
}

impl FcClient {
    pub fn new(client: AcsClient) -> Self {
        Self { client }
    }

    fn host(region: Region) -> String {
        format!("fcv3.{region}.aliyuncs.com")
    }

    fn request<const N: usize>(
        method: Method,
        region: Region,
        action: &str,
        path: [&str; N],
    ) -> AcsRequest {
        AcsRequest::new(method, Self::host(region), action, FC_API_VERSION)
            .path(std::iter::once(FC_API_VERSION).chain(path))
    }

    fn with_body<T: Serialize>(request: AcsRequest, body: &T) -> FcResult<AcsRequest> {
        request.json(body).map_err(|err| match err {
            AcsError::SerializingError(err) => FcError::SerializingError(err),
            err => FcError::RequestError(err),
        })
    }

    async fn call(&self, credentials: &Credentials, request: AcsRequest) -> FcResult<String> {
        let text = self
            .client
            .send(credentials, request)
            .await?
            .into_result()?;

        Ok(text)
    }

    async fn call_json(&self, credentials: &Credentials, request: AcsRequest) -> FcResult<Value> {
        let text = self.call(credentials, request).await?;

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(FcError::DeserializingError)
    }
}

#[async_trait]
impl FunctionComputeApi for FcClient {
    async fn get_function(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
    ) -> FcResult<Value> {
        let request = Self::request(
            Method::GET,
            region,
            "GetFunction",
            ["functions", function_name],
        );

        self.call_json(credentials, request).await
    }

    async fn list_functions(
        &self,
        credentials: &Credentials,
        request: &ListFunctionsRequest,
    ) -> FcResult<Value> {
        let tags = request
            .tags
            .as_ref()
            .filter(|tags| !tags.is_empty())
            .map(serde_json::to_string)
            .transpose()
            .map_err(FcError::SerializingError)?;

        let acs_request = Self::request(
            Method::GET,
            request.region,
            "ListFunctions",
            ["functions"],
        )
        .query("limit", request.limit)
        .query_opt("prefix", request.prefix.as_ref())
        .query_opt("nextToken", request.next_token.as_ref())
        .query_opt("runtime", request.runtime.as_ref())
        .query_opt("tags", tags);

        self.call_json(credentials, acs_request).await
    }

    async fn delete_function(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
    ) -> FcResult<()> {
        let request = Self::request(
            Method::DELETE,
            region,
            "DeleteFunction",
            ["functions", function_name],
        );

        self.call(credentials, request).await.map(|_| ())
    }

    async fn get_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        domain: &str,
    ) -> FcResult<Value> {
        let request = Self::request(
            Method::GET,
            region,
            "GetCustomDomain",
            ["custom-domains", domain],
        );

        self.call_json(credentials, request).await
    }

    async fn create_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        config: &CreateCustomDomainConfig,
    ) -> FcResult<Value> {
        let request = Self::request(
            Method::POST,
            region,
            "CreateCustomDomain",
            ["custom-domains"],
        );
        let request = Self::with_body(request, &CreateCustomDomainBody::from(config))?;

        self.call_json(credentials, request).await
    }

    async fn update_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        domain: &str,
        config: &CustomDomainConfig,
    ) -> FcResult<Value> {
        let request = Self::request(
            Method::PUT,
            region,
            "UpdateCustomDomain",
            ["custom-domains", domain],
        );
        let request = Self::with_body(request, config)?;

        self.call_json(credentials, request).await
    }

    async fn delete_custom_domain(
        &self,
        credentials: &Credentials,
        region: Region,
        domain: &str,
    ) -> FcResult<()> {
        let request = Self::request(
            Method::DELETE,
            region,
            "DeleteCustomDomain",
            ["custom-domains", domain],
        );

        self.call(credentials, request).await.map(|_| ())
    }

    async fn publish_function_version(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
        description: Option<&str>,
    ) -> FcResult<Value> {
        let request = Self::request(
            Method::POST,
            region,
            "PublishFunctionVersion",
            ["functions", function_name, "versions"],
        );
        let request = Self::with_body(request, &PublishVersionBody { description })?;

        self.call_json(credentials, request).await
    }

    async fn list_function_versions(
        &self,
        credentials: &Credentials,
        request: &ListVersionsRequest,
    ) -> FcResult<Value> {
        let acs_request = Self::request(
            Method::GET,
            request.region,
            "ListFunctionVersions",
            ["functions", request.function_name.as_str(), "versions"],
        )
        .query("direction", request.direction.as_str())
        .query_opt("limit", request.limit)
        .query_opt("nextToken", request.next_token.as_ref());

        self.call_json(credentials, acs_request).await
    }

    async fn delete_function_version(
        &self,
        credentials: &Credentials,
        region: Region,
        function_name: &str,
        version_id: &str,
    ) -> FcResult<()> {
        let request = Self::request(
            Method::DELETE,
            region,
            "DeleteFunctionVersion",
            ["functions", function_name, "versions", version_id],
        );

        self.call(credentials, request).await.map(|_| ())
    }
}
