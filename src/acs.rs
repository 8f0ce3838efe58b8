//! `ACS3-HMAC-SHA256` request signing shared by the control plane clients.

use crate::credentials::Credentials;
use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use itertools::Itertools;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Error as ReqwestError, Method, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Error as SerdeJsonError;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;
use url::{ParseError as UrlParseError, Url};

pub const SIGNATURE_ALGORITHM: &str = "ACS3-HMAC-SHA256";

const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// RFC 3986 unreserved characters stay as they are.
const RFC3986: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub fn percent_encode(value: &str) -> String {
    utf8_percent_encode(value, RFC3986).to_string()
}

pub fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[derive(ThisError, Debug)]
pub enum AcsError {
    #[error("Serializing error: {0}")]
    SerializingError(
        #[source]
        #[from]
        SerdeJsonError,
    ),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(
        #[source]
        #[from]
        UrlParseError,
    ),
    #[error("Invalid signing key: {0}")]
    InvalidSigningKey(#[source] InvalidLength),
    #[error("HTTP build error: {0}")]
    HttpBuilderError(#[source] ReqwestError),
    #[error("HTTP error: {0}")]
    HttpError(#[source] ReqwestError),
}

/// Error body returned by the control plane on a non 2xx status.
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: String,
}

#[derive(ThisError, Debug, Clone)]
#[error("status {status}, code {:?}, message {:?}, request id {:?}", .body.code, .body.message, .body.request_id)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ApiErrorBody,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }
}

/// A raw control plane answer.
#[derive(Debug)]
pub struct AcsResponse {
    pub status: StatusCode,
    pub text: String,
}

impl AcsResponse {
    /// Splits the answer into the body of a successful call or an [`ApiError`].
    pub fn into_result(self) -> Result<String, ApiError> {
        if self.status.is_success() {
            return Ok(self.text);
        }

        let body = serde_json::from_str::<ApiErrorBody>(&self.text).unwrap_or_else(|_| {
            ApiErrorBody {
                message: self.text.clone(),
                ..Default::default()
            }
        });

        Err(ApiError {
            status: self.status,
            body,
        })
    }
}

/// One API call before it is signed.
#[derive(Debug, Clone)]
pub struct AcsRequest {
    method: Method,
    host: String,
    /// Path segments, unencoded
    segments: Vec<String>,
    query: BTreeMap<String, String>,
    action: String,
    version: String,
    body: Option<Vec<u8>>,
}

impl AcsRequest {
    pub fn new(method: Method, host: impl Into<String>, action: &str, version: &str) -> Self {
        Self {
            method,
            host: host.into(),
            segments: Vec::new(),
            query: BTreeMap::new(),
            action: action.to_string(),
            version: version.to_string(),
            body: None,
        }
    }

    pub fn path<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.insert(key.to_string(), value.to_string());
        self
    }

    pub fn query_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.query(key, value),
            None => self,
        }
    }

    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self, AcsError> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    pub fn canonical_uri(&self) -> String {
        if self.segments.is_empty() {
            return String::from("/");
        }

        self.segments
            .iter()
            .map(|segment| format!("/{}", percent_encode(segment)))
            .collect()
    }

    pub fn canonical_query(&self) -> String {
        self.query
            .iter()
            .map(|(key, value)| (percent_encode(key), percent_encode(value)))
            .sorted()
            .map(|(key, value)| format!("{key}={value}"))
            .join("&")
    }

    fn payload(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    /// Headers that take part in the signature, keyed in lowercase.
    pub fn signed_headers(
        &self,
        credentials: &Credentials,
        date: &str,
        nonce: &str,
    ) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();

        headers.insert(String::from("host"), self.host.clone());
        headers.insert(String::from("x-acs-action"), self.action.clone());
        headers.insert(String::from("x-acs-version"), self.version.clone());
        headers.insert(String::from("x-acs-date"), date.to_string());
        headers.insert(String::from("x-acs-signature-nonce"), nonce.to_string());
        headers.insert(
            String::from("x-acs-content-sha256"),
            hex_sha256(self.payload()),
        );

        if self.body.is_some() {
            headers.insert(
                String::from("content-type"),
                String::from("application/json"),
            );
        }

        if let Some(token) = &credentials.security_token {
            headers.insert(String::from("x-acs-security-token"), token.clone());
        }

        headers
    }

    pub fn canonical_request(&self, headers: &BTreeMap<String, String>) -> String {
        let canonical_headers: String = headers
            .iter()
            .map(|(key, value)| format!("{key}:{}\n", value.trim()))
            .collect();

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.method.as_str(),
            self.canonical_uri(),
            self.canonical_query(),
            canonical_headers,
            headers.keys().join(";"),
            hex_sha256(self.payload()),
        )
    }

    pub fn authorization(
        &self,
        credentials: &Credentials,
        headers: &BTreeMap<String, String>,
    ) -> Result<String, AcsError> {
        let string_to_sign = format!(
            "{SIGNATURE_ALGORITHM}\n{}",
            hex_sha256(self.canonical_request(headers).as_bytes())
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(credentials.access_key_secret.as_bytes())
            .map_err(AcsError::InvalidSigningKey)?;
        mac.update(string_to_sign.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());

        Ok(format!(
            "{SIGNATURE_ALGORITHM} Credential={},SignedHeaders={},Signature={signature}",
            credentials.access_key_id,
            headers.keys().join(";"),
        ))
    }

    pub fn url(&self) -> Result<Url, AcsError> {
        let mut url = Url::parse(&format!("https://{}{}", self.host, self.canonical_uri()))?;

        let query = self.canonical_query();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }

        Ok(url)
    }

    /// Signs the request with a fresh date and nonce and builds it.
    pub fn build(
        self,
        client: &reqwest::Client,
        credentials: &Credentials,
    ) -> Result<reqwest::Request, AcsError> {
        let date = chrono::Utc::now().format(DATE_FORMAT).to_string();
        let nonce = uuid::Uuid::new_v4().to_string();

        let headers = self.signed_headers(credentials, &date, &nonce);
        let authorization = self.authorization(credentials, &headers)?;
        let url = self.url()?;

        // reqwest derives the host header from the url
        let mut builder = client
            .request(self.method.clone(), url)
            .header("authorization", authorization);

        for (key, value) in headers.iter().filter(|(key, _)| *key != "host") {
            builder = builder.header(key.as_str(), value.as_str());
        }

        if let Some(body) = self.body {
            builder = builder.body(body);
        }

        builder.build().map_err(AcsError::HttpBuilderError)
    }
}

/// Sends signed requests. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct AcsClient {
    client: reqwest::Client,
}

impl AcsClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn send(
        &self,
        credentials: &Credentials,
        request: AcsRequest,
    ) -> Result<AcsResponse, AcsError> {
        let action = request.action.clone();
        let req = request.build(&self.client, credentials)?;

        tracing::debug!(%action, url = %req.url(), "Sending request.");

        let resp = self
            .client
            .execute(req)
            .await
            .map_err(AcsError::HttpError)?;

        let status = resp.status();
        let text = resp.text().await.map_err(AcsError::HttpError)?;

        tracing::debug!(%action, %status, "Received response.");

        Ok(AcsResponse { status, text })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials {
            access_key_id: String::from("YourAccessKeyId"),
            access_key_secret: String::from("YourAccessKeySecret"),
            security_token: None,
        }
    }

    fn request() -> AcsRequest {
        AcsRequest::new(
            Method::GET,
            "fcv3.cn-hangzhou.aliyuncs.com",
            "ListFunctions",
            "2023-03-30",
        )
        .path(["2023-03-30", "functions"])
        .query("prefix", "my func")
        .query("limit", 50)
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode("a b*c/d"), "a%20b%2Ac%2Fd");
        assert_eq!(percent_encode("[{\"key\":\"k\"}]"), "%5B%7B%22key%22%3A%22k%22%7D%5D");
    }

    #[test]
    fn test_canonical_parts() {
        let request = request();

        assert_eq!(request.canonical_uri(), "/2023-03-30/functions");
        assert_eq!(request.canonical_query(), "limit=50&prefix=my%20func");
        assert_eq!(
            AcsRequest::new(Method::POST, "sts.cn-hangzhou.aliyuncs.com", "GetCallerIdentity", "2015-04-01")
                .canonical_uri(),
            "/"
        );
    }

    #[test]
    fn test_signature_is_stable() {
        let request = request();
        let credentials = credentials();
        let headers = request.signed_headers(
            &credentials,
            "2023-10-26T10:22:32Z",
            "3156853299f313e23d1673dc12e1703d",
        );

        assert_eq!(
            headers.keys().join(";"),
            "host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version"
        );
        assert_eq!(
            headers["x-acs-content-sha256"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );

        let authorization = request.authorization(&credentials, &headers).unwrap();
        assert_eq!(authorization, SIGNED_LIST_FUNCTIONS);
    }

    #[test]
    fn test_security_token_is_signed() {
        let mut credentials = credentials();
        credentials.security_token = Some(String::from("token"));

        let headers = request().signed_headers(&credentials, "2023-10-26T10:22:32Z", "nonce");
        assert_eq!(headers["x-acs-security-token"], "token");
    }

    #[test]
    fn test_url_carries_encoded_query() {
        let url = request().url().unwrap();
        assert_eq!(
            url.as_str(),
            "https://fcv3.cn-hangzhou.aliyuncs.com/2023-03-30/functions?limit=50&prefix=my%20func"
        );
    }

    #[test]
    fn test_error_body_parsing() {
        let response = AcsResponse {
            status: StatusCode::NOT_FOUND,
            text: String::from(
                r#"{"Code":"FunctionNotFound","Message":"function 'x' does not exist","RequestId":"1-2"}"#,
            ),
        };

        let error = response.into_result().unwrap_err();
        assert!(error.is_not_found());
        assert_eq!(error.body.code, "FunctionNotFound");
        assert_eq!(error.body.request_id, "1-2");

        let response = AcsResponse {
            status: StatusCode::BAD_GATEWAY,
            text: String::from("upstream down"),
        };
        let error = response.into_result().unwrap_err();
        assert!(!error.is_not_found());
        assert_eq!(error.body.message, "upstream down");
    }

    const SIGNED_LIST_FUNCTIONS: &str = "ACS3-HMAC-SHA256 Credential=YourAccessKeyId,SignedHeaders=host;x-acs-action;x-acs-content-sha256;x-acs-date;x-acs-signature-nonce;x-acs-version,Signature=28216d5104eb0e1b23a195d17c3dc7075f5afae8196300dbb1a68c46f03a1dac";
}
