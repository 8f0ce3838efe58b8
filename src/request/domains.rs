use super::common::Region;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Protocols a custom domain accepts.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonSchema)]
pub enum Protocol {
    #[serde(rename = "HTTP")]
    Http,
    #[serde(rename = "HTTPS")]
    Https,
    #[serde(rename = "HTTP,HTTPS")]
    HttpAndHttps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn all() -> Vec<HttpMethod> {
        vec![
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
            HttpMethod::Head,
            HttpMethod::Options,
        ]
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
pub struct RewriteRule {
    pub r#match: String,
    pub replacement: String,
}

/// Rewrite rules. Use one of exact, wildcard or regex matching
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RewriteConfig {
    #[serde(default)]
    pub equal_rules: Vec<RewriteRule>,

    #[serde(default)]
    pub wildcard_rules: Vec<RewriteRule>,

    #[serde(default)]
    pub regex_rules: Vec<RewriteRule>,
}

/// A route from a path to a function.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PathConfig {
    /// HTTP path, e.g. /api/ or /api/*
    pub path: String,

    /// Function the path routes to
    pub function_name: String,

    /// Version or alias the path routes to. Defaults to LATEST
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,

    /// Defaults to all methods
    #[serde(default = "HttpMethod::all")]
    pub methods: Vec<HttpMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite_config: Option<RewriteConfig>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
pub struct RouteConfig {
    pub routes: Vec<PathConfig>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    Anonymous,
    Function,
}

/// Authentication of incoming requests. Defaults to anonymous
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,
}

/// Certificate, required for HTTPS
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CertConfig {
    pub cert_name: String,

    /// PEM encoded private key
    pub private_key: String,

    /// PEM encoded certificate chain, intermediate certificates included
    pub certificate: String,
}

/// TLS settings, required for HTTPS
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TlsConfig {
    /// One of TLSv1.0, TLSv1.1, TLSv1.2, TLSv1.3
    pub min_version: String,

    /// One of TLSv1.0, TLSv1.1, TLSv1.2, TLSv1.3
    pub max_version: String,

    pub cipher_suites: Vec<String>,
}

/// Web application firewall
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
pub struct WafConfig {
    pub enable: bool,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomainConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,

    pub route_config: RouteConfig,

    #[serde(default)]
    pub auth_config: AuthConfig,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert_config: Option<CertConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls_config: Option<TlsConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waf_config: Option<WafConfig>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
pub struct CreateCustomDomainConfig {
    /// Domain name without a scheme, e.g. example.com
    pub domain: String,

    #[serde(flatten)]
    pub config: CustomDomainConfig,
}

/// Addresses a single custom domain.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
pub struct DomainRequest {
    #[serde(default)]
    pub region: Region,

    /// Domain name without a scheme, e.g. example.com
    pub domain: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomDomainRequest {
    #[serde(default)]
    pub region: Region,

    /// Domain name without a scheme, e.g. example.com
    pub domain: String,

    pub update_custom_domain_config: CustomDomainConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomDomainRequest {
    #[serde(default)]
    pub region: Region,

    pub create_custom_domain_config: CreateCustomDomainConfig,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_methods_default_to_all() {
        let config: CustomDomainConfig = serde_json::from_value(json!({
            "protocol": "HTTP,HTTPS",
            "routeConfig": { "routes": [{ "path": "/*", "functionName": "my-func" }] }
        }))
        .unwrap();

        assert_eq!(config.protocol, Some(Protocol::HttpAndHttps));
        assert_eq!(config.route_config.routes[0].methods.len(), 6);
        assert_eq!(config.auth_config, AuthConfig::default());
    }

    #[test]
    fn test_create_config_flattens_domain() {
        let request: CreateCustomDomainRequest = serde_json::from_value(json!({
            "region": "cn-shanghai",
            "createCustomDomainConfig": {
                "domain": "example.com",
                "routeConfig": { "routes": [] },
                "authConfig": { "authType": "function" },
                "wafConfig": { "enable": true }
            }
        }))
        .unwrap();

        let config = request.create_custom_domain_config;
        assert_eq!(config.domain, "example.com");
        assert_eq!(config.config.auth_config.auth_type, Some(AuthType::Function));

        let value = serde_json::to_value(&config.config).unwrap();
        assert!(value.get("certConfig").is_none());
        assert_eq!(value["wafConfig"]["enable"], true);
    }
}
