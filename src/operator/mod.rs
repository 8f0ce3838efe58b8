pub mod errors;
pub mod response;

use crate::acs::AcsClient;
use crate::config::ServerConfig;
use crate::credentials::{
    AccountCredentials, AssumeRoleCredentialProvider, CredentialProvider, EnvCredentialProvider,
};
use crate::descriptor::{
    self, auto_domain_name, merge_file, normalize_env, normalize_layers, validate_function_name,
    DeploymentDescriptor,
};
use crate::download::{ArtifactFetcher, HttpArtifactFetcher};
use crate::engine::{DeploymentEngine, ServerlessDevsEngine};
use crate::fc_client::{FcClient, FunctionComputeApi};
use crate::locks::DeployLocks;
use crate::request::domains::{CreateCustomDomainRequest, DomainRequest, UpdateCustomDomainRequest};
use crate::request::functions::{
    CreateFunctionRequest, FunctionRequest, ListFunctionsRequest, UpdateFunctionRequest,
};
use crate::request::versions::{DeleteVersionRequest, ListVersionsRequest, PublishVersionRequest};
use crate::request::Region;
use crate::sts_client::{IdentityApi, StsClient, StsError};
use crate::workspace::Workspace;
use errors::ToolError;
use response::ToolResponse;
use serde_json::Value;
use std::sync::Arc;
use tracing::{trace_span, Instrument};

type ToolResult = Result<String, ToolError>;

/// The collaborators a [`FunctionOperator`] talks to.
#[derive(Clone)]
pub struct Backends {
    pub credentials: Arc<dyn CredentialProvider>,
    pub identity: Arc<dyn IdentityApi>,
    pub fc: Arc<dyn FunctionComputeApi>,
    pub engine: Arc<dyn DeploymentEngine>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
}

impl Backends {
    /// Wires the real clients.
    pub fn from_config(config: &ServerConfig) -> Self {
        let acs = AcsClient::new();
        let sts = Arc::new(StsClient::new(acs.clone(), &config.identity_region));

        let credentials: Arc<dyn CredentialProvider> = match &config.role_arn {
            Some(role_arn) => Arc::new(AssumeRoleCredentialProvider::new(
                Arc::new(EnvCredentialProvider),
                sts.clone(),
                role_arn.clone(),
            )),
            None => Arc::new(EnvCredentialProvider),
        };

        Self {
            credentials,
            identity: sts,
            fc: Arc::new(FcClient::new(acs)),
            engine: Arc::new(ServerlessDevsEngine::new(config.engine_bin.clone())),
            fetcher: Arc::new(HttpArtifactFetcher::new()),
        }
    }
}

/// Runs the tool operations: resolves credentials and identity, prepares code,
/// drives the control plane and the deployment engine.
pub struct FunctionOperator {
    config: ServerConfig,
    backends: Backends,
    locks: DeployLocks,
}

fn to_json(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

fn is_present(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}

/// A custom domain routes only to `function_name`.
fn routes_only_to(domain: &Value, function_name: &str) -> bool {
    domain
        .pointer("/routeConfig/routes")
        .and_then(Value::as_array)
        .is_some_and(|routes| {
            routes.len() == 1
                && routes[0].get("functionName").and_then(Value::as_str) == Some(function_name)
        })
}

impl FunctionOperator {
    pub fn new(config: ServerConfig, backends: Backends) -> Self {
        let locks = DeployLocks::new(config.serialize_deploys);

        Self {
            config,
            backends,
            locks,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Credentials of the caller plus the account they belong to.
    async fn session(&self) -> Result<AccountCredentials, ToolError> {
        let credentials = self
            .backends
            .credentials
            .credentials()
            .await
            .map_err(ToolError::Credentials)?;

        let identity = self
            .backends
            .identity
            .get_caller_identity(&credentials)
            .await
            .map_err(ToolError::Identity)?;

        if identity.account_id.is_empty() {
            return Err(ToolError::Identity(StsError::EmptyAccountId));
        }

        tracing::debug!(account_id = %identity.account_id, "Resolved account.");

        Ok(AccountCredentials {
            account_id: identity.account_id,
            credentials,
        })
    }

    /// Where the code of a deploy lives on this machine.
    ///
    /// In remote mode `code_uri` is downloaded into the workspace, otherwise
    /// `location` has to exist. `None` when the code is optional and not given.
    async fn resolve_code(
        &self,
        location: Option<&str>,
        code_uri: Option<&str>,
        workspace: &Workspace,
        required: bool,
    ) -> Result<Option<String>, ToolError> {
        if self.config.remote_mode {
            let Some(code_uri) = is_present(code_uri) else {
                if required {
                    return Err(ToolError::Validation(String::from(
                        "codeUri is required in remote mode",
                    )));
                }
                return Ok(None);
            };

            let path = self
                .backends
                .fetcher
                .fetch(code_uri, &workspace.artifact_path())
                .await?;

            return Ok(Some(path.to_string_lossy().into_owned()));
        }

        let Some(location) = is_present(location) else {
            if required {
                return Err(ToolError::Validation(String::from(
                    "location, the root path of the local code project, is required",
                )));
            }
            return Ok(None);
        };

        if !tokio::fs::try_exists(location).await.unwrap_or(false) {
            return Err(ToolError::Validation(format!(
                "location {location} does not exist"
            )));
        }

        Ok(Some(location.to_string()))
    }

    async fn workspace(&self) -> Result<Workspace, ToolError> {
        Workspace::create(&self.config.workspace_root, self.config.keep_workspaces)
            .await
            .map_err(ToolError::Workspace)
    }

    fn validate_name(function_name: &str) -> Result<(), ToolError> {
        if function_name.is_empty() {
            return Err(ToolError::Validation(String::from(
                "functionName is required",
            )));
        }

        validate_function_name(function_name)?;

        Ok(())
    }

    pub async fn put_function(&self, request: CreateFunctionRequest) -> ToolResponse {
        let function_name = request.function_name.clone();
        let region = request.region;

        self.put_function_inner(request)
            .instrument(trace_span!("PutFunction", %function_name, %region))
            .await
            .into()
    }

    async fn put_function_inner(&self, request: CreateFunctionRequest) -> ToolResult {
        let account = self.session().await?;

        Self::validate_name(&request.function_name)?;

        let _guard = self
            .locks
            .acquire(request.region, &request.function_name)
            .await;

        let workspace = self.workspace().await?;
        let result = self.deploy_new(&request, &account, &workspace).await;
        workspace.release().await;

        result
    }

    async fn deploy_new(
        &self,
        request: &CreateFunctionRequest,
        account: &AccountCredentials,
        workspace: &Workspace,
    ) -> ToolResult {
        let code = self
            .resolve_code(
                request.location.as_deref(),
                request.code_uri.as_deref(),
                workspace,
                true,
            )
            .await?
            .ok_or_else(|| ToolError::Validation(String::from("code is required")))?;

        let layers = normalize_layers(request.layers.clone(), request.region.as_str());
        let env = normalize_env(Some(request.environment_variables.clone()));

        let props = descriptor::build(request, &code, &account.account_id, layers, env);
        props.validate()?;

        let descriptor_path = workspace.descriptor_path();
        DeploymentDescriptor::single(props.clone())
            .save(&descriptor_path)
            .await?;

        tracing::info!(path = %descriptor_path.display(), "Wrote descriptor.");

        let output = self
            .backends
            .engine
            .deploy(&request.function_name, &descriptor_path, account, &props)
            .await?;

        tracing::info!("Deployment finished.");

        Ok(format!("Deployment finished. output: {output}"))
    }

    pub async fn update_function(&self, request: UpdateFunctionRequest) -> ToolResponse {
        let function_name = request.function_name.clone();
        let region = request.region;

        self.update_function_inner(request)
            .instrument(trace_span!("UpdateFunction", %function_name, %region))
            .await
            .into()
    }

    async fn update_function_inner(&self, request: UpdateFunctionRequest) -> ToolResult {
        let account = self.session().await?;

        Self::validate_name(&request.function_name)?;

        let _guard = self
            .locks
            .acquire(request.region, &request.function_name)
            .await;

        let workspace = self.workspace().await?;
        let result = self.deploy_existing(&request, &account, &workspace).await;
        workspace.release().await;

        result
    }

    async fn deploy_existing(
        &self,
        request: &UpdateFunctionRequest,
        account: &AccountCredentials,
        workspace: &Workspace,
    ) -> ToolResult {
        let function_name = request.function_name.as_str();
        let region = request.region;

        let new_code = self
            .resolve_code(
                request.location.as_deref(),
                request.code_uri.as_deref(),
                workspace,
                false,
            )
            .await?;

        self.backends
            .fc
            .get_function(&account.credentials, region, function_name)
            .await
            .map_err(ToolError::function_lookup("GetFunction", function_name, region))?;

        let synced = self
            .backends
            .engine
            .sync(workspace.path(), region, function_name, account)
            .instrument(trace_span!("Sync"))
            .await?;

        tracing::info!(path = %synced.descriptor_path.display(), "Synced remote configuration.");

        let props = merge_file(
            &synced.descriptor_path,
            new_code.as_deref(),
            &synced.code_path.to_string_lossy(),
            request,
        )
        .await?;

        let output = self
            .backends
            .engine
            .deploy(function_name, &synced.descriptor_path, account, &props)
            .await?;

        tracing::info!("Deployment finished.");

        Ok(format!("Deployment finished. output: {output}"))
    }

    pub async fn get_function(&self, request: FunctionRequest) -> ToolResponse {
        let FunctionRequest {
            function_name,
            region,
        } = request;

        self.get_function_inner(&function_name, region)
            .instrument(trace_span!("GetFunction", %function_name, %region))
            .await
            .into()
    }

    async fn get_function_inner(&self, function_name: &str, region: Region) -> ToolResult {
        let account = self.session().await?;

        let mut info = self
            .backends
            .fc
            .get_function(&account.credentials, region, function_name)
            .await
            .map_err(ToolError::function_lookup("GetFunction", function_name, region))?;

        let domain_name = auto_domain_name(
            &account.account_id,
            function_name,
            region.as_str(),
            &self.config.base_domain,
        );

        match self
            .backends
            .fc
            .get_custom_domain(&account.credentials, region, &domain_name)
            .await
        {
            Ok(domain) => {
                if routes_only_to(&domain, function_name) {
                    if let Value::Object(info) = &mut info {
                        info.insert(String::from("domain"), Value::String(domain_name));
                    }
                }
            }
            Err(error) if error.is_not_found() => {
                tracing::debug!(%domain_name, "Function has no custom domain.");
            }
            Err(error) => return Err(ToolError::cloud("GetCustomDomain")(error)),
        }

        Ok(format!("Function info: {}", to_json(&info)))
    }

    pub async fn list_functions(&self, request: ListFunctionsRequest) -> ToolResponse {
        let region = request.region;

        self.list_functions_inner(request)
            .instrument(trace_span!("ListFunctions", %region))
            .await
            .into()
    }

    async fn list_functions_inner(&self, request: ListFunctionsRequest) -> ToolResult {
        let account = self.session().await?;

        let functions = self
            .backends
            .fc
            .list_functions(&account.credentials, &request)
            .await
            .map_err(ToolError::cloud("ListFunctions"))?;

        Ok(format!("Functions: {}", to_json(&functions)))
    }

    pub async fn delete_function(&self, request: FunctionRequest) -> ToolResponse {
        let FunctionRequest {
            function_name,
            region,
        } = request;

        self.delete_function_inner(&function_name, region)
            .instrument(trace_span!("DeleteFunction", %function_name, %region))
            .await
            .into()
    }

    /// Deletes the function, then its auto created custom domain.
    ///
    /// A failing domain deletion is reported, the function stays deleted.
    async fn delete_function_inner(&self, function_name: &str, region: Region) -> ToolResult {
        let account = self.session().await?;

        Self::validate_name(function_name)?;

        self.backends
            .fc
            .delete_function(&account.credentials, region, function_name)
            .await
            .map_err(ToolError::function_lookup("DeleteFunction", function_name, region))?;

        tracing::info!("Deleted function.");

        let domain = auto_domain_name(
            &account.account_id,
            function_name,
            region.as_str(),
            &self.config.base_domain,
        );

        self.backends
            .fc
            .delete_custom_domain(&account.credentials, region, &domain)
            .await
            .map_err(|source| ToolError::DomainCleanup {
                function_name: function_name.to_string(),
                domain: domain.clone(),
                source,
            })?;

        tracing::info!(%domain, "Deleted custom domain.");

        Ok(format!(
            "Function {function_name} deleted together with its custom domain {domain}."
        ))
    }

    pub async fn get_custom_domain(&self, request: DomainRequest) -> ToolResponse {
        let DomainRequest { region, domain } = request;

        let result: ToolResult = async {
            let account = self.session().await?;

            let config = self
                .backends
                .fc
                .get_custom_domain(&account.credentials, region, &domain)
                .await
                .map_err(ToolError::cloud("GetCustomDomain"))?;

            Ok(format!("Custom domain config: {}", to_json(&config)))
        }
        .instrument(trace_span!("GetCustomDomain", %domain, %region))
        .await;

        result.into()
    }

    pub async fn update_custom_domain(&self, request: UpdateCustomDomainRequest) -> ToolResponse {
        let UpdateCustomDomainRequest {
            region,
            domain,
            update_custom_domain_config,
        } = request;

        let result: ToolResult = async {
            let account = self.session().await?;

            let config = self
                .backends
                .fc
                .update_custom_domain(
                    &account.credentials,
                    region,
                    &domain,
                    &update_custom_domain_config,
                )
                .await
                .map_err(ToolError::cloud("UpdateCustomDomain"))?;

            tracing::info!("Updated custom domain.");

            Ok(format!(
                "Custom domain config updated. result: {}",
                to_json(&config)
            ))
        }
        .instrument(trace_span!("UpdateCustomDomain", %domain, %region))
        .await;

        result.into()
    }

    pub async fn create_custom_domain(&self, request: CreateCustomDomainRequest) -> ToolResponse {
        let CreateCustomDomainRequest {
            region,
            create_custom_domain_config,
        } = request;
        let domain = create_custom_domain_config.domain.clone();

        let result: ToolResult = async {
            let account = self.session().await?;

            if domain.contains("://") {
                return Err(ToolError::Validation(format!(
                    "domain {domain} must not carry a scheme"
                )));
            }

            let config = self
                .backends
                .fc
                .create_custom_domain(&account.credentials, region, &create_custom_domain_config)
                .await
                .map_err(ToolError::cloud("CreateCustomDomain"))?;

            tracing::info!("Created custom domain.");

            Ok(format!(
                "Custom domain config created. result: {}",
                to_json(&config)
            ))
        }
        .instrument(trace_span!("CreateCustomDomain", %domain, %region))
        .await;

        result.into()
    }

    pub async fn delete_custom_domain(&self, request: DomainRequest) -> ToolResponse {
        let DomainRequest { region, domain } = request;

        let result: ToolResult = async {
            let account = self.session().await?;

            self.backends
                .fc
                .delete_custom_domain(&account.credentials, region, &domain)
                .await
                .map_err(ToolError::cloud("DeleteCustomDomain"))?;

            tracing::info!("Deleted custom domain.");

            Ok(format!("Custom domain config of {domain} deleted."))
        }
        .instrument(trace_span!("DeleteCustomDomain", %domain, %region))
        .await;

        result.into()
    }

    pub async fn publish_version(&self, request: PublishVersionRequest) -> ToolResponse {
        let PublishVersionRequest {
            function_name,
            region,
            description,
        } = request;

        let result: ToolResult = async {
            let account = self.session().await?;

            let version = self
                .backends
                .fc
                .publish_function_version(
                    &account.credentials,
                    region,
                    &function_name,
                    description.as_deref(),
                )
                .await
                .map_err(ToolError::function_lookup(
                    "PublishFunctionVersion",
                    &function_name,
                    region,
                ))?;

            tracing::info!("Published version.");

            Ok(format!(
                "Function version published. result: {}",
                to_json(&version)
            ))
        }
        .instrument(trace_span!("PublishFunctionVersion", %function_name, %region))
        .await;

        result.into()
    }

    pub async fn list_versions(&self, request: ListVersionsRequest) -> ToolResponse {
        let function_name = request.function_name.clone();
        let region = request.region;

        let result: ToolResult = async {
            let account = self.session().await?;

            let versions = self
                .backends
                .fc
                .list_function_versions(&account.credentials, &request)
                .await
                .map_err(ToolError::function_lookup(
                    "ListFunctionVersions",
                    &function_name,
                    region,
                ))?;

            Ok(format!("Function versions: {}", to_json(&versions)))
        }
        .instrument(trace_span!("ListFunctionVersions", %function_name, %region))
        .await;

        result.into()
    }

    pub async fn delete_version(&self, request: DeleteVersionRequest) -> ToolResponse {
        let DeleteVersionRequest {
            function_name,
            region,
            version_id,
        } = request;

        let result: ToolResult = async {
            let account = self.session().await?;

            self.backends
                .fc
                .delete_function_version(&account.credentials, region, &function_name, &version_id)
                .await
                .map_err(ToolError::cloud("DeleteFunctionVersion"))?;

            tracing::info!(%version_id, "Deleted version.");

            Ok(format!(
                "Version {version_id} of function {function_name} deleted."
            ))
        }
        .instrument(trace_span!("DeleteFunctionVersion", %function_name, %region))
        .await;

        result.into()
    }
}

/// Renders the creation descriptor of `request` without touching the cloud.
pub fn render_create_descriptor(
    request: &CreateFunctionRequest,
    account_id: &str,
) -> Result<DeploymentDescriptor, ToolError> {
    FunctionOperator::validate_name(&request.function_name)?;

    let code = is_present(request.location.as_deref())
        .or(is_present(request.code_uri.as_deref()))
        .ok_or_else(|| ToolError::Validation(String::from("location or codeUri is required")))?;

    let layers = normalize_layers(request.layers.clone(), request.region.as_str());
    let env = normalize_env(Some(request.environment_variables.clone()));

    let props = descriptor::build(request, code, account_id, layers, env);
    props.validate()?;

    Ok(DeploymentDescriptor::single(props))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_routes_only_to() {
        let single = json!({ "routeConfig": { "routes": [{ "path": "/*", "functionName": "my-func" }] } });
        let other = json!({ "routeConfig": { "routes": [{ "path": "/*", "functionName": "other" }] } });
        let many = json!({ "routeConfig": { "routes": [
            { "path": "/a", "functionName": "my-func" },
            { "path": "/b", "functionName": "my-func" }
        ] } });

        assert!(routes_only_to(&single, "my-func"));
        assert!(!routes_only_to(&other, "my-func"));
        assert!(!routes_only_to(&many, "my-func"));
        assert!(!routes_only_to(&json!({}), "my-func"));
    }

    #[test]
    fn test_render_create_descriptor() {
        let request: CreateFunctionRequest = serde_json::from_value(json!({
            "location": "./code",
            "functionName": "my-func",
            "customRuntimeConfig": { "command": ["python3"] },
            "diskSize": 512,
            "instanceConcurrency": 10
        }))
        .unwrap();

        let descriptor = render_create_descriptor(&request, "1234").unwrap();
        let props = &descriptor.resources["my-func"].props;

        assert_eq!(props.code.as_deref(), Some("./code"));
        assert_eq!(props.layers.as_ref().unwrap().len(), 3);
        assert_eq!(props.environment_variables.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn test_render_rejects_bad_name() {
        let request: CreateFunctionRequest = serde_json::from_value(json!({
            "location": "./code",
            "functionName": "-bad",
            "customRuntimeConfig": { "command": ["python3"] },
            "diskSize": 512,
            "instanceConcurrency": 10
        }))
        .unwrap();

        assert!(matches!(
            render_create_descriptor(&request, "1234"),
            Err(ToolError::Descriptor(_))
        ));
    }
}
