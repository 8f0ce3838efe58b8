use crate::consts::{DISPLAY_NAME, PKG_VERSION, SERVER_NAME};
use crate::operator::FunctionOperator;
use crate::request::domains::{CreateCustomDomainRequest, DomainRequest, UpdateCustomDomainRequest};
use crate::request::functions::{
    CreateFunctionRequest, FunctionRequest, ListFunctionsRequest, UpdateFunctionRequest,
};
use crate::request::versions::{DeleteVersionRequest, ListVersionsRequest, PublishVersionRequest};
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    service::RequestContext,
    tool, tool_handler, tool_router, ErrorData as McpError, RoleServer, ServerHandler,
};
use std::sync::Arc;

pub const DEPLOY_PROMPT_NAME: &str = "deploy-custom-runtime-function";
const DEPLOY_PROMPT_DESCRIPTION: &str =
    "How to prepare, build and deploy code to a Function Compute custom runtime";
const DEPLOY_PROMPT: &str = include_str!("../static/custom_runtime_prompt.md");

const INSTRUCTIONS: &str = "Manage Alibaba Cloud Function Compute functions running on custom runtimes: \
deploy and update code, inspect and delete functions, route custom domains to them and publish versions. \
Use the deploy-custom-runtime-function prompt before the first deployment.";

#[derive(Clone)]
pub struct FcMcpServer {
    operator: Arc<FunctionOperator>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl FcMcpServer {
    pub fn new(operator: Arc<FunctionOperator>) -> Self {
        Self {
            operator,
            tool_router: Self::tool_router(),
        }
    }

    // ===== FUNCTIONS =====

    #[tool(
        name = "put-custom-runtime-function",
        description = "Create a Function Compute function on a custom runtime and deploy the given code to it. \
The code is an already built project: all dependencies have to be installed inside it. \
The function gets an HTTP custom domain routing every path to it."
    )]
    async fn put_custom_runtime_function(
        &self,
        Parameters(params): Parameters<CreateFunctionRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.put_function(params).await.into())
    }

    #[tool(
        name = "update-custom-runtime-function",
        description = "Update the code and/or configuration of an existing custom runtime function. \
Only supplied values change: 0, false, empty strings and empty lists are treated as not supplied \
and leave the current value untouched. Environment variables and layers are replaced as a whole."
    )]
    async fn update_custom_runtime_function(
        &self,
        Parameters(params): Parameters<UpdateFunctionRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.update_function(params).await.into())
    }

    #[tool(
        name = "get-function",
        description = "Get the full configuration of a function. Includes the URL of its custom domain as domain when it has one."
    )]
    async fn get_function(
        &self,
        Parameters(params): Parameters<FunctionRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.get_function(params).await.into())
    }

    #[tool(
        name = "list-functions",
        description = "List functions with their names and a part of their configuration. Use get-function for the full configuration."
    )]
    async fn list_functions(
        &self,
        Parameters(params): Parameters<ListFunctionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.list_functions(params).await.into())
    }

    #[tool(
        name = "delete-function",
        description = "Delete a function together with the custom domain that was created for it."
    )]
    async fn delete_function(
        &self,
        Parameters(params): Parameters<FunctionRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.delete_function(params).await.into())
    }

    // ===== CUSTOM DOMAINS =====

    #[tool(
        name = "get-custom-domain-config",
        description = "Get the routing configuration of a custom domain."
    )]
    async fn get_custom_domain_config(
        &self,
        Parameters(params): Parameters<DomainRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.get_custom_domain(params).await.into())
    }

    #[tool(
        name = "update-custom-domain-config",
        description = "Update the routing configuration of a custom domain: protocol, routes, authentication, certificate, TLS and WAF."
    )]
    async fn update_custom_domain_config(
        &self,
        Parameters(params): Parameters<UpdateCustomDomainRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.update_custom_domain(params).await.into())
    }

    #[tool(
        name = "create-custom-domain-config",
        description = "Create a custom domain and route its paths to functions. The domain must already resolve to Function Compute through a CNAME record."
    )]
    async fn create_custom_domain_config(
        &self,
        Parameters(params): Parameters<CreateCustomDomainRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.create_custom_domain(params).await.into())
    }

    #[tool(
        name = "delete-custom-domain-config",
        description = "Delete a custom domain and all of its routes."
    )]
    async fn delete_custom_domain_config(
        &self,
        Parameters(params): Parameters<DomainRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.delete_custom_domain(params).await.into())
    }

    // ===== VERSIONS =====

    #[tool(
        name = "publish-function-version",
        description = "Publish the current code and configuration of a function as a new immutable version."
    )]
    async fn publish_function_version(
        &self,
        Parameters(params): Parameters<PublishVersionRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.publish_version(params).await.into())
    }

    #[tool(
        name = "list-function-versions",
        description = "List the published versions of a function."
    )]
    async fn list_function_versions(
        &self,
        Parameters(params): Parameters<ListVersionsRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.list_versions(params).await.into())
    }

    #[tool(
        name = "delete-function-version",
        description = "Delete a published version of a function."
    )]
    async fn delete_function_version(
        &self,
        Parameters(params): Parameters<DeleteVersionRequest>,
    ) -> Result<CallToolResult, McpError> {
        Ok(self.operator.delete_version(params).await.into())
    }
}

fn deploy_prompt() -> Prompt {
    Prompt::new(
        DEPLOY_PROMPT_NAME,
        Some(DEPLOY_PROMPT_DESCRIPTION),
        None,
    )
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for FcMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_prompts()
                .build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: PKG_VERSION.to_string(),
                title: Some(DISPLAY_NAME.to_string()),
                website_url: None,
                icons: None,
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..Default::default()
        }
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        Ok(ListPromptsResult::with_all_items(vec![deploy_prompt()]))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        if request.name != DEPLOY_PROMPT_NAME {
            return Err(McpError::invalid_params(
                format!("Unknown prompt {}", request.name),
                None,
            ));
        }

        Ok(GetPromptResult {
            description: Some(DEPLOY_PROMPT_DESCRIPTION.to_string()),
            messages: vec![PromptMessage::new_text(
                PromptMessageRole::User,
                DEPLOY_PROMPT,
            )],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::operator::Backends;

    fn server() -> FcMcpServer {
        let config = ServerConfig::default();
        let backends = Backends::from_config(&config);
        FcMcpServer::new(Arc::new(FunctionOperator::new(config, backends)))
    }

    #[test]
    fn test_exposes_all_tools() {
        let mut names: Vec<String> = server()
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            [
                "create-custom-domain-config",
                "delete-custom-domain-config",
                "delete-function",
                "delete-function-version",
                "get-custom-domain-config",
                "get-function",
                "list-function-versions",
                "list-functions",
                "publish-function-version",
                "put-custom-runtime-function",
                "update-custom-domain-config",
                "update-custom-runtime-function",
            ]
        );
    }

    #[test]
    fn test_server_info() {
        let info = server().get_info();

        assert_eq!(info.server_info.name, "alibabacloud-fc-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.prompts.is_some());
    }

    #[test]
    fn test_prompt_text_is_bundled() {
        assert!(DEPLOY_PROMPT.contains("customRuntimeConfig"));
        assert_eq!(deploy_prompt().name, DEPLOY_PROMPT_NAME);
    }
}
