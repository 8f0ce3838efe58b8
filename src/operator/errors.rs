use crate::credentials::CredentialsError;
use crate::descriptor::DescriptorError;
use crate::download::DownloadError;
use crate::engine::EngineError;
use crate::fc_client::FcError;
use crate::request::Region;
use crate::sts_client::StsError;
use thiserror::Error as ThisError;

/// Every way a tool call can fail. The display text is what the caller sees.
#[derive(ThisError, Debug)]
pub enum ToolError {
    #[error("Failed to resolve credentials: {0}")]
    Credentials(#[source] CredentialsError),
    #[error("Failed to resolve account id: {0}")]
    Identity(#[source] StsError),
    #[error("Function {function_name} does not exist in {region}")]
    FunctionNotFound {
        function_name: String,
        region: Region,
    },
    #[error("Invalid parameters: {0}")]
    Validation(String),
    #[error("Invalid function configuration: {0}")]
    Descriptor(
        #[source]
        #[from]
        DescriptorError,
    ),
    #[error("Failed to download code: {0}")]
    Download(
        #[source]
        #[from]
        DownloadError,
    ),
    #[error("Deployment failed: {0}")]
    Engine(
        #[source]
        #[from]
        EngineError,
    ),
    #[error("{operation} failed: {source}")]
    Cloud {
        operation: &'static str,
        #[source]
        source: FcError,
    },
    #[error("Failed to prepare workspace: {0}")]
    Workspace(#[source] std::io::Error),
    #[error("Function {function_name} was deleted, but deleting its custom domain {domain} failed: {source}")]
    DomainCleanup {
        function_name: String,
        domain: String,
        #[source]
        source: FcError,
    },
}

impl ToolError {
    /// Wraps a control plane failure of `operation`.
    pub fn cloud(operation: &'static str) -> impl FnOnce(FcError) -> ToolError {
        move |source| ToolError::Cloud { operation, source }
    }

    /// Like [`ToolError::cloud`], but a 404 reports the function as missing.
    pub fn function_lookup<'a>(
        operation: &'static str,
        function_name: &'a str,
        region: Region,
    ) -> impl FnOnce(FcError) -> ToolError + 'a {
        move |source| {
            if source.is_not_found() {
                ToolError::FunctionNotFound {
                    function_name: function_name.to_string(),
                    region,
                }
            } else {
                ToolError::Cloud { operation, source }
            }
        }
    }
}
