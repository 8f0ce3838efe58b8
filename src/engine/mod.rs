use crate::credentials::AccountCredentials;
use crate::descriptor::FunctionProps;
use crate::request::Region;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error as ThisError;

pub mod serverless_devs;

pub use serverless_devs::ServerlessDevsEngine;

#[derive(ThisError, Debug)]
pub enum EngineError {
    #[error("Failed to start {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("Sync produced no descriptor at {0}")]
    MissingOutput(PathBuf),
}

/// Where a sync put the remote state of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutput {
    /// The synced descriptor, `{region}_{function}.yaml`
    pub descriptor_path: PathBuf,
    /// The synced code directory, `{region}_{function}`
    pub code_path: PathBuf,
}

/// Name of the synced descriptor (plus `.yaml`) and code directory.
pub fn sync_target_name(region: Region, function_name: &str) -> String {
    format!("{region}_{function_name}").replace('$', "")
}

impl SyncOutput {
    pub fn new(target_dir: &Path, region: Region, function_name: &str) -> Self {
        let name = sync_target_name(region, function_name);

        Self {
            descriptor_path: target_dir.join(format!("{name}.yaml")),
            code_path: target_dir.join(name),
        }
    }
}

/// The external tool applying descriptors.
#[async_trait]
pub trait DeploymentEngine: Send + Sync {
    /// Pulls the remote configuration and code of a function into `target_dir`.
    async fn sync(
        &self,
        target_dir: &Path,
        region: Region,
        function_name: &str,
        credentials: &AccountCredentials,
    ) -> Result<SyncOutput, EngineError>;

    /// Applies the resource named `function_name` of the descriptor at `descriptor_path`.
    ///
    /// Returns the raw engine output.
    async fn deploy(
        &self,
        function_name: &str,
        descriptor_path: &Path,
        credentials: &AccountCredentials,
        props: &FunctionProps,
    ) -> Result<String, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_target_names() {
        let output = SyncOutput::new(Path::new("/tmp/1"), Region::CnBeijing, "my$func");

        assert_eq!(
            output.descriptor_path,
            PathBuf::from("/tmp/1/cn-beijing_myfunc.yaml")
        );
        assert_eq!(output.code_path, PathBuf::from("/tmp/1/cn-beijing_myfunc"));
    }
}
