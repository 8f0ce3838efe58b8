use super::{DeploymentEngine, EngineError, SyncOutput};
use crate::consts::{
    ACCESS_KEY_ID_ENV_VAR, ACCESS_KEY_SECRET_ENV_VAR, ACCOUNT_ID_ENV_VAR, ENGINE_ACCESS_ALIAS,
    SECURITY_TOKEN_ENV_VAR,
};
use crate::credentials::AccountCredentials;
use crate::descriptor::FunctionProps;
use crate::request::Region;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;

/// Drives the Serverless Devs `s` command line tool.
#[derive(Debug, Clone)]
pub struct ServerlessDevsEngine {
    bin: String,
}

impl ServerlessDevsEngine {
    pub fn new(bin: String) -> Self {
        Self { bin }
    }

    pub fn sync_args(target_dir: &Path, region: Region, function_name: &str) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["cli", "fc3", "sync", "--region", region.as_str()]
            .into_iter()
            .map(OsString::from)
            .collect();

        args.extend([
            OsString::from("--function-name"),
            OsString::from(function_name),
            OsString::from("--target-dir"),
            target_dir.as_os_str().to_owned(),
        ]);
        args.extend(Self::common_args());

        args
    }

    pub fn deploy_args(function_name: &str, descriptor_path: &Path) -> Vec<OsString> {
        let mut args = vec![
            OsString::from(function_name),
            OsString::from("deploy"),
            OsString::from("-t"),
            descriptor_path.as_os_str().to_owned(),
        ];
        args.extend(Self::common_args());
        args.extend([OsString::from("-o"), OsString::from("json")]);

        args
    }

    fn common_args() -> [OsString; 4] {
        ["-a", ENGINE_ACCESS_ALIAS, "--silent", "-y"].map(OsString::from)
    }

    fn command(&self, args: &[OsString], credentials: &AccountCredentials) -> Command {
        let mut command = Command::new(&self.bin);

        command
            .args(args)
            .env(ACCOUNT_ID_ENV_VAR, &credentials.account_id)
            .env(ACCESS_KEY_ID_ENV_VAR, &credentials.credentials.access_key_id)
            .env(
                ACCESS_KEY_SECRET_ENV_VAR,
                &credentials.credentials.access_key_secret,
            )
            .kill_on_drop(true);

        match &credentials.credentials.security_token {
            Some(token) => command.env(SECURITY_TOKEN_ENV_VAR, token),
            None => command.env_remove(SECURITY_TOKEN_ENV_VAR),
        };

        command
    }

    fn display(&self, args: &[OsString]) -> String {
        std::iter::once(self.bin.clone())
            .chain(args.iter().map(|arg| arg.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(
        &self,
        args: Vec<OsString>,
        credentials: &AccountCredentials,
    ) -> Result<String, EngineError> {
        let command_line = self.display(&args);

        tracing::debug!(command = %command_line, "Running engine.");

        let output = self
            .command(&args, credentials)
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };

            return Err(EngineError::Failed {
                command: command_line,
                status: output.status.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl DeploymentEngine for ServerlessDevsEngine {
    async fn sync(
        &self,
        target_dir: &Path,
        region: Region,
        function_name: &str,
        credentials: &AccountCredentials,
    ) -> Result<SyncOutput, EngineError> {
        self.run(
            Self::sync_args(target_dir, region, function_name),
            credentials,
        )
        .await?;

        let output = SyncOutput::new(target_dir, region, function_name);

        if !tokio::fs::try_exists(&output.descriptor_path)
            .await
            .unwrap_or(false)
        {
            return Err(EngineError::MissingOutput(output.descriptor_path));
        }

        Ok(output)
    }

    async fn deploy(
        &self,
        function_name: &str,
        descriptor_path: &Path,
        credentials: &AccountCredentials,
        props: &FunctionProps,
    ) -> Result<String, EngineError> {
        tracing::info!(
            %function_name,
            region = %props.region,
            runtime = props.runtime.as_deref().unwrap_or_default(),
            "Deploying."
        );

        self.run(Self::deploy_args(function_name, descriptor_path), credentials)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::Credentials;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn account() -> AccountCredentials {
        AccountCredentials {
            account_id: String::from("1234"),
            credentials: Credentials {
                access_key_id: String::from("id"),
                access_key_secret: String::from("secret"),
                security_token: None,
            },
        }
    }

    #[test]
    fn test_sync_args() {
        let args = ServerlessDevsEngine::sync_args(Path::new("/tmp/1"), Region::CnHangzhou, "my-func");

        assert_eq!(
            strings(args),
            [
                "cli",
                "fc3",
                "sync",
                "--region",
                "cn-hangzhou",
                "--function-name",
                "my-func",
                "--target-dir",
                "/tmp/1",
                "-a",
                "default_serverless_devs_key",
                "--silent",
                "-y"
            ]
        );
    }

    #[test]
    fn test_deploy_args() {
        let args = ServerlessDevsEngine::deploy_args("my-func", Path::new("/tmp/1/s.yaml"));

        assert_eq!(
            strings(args),
            [
                "my-func",
                "deploy",
                "-t",
                "/tmp/1/s.yaml",
                "-a",
                "default_serverless_devs_key",
                "--silent",
                "-y",
                "-o",
                "json"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let engine = ServerlessDevsEngine::new(String::from("/nonexistent/s-binary"));

        let result = engine
            .deploy(
                "my-func",
                Path::new("/tmp/s.yaml"),
                &account(),
                &FunctionProps::default(),
            )
            .await;

        assert!(matches!(result, Err(EngineError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_carries_stderr() {
        let engine = ServerlessDevsEngine::new(String::from("sh"));

        let result = engine
            .run(
                vec![
                    OsString::from("-c"),
                    OsString::from("echo \"$ALIBABA_CLOUD_ACCOUNT_ID denied\" >&2; exit 3"),
                ],
                &account(),
            )
            .await;

        match result {
            Err(EngineError::Failed { stderr, .. }) => assert_eq!(stderr, "1234 denied"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
