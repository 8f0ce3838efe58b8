//! Field presence merge of update requests into a synced descriptor.
//!
//! An override replaces the existing value only when it is truthy: a non zero
//! number, a non empty string, list or map, `true`, or any structured object.
//! Everything else counts as "not supplied". As a consequence an update can
//! not reset a field to `0`, `false` or an empty list. Structured objects such
//! as `logConfig` are replaced as a whole, never merged key by key.

use super::builder::{normalize_env, normalize_layers};
use super::defs::{
    CustomRuntimeConfig, DeploymentDescriptor, DescriptorError, FunctionProps, LogConfig, Tag,
    VpcConfig,
};
use crate::request::functions::UpdateFunctionRequest;
use std::collections::BTreeMap;
use std::path::Path;

pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0 && !self.is_nan()
    }
}

impl Truthy for u32 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for String {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<T> Truthy for Vec<T> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl<K, V> Truthy for BTreeMap<K, V> {
    fn is_truthy(&self) -> bool {
        !self.is_empty()
    }
}

impl Truthy for CustomRuntimeConfig {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for LogConfig {
    fn is_truthy(&self) -> bool {
        true
    }
}

impl Truthy for VpcConfig {
    fn is_truthy(&self) -> bool {
        true
    }
}

fn supplied<T: Truthy + Clone>(value: &Option<T>) -> Option<T> {
    value.as_ref().filter(|value| value.is_truthy()).cloned()
}

fn apply<T: Truthy + Clone>(target: &mut Option<T>, value: &Option<T>) {
    if let Some(value) = supplied(value) {
        *target = Some(value);
    }
}

/// Merges `overrides` into the props of the resource named after the function.
///
/// The code pointer is always set: to `new_code` when given, otherwise back to
/// `synced_code`, the directory the engine pulled the current code into.
pub fn merge(
    descriptor: &mut DeploymentDescriptor,
    new_code: Option<&str>,
    synced_code: &str,
    overrides: &UpdateFunctionRequest,
) -> Result<FunctionProps, DescriptorError> {
    let region = overrides.region.to_string();
    let props = descriptor.props_mut(&overrides.function_name)?;

    props.code = Some(new_code.unwrap_or(synced_code).to_string());

    apply(&mut props.cpu, &overrides.cpu);
    apply(&mut props.memory_size, &overrides.memory_size);
    apply(&mut props.custom_runtime_config, &overrides.custom_runtime_config);
    apply(&mut props.description, &overrides.description);
    apply(&mut props.disk_size, &overrides.disk_size);
    apply(&mut props.instance_concurrency, &overrides.instance_concurrency);

    if let Some(env) = supplied(&overrides.environment_variables) {
        props.environment_variables = Some(normalize_env(Some(env)));
    }

    if let Some(layers) = supplied(&overrides.layers) {
        props.layers = Some(normalize_layers(layers, &region));
    }

    apply(&mut props.internet_access, &overrides.internet_access);
    apply(&mut props.log_config, &overrides.log_config);
    apply(&mut props.vpc_config, &overrides.vpc_config);
    apply(&mut props.role, &overrides.role);
    apply(
        &mut props.runtime,
        &overrides.runtime.map(|runtime| runtime.to_string()),
    );
    apply(&mut props.timeout, &overrides.timeout);
    apply::<Vec<Tag>>(&mut props.tags, &overrides.tags);

    Ok(props.clone())
}

/// Loads the descriptor at `path`, merges and writes it back in place.
pub async fn merge_file(
    path: &Path,
    new_code: Option<&str>,
    synced_code: &str,
    overrides: &UpdateFunctionRequest,
) -> Result<FunctionProps, DescriptorError> {
    let mut descriptor = DeploymentDescriptor::load(path).await?;

    let props = merge(&mut descriptor, new_code, synced_code, overrides)?;
    props.validate()?;

    descriptor.save(path).await?;

    Ok(props)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::defs::{Auto, SlsLogConfig};
    use serde_json::json;

    const SYNCED: &str = r#"
edition: 3.0.0
name: my-app
access: default
resources:
  my-func:
    component: fc3
    props:
      region: cn-hangzhou
      functionName: my-func
      code: ./cn-hangzhou_my-func
      cpu: 1
      memorySize: 2048
      diskSize: 512
      instanceConcurrency: 10
      timeout: 3
      runtime: custom.debian10
      internetAccess: true
      role: acs:ram::1234:role/aliyunfcdefaultrole
      description: original
      customRuntimeConfig:
        command:
          - python3
        args:
          - app.py
        port: 9000
      environmentVariables:
        APP_MODE: prod
      layers:
        - acs:fc:cn-hangzhou:official:layers/Python310/versions/3
      logConfig:
        project: my-project
        logstore: my-store
        enableRequestMetrics: true
      tags:
        - key: team
          value: core
      gpuConfig:
        gpuMemorySize: 0
"#;

    fn synced() -> DeploymentDescriptor {
        DeploymentDescriptor::from_yaml_str(SYNCED).unwrap()
    }

    fn overrides(value: serde_json::Value) -> UpdateFunctionRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_restores_synced_code_when_no_new_code() {
        let mut descriptor = synced();
        let props = merge(
            &mut descriptor,
            None,
            "/tmp/1/cn-hangzhou_my-func",
            &overrides(json!({ "functionName": "my-func" })),
        )
        .unwrap();

        assert_eq!(props.code.as_deref(), Some("/tmp/1/cn-hangzhou_my-func"));
    }

    #[test]
    fn test_new_code_replaces_code() {
        let mut descriptor = synced();
        let props = merge(
            &mut descriptor,
            Some("/home/me/project"),
            "/tmp/1/cn-hangzhou_my-func",
            &overrides(json!({ "functionName": "my-func" })),
        )
        .unwrap();

        assert_eq!(props.code.as_deref(), Some("/home/me/project"));
    }

    #[test]
    fn test_only_timeout_changes() {
        let before = synced().resources["my-func"].props.clone();

        let mut descriptor = synced();
        let props = merge(
            &mut descriptor,
            None,
            "/tmp/1/cn-hangzhou_my-func",
            &overrides(json!({ "functionName": "my-func", "timeout": 30 })),
        )
        .unwrap();

        let expected = FunctionProps {
            timeout: Some(30),
            code: Some(String::from("/tmp/1/cn-hangzhou_my-func")),
            ..before
        };
        assert_eq!(props, expected);
        assert_eq!(descriptor.resources["my-func"].props, expected);
    }

    #[test]
    fn test_falsy_overrides_are_ignored() {
        let before = synced().resources["my-func"].props.clone();

        let mut descriptor = synced();
        let props = merge(
            &mut descriptor,
            None,
            "./cn-hangzhou_my-func",
            &overrides(json!({
                "functionName": "my-func",
                "timeout": 0,
                "cpu": 0,
                "description": "",
                "internetAccess": false,
                "tags": [],
                "layers": [],
                "environmentVariables": {}
            })),
        )
        .unwrap();

        assert_eq!(props, before);
    }

    #[test]
    fn test_env_and_layer_overrides_are_normalized() {
        let mut descriptor = synced();
        let props = merge(
            &mut descriptor,
            None,
            "./cn-hangzhou_my-func",
            &overrides(json!({
                "functionName": "my-func",
                "region": "cn-hangzhou",
                "environmentVariables": { "FEATURE": "on" },
                "layers": ["acs:fc:cn-hangzhou:official:layers/Python310/versions/3", "mine"]
            })),
        )
        .unwrap();

        let env = props.environment_variables.unwrap();
        assert_eq!(env["FEATURE"], "on");
        assert!(!env.contains_key("APP_MODE"));
        assert_eq!(env["JAVA_HOME"], "/opt/java21");

        assert_eq!(
            props.layers.unwrap(),
            vec![
                String::from("acs:fc:cn-hangzhou:official:layers/Python310/versions/3"),
                String::from("mine"),
                String::from("acs:fc:cn-hangzhou:official:layers/Nodejs20/versions/3"),
                String::from("acs:fc:cn-hangzhou:official:layers/Java21/versions/2"),
            ]
        );
    }

    #[test]
    fn test_nested_objects_replaced_wholesale() {
        let mut descriptor = synced();
        let props = merge(
            &mut descriptor,
            None,
            "./cn-hangzhou_my-func",
            &overrides(json!({
                "functionName": "my-func",
                "logConfig": { "project": "other", "logstore": "other-store" },
                "vpcConfig": "auto"
            })),
        )
        .unwrap();

        assert_eq!(
            props.log_config,
            Some(LogConfig::Sls(SlsLogConfig {
                project: String::from("other"),
                logstore: String::from("other-store"),
                log_begin_rule: None,
                enable_instance_metrics: None,
                enable_request_metrics: None,
                extra: Default::default(),
            }))
        );
        assert_eq!(props.vpc_config, Some(VpcConfig::Auto(Auto::Auto)));
        assert!(props.extra.contains_key("gpuConfig"));
    }

    const SYNCED_PARTIAL_SHAPES: &str = r#"
edition: 3.0.0
name: my-app
access: default
resources:
  my-func:
    component: fc3
    props:
      region: cn-hangzhou
      functionName: my-func
      code: ./cn-hangzhou_my-func
      timeout: 3
      customRuntimeConfig:
        port: 9000
      logConfig:
        enableInstanceMetrics: false
        enableRequestMetrics: false
        logBeginRule: None
      vpcConfig:
        role: acs:ram::1234:role/vpc
"#;

    #[test]
    fn test_keeps_synced_shapes_it_does_not_model() {
        let mut descriptor = DeploymentDescriptor::from_yaml_str(SYNCED_PARTIAL_SHAPES).unwrap();
        let props = merge(
            &mut descriptor,
            None,
            "./cn-hangzhou_my-func",
            &overrides(json!({ "functionName": "my-func", "timeout": 30 })),
        )
        .unwrap();

        assert_eq!(props.timeout, Some(30));

        let runtime = props.custom_runtime_config.unwrap();
        assert!(runtime.command.is_empty());
        assert_eq!(runtime.port, 9000);

        assert_eq!(
            props.log_config,
            Some(LogConfig::Other(json!({
                "enableInstanceMetrics": false,
                "enableRequestMetrics": false,
                "logBeginRule": "None"
            })))
        );
        assert_eq!(
            props.vpc_config,
            Some(VpcConfig::Other(json!({ "role": "acs:ram::1234:role/vpc" })))
        );
    }

    #[test]
    fn test_unmodeled_shapes_are_written_back_unchanged() {
        let descriptor = DeploymentDescriptor::from_yaml_str(SYNCED_PARTIAL_SHAPES).unwrap();
        let yaml = descriptor.to_yaml_string().unwrap();

        assert!(!yaml.contains("command"));
        assert_eq!(DeploymentDescriptor::from_yaml_str(&yaml).unwrap(), descriptor);
    }

    #[test]
    fn test_missing_resource() {
        let mut descriptor = synced();
        let result = merge(
            &mut descriptor,
            None,
            "./code",
            &overrides(json!({ "functionName": "other-func" })),
        );

        assert!(matches!(result, Err(DescriptorError::ResourceNotFound(name)) if name == "other-func"));
    }

    #[tokio::test]
    async fn test_merge_file_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cn-hangzhou_my-func.yaml");
        tokio::fs::write(&path, SYNCED).await.unwrap();

        let props = merge_file(
            &path,
            None,
            "/tmp/code",
            &overrides(json!({ "functionName": "my-func", "memorySize": 4096 })),
        )
        .await
        .unwrap();

        let written = DeploymentDescriptor::load(&path).await.unwrap();
        assert_eq!(written.resources["my-func"].props, props);
        assert_eq!(props.memory_size, Some(4096));
    }

    #[tokio::test]
    async fn test_merge_file_rejects_bad_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cn-hangzhou_my-func.yaml");
        tokio::fs::write(&path, SYNCED).await.unwrap();

        let result = merge_file(
            &path,
            None,
            "/tmp/code",
            &overrides(json!({ "functionName": "my-func", "memorySize": 8192 })),
        )
        .await;

        assert!(matches!(result, Err(DescriptorError::CpuMemoryRatio { .. })));
        assert_eq!(tokio::fs::read_to_string(&path).await.unwrap(), SYNCED);
    }
}
