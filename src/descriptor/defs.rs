use crate::consts::{
    AUTO_DOMAIN_NAME, AUTO_DOMAIN_PATH, AUTO_DOMAIN_PROTOCOL, ENGINE_ACCESS_ALIAS,
    ENGINE_APP_NAME, ENGINE_COMPONENT, ENGINE_EDITION, LATEST_QUALIFIER,
};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

/// Keys the engine knows about but this crate does not model.
/// They are carried through a sync/merge/deploy cycle untouched.
pub type Extra = BTreeMap<String, Value>;

/// The declarative deployment file consumed by the engine.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct DeploymentDescriptor {
    pub edition: String,

    pub name: String,

    pub access: String,

    pub resources: BTreeMap<String, ResourceSpec>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// A named resource inside a [`DeploymentDescriptor`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct ResourceSpec {
    pub component: String,

    pub props: FunctionProps,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Desired state of one function.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct FunctionProps {
    /// region the function lives in
    pub region: String,

    /// functionName is unique per region
    pub function_name: String,

    /// code is a local path or an engine relative path to the code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// cpu in vCPU, a multiple of 0.05
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<f64>,

    /// memorySize in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u32>,

    /// diskSize in MB
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_size: Option<u32>,

    /// instanceConcurrency is the number of requests a single instance may serve at once
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_concurrency: Option<u32>,

    /// timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_runtime_config: Option<CustomRuntimeConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        deserialize_with = "deserialize_env",
        skip_serializing_if = "Option::is_none"
    )]
    pub environment_variables: Option<BTreeMap<String, String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internet_access: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_config: Option<LogConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vpc_config: Option<VpcConfig>,

    /// role is the ARN of the execution role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<CustomDomainBinding>,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Launch configuration of a custom runtime.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomRuntimeConfig {
    /// Startup command, run as root in /code. e.g. ["python3"]. Empty runs /code/bootstrap
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub command: Vec<String>,

    /// Startup command arguments. e.g. ["app.py"]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Port the HTTP server inside the custom runtime listens on. Defaults to 9000
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Extra,
}

fn default_port() -> u16 {
    9000
}

/// The sentinel letting the platform create the resource on its own.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Auto {
    Auto,
}

/// Log delivery configuration. "auto" creates the log project and store automatically.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(untagged)]
pub enum LogConfig {
    Auto(Auto),
    Sls(SlsLogConfig),
    /// A synced shape this crate does not model, written back as read.
    #[schemars(skip)]
    Other(Value),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SlsLogConfig {
    /// Log project logs are delivered to
    pub project: String,

    /// Log store logs are delivered to
    pub logstore: String,

    /// Split rule, "DefaultRegex" or "None". Defaults to "DefaultRegex"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_begin_rule: Option<String>,

    /// Deliver instance level metrics. Defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_instance_metrics: Option<bool>,

    /// Deliver request level metrics. Defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_request_metrics: Option<bool>,

    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Extra,
}

/// VPC network configuration. "auto" creates the VPC, vSwitch and security group automatically.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(untagged)]
pub enum VpcConfig {
    Auto(Auto),
    Vpc(VpcNetworkConfig),
    #[schemars(skip)]
    Other(Value),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VpcNetworkConfig {
    pub vpc_id: String,

    #[serde(rename = "vSwitchIds")]
    pub v_switch_ids: VSwitchIds,

    pub security_group_id: String,

    #[serde(flatten)]
    #[schemars(skip)]
    pub extra: Extra,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, JsonSchema)]
#[serde(untagged)]
pub enum VSwitchIds {
    One(String),
    Many(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, JsonSchema)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// The route every auto created function is reachable through.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CustomDomainBinding {
    pub domain_name: String,
    pub protocol: String,
    pub route: DomainRoute,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone)]
pub struct DomainRoute {
    pub path: String,
    pub qualifier: String,
}

impl Default for CustomDomainBinding {
    fn default() -> Self {
        Self {
            domain_name: String::from(AUTO_DOMAIN_NAME),
            protocol: String::from(AUTO_DOMAIN_PROTOCOL),
            route: DomainRoute {
                path: String::from(AUTO_DOMAIN_PATH),
                qualifier: String::from(LATEST_QUALIFIER),
            },
        }
    }
}

impl DeploymentDescriptor {
    /// Wraps a single function under a resource named after it.
    pub fn single(props: FunctionProps) -> Self {
        let mut resources = BTreeMap::new();
        resources.insert(
            props.function_name.clone(),
            ResourceSpec {
                component: String::from(ENGINE_COMPONENT),
                props,
                extra: Extra::new(),
            },
        );

        Self {
            edition: String::from(ENGINE_EDITION),
            name: String::from(ENGINE_APP_NAME),
            access: String::from(ENGINE_ACCESS_ALIAS),
            resources,
            extra: Extra::new(),
        }
    }

    pub fn props_mut(&mut self, function_name: &str) -> Result<&mut FunctionProps, DescriptorError> {
        self.resources
            .get_mut(function_name)
            .map(|resource| &mut resource.props)
            .ok_or_else(|| DescriptorError::ResourceNotFound(function_name.to_string()))
    }
}

/// Synced descriptors may carry unquoted scalars as environment values.
fn deserialize_env<'de, D>(deserializer: D) -> Result<Option<BTreeMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;

    Ok(raw.map(|env| {
        env.into_iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                (key, value)
            })
            .collect()
    }))
}

#[derive(ThisError, Debug)]
pub enum DescriptorError {
    #[error("Invalid function name {0:?}. It must match {pattern}", pattern = super::FUNCTION_NAME_PATTERN)]
    InvalidFunctionName(String),
    #[error("Invalid cpu/memory combination: {cpu} vCPU with {memory_size} MB. Memory in GB must be 1 to 4 times the cpu")]
    CpuMemoryRatio { cpu: f64, memory_size: u32 },
    #[error("Duplicate layer: {0}")]
    DuplicateLayer(String),
    #[error("Resource {0} not found in descriptor")]
    ResourceNotFound(String),
    #[error("Failed to read descriptor: {0}")]
    Read(#[source] std::io::Error),
    #[error("Failed to write descriptor: {0}")]
    Write(#[source] std::io::Error),
    #[error("Failed to parse descriptor: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("Failed to serialize descriptor: {0}")]
    Serialize(#[source] serde_yaml::Error),
}
