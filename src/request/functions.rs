use super::common::{CustomRuntime, Region};
use crate::descriptor::defs::{CustomRuntimeConfig, LogConfig, Tag, VpcConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

fn default_cpu() -> f64 {
    1.0
}

fn default_memory_size() -> u32 {
    2048
}

fn default_internet_access() -> bool {
    true
}

fn default_timeout() -> u32 {
    3
}

fn default_limit() -> u32 {
    50
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFunctionRequest {
    /// Root path of the local, already built code project. Required unless the server runs in remote mode
    #[serde(default)]
    pub location: Option<String>,

    /// Downloadable url of the zipped code package. Required when the server runs in remote mode
    #[serde(default)]
    pub code_uri: Option<String>,

    /// Function name, unique per region
    #[schemars(regex(pattern = r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$"))]
    pub function_name: String,

    #[serde(default)]
    pub region: Region,

    /// CPU in vCPU, a multiple of 0.05. Memory in GB must be 1 to 4 times the cpu. Defaults to 1
    #[serde(default = "default_cpu")]
    pub cpu: f64,

    /// Memory in MB, one of 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768. Defaults to 2048
    #[serde(default = "default_memory_size")]
    pub memory_size: u32,

    pub custom_runtime_config: CustomRuntimeConfig,

    /// What the function does
    #[serde(default)]
    pub description: Option<String>,

    /// Disk size in MB, 512 or 10240
    pub disk_size: u32,

    /// Requests a single instance serves at once, 1 to 200
    pub instance_concurrency: u32,

    /// Environment variables of the runtime
    #[serde(default)]
    pub environment_variables: BTreeMap<String, String>,

    /// Allow the function to access the internet. Defaults to true
    #[serde(default = "default_internet_access")]
    pub internet_access: bool,

    #[serde(default)]
    pub log_config: Option<LogConfig>,

    #[serde(default)]
    pub vpc_config: Option<VpcConfig>,

    /// ARN of the execution role. Defaults to acs:ram::<account>:role/aliyunfcdefaultrole
    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub runtime: CustomRuntime,

    /// Execution timeout in seconds. Defaults to 3
    #[serde(default = "default_timeout")]
    pub timeout: u32,

    /// Layers to attach. The official Python, Node.js and Java layers are always added
    #[serde(default)]
    pub layers: Vec<String>,

    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Only supplied, non empty and non zero values are applied.
/// Passing 0, false, "" or an empty list leaves the current value untouched.
#[derive(Serialize, Deserialize, Debug, Clone, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFunctionRequest {
    /// Root path of the local code project. Only needed when the code changes
    #[serde(default)]
    pub location: Option<String>,

    /// Downloadable url of the zipped code package. Only needed when the code changes in remote mode
    #[serde(default)]
    pub code_uri: Option<String>,

    /// Name of the function to update
    #[schemars(regex(pattern = r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$"))]
    pub function_name: String,

    #[serde(default)]
    pub region: Region,

    #[serde(default)]
    pub cpu: Option<f64>,

    #[serde(default)]
    pub memory_size: Option<u32>,

    #[serde(default)]
    pub custom_runtime_config: Option<CustomRuntimeConfig>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub disk_size: Option<u32>,

    #[serde(default)]
    pub instance_concurrency: Option<u32>,

    /// Replaces all environment variables of the function
    #[serde(default)]
    pub environment_variables: Option<BTreeMap<String, String>>,

    #[serde(default)]
    pub internet_access: Option<bool>,

    #[serde(default)]
    pub log_config: Option<LogConfig>,

    #[serde(default)]
    pub vpc_config: Option<VpcConfig>,

    #[serde(default)]
    pub role: Option<String>,

    #[serde(default)]
    pub runtime: Option<CustomRuntime>,

    #[serde(default)]
    pub timeout: Option<u32>,

    /// Replaces all layers of the function. The official layers are always added
    #[serde(default)]
    pub layers: Option<Vec<String>>,

    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
}

/// Addresses a single function.
#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRequest {
    #[schemars(regex(pattern = r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$"))]
    pub function_name: String,

    #[serde(default)]
    pub region: Region,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListFunctionsRequest {
    #[serde(default)]
    pub region: Region,

    /// Only list functions whose name starts with this prefix
    #[serde(default)]
    pub prefix: Option<String>,

    /// Token of the next page. Not needed for the first page
    #[serde(default)]
    pub next_token: Option<String>,

    /// Page size. Defaults to 50
    #[serde(default = "default_limit")]
    #[schemars(range(min = 1, max = 100))]
    pub limit: u32,

    /// Only list functions carrying all of these tags
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,

    /// Only list functions with this runtime
    #[serde(default)]
    pub runtime: Option<String>,
}
