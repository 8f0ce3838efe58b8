use super::defs::{DeploymentDescriptor, DescriptorError, FunctionProps};
use super::FUNCTION_NAME_PATTERN;
use itertools::Itertools;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

const MIN_MEMORY_CPU_RATIO: f64 = 1.0;
const MAX_MEMORY_CPU_RATIO: f64 = 4.0;
const RATIO_TOLERANCE: f64 = 1e-9;

fn function_name_regex() -> Option<&'static Regex> {
    static REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    REGEX
        .get_or_init(|| Regex::new(FUNCTION_NAME_PATTERN).ok())
        .as_ref()
}

pub fn validate_function_name(function_name: &str) -> Result<(), DescriptorError> {
    if function_name_regex().is_some_and(|regex| regex.is_match(function_name)) {
        Ok(())
    } else {
        Err(DescriptorError::InvalidFunctionName(function_name.to_string()))
    }
}

/// Memory in GB must lie within 1 to 4 times the cpu.
pub fn validate_cpu_memory(cpu: f64, memory_size: u32) -> Result<(), DescriptorError> {
    let memory_gb = f64::from(memory_size) / 1024.0;
    let ratio = memory_gb / cpu;

    if cpu > 0.0
        && ratio >= MIN_MEMORY_CPU_RATIO - RATIO_TOLERANCE
        && ratio <= MAX_MEMORY_CPU_RATIO + RATIO_TOLERANCE
    {
        Ok(())
    } else {
        Err(DescriptorError::CpuMemoryRatio { cpu, memory_size })
    }
}

/// `{normalized-name}.fcv3.{account-id}.{region}.fc.{base-domain}`
pub fn auto_domain_name(
    account_id: &str,
    function_name: &str,
    region: &str,
    base_domain: &str,
) -> String {
    let normalized_function_name = function_name.replace('_', "-").to_lowercase();
    format!("{normalized_function_name}.fcv3.{account_id}.{region}.fc.{base_domain}")
}

impl FunctionProps {
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_function_name(&self.function_name)?;

        if let (Some(cpu), Some(memory_size)) = (self.cpu, self.memory_size) {
            validate_cpu_memory(cpu, memory_size)?;
        }

        if let Some(layers) = &self.layers {
            if let Some(layer) = layers.iter().duplicates().next() {
                return Err(DescriptorError::DuplicateLayer(layer.clone()));
            }
        }

        Ok(())
    }
}

impl DeploymentDescriptor {
    pub fn to_yaml_string(&self) -> Result<String, DescriptorError> {
        serde_yaml::to_string(self).map_err(DescriptorError::Serialize)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, DescriptorError> {
        serde_yaml::from_str(yaml).map_err(DescriptorError::Parse)
    }

    pub async fn load(path: &Path) -> Result<Self, DescriptorError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(DescriptorError::Read)?;

        Self::from_yaml_str(&yaml)
    }

    pub async fn save(&self, path: &Path) -> Result<(), DescriptorError> {
        let yaml = self.to_yaml_string()?;

        tracing::debug!(path = %path.display(), "Writing descriptor.");

        tokio::fs::write(path, yaml)
            .await
            .map_err(DescriptorError::Write)
    }
}
