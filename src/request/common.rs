use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Region to deploy to. Defaults to cn-hangzhou
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Hash, Clone, Copy, Default, JsonSchema)]
pub enum Region {
    #[default]
    #[serde(rename = "cn-hangzhou")]
    CnHangzhou,
    #[serde(rename = "cn-shanghai")]
    CnShanghai,
    #[serde(rename = "cn-beijing")]
    CnBeijing,
    #[serde(rename = "cn-shenzhen")]
    CnShenzhen,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::CnHangzhou => "cn-hangzhou",
            Region::CnShanghai => "cn-shanghai",
            Region::CnBeijing => "cn-beijing",
            Region::CnShenzhen => "cn-shenzhen",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom runtime the function runs on. Defaults to custom.debian10
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, JsonSchema)]
pub enum CustomRuntime {
    #[default]
    #[serde(rename = "custom.debian10")]
    Debian10,
    #[serde(rename = "custom.debian11")]
    Debian11,
    #[serde(rename = "custom.debian12")]
    Debian12,
}

impl CustomRuntime {
    pub fn as_str(&self) -> &'static str {
        match self {
            CustomRuntime::Debian10 => "custom.debian10",
            CustomRuntime::Debian11 => "custom.debian11",
            CustomRuntime::Debian12 => "custom.debian12",
        }
    }
}

impl fmt::Display for CustomRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&Region::CnShenzhen).unwrap(),
            "\"cn-shenzhen\""
        );
        assert_eq!(
            serde_json::from_str::<CustomRuntime>("\"custom.debian12\"").unwrap(),
            CustomRuntime::Debian12
        );
        assert_eq!(Region::default().to_string(), "cn-hangzhou");
    }
}
