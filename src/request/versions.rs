use super::common::Region;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Listing order of versions.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy, Default, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Forward,
    #[default]
    Backward,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Forward => "FORWARD",
            Direction::Backward => "BACKWARD",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishVersionRequest {
    #[schemars(regex(pattern = r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$"))]
    pub function_name: String,

    #[serde(default)]
    pub region: Region,

    /// What the version is about
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListVersionsRequest {
    #[schemars(regex(pattern = r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$"))]
    pub function_name: String,

    #[serde(default)]
    pub region: Region,

    /// Token of the next page. Not needed for the first page
    #[serde(default)]
    pub next_token: Option<String>,

    /// FORWARD lists oldest first, BACKWARD newest first. Defaults to BACKWARD
    #[serde(default)]
    pub direction: Direction,

    #[serde(default)]
    #[schemars(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteVersionRequest {
    #[schemars(regex(pattern = r"^[a-zA-Z0-9_][a-zA-Z0-9_-]{0,63}$"))]
    pub function_name: String,

    #[serde(default)]
    pub region: Region,

    pub version_id: String,
}
