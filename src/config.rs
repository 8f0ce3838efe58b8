use crate::consts::{DEFAULT_BASE_DOMAIN, ENGINE_DEFAULT_BIN, IDENTITY_DEFAULT_REGION};
use std::path::PathBuf;

/// Everything the server needs to know at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Code comes as a downloadable `codeUri` instead of a local `location`
    pub remote_mode: bool,
    /// Executable of the deployment engine
    pub engine_bin: String,
    /// Suffix of auto created custom domains
    pub base_domain: String,
    /// Region of the identity endpoint
    pub identity_region: String,
    /// RAM role to assume before calling the control plane
    pub role_arn: Option<String>,
    /// Leave workspaces on disk after a call
    pub keep_workspaces: bool,
    /// One deploy per function at a time
    pub serialize_deploys: bool,
    /// Directory workspaces are created in
    pub workspace_root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            remote_mode: false,
            engine_bin: ENGINE_DEFAULT_BIN.to_string(),
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            identity_region: IDENTITY_DEFAULT_REGION.to_string(),
            role_arn: None,
            keep_workspaces: false,
            serialize_deploys: true,
            workspace_root: std::env::temp_dir(),
        }
    }
}

/// Only the exact value `true` enables a flag.
pub fn parse_flag(value: &str) -> bool {
    value == "true"
}

/// [`parse_flag`] as a clap value parser.
pub fn parse_flag_arg(value: &str) -> Result<bool, std::convert::Infallible> {
    Ok(parse_flag(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert!(!config.remote_mode);
        assert_eq!(config.engine_bin, "s");
        assert_eq!(config.base_domain, "devsapp.net");
        assert_eq!(config.identity_region, "cn-hangzhou");
        assert!(config.role_arn.is_none());
        assert!(!config.keep_workspaces);
        assert!(config.serialize_deploys);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("true"));
        assert!(!parse_flag("TRUE"));
        assert!(!parse_flag("true "));
        assert!(!parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag(""));
    }
}
