use std::path::PathBuf;

use crate::{
    config::ServerConfig,
    consts::{
        BASE_DOMAIN_ENV_VAR, DEFAULT_BASE_DOMAIN, ENGINE_BIN_ENV_VAR, ENGINE_DEFAULT_BIN,
        IDENTITY_DEFAULT_REGION, REMOTE_MODE_ENV_VAR, ROLE_ARN_ENV_VAR,
    },
};
use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Runs the MCP server on stdin/stdout
    #[clap(visible_alias = "s")]
    Serve {
        #[command(flatten)]
        args: ServeArgs,
    },
    /// Deployment descriptor commands
    #[clap(visible_alias = "d")]
    Descriptor {
        #[command(subcommand)]
        command: DescriptorCommands,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    /// Expect code as a downloadable codeUri instead of a local location
    #[clap(long, env = REMOTE_MODE_ENV_VAR, value_parser = crate::config::parse_flag_arg, default_value = "false", action = ArgAction::Set)]
    pub remote_mode: bool,
    /// The executable of the deployment engine
    #[clap(long, env = ENGINE_BIN_ENV_VAR, default_value = ENGINE_DEFAULT_BIN)]
    pub engine_bin: String,
    /// The suffix of auto created custom domains
    #[clap(long, env = BASE_DOMAIN_ENV_VAR, default_value = DEFAULT_BASE_DOMAIN)]
    pub base_domain: String,
    /// The region of the identity endpoint
    #[clap(long, default_value = IDENTITY_DEFAULT_REGION)]
    pub identity_region: String,
    /// A RAM role to assume with the environment credentials
    #[clap(long, env = ROLE_ARN_ENV_VAR)]
    pub role_arn: Option<String>,
    /// Keep workspaces on disk after a call
    #[clap(long)]
    pub keep_workspaces: bool,
    /// Allow concurrent deploys of the same function
    #[clap(long)]
    pub no_serialize_deploys: bool,
    /// The directory workspaces are created in.
    /// Defaults to the system temp directory
    #[clap(long)]
    pub workspace_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum DescriptorCommands {
    /// Prints the descriptor put-custom-runtime-function would deploy
    #[clap(visible_alias = "p")]
    Print {
        #[command(flatten)]
        source: DescriptorSource,
    },
    /// Writes the descriptor put-custom-runtime-function would deploy to a file
    #[clap(visible_alias = "w")]
    Write {
        #[command(flatten)]
        source: DescriptorSource,
        /// The path to the file to write the descriptor to
        #[clap(short, long)]
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct DescriptorSource {
    /// A JSON file with put-custom-runtime-function parameters
    #[clap(short, long)]
    pub params: PathBuf,
    /// The account the function would be deployed to
    #[clap(short, long)]
    pub account_id: String,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        let defaults = ServerConfig::default();

        Self {
            remote_mode: args.remote_mode,
            engine_bin: args.engine_bin,
            base_domain: args.base_domain,
            identity_region: args.identity_region,
            role_arn: args.role_arn.filter(|arn| !arn.trim().is_empty()),
            keep_workspaces: args.keep_workspaces,
            serialize_deploys: !args.no_serialize_deploys,
            workspace_root: args.workspace_root.unwrap_or(defaults.workspace_root),
        }
    }
}

// https://docs.rs/clap/latest/clap/_derive/index.html#arg-attributes

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_args_into_config() {
        let cli = Cli::try_parse_from([
            "fc",
            "serve",
            "--remote-mode",
            "true",
            "--engine-bin",
            "/usr/local/bin/s",
            "--no-serialize-deploys",
            "--workspace-root",
            "/var/tmp",
        ])
        .unwrap();

        let Commands::Serve { args } = cli.command else {
            panic!("expected serve");
        };
        let config = ServerConfig::from(args);

        assert!(config.remote_mode);
        assert_eq!(config.engine_bin, "/usr/local/bin/s");
        assert!(!config.serialize_deploys);
        assert_eq!(config.workspace_root, PathBuf::from("/var/tmp"));
        assert!(!config.keep_workspaces);
    }

    #[test]
    fn test_descriptor_write() {
        let cli = Cli::try_parse_from([
            "fc", "d", "w", "-p", "params.json", "-a", "1234", "-f", "s.yaml",
        ])
        .unwrap();

        match cli.command {
            Commands::Descriptor {
                command: DescriptorCommands::Write { source, file },
            } => {
                assert_eq!(source.account_id, "1234");
                assert_eq!(file, PathBuf::from("s.yaml"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
