use clap::Parser;
use fc_functions_mcp_rs::{
    cli::{Cli, Commands, DescriptorCommands},
    config::ServerConfig,
    main_actions::{print_descriptor, run_server, write_descriptor_to_file},
};
use tracing_subscriber::EnvFilter;

/// Logs go to stderr, stdout carries the MCP protocol.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("fc_functions_mcp_rs=info,rmcp=warn"));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve { args } => run_server(ServerConfig::from(args)).await,
        Commands::Descriptor { command } => match command {
            DescriptorCommands::Print { source } => {
                print_descriptor(&source.params, &source.account_id).await
            }
            DescriptorCommands::Write { source, file } => {
                write_descriptor_to_file(&source.params, &source.account_id, &file).await
            }
        },
    };

    if let Err(error) = result {
        tracing::error!("{:#}", error);
        std::process::exit(1);
    }
}
