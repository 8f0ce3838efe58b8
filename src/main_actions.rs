use crate::{
    config::ServerConfig,
    descriptor::DeploymentDescriptor,
    operator::{render_create_descriptor, Backends, FunctionOperator},
    request::functions::CreateFunctionRequest,
    server::FcMcpServer,
};
use anyhow::{Context, Result as AnyResult};
use rmcp::{transport::stdio, ServiceExt};
use std::{path::Path, sync::Arc};
use tracing::{trace_span, Instrument};

pub async fn run_server(config: ServerConfig) -> AnyResult<()> {
    tracing::info!(
        remote_mode = config.remote_mode,
        engine_bin = %config.engine_bin,
        base_domain = %config.base_domain,
        serialize_deploys = config.serialize_deploys,
        assume_role = config.role_arn.is_some(),
        "Running with current config."
    );

    let backends = Backends::from_config(&config);
    let operator = Arc::new(FunctionOperator::new(config, backends));

    let service = FcMcpServer::new(operator)
        .serve(stdio())
        .instrument(trace_span!("Initialize"))
        .await
        .context("Failed to start the MCP service")?;

    tracing::info!("Serving on stdio.");

    let reason = service
        .waiting()
        .await
        .context("MCP service terminated abnormally")?;

    tracing::info!(?reason, "MCP service stopped.");

    Ok(())
}

pub async fn read_create_request(path: &Path) -> AnyResult<CreateFunctionRequest> {
    let params = tokio::fs::read_to_string(path)
        .await
        .context("Failed to read parameters from file")?;
    let request = serde_json::from_str(&params).context("Failed to parse parameters")?;
    Ok(request)
}

pub async fn render_descriptor(params: &Path, account_id: &str) -> AnyResult<DeploymentDescriptor> {
    let request = read_create_request(params).await?;
    let descriptor =
        render_create_descriptor(&request, account_id).context("Failed to render descriptor")?;
    Ok(descriptor)
}

pub async fn print_descriptor(params: &Path, account_id: &str) -> AnyResult<()> {
    let descriptor = render_descriptor(params, account_id).await?;
    println!("{}", descriptor.to_yaml_string()?);
    Ok(())
}

pub async fn write_descriptor_to_file(params: &Path, account_id: &str, file: &Path) -> AnyResult<()> {
    let descriptor = render_descriptor(params, account_id).await?;
    descriptor
        .save(file)
        .await
        .context("Failed to write descriptor to file")?;
    Ok(())
}
