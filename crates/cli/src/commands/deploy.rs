use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use localdeploy_core::{OperationError, Report};
use localdeploy_deploy::{DeployConfig, LocalDeployHandler, LocalDeployRequest, SequentialOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::OutputFormat;

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Compiled template document (JSON).
    #[arg(short, long)]
    pub template: PathBuf,

    /// Compiled parameters document (JSON).
    #[arg(short, long)]
    pub parameters: Option<PathBuf>,

    /// Report intended outcomes without committing side effects.
    #[arg(long)]
    pub preview: bool,
}

pub async fn run(config: DeployConfig, args: &DeployArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let mut handler = LocalDeployHandler::new(config);
    if args.preview {
        handler = handler.with_orchestrator(Arc::new(SequentialOrchestrator::preview()));
    }

    let mut request = LocalDeployRequest::new(&args.template);
    if let Some(parameters) = &args.parameters {
        request = request.with_parameters(parameters);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling deployment");
            on_interrupt.cancel();
        }
    });

    let report = handler.handle(&request, cancel).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", render_text(&report)),
    }
    Ok(())
}

fn render_text(report: &Report) -> String {
    let mut lines = vec![format!("Deployment: {}", report.deployment.provisioning_state)];
    if let Some(error) = &report.deployment.error {
        lines.push(format!("  error: {}", describe(error)));
    }

    if !report.deployment.outputs.is_empty() {
        lines.push("Outputs:".to_owned());
        for (name, value) in &report.deployment.outputs {
            lines.push(format!("  {name} = {value}"));
        }
    }

    lines.push(format!("Operations ({}):", report.operations.len()));
    for op in &report.operations {
        let marker = if op.error.is_some() { "ERR" } else { "OK " };
        lines.push(format!("  [{marker}] {} | {}", op.resource_name, op.provisioning_state));
        if let Some(error) = &op.error {
            lines.push(format!("        {}", describe(error)));
        }
    }

    lines.join("\n")
}

fn describe(error: &OperationError) -> String {
    if error.target.is_empty() {
        format!("{}: {}", error.code, error.message)
    } else {
        format!("{}: {} (target: {})", error.code, error.message, error.target)
    }
}
