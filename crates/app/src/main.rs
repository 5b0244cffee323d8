use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};
use kube::CustomResourceExt;

use tgrun_api::TerragruntRun;
use tgrun_reconcile::RunnerConfig;

#[derive(Parser, Debug)]
#[command(name = "tgrun", version, about = "Terragrunt run operator")]
struct Cli {
    /// Kubernetes namespace to watch (default: all namespaces)
    #[arg(long = "ns", global = true)]
    namespace: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the controller
    Run,
    /// Print the TerragruntRun CustomResourceDefinition as YAML
    Crd,
}

fn init_tracing() {
    let env = std::env::var("TGRUN_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("TGRUN_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid TGRUN_METRICS_ADDR; metrics disabled");
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_metrics();
            let cfg = RunnerConfig::from_env();
            tgrun_kubehub::run_controller(cfg, cli.namespace.as_deref()).await
        }
        Commands::Crd => {
            println!("{}", serde_yaml::to_string(&TerragruntRun::crd())?);
            Ok(())
        }
    }
}
