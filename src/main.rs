// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use costctl::config::BackendConfig;
use costctl::kubernetes::create_client;
use costctl::predict::{decode_workloads, predict_workloads, PredictOptions};
use costctl::query::{query_agg_cost_model, query_currency_code, AggCostModelParams, QueryBackend};
use costctl::render::{aggregation_table, prediction_table};

/// Query and predict workload costs from an in-cluster cost-model
#[derive(Parser)]
#[command(name = "costctl", version, about, long_about = None)]
struct Cli {
    /// Namespace the cost-analyzer is installed in
    #[arg(long, short = 'N', global = true)]
    namespace: Option<String>,

    /// Name of the cost-analyzer service
    #[arg(long, global = true)]
    service_name: Option<String>,

    /// Reach the service through the API server proxy instead of a port-forward
    #[arg(long, global = true)]
    use_proxy: bool,

    /// Kubeconfig context to use
    #[arg(long, env = "COSTCTL_CONTEXT", global = true)]
    context: Option<String>,

    /// Seconds allowed per query
    #[arg(long, env = "COSTCTL_TIMEOUT_SECS", global = true)]
    timeout_secs: Option<u64>,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict the monthly cost of workloads described by manifests
    Predict(PredictArgs),
    /// Show aggregated monthly costs
    Cost(CostArgs),
}

#[derive(Args)]
struct PredictArgs {
    /// Manifest file to predict, `-` for stdin
    #[arg(long, short = 'f')]
    filepath: PathBuf,

    /// Cluster whose prices are used
    #[arg(long, short = 'c')]
    cluster_id: Option<String>,

    /// Window of cost data to derive prices from
    #[arg(long, default_value = "2d")]
    window: String,

    /// Also show the unit prices used for each prediction
    #[arg(long)]
    show_cost_per_resource_hr: bool,
}

#[derive(Args)]
struct CostArgs {
    #[arg(long, default_value = "1d")]
    window: String,

    /// Field to aggregate by, e.g. namespace, cluster, controller, label
    #[arg(long, default_value = "namespace")]
    aggregate: String,

    /// Subfield to aggregate by, e.g. the label name when aggregating by label
    #[arg(long)]
    aggregation_subfield: Option<String>,
}

impl Cli {
    fn backend_config(&self) -> BackendConfig {
        let mut config = BackendConfig::from_env();
        if let Some(namespace) = &self.namespace {
            config.namespace = namespace.clone();
        }
        if let Some(service_name) = &self.service_name {
            config.service_name = service_name.clone();
        }
        if self.use_proxy {
            config.use_proxy = true;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn read_manifests(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut input = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut input)
            .await
            .context("Failed to read manifests from stdin")?;
        return Ok(input);
    }
    if !path.exists() {
        bail!("file '{}' does not exist", path.display());
    }
    tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn run_predict(backend: &QueryBackend, args: &PredictArgs) -> Result<()> {
    let input = read_manifests(&args.filepath).await?;
    let workloads = decode_workloads(&input).context("Failed to decode manifests")?;
    info!("Decoded {} workloads", workloads.len());

    let options = PredictOptions {
        window: args.window.clone(),
        cluster_id: args.cluster_id.clone().filter(|c| !c.is_empty()),
    };
    let report = predict_workloads(backend, &workloads, &options).await?;

    println!("{}", prediction_table(&report, args.show_cost_per_resource_hr));
    Ok(())
}

async fn run_cost(backend: &QueryBackend, args: &CostArgs) -> Result<()> {
    let params = AggCostModelParams {
        window: args.window.clone(),
        aggregate: args.aggregate.clone(),
        aggregation_subfield: args.aggregation_subfield.clone(),
    };
    let (data, decode_error) = query_agg_cost_model(backend, &params)
        .await
        .context("Failed to query aggregated costs")?;
    if let Some(e) = decode_error {
        if data.is_empty() {
            bail!(e);
        }
        warn!("Showing partial results: {}", e);
    }

    let currency_code = query_currency_code(backend).await.unwrap_or_else(|e| {
        debug!("failed to get currency code, displaying as empty string: {}", e);
        String::new()
    });

    println!("{}", aggregation_table(&data, &currency_code));
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.backend_config();
    debug!("Configuration loaded: {:?}", config);

    let client = create_client(cli.context.as_deref()).await?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let backend = QueryBackend::new(client, config).with_cancellation(cancel);

    match &cli.command {
        Commands::Predict(args) => run_predict(&backend, args).await,
        Commands::Cost(args) => run_cost(&backend, args).await,
    }
}
