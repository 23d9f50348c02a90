//! bizplan-server: serve the generation API, or talk to a running one.

use anyhow::{Context, Result};
use bizplan::config::AppConfig;
use bizplan::delivery::DOWNLOAD_FILENAME;
use bizplan::observability::init_tracing;
use bizplan::pipeline::BusinessPlanPipeline;
use bizplan::service::GenerationService;
use bizplan_server::{router, AppState, PlanClient};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Business plan generator.
#[derive(Parser)]
#[command(name = "bizplan-server", version, about = "Generate business plans with a staged LLM pipeline.")]
struct Cli {
    /// TOML configuration file.
    #[arg(long, global = true, env = "BIZPLAN_CONFIG")]
    config: Option<PathBuf>,

    /// Emit JSON log lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Bind address; overrides the config file.
        #[arg(long, env = "BIZPLAN_HOST")]
        host: Option<String>,

        /// Bind port; overrides the config file.
        #[arg(long, env = "BIZPLAN_PORT")]
        port: Option<u16>,
    },

    /// Post an intake file to a running server and save the plan.
    Generate {
        /// JSON file with intake answers and provider keys.
        #[arg(short, long)]
        input: PathBuf,

        /// Full URL of the generate endpoint.
        #[arg(long, env = "BIZPLAN_ENDPOINT")]
        endpoint: Option<String>,

        /// Directory the plan is written to.
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Print the resolved stage order.
    Stages,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.log_json {
        config.logging.json = true;
    }
    init_tracing(&config.logging)?;

    match cli.command {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Generate { input, endpoint, output } => generate(&input, endpoint, &output).await,
        Command::Stages => stages(),
    }
}

async fn serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let service = GenerationService::from_config(&config)?;
    tracing::info!(stages = service.pipeline().stages().len(), "Stage catalog validated");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.server.host, config.server.port))?;
    let listener = tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, "Business Plan Generator API listening");

    axum::serve(listener, router(AppState::new(service)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("Shutting down");
    }
}

async fn generate(input: &Path, endpoint: Option<String>, output: &Path) -> Result<()> {
    let client = PlanClient::new(endpoint)?;
    let text = std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let body: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", input.display()))?;

    let document = client.generate(&body).await?;

    std::fs::create_dir_all(output).with_context(|| format!("creating {}", output.display()))?;
    let path = output.join(DOWNLOAD_FILENAME);
    std::fs::write(&path, document.body()).with_context(|| format!("writing {}", path.display()))?;
    println!("Business plan written to {}", path.display());
    Ok(())
}

fn stages() -> Result<()> {
    let pipeline = BusinessPlanPipeline::business_plan()?;
    for (i, stage) in pipeline.stages().iter().enumerate() {
        let deps = if stage.depends_on.is_empty() { "-".to_string() } else { stage.depends_on.join(", ") };
        println!("{:>2}. {:<32} {:<10} {:<7} <- {}", i + 1, stage.name, stage.kind.to_string(), stage.provider.to_string(), deps);
    }
    Ok(())
}
