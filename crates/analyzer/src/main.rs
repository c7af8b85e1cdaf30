use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use analyzer::render;
use analyzer::{AnalysisOrchestrator, OrchestratorConfig};
use backend::{AnalysisBackend, FunctionClient, StatsClient, StatsStore, VisionClient};
use common::config::AppConfig;
use common::logger;
use common::models::{AuthSession, ImageError, ImageFormat, ImagePayload, TradeOutcome};

#[derive(Parser)]
#[command(name = "chart-signal")]
#[command(about = "BUY/SELL signals from trading chart screenshots", long_about = None)]
struct Cli {
    #[command(flatten)]
    auth: AuthArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct AuthArgs {
    /// Backend user id
    #[arg(long, env = "ANALYZER_USER_ID", global = true)]
    user_id: Option<String>,

    /// Backend access token (JWT)
    #[arg(long, env = "ANALYZER_ACCESS_TOKEN", global = true, hide_env_values = true)]
    access_token: Option<String>,
}

impl AuthArgs {
    fn session(&self) -> Option<AuthSession> {
        match (&self.user_id, &self.access_token) {
            (Some(user_id), Some(token)) => Some(AuthSession::new(user_id, token)),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a chart screenshot
    Analyze {
        /// JPEG, PNG, GIF or WebP file
        image: PathBuf,
        /// Call the vision model directly instead of the hosted function
        #[arg(long)]
        direct: bool,
        /// Print the parsed analysis as JSON
        #[arg(long)]
        json: bool,
        /// Record the trade outcome (win or loss) once the analysis completes
        #[arg(long)]
        mark: Option<TradeOutcome>,
    },
    /// Show trading statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    logger::setup_logger();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    debug!("Configuration loaded for {}", config.backend_url);

    match cli.command {
        Commands::Analyze {
            image,
            direct,
            json,
            mark,
        } => analyze(&config, cli.auth.session(), &image, direct, json, mark).await,
        Commands::Stats => stats(&config, cli.auth.session()).await,
    }
}

fn build_orchestrator(config: &AppConfig, direct: bool) -> Result<AnalysisOrchestrator> {
    let backend: Arc<dyn AnalysisBackend> = if direct {
        Arc::new(VisionClient::from_config(config)?)
    } else {
        Arc::new(FunctionClient::from_config(config)?)
    };
    let stats = Arc::new(StatsClient::from_config(config)?);

    Ok(AnalysisOrchestrator::new(
        backend,
        stats,
        OrchestratorConfig::from(config),
    ))
}

async fn load_image(path: &Path) -> Result<ImagePayload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let format = ImageFormat::sniff(&bytes)
        .or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(ImageFormat::from_extension)
        })
        .ok_or(ImageError::UnsupportedFormat)?;

    Ok(ImagePayload::from_bytes(&bytes, format)?)
}

async fn analyze(
    config: &AppConfig,
    auth: Option<AuthSession>,
    path: &Path,
    direct: bool,
    json: bool,
    mark: Option<TradeOutcome>,
) -> Result<()> {
    let orchestrator = build_orchestrator(config, direct)?;
    orchestrator.set_image(load_image(path).await?).await?;

    let mut progress_rx = orchestrator.subscribe_progress();
    let mut state_rx = orchestrator.subscribe_state();
    let reporter = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let progress = *progress_rx.borrow_and_update();
            if state_rx.borrow_and_update().is_busy() {
                eprint!("\rAnalyzing... {progress:>3.0}%");
                let _ = std::io::stderr().flush();
            }
        }
    });

    let result = orchestrator.analyze(auth.as_ref()).await;
    reporter.abort();
    eprintln!();

    let completed = match result {
        Ok(completed) => completed,
        Err(err) => bail!("{}", err.user_message()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&completed.parsed)?);
    } else {
        print!("{}", render::render_analysis(&completed.parsed));
    }

    if let Some(outcome) = mark {
        let auth = auth.context("sign in to record trade outcomes")?;
        let stats = orchestrator.mark_outcome(&auth, outcome).await?;
        println!("\n{}", render::render_outcome(outcome, &stats));
    }

    Ok(())
}

async fn stats(config: &AppConfig, auth: Option<AuthSession>) -> Result<()> {
    let auth = auth.context("sign in to view trading statistics (--user-id, --access-token)")?;
    let client = StatsClient::from_config(config)?;

    let stats = client.load_stats(&auth).await?;
    println!("{}", render::render_stats(&stats));
    Ok(())
}
