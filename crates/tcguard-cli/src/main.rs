mod config;
mod display;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tcguard_ai::{AnalysisService, ChatService, NegotiationService};
use tcguard_core::{AnalyzeResponse, Jurisdiction};
use tcguard_ingest::Ingestor;
use tracing_subscriber::EnvFilter;

use config::Settings;
use server::AppState;

#[derive(Parser)]
#[command(name = "tcguard", version, about = "T&C Guardian: contract risk analysis")]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API.
    Serve {
        #[arg(long, env = "TCGUARD_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
    /// Analyse a contract once and print the result.
    Analyze {
        /// Contract text. Mutually exclusive with --file and --url.
        #[arg(conflicts_with_all = ["file", "url"])]
        text: Option<String>,
        /// PDF or DOCX file to extract text from.
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,
        /// Page to scrape.
        #[arg(long)]
        url: Option<String>,
        /// Jurisdiction identifier or legacy code (e.g. EU_GDPR, US-CA).
        #[arg(long, default_value = "US_CALIFORNIA")]
        jurisdiction: String,
        /// Print the JSON response body instead of a card.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    tracing::info!("tcguard v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let state = build_state(&cli.settings)?;

    match cli.command {
        Command::Serve { bind } => server::serve(state, bind).await,
        Command::Analyze {
            text,
            file,
            url,
            jurisdiction,
            json,
        } => {
            let text = match (text, file, url) {
                (Some(text), _, _) => text,
                (None, Some(path), _) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading {}", path.display()))?;
                    let name = path.file_name().and_then(|n| n.to_str());
                    state.ingestor.extract_from_file(name, &bytes)?
                }
                (None, None, Some(url)) => state.ingestor.extract_from_url(&url).await?,
                (None, None, None) => anyhow::bail!("provide contract text, --file or --url"),
            };

            let outcome = state
                .analysis
                .analyze(&text, Jurisdiction::resolve(&jurisdiction))
                .await?;
            if json {
                let body = AnalyzeResponse::from(outcome.result);
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                display::print_analysis_card(&outcome.result, &format!("{:?}", outcome.source));
            }
            Ok(())
        }
    }
}

fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let stores = settings.open_stores()?;
    let model = settings.model_client();
    let config = settings.model_config();

    Ok(AppState {
        analysis: AnalysisService::new(stores.cache, model.clone(), config.clone()),
        chat: ChatService::new(model.clone(), config.clone()),
        negotiations: NegotiationService::new(stores.negotiations, model, config),
        ingestor: Arc::new(Ingestor::new(settings.max_pdf_pages)?),
    })
}
