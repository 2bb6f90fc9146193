//! Runtime settings: flags with environment fallbacks, plus an optional secrets file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::Deserialize;
use tcguard_ai::model::{
    DEFAULT_ANALYSIS_MODEL, DEFAULT_CHAT_MODEL, DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_TEMPERATURE,
};
use tcguard_ai::{GeminiClient, ModelClient, ModelConfig};
use tcguard_ingest::DEFAULT_MAX_PDF_PAGES;
use tcguard_store::{AnalysisCache, MemoryStore, NegotiationStore};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// No persistence: the cache is disabled and negotiations are not stored.
    None,
    /// Process-local maps, lost on restart.
    Memory,
    /// DuckDB file at `--db-path`.
    Duckdb,
}

#[derive(Debug, Clone, Args)]
pub struct Settings {
    /// Gemini API key. Without one, analysis returns fallback results.
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// JSON file with a `google_api_key` entry, read when no key is given.
    #[arg(long, env = "TCGUARD_SECRETS", global = true)]
    pub secrets: Option<PathBuf>,

    #[arg(
        long,
        env = "TCGUARD_ANALYSIS_MODEL",
        default_value = DEFAULT_ANALYSIS_MODEL,
        global = true,
    )]
    pub analysis_model: String,

    #[arg(long, env = "TCGUARD_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL, global = true)]
    pub chat_model: String,

    #[arg(long, env = "TCGUARD_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE, global = true)]
    pub temperature: f32,

    #[arg(
        long,
        env = "TCGUARD_MAX_TOKENS",
        default_value_t = DEFAULT_MAX_OUTPUT_TOKENS,
        global = true,
    )]
    pub max_tokens: u32,

    #[arg(
        long,
        env = "TCGUARD_STORE",
        value_enum,
        default_value_t = StoreKind::Memory,
        global = true,
    )]
    pub store: StoreKind,

    #[arg(long, env = "TCGUARD_DB_PATH", default_value = "tcguard.duckdb", global = true)]
    pub db_path: PathBuf,

    #[arg(
        long,
        env = "TCGUARD_MAX_PDF_PAGES",
        default_value_t = DEFAULT_MAX_PDF_PAGES,
        global = true,
    )]
    pub max_pdf_pages: usize,
}

#[derive(Deserialize)]
struct Secrets {
    google_api_key: Option<String>,
}

/// Persistence handles shared by the services.
pub struct Stores {
    pub cache: AnalysisCache,
    pub negotiations: Option<Arc<dyn NegotiationStore>>,
}

impl Settings {
    /// The explicit key if set, else the secrets file entry.
    pub fn resolve_api_key(&self) -> Option<String> {
        let explicit = self
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty());
        if let Some(key) = explicit {
            return Some(key.to_string());
        }
        let key = self.secrets.as_deref().and_then(read_secrets);
        if key.is_none() {
            warn!("GOOGLE_API_KEY is not set, AI features will use fallbacks or fail");
        }
        key
    }

    pub fn model_config(&self) -> ModelConfig {
        ModelConfig {
            analysis_model: self.analysis_model.clone(),
            chat_model: self.chat_model.clone(),
            temperature: self.temperature,
            max_output_tokens: self.max_tokens,
            ..ModelConfig::default()
        }
    }

    pub fn model_client(&self) -> Option<Arc<dyn ModelClient>> {
        self.resolve_api_key()
            .map(|key| Arc::new(GeminiClient::new(key)) as Arc<dyn ModelClient>)
    }

    pub fn open_stores(&self) -> anyhow::Result<Stores> {
        match self.store {
            StoreKind::None => {
                info!("persistence disabled");
                Ok(Stores {
                    cache: AnalysisCache::disabled(),
                    negotiations: None,
                })
            }
            StoreKind::Memory => {
                let store = Arc::new(MemoryStore::new());
                info!("using in-memory store");
                Ok(Stores {
                    cache: AnalysisCache::new(store.clone()),
                    negotiations: Some(store),
                })
            }
            StoreKind::Duckdb => self.open_duckdb(),
        }
    }

    #[cfg(feature = "duckdb")]
    fn open_duckdb(&self) -> anyhow::Result<Stores> {
        let store = Arc::new(
            tcguard_store::DuckStore::open_persistent(&self.db_path)
                .with_context(|| format!("opening {}", self.db_path.display()))?,
        );
        Ok(Stores {
            cache: AnalysisCache::new(store.clone()),
            negotiations: Some(store),
        })
    }

    #[cfg(not(feature = "duckdb"))]
    fn open_duckdb(&self) -> anyhow::Result<Stores> {
        anyhow::bail!(
            "cannot open {}: built without the `duckdb` feature",
            self.db_path.display()
        )
    }
}

fn read_secrets(path: &Path) -> Option<String> {
    let parsed = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))
        .and_then(|raw| serde_json::from_str::<Secrets>(&raw).context("parsing secrets file"));
    match parsed {
        Ok(secrets) => {
            info!(path = %path.display(), "configuration loaded from secrets file");
            secrets.google_api_key.filter(|k| !k.trim().is_empty())
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "failed to load secrets file");
            None
        }
    }
}
