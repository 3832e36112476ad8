// ABOUTME: Entry point for the postview binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and serves post pages or imports posts.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use postview_agent::GeminiSummarizer;
use postview_agent::testing::FailingSummarizer;
use postview_core::{AmmoniaSanitizer, PostStore, SummarizerService};
use postview_server::{AppState, PostviewConfig, StoreKind, create_router};
use postview_store::{HttpPostStore, SqlitePostStore, import_posts};

#[derive(Parser)]
#[command(name = "postview", version, about = "Post pages with safe HTML and AI summaries")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Address to bind, overrides POSTVIEW_BIND
        #[arg(long)]
        bind: Option<SocketAddr>,
        /// SQLite database path, overrides POSTVIEW_DB
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Load a JSON array of posts into the SQLite store
    Import {
        file: PathBuf,
        /// SQLite database path, overrides POSTVIEW_DB
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("postview=debug,tower_http=debug")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = PostviewConfig::from_env()?;

    match cli.command.unwrap_or(Command::Serve { bind: None, db: None }) {
        Command::Serve { bind, db } => {
            if let Some(bind) = bind {
                config.bind = bind;
            }
            if let Some(db) = db {
                config.db_path = db;
            }
            serve(config).await
        }
        Command::Import { file, db } => {
            let db_path = db.unwrap_or(config.db_path);
            let store = SqlitePostStore::open(&db_path)
                .with_context(|| format!("opening {}", db_path.display()))?;
            let count = import_posts(&store, &file).await?;
            println!("imported {} posts into {}", count, db_path.display());
            Ok(())
        }
    }
}

fn build_store(config: &PostviewConfig) -> anyhow::Result<Arc<dyn PostStore>> {
    match config.store {
        StoreKind::Sqlite => {
            let store = SqlitePostStore::open(&config.db_path)
                .with_context(|| format!("opening {}", config.db_path.display()))?;
            tracing::info!(path = %config.db_path.display(), "using sqlite post store");
            Ok(Arc::new(store))
        }
        StoreKind::Http => {
            let api_url = config
                .api_url
                .as_deref()
                .context("POSTVIEW_API_URL is required for the http store")?;
            tracing::info!(api_url, "using remote post store");
            Ok(Arc::new(HttpPostStore::new(api_url, config.api_token.clone())?))
        }
    }
}

fn build_summarizer(config: &PostviewConfig) -> Arc<dyn SummarizerService> {
    match &config.gemini_api_key {
        Some(key) => {
            tracing::info!(model = %config.gemini_model, "summaries via gemini");
            Arc::new(GeminiSummarizer::new(
                key.clone(),
                config.gemini_base_url.clone(),
                config.gemini_model.clone(),
            ))
        }
        None => {
            tracing::warn!("GEMINI_API_KEY not set; summary requests will show the failure notice");
            Arc::new(FailingSummarizer)
        }
    }
}

async fn serve(config: PostviewConfig) -> anyhow::Result<()> {
    if !config.allow_remote && !config.bind.ip().is_loopback() {
        anyhow::bail!(
            "refusing to bind {} without POSTVIEW_ALLOW_REMOTE=true",
            config.bind
        );
    }

    let state = Arc::new(AppState::new(
        build_store(&config)?,
        build_summarizer(&config),
        Arc::new(AmmoniaSanitizer),
        config.auth_token.clone(),
        config.base_url(),
    ));

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!(addr = %config.bind, "postview listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
