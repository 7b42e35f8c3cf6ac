use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod api;
mod candidates;
mod config;
mod connection;
mod exit_codes;
mod matcher;
mod output;
mod session;
mod store;

use api::AppState;
use candidates::{CandidateSource, PeerCandidates, StoreCandidates};
use config::{Config, StorageKind};
use exit_codes::ConfigError;
use matcher::{LexicalStrategy, Matcher, ValueStrategy};
use output::{JsonError, MatchResponse, Output, PhrasesResponse};
use store::{MemoryPhraseStore, PgPhraseStore, PhraseStore};

/// Version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "wordmatch")]
#[command(version = VERSION)]
#[command(about = "Match text against stored phrases by letter value and lexical order", long_about = None)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Database URL (overrides DATABASE_URL env var and config file)
    #[arg(short = 'd', long = "database-url", global = true)]
    database_url: Option<String>,

    /// Path to config file (default: ./wordmatch.toml)
    #[arg(long = "config", global = true)]
    config_path: Option<PathBuf>,

    /// Errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service (POST /analyze, GET /analyze)
    Serve {
        /// Listen address (default: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
        /// Listen port (default: 8089)
        #[arg(short, long)]
        port: Option<u16>,
        /// Take candidates from a peer's GET /analyze instead of the local store
        #[arg(long, value_name = "URL")]
        peer: Option<String>,
        #[command(flatten)]
        strategies: StrategyArgs,
        /// Create the phrases table before serving
        #[arg(long)]
        init: bool,
    },
    /// Create the phrases table if it does not exist
    Init,
    /// Inspect or add stored phrases
    Phrases {
        #[command(subcommand)]
        command: PhrasesCommands,
    },
    /// Match text against the stored phrases without storing it
    Match {
        text: String,
        #[command(flatten)]
        strategies: StrategyArgs,
        /// Show the result of every value/lexical strategy pair
        #[arg(long, conflicts_with_all = ["value", "lexical"])]
        compare: bool,
    },
}

#[derive(Subcommand)]
enum PhrasesCommands {
    /// List every stored phrase
    List,
    /// Store one phrase
    Add { text: String },
}

#[derive(clap::Args, Debug, Clone, Default)]
struct StrategyArgs {
    /// Closest-value strategy: value-diff | length-diff
    #[arg(long = "value-strategy", value_name = "STRATEGY")]
    value: Option<ValueStrategy>,
    /// Closest-lexical strategy: lower-bound | case-insensitive
    #[arg(long = "lexical-strategy", value_name = "STRATEGY")]
    lexical: Option<LexicalStrategy>,
}

fn init_tracing(quiet: bool, verbose: bool) {
    let level = if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    // Load .env file if present (before parsing CLI so env vars are available)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);
    let output = Output::new(cli.json, cli.quiet);

    if let Err(e) = run(cli, &output).await {
        let code = exit_codes::for_error(&e);
        if output.is_json() {
            JsonError::new(e.to_string(), Some(format!("{e:#}")), code).print();
        } else {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(code);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let config = Config::load(cli.config_path.as_deref())
        .map_err(|e| ConfigError(format!("{e:#}")))?;
    let store = open_store(&config, cli.database_url.as_deref()).await?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            peer,
            strategies,
            init,
        } => {
            if init {
                store
                    .ensure_schema()
                    .await
                    .context("Failed to create phrases table")?;
            }

            let addr = config
                .listen_addr(host.as_deref(), port)
                .map_err(|e| ConfigError(format!("{e:#}")))?;
            let matcher = config.matcher(strategies.value, strategies.lexical);
            let candidates = candidate_source(&config, peer.as_deref(), &store)?;

            api::serve(AppState::new(candidates, store, matcher), addr).await
        }
        Commands::Init => {
            store
                .ensure_schema()
                .await
                .context("Failed to create phrases table")?;
            if output.is_json() {
                output.json(&serde_json::json!({ "ok": true, "table": "phrases" }))?;
            } else {
                output.info("phrases table ready");
            }
            Ok(())
        }
        Commands::Phrases { command } => match command {
            PhrasesCommands::List => {
                let phrases = store.list_phrases().await.context("Failed to list phrases")?;
                if output.is_json() {
                    output.json(&PhrasesResponse {
                        ok: true,
                        count: phrases.len(),
                        phrases,
                    })?;
                } else {
                    for phrase in &phrases {
                        output.data(phrase);
                    }
                    output.info(&format!("{} phrase(s)", phrases.len()));
                }
                Ok(())
            }
            PhrasesCommands::Add { text } => {
                store
                    .insert_phrase(&text)
                    .await
                    .context("Failed to store phrase")?;
                if output.is_json() {
                    output.json(&serde_json::json!({ "ok": true, "phrase": text }))?;
                } else {
                    output.info(&format!("stored {:?}", text));
                }
                Ok(())
            }
        },
        Commands::Match {
            text,
            strategies,
            compare,
        } => {
            let words = store.list_phrases().await.context("Failed to list phrases")?;
            let matchers = if compare {
                ValueStrategy::ALL
                    .iter()
                    .flat_map(|&value| {
                        LexicalStrategy::ALL
                            .iter()
                            .map(move |&lexical| Matcher::new(value, lexical))
                    })
                    .collect()
            } else {
                vec![config.matcher(strategies.value, strategies.lexical)]
            };

            let responses: Vec<MatchResponse> = matchers
                .into_iter()
                .map(|matcher| MatchResponse {
                    ok: true,
                    text: text.clone(),
                    candidates: words.len(),
                    value_strategy: matcher.value.to_string(),
                    lexical_strategy: matcher.lexical.to_string(),
                    result: matcher.analyze(&text, &words),
                })
                .collect();

            if output.is_json() {
                if let [single] = responses.as_slice() {
                    output.json(single)?;
                } else {
                    output.json(&responses)?;
                }
            } else {
                for response in &responses {
                    let label = format!("{}/{}", response.value_strategy, response.lexical_strategy);
                    output.match_result(&label, &response.result);
                }
            }
            Ok(())
        }
    }
}

async fn open_store(config: &Config, cli_url: Option<&str>) -> Result<Arc<dyn PhraseStore>> {
    match config.storage() {
        StorageKind::Memory => {
            tracing::warn!("using in-memory phrase store; phrases are lost on exit");
            Ok(Arc::new(MemoryPhraseStore::new()))
        }
        StorageKind::Postgres => {
            let env_url = std::env::var("DATABASE_URL").ok();
            let conn = config
                .resolve_database_url(cli_url, env_url.as_deref())
                .map_err(|e| ConfigError(format!("{e:#}")))?;
            let timeouts = config.timeouts();
            conn.log_banner();

            let store = PgPhraseStore::connect(&conn.url, config.pool_size(), &timeouts)
                .await
                .with_context(|| format!("Failed to open phrase store at {}", conn.display()))?;
            tracing::info!(pool_size = store.pool_size(), "phrase store ready");
            Ok(Arc::new(store))
        }
    }
}

fn candidate_source(
    config: &Config,
    cli_peer: Option<&str>,
    store: &Arc<dyn PhraseStore>,
) -> Result<Arc<dyn CandidateSource>> {
    match config.peer_url(cli_peer) {
        Some(url) => {
            let peer = PeerCandidates::new(url, config.peer_timeout())
                .map_err(|e| ConfigError(format!("{e:#}")))?;
            Ok(Arc::new(peer))
        }
        None => Ok(Arc::new(StoreCandidates::new(Arc::clone(store)))),
    }
}
