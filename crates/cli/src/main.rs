use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finsearch_core::attachments::{self, AttachedQuery};
use finsearch_core::domain::entry::ResultEntry;
use finsearch_core::domain::query::classify;
use finsearch_core::history::session::HistorySession;
use finsearch_core::market_data::twelve_data::TwelveDataClient;
use finsearch_core::market_data::{self, DEFAULT_INTERVAL};
use finsearch_core::suggest;

mod files;

#[derive(Debug, Parser)]
#[command(name = "finsearch")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the category and lookup key for a query.
    Classify {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// Run queries through a history session and print the resulting entries.
    Ask {
        #[arg(required = true)]
        queries: Vec<String>,

        /// Seed for reproducible answers.
        #[arg(long)]
        seed: Option<u64>,

        /// Overrides SIMULATED_LATENCY_MS.
        #[arg(long)]
        latency_ms: Option<u64>,
    },

    /// Fuzzy-match the suggestion catalog.
    Suggest {
        #[arg(default_value = "")]
        input: String,
    },

    /// Fetch live market data for a ticker (needs TWELVE_DATA_API_KEY).
    Quote {
        ticker: String,

        #[arg(long, default_value = DEFAULT_INTERVAL)]
        interval: String,
    },

    /// Validate local files for upload and print the encoded queries.
    Attach {
        #[arg(required = true, value_name = "FILE")]
        paths: Vec<PathBuf>,

        #[arg(long)]
        question: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finsearch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Classify { query } => {
            let classification = classify(&query.join(" "));
            print_json(&classification)?;
        }
        Command::Ask {
            queries,
            seed,
            latency_ms,
        } => {
            let mut options = settings.session_options();
            options.seed = seed;
            if let Some(ms) = latency_ms {
                options.latency = Duration::from_millis(ms);
            }

            let session = HistorySession::new(options);
            for query in &queries {
                if session.submit_and_wait(query).await.is_none() {
                    tracing::warn!(%query, "query produced no entry");
                }
            }

            let entries = session.current_entries().await;
            session.shutdown().await;
            let entries: Vec<&ResultEntry> = entries.iter().map(|e| e.as_ref()).collect();
            print_json(&entries)?;
        }
        Command::Suggest { input } => {
            if input.trim().is_empty() {
                print_json(&suggest::ICEBREAKERS)?;
            } else {
                print_json(&suggest::group(suggest::search(&input)))?;
            }
        }
        Command::Quote { ticker, interval } => {
            let client = TwelveDataClient::from_settings(&settings)?;
            let combined = market_data::aggregate(&client, &ticker, &interval).await;
            if combined.all_failed() {
                let err = anyhow::anyhow!(
                    "failed to fetch any data for {ticker}: {:?}",
                    combined.errors
                );
                sentry_anyhow::capture_anyhow(&err);
                return Err(err);
            }
            print_json(&combined)?;
        }
        Command::Attach { paths, question } => {
            let descriptors = paths
                .iter()
                .map(|p| files::describe(p))
                .collect::<anyhow::Result<Vec<_>>>()?;

            let report = attachments::validate_batch(&descriptors);
            for message in report.messages() {
                tracing::warn!(%message, "attachment rejected");
            }

            let question = question.as_deref().map(str::trim).filter(|q| !q.is_empty());
            let queries: Vec<String> = report
                .accepted
                .into_iter()
                .map(|file| AttachedQuery::new(file, question).to_query_string())
                .collect();
            print_json(&queries)?;
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn init_sentry(settings: &finsearch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
