use std::{path::PathBuf, str::FromStr};

use anyhow::Context;
use apalis::{layers::sentry::SentryLayer, prelude::*};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand};
use cron::Schedule;
use feed_digest::{
    config::{AppConfig, Variant},
    extract::{enclosure::EnclosureDownloader, ContentExtractor},
    gemini::GeminiClient,
    handler::handle_trigger,
    markdown::clean_html_output,
    tracing::init_tracing_subscriber,
    types::FeedItem,
    Summarizer,
};
use tokio::sync::Mutex;

/// Held for the duration of a scheduled run so ticks never overlap
static RUN_LOCK: Mutex<()> = Mutex::const_new(());

#[derive(Parser)]
#[command(
    name = "feed-digest",
    about = "Summarizes new feed items with Gemini and emails the digest"
)]
struct Cli {
    #[command(flatten)]
    config: AppConfig,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline once, print the result and exit
    Run,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression (with seconds)
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 0 * * * *")]
        schedule: String,
    },
    /// List the Gemini models available to the configured key
    Models,
    /// Download and summarize a single audio URL, writing the HTML to a file
    TryEpisode {
        #[arg(long)]
        audio_url: String,

        #[arg(long, default_value = "Test Episode")]
        title: String,

        #[arg(long, default_value = "summary.html")]
        output: PathBuf,
    },
}

async fn handle_tick(_tick: Tick, config: Data<AppConfig>) -> anyhow::Result<()> {
    let Ok(_guard) = RUN_LOCK.try_lock() else {
        tracing::warn!("Previous run still in progress, skipping tick");
        return Ok(());
    };

    tracing::info!(variant = ?config.variant, "Running scheduled pipeline...");
    let result = handle_trigger(serde_json::Value::Null, &config).await;
    tracing::info!(
        status = result.status_code,
        message = %result.message,
        "Scheduled run finished"
    );

    Ok(())
}

async fn list_models(config: &AppConfig) -> anyhow::Result<()> {
    let client = GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_model)?;

    for model in client.list_models().await? {
        match model.display_name {
            Some(display_name) => println!("{} ({display_name})", model.name),
            None => println!("{}", model.name),
        }
    }

    Ok(())
}

async fn try_episode(
    config: &AppConfig,
    audio_url: String,
    title: String,
    output: PathBuf,
) -> anyhow::Result<()> {
    let prompt_path = config
        .prompt_path
        .clone()
        .unwrap_or_else(|| Variant::Podcast.default_prompt_path().into());
    let summarizer = GeminiClient::new(config.gemini_api_key.clone(), &config.gemini_model)?
        .with_prompt_path(prompt_path);

    let item = FeedItem {
        id: "manual-test".into(),
        title,
        audio_url: Some(audio_url),
        ..Default::default()
    };

    tracing::info!(url = ?item.audio_url, "Downloading episode...");
    let content = EnclosureDownloader::new()?
        .extract(&item, &config.workdir)
        .await
        .context("Failed to download episode")?;

    tracing::info!("Summarizing episode...");
    let summary = summarizer
        .summarize(&item.title, &content)
        .await
        .context("Failed to summarize episode")?;

    let html = clean_html_output(&summary.summary);
    tokio::fs::write(&output, html)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    tracing::info!(path = ?output, "Summary written");
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = cli.config;

    match cli.command {
        Command::Run => {
            tracing::info!(variant = ?config.variant, "Running pipeline once...");
            let result = handle_trigger(serde_json::Value::Null, &config).await;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("feed-digest-cron")
                .backend(CronStream::new(schedule))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
        Command::Models => list_models(&config).await?,
        Command::TryEpisode {
            audio_url,
            title,
            output,
        } => try_episode(&config, audio_url, title, output).await?,
    }

    Ok(())
}
