mod collectors;
mod config;
mod delivery;
mod digest;
mod error;
mod models;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::collectors::PostCollector;
use crate::collectors::bluesky::BlueskyCollector;
use crate::collectors::reddit::RedditCollector;
use crate::collectors::runner::Runner;
use crate::config::{Command, Config, LogFormat};
use crate::delivery::Mailer;
use crate::delivery::mailer::SmtpMailer;
use crate::delivery::workbook::XlsxWriter;
use crate::error::AppError;

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("jobdigest=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn build_runner(config: &Config) -> Result<Runner, AppError> {
    let policy = config.load_policy()?;
    tracing::info!(
        "Policy: {} keywords, {} locations, {} job types, rule {:?}",
        policy.keywords.len(),
        policy.locations.len(),
        policy.job_types.len(),
        policy.rule
    );

    let mut collectors: Vec<Box<dyn PostCollector>> = Vec::new();
    match config.reddit() {
        Some(reddit) => collectors.push(Box::new(RedditCollector::new(reddit)?)),
        None => tracing::warn!("Reddit credentials incomplete, skipping Reddit"),
    }
    match config.bluesky(&policy) {
        Some(bsky) => collectors.push(Box::new(BlueskyCollector::new(bsky)?)),
        None => tracing::warn!("Bluesky credentials incomplete, skipping Bluesky"),
    }

    let mailer: Option<Box<dyn Mailer>> = if config.dry_run {
        None
    } else {
        Some(Box::new(SmtpMailer::new(config.smtp()?)?))
    };

    Ok(Runner {
        policy,
        snippet_cap: config.snippet_cap(),
        options: config.report_options(),
        collectors,
        writer: Box::new(XlsxWriter::new(config.output_dir.clone())),
        mailer,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.log_format);

    let runner = build_runner(&config)
        .map_err(|e| anyhow::anyhow!("{} stage failed: {e}", e.stage()))?;

    match config.resolved_command() {
        Command::Run => {
            let outcome = runner
                .run_once(Local::now().date_naive())
                .await
                .map_err(|e| {
                    tracing::error!(stage = e.stage(), "Run failed: {e}");
                    anyhow::anyhow!("{} stage failed: {e}", e.stage())
                })?;
            tracing::info!(
                "Scrape complete: {} matches, {} fetch failures, email {}",
                outcome.total(),
                outcome.failures.len(),
                if outcome.delivered { "sent" } else { "not sent" }
            );
        }
        Command::Watch { interval_secs } => runner.watch(interval_secs).await?,
    }

    Ok(())
}
