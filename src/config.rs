use std::path::PathBuf;

use clap::Parser;

use crate::digest::reporter::ReportOptions;
use crate::error::AppError;
use crate::models::policy::{AcceptanceRule, Policy};

/// Largest snippet cap whose capped text plus `...` still fits in one
/// spreadsheet cell (32,767 characters).
pub const MAX_SNIPPET_CAP: u64 = 32_764;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobdigest",
    about = "Search Reddit and Bluesky for job posts and email a daily digest"
)]
pub struct Config {
    /// JSON policy file (keywords, locations, job_types, rule)
    #[arg(long, env = "JOBDIGEST_POLICY")]
    pub policy: Option<PathBuf>,

    /// Override the policy's acceptance rule
    #[arg(long, value_enum)]
    pub rule: Option<AcceptanceRule>,

    /// Maximum characters kept from a post body
    #[arg(
        long,
        env = "SNIPPET_CAP",
        default_value = "500",
        value_parser = clap::value_parser!(u64).range(0..=MAX_SNIPPET_CAP)
    )]
    pub snippet_cap: u64,

    /// Render and write the spreadsheet but do not send email
    #[arg(long)]
    pub dry_run: bool,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    pub log_format: LogFormat,

    #[arg(long, env = "REDDIT_CLIENT_ID")]
    pub reddit_client_id: Option<String>,

    #[arg(long, env = "REDDIT_CLIENT_SECRET", hide_env_values = true)]
    pub reddit_client_secret: Option<String>,

    #[arg(long, env = "REDDIT_USER_AGENT", default_value = "jobdigest/0.1")]
    pub reddit_user_agent: String,

    #[arg(long, env = "REDDIT_USERNAME")]
    pub reddit_username: Option<String>,

    #[arg(long, env = "REDDIT_PASSWORD", hide_env_values = true)]
    pub reddit_password: Option<String>,

    /// Subreddits scanned each run
    #[arg(
        long,
        env = "REDDIT_SUBREDDITS",
        value_delimiter = ',',
        default_values = [
            "forhire", "jobs", "psychology", "Neuropsychology",
            "remotework", "gradadmissions", "postbac", "clinicalpsych",
        ]
    )]
    pub subreddits: Vec<String>,

    /// Newest posts fetched per subreddit
    #[arg(long, env = "REDDIT_LIMIT", default_value = "50")]
    pub reddit_limit: u32,

    #[arg(long, env = "BSKY_USERNAME")]
    pub bsky_username: Option<String>,

    #[arg(long, env = "BSKY_PASSWORD", hide_env_values = true)]
    pub bsky_password: Option<String>,

    #[arg(long, env = "BSKY_SERVICE", default_value = "https://bsky.social")]
    pub bsky_service: String,

    /// Results requested per Bluesky search
    #[arg(long, env = "BSKY_LIMIT", default_value = "25")]
    pub bsky_limit: u32,

    #[arg(long, env = "EMAIL_ADDRESS")]
    pub email_address: Option<String>,

    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    pub email_password: Option<String>,

    #[arg(long, env = "EMAIL_SMTP_SERVER")]
    pub email_smtp_server: Option<String>,

    #[arg(long, env = "EMAIL_SMTP_PORT", default_value = "587")]
    pub email_smtp_port: u16,

    /// Recipient; defaults to the sending address
    #[arg(long, env = "EMAIL_SEND_TO")]
    pub email_send_to: Option<String>,

    /// Directory the spreadsheet is written to
    #[arg(long, env = "OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    #[arg(long, env = "ARTIFACT_PREFIX", default_value = "psych_jobs")]
    pub artifact_prefix: String,

    #[arg(long, env = "EMAIL_SUBJECT", default_value = "Psychology Jobs Report")]
    pub subject: String,

    /// Rows per source shown inline in the email
    #[arg(long, env = "PREVIEW_ROWS", default_value = "10")]
    pub preview_rows: usize,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the digest once (default when no subcommand given)
    Run,
    /// Run the digest repeatedly until interrupted
    Watch {
        /// Seconds between runs
        #[arg(long, env = "WATCH_INTERVAL", default_value = "86400")]
        interval_secs: u64,
    },
}

#[derive(Debug, Clone)]
pub struct RedditConfig {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
    pub username: String,
    pub password: String,
    pub subreddits: Vec<String>,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct BlueskyConfig {
    pub identifier: String,
    pub password: String,
    pub service_url: String,
    pub search_terms: Vec<String>,
    pub limit: u32,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

impl Config {
    /// Resolve the command, defaulting to Run if none specified.
    pub fn resolved_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Load the policy file, or fall back to the built-in policy.
    pub fn load_policy(&self) -> Result<Policy, AppError> {
        let mut policy = match &self.policy {
            Some(path) => Policy::load(path)?,
            None => Policy::default(),
        };
        if let Some(rule) = self.rule {
            policy.rule = rule;
        }
        Ok(policy)
    }

    /// Reddit settings, or `None` when credentials are incomplete.
    pub fn reddit(&self) -> Option<RedditConfig> {
        Some(RedditConfig {
            client_id: self.reddit_client_id.clone()?,
            client_secret: self.reddit_client_secret.clone()?,
            user_agent: self.reddit_user_agent.clone(),
            username: self.reddit_username.clone()?,
            password: self.reddit_password.clone()?,
            subreddits: self.subreddits.clone(),
            limit: self.reddit_limit,
        })
    }

    /// Bluesky settings, or `None` when credentials are incomplete.
    /// One search is issued per policy keyword.
    pub fn bluesky(&self, policy: &Policy) -> Option<BlueskyConfig> {
        Some(BlueskyConfig {
            identifier: self.bsky_username.clone()?,
            password: self.bsky_password.clone()?,
            service_url: self.bsky_service.trim_end_matches('/').to_string(),
            search_terms: policy.keywords.iter().map(|k| format!("{k} job")).collect(),
            limit: self.bsky_limit,
        })
    }

    pub fn smtp(&self) -> Result<SmtpConfig, AppError> {
        let missing = |name: &str| AppError::Config(format!("{name} is not set"));
        let from = self
            .email_address
            .clone()
            .ok_or_else(|| missing("EMAIL_ADDRESS"))?;
        Ok(SmtpConfig {
            server: self
                .email_smtp_server
                .clone()
                .ok_or_else(|| missing("EMAIL_SMTP_SERVER"))?,
            port: self.email_smtp_port,
            username: from.clone(),
            password: self
                .email_password
                .clone()
                .ok_or_else(|| missing("EMAIL_PASSWORD"))?,
            to: self.email_send_to.clone().unwrap_or_else(|| from.clone()),
            from,
        })
    }

    pub fn snippet_cap(&self) -> usize {
        self.snippet_cap as usize
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            subject: self.subject.clone(),
            artifact_prefix: self.artifact_prefix.clone(),
            preview_rows: self.preview_rows,
        }
    }
}
