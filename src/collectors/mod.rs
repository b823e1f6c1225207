// Post collectors: one per platform.
// Each fetches the newest raw posts for a run; filtering happens in the digest.

pub mod bluesky;
pub mod reddit;
pub mod runner;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::post::{RawPost, Source};

/// A sub-source (one subreddit, one search query) that failed this run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubsourceFailure {
    pub subsource: String,
    pub error: String,
}

impl std::fmt::Display for SubsourceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.subsource, self.error)
    }
}

/// Posts gathered by one collector, plus the sub-sources it had to skip.
#[derive(Debug, Default)]
pub struct Collected {
    pub posts: Vec<RawPost>,
    pub failures: Vec<SubsourceFailure>,
}

impl Collected {
    fn record_failure(&mut self, subsource: String, error: AppError) {
        tracing::warn!("Skipping {subsource}: {error}");
        self.failures.push(SubsourceFailure {
            subsource,
            error: error.to_string(),
        });
    }
}

/// Trait that all post collectors must implement.
/// A failing sub-source is recorded in `Collected::failures`; an `Err`
/// means the whole platform was unavailable (e.g. login failed).
#[async_trait]
pub trait PostCollector: Send + Sync {
    fn source(&self) -> Source;

    async fn collect(&self) -> Result<Collected, AppError>;
}
