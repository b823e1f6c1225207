// Classification and aggregation core.
// Pure and synchronous: raw posts in, grouped report rows out.

pub mod aggregator;
pub mod classifier;
pub mod normalizer;
pub mod reporter;

use std::collections::BTreeMap;

use crate::models::policy::Policy;
use crate::models::post::{RawPost, Source};
use crate::models::report::{Report, ReportRow};

/// Classify, normalize and aggregate one run's fetched posts.
pub fn build_report(
    policy: &Policy,
    snippet_cap: usize,
    batches: impl IntoIterator<Item = (Source, Vec<RawPost>)>,
) -> Report {
    let mut rows_by_source: BTreeMap<Source, Vec<ReportRow>> = BTreeMap::new();
    for (source, posts) in batches {
        let fetched = posts.len();
        let accepted: Vec<ReportRow> = posts
            .into_iter()
            .filter(|p| classifier::accepts(&p.title, &p.body, policy))
            .map(|p| normalizer::normalize(p, snippet_cap))
            .collect();
        tracing::info!("{source}: {} of {fetched} posts matched", accepted.len());
        rows_by_source.entry(source).or_default().extend(accepted);
    }
    aggregator::aggregate(rows_by_source)
}
