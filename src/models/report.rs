use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::post::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Workplace {
    Remote,
    OnSite,
}

impl Workplace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Workplace::Remote => "Remote",
            Workplace::OnSite => "On-site",
        }
    }
}

/// A normalized, accepted post ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    pub source: Source,
    pub channel: String,
    pub title: String,
    pub text_snippet: String,
    pub url: String,
    pub formatted_date: String,
    pub author: String,
    pub workplace: Workplace,
    /// Sort key; `formatted_date` is display only.
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
}

/// Accepted rows for one run, grouped by source, newest first.
#[derive(Debug, Clone)]
pub struct Report {
    rows: BTreeMap<Source, Vec<ReportRow>>,
}

impl Default for Report {
    fn default() -> Self {
        Self::empty()
    }
}

impl Report {
    /// A report with every known source present and no rows.
    pub fn empty() -> Self {
        Self {
            rows: Source::ALL.iter().map(|s| (*s, Vec::new())).collect(),
        }
    }

    pub(crate) fn insert(&mut self, source: Source, rows: Vec<ReportRow>) {
        self.rows.insert(source, rows);
    }

    pub fn rows(&self, source: Source) -> &[ReportRow] {
        self.rows.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, source: Source) -> usize {
        self.rows(source).len()
    }

    pub fn total(&self) -> usize {
        self.rows.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    #[cfg(test)]
    pub fn contains(&self, source: Source) -> bool {
        self.rows.contains_key(&source)
    }

    /// Sources in sheet order, each with its rows.
    pub fn sections(&self) -> impl Iterator<Item = (Source, &[ReportRow])> {
        self.rows.iter().map(|(s, r)| (*s, r.as_slice()))
    }
}
