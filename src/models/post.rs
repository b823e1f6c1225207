use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Platform a post was fetched from.
/// Variant order is the sheet order in the report workbook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    Bluesky,
}

impl Source {
    pub const ALL: [Source; 2] = [Source::Reddit, Source::Bluesky];

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Reddit => "Reddit",
            Source::Bluesky => "Bluesky",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unfiltered post as returned by a platform collector.
#[derive(Debug, Clone)]
pub struct RawPost {
    pub source: Source,
    /// Sub-source label shown in the report, e.g. `Reddit/r/jobs`.
    pub channel: String,
    pub title: String,
    pub body: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
    pub author: Option<String>,
}
