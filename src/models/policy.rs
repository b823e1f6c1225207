use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

const DEFAULT_KEYWORDS: &[&str] = &[
    "psych",
    "psychiatry",
    "neuroscience",
    "neurology",
    "mental health",
    "research assistant",
    "postbac",
    "lab tech",
    "research coordinator",
    "clinical research coordinator",
    "crc",
    "project manager",
];

const DEFAULT_LOCATIONS: &[&str] = &[
    "nyc",
    "new york",
    "remote",
    "telehealth",
    "new york city",
    "cuny",
    "stony brook",
    "columbia",
    "mount sinai",
    "nyu",
    "langone",
    "hunter college",
    "fordham",
    "chop",
    "penn",
    "upenn",
];

const DEFAULT_JOB_TYPES: &[&str] = &[
    "job",
    "position",
    "hire",
    "opportunity",
    "hiring",
    "postgrad",
    "postbac",
    "full time",
];

/// How the keyword, location and job-type signals combine into a verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceRule {
    /// keyword AND (location OR job type)
    #[default]
    KeywordAndLocationOrJobType,
    /// keyword AND location
    KeywordAndLocation,
    /// keyword AND location AND job type
    All,
    /// keyword alone
    KeywordOnly,
}

impl AcceptanceRule {
    pub fn decide(self, has_keyword: bool, has_location: bool, has_job_type: bool) -> bool {
        match self {
            AcceptanceRule::KeywordAndLocationOrJobType => {
                has_keyword && (has_location || has_job_type)
            }
            AcceptanceRule::KeywordAndLocation => has_keyword && has_location,
            AcceptanceRule::All => has_keyword && has_location && has_job_type,
            AcceptanceRule::KeywordOnly => has_keyword,
        }
    }
}

/// Trigger sets and matching rule used to classify posts.
/// Built once at startup and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    #[serde(default)]
    pub job_types: Vec<String>,
    #[serde(default)]
    pub rule: AcceptanceRule,
}

impl Default for Policy {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            keywords: owned(DEFAULT_KEYWORDS),
            locations: owned(DEFAULT_LOCATIONS),
            job_types: owned(DEFAULT_JOB_TYPES),
            rule: AcceptanceRule::default(),
        }
    }
}

impl Policy {
    #[cfg(test)]
    pub fn new(
        keywords: Vec<String>,
        locations: Vec<String>,
        job_types: Vec<String>,
        rule: AcceptanceRule,
    ) -> Self {
        Self {
            keywords,
            locations,
            job_types,
            rule,
        }
        .normalized()
    }

    /// Parse a policy from its JSON form.
    pub fn from_json(json: &str) -> Result<Policy, AppError> {
        let policy: Policy = serde_json::from_str(json)
            .map_err(|e| AppError::Config(format!("Invalid policy: {e}")))?;
        if policy.keywords.is_empty() {
            return Err(AppError::Config(
                "Policy must list at least one keyword".to_string(),
            ));
        }
        Ok(policy.normalized())
    }

    pub fn load(path: &Path) -> Result<Policy, AppError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read policy {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Lowercase and trim every trigger, dropping blanks. Content is
    /// lowercased before matching, so mixed-case triggers would never hit.
    fn normalized(mut self) -> Self {
        for list in [&mut self.keywords, &mut self.locations, &mut self.job_types] {
            *list = list
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }
        self
    }
}
