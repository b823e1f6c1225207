// Output collaborators: the spreadsheet writer and the mailer.

pub mod mailer;
pub mod workbook;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::digest::reporter::TabularArtifact;
use crate::error::AppError;

/// A spreadsheet that has been written to storage.
#[derive(Debug, Clone)]
pub struct PersistedArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub subject: String,
    pub html: String,
    pub attachment: Option<PersistedArtifact>,
}

#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, artifact: &TabularArtifact) -> Result<PersistedArtifact, AppError>;
}

/// Single-attempt delivery; a failure is fatal to the run.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<(), AppError>;
}
