use askama::Template;
use chrono::NaiveDate;

use crate::error::AppError;
use crate::models::post::Source;
use crate::models::report::{Report, ReportRow, Workplace};

pub const SHEET_HEADERS: [&str; 7] = [
    "Source", "Title", "Text", "URL", "Date", "Author", "Workplace",
];

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const REMOTE_COLOUR: &str = "#d0f0c0";
const ON_SITE_COLOUR: &str = "#add8e6";

/// Presentation settings for a run's output.
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub subject: String,
    pub artifact_prefix: String,
    pub preview_rows: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            subject: "Psychology Jobs Report".to_string(),
            artifact_prefix: "psych_jobs".to_string(),
            preview_rows: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Named tables ready for the artifact writer.
#[derive(Debug, Clone)]
pub struct TabularArtifact {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub subject: String,
    pub html: String,
    pub counts: Vec<(Source, usize)>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, c)| c).sum()
    }
}

/// Output of a render. `artifact` is `None` when the report is empty, so
/// nothing gets attached.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub artifact: Option<TabularArtifact>,
    pub summary: Summary,
}

struct PreviewRow {
    date: String,
    title: String,
    url: String,
    workplace: &'static str,
    colour: &'static str,
}

struct SectionView {
    name: &'static str,
    count: usize,
    preview: Vec<PreviewRow>,
    more: usize,
}

#[derive(Template)]
#[template(path = "digest_email.html")]
struct DigestEmail {
    heading: String,
    run_date: String,
    sections: Vec<SectionView>,
    empty: bool,
    failures: Vec<String>,
}

/// Render the report into a workbook description and the email summary.
/// `failures` lists sub-sources that could not be fetched this run.
pub fn render(
    report: &Report,
    run_date: NaiveDate,
    failures: &[String],
    options: &ReportOptions,
) -> Result<Rendered, AppError> {
    for (source, rows) in report.sections() {
        validate(source, rows)?;
    }

    let counts: Vec<(Source, usize)> = report
        .sections()
        .map(|(source, rows)| (source, rows.len()))
        .collect();

    let artifact = if report.is_empty() {
        None
    } else {
        Some(TabularArtifact {
            file_name: format!(
                "{}_{}.xlsx",
                options.artifact_prefix,
                run_date.format("%Y%m%d")
            ),
            sheets: report
                .sections()
                .map(|(source, rows)| Sheet {
                    name: source.to_string(),
                    headers: SHEET_HEADERS.iter().map(|h| h.to_string()).collect(),
                    rows: rows.iter().map(sheet_row).collect(),
                })
                .collect(),
        })
    };

    let email = DigestEmail {
        heading: format!("Daily {}", options.subject),
        run_date: run_date.format("%A, %B %d, %Y").to_string(),
        sections: report
            .sections()
            .map(|(source, rows)| section_view(source, rows, options.preview_rows))
            .collect(),
        empty: report.is_empty(),
        failures: failures.to_vec(),
    };

    let summary = Summary {
        subject: format!("{} - {}", options.subject, run_date.format("%m/%d/%Y")),
        html: email.render()?,
        counts,
    };

    Ok(Rendered { artifact, summary })
}

/// A row without a title or url cannot be shown; refuse the whole report.
fn validate(source: Source, rows: &[ReportRow]) -> Result<(), AppError> {
    for (idx, row) in rows.iter().enumerate() {
        if row.source != source {
            return Err(AppError::Render(format!(
                "{source} row {idx} belongs to {}",
                row.source
            )));
        }
        if row.title.trim().is_empty() || row.url.trim().is_empty() {
            return Err(AppError::Render(format!(
                "{source} row {idx} is missing a title or url"
            )));
        }
    }
    Ok(())
}

/// Posts without a body (all of Bluesky) show their title as the text.
fn sheet_row(row: &ReportRow) -> Vec<String> {
    let text = if row.text_snippet.is_empty() {
        &row.title
    } else {
        &row.text_snippet
    };
    vec![
        row.channel.clone(),
        row.title.clone(),
        text.clone(),
        row.url.clone(),
        row.formatted_date.clone(),
        row.author.clone(),
        row.workplace.as_str().to_string(),
    ]
}

fn section_view(source: Source, rows: &[ReportRow], preview_rows: usize) -> SectionView {
    let preview = rows
        .iter()
        .take(preview_rows)
        .map(|row| PreviewRow {
            date: row.formatted_date.clone(),
            title: row.title.clone(),
            url: row.url.clone(),
            workplace: row.workplace.as_str(),
            colour: match row.workplace {
                Workplace::Remote => REMOTE_COLOUR,
                Workplace::OnSite => ON_SITE_COLOUR,
            },
        })
        .collect::<Vec<_>>();
    SectionView {
        name: source.as_str(),
        count: rows.len(),
        more: rows.len() - preview.len(),
        preview,
    }
}
