use std::path::PathBuf;

use async_trait::async_trait;
use rust_xlsxwriter::{Format, Workbook};

use crate::delivery::{ArtifactWriter, PersistedArtifact};
use crate::digest::reporter::{TabularArtifact, XLSX_CONTENT_TYPE};
use crate::error::AppError;

const COLUMN_WIDTH: f64 = 24.0;
/// Excel's per-cell character limit.
const MAX_CELL_CHARS: usize = 32_767;
const CELL_TRUNCATION_MARKER: &str = "...";

/// Writes report artifacts as `.xlsx` workbooks under `output_dir`.
pub struct XlsxWriter {
    output_dir: PathBuf,
}

impl XlsxWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl ArtifactWriter for XlsxWriter {
    async fn write(&self, artifact: &TabularArtifact) -> Result<PersistedArtifact, AppError> {
        let bytes = build_workbook(artifact)?;
        let path = self.output_dir.join(&artifact.file_name);

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| AppError::Render(format!("Failed to create output dir: {e}")))?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::Render(format!("Failed to write {}: {e}", path.display())))?;

        tracing::info!("Wrote {}", path.display());
        Ok(PersistedArtifact {
            path,
            file_name: artifact.file_name.clone(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes,
        })
    }
}

/// One worksheet per table, bold header row, then the data rows.
pub fn build_workbook(artifact: &TabularArtifact) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for sheet in &artifact.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            let col = col as u16;
            worksheet.write_string_with_format(0, col, header, &bold)?;
            worksheet.set_column_width(col, COLUMN_WIDTH)?;
        }
        for (idx, row) in sheet.rows.iter().enumerate() {
            let row_num = idx as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string(row_num, col as u16, fit_cell(value))?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

/// Cut text that would not fit in a cell, keeping room for the marker.
fn fit_cell(value: &str) -> std::borrow::Cow<'_, str> {
    let keep = MAX_CELL_CHARS - CELL_TRUNCATION_MARKER.len();
    match value.char_indices().nth(MAX_CELL_CHARS) {
        Some(_) => {
            let end = value.char_indices().nth(keep).map_or(value.len(), |(i, _)| i);
            format!("{}{CELL_TRUNCATION_MARKER}", &value[..end]).into()
        }
        None => value.into(),
    }
}
