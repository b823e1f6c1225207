use std::collections::BTreeMap;

use crate::models::post::Source;
use crate::models::report::{Report, ReportRow};

/// Group rows per source, newest first. `sort_by` is stable, so rows with
/// equal timestamps keep fetch order. Every known source is present in the
/// result, with an empty sequence when nothing matched.
pub fn aggregate(rows_by_source: BTreeMap<Source, Vec<ReportRow>>) -> Report {
    let mut report = Report::empty();
    for (source, mut rows) in rows_by_source {
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        report.insert(source, rows);
    }
    report
}
