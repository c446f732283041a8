// src/utils/report.rs

use crate::models::result::ResultReportRow;

pub const REPORT_HEADER: [&str; 9] = [
    "Name",
    "Email",
    "Department",
    "Course",
    "Score",
    "Total",
    "Passed",
    "Attempt",
    "Date",
];

const UTF8_BOM: &str = "\u{feff}";

/// Renders valid results as CSV, prefixed with a BOM so spreadsheets pick UTF-8.
pub fn render_results_csv(rows: &[ResultReportRow]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(REPORT_HEADER)?;

    for row in rows {
        writer.write_record([
            row.name.clone().unwrap_or_default(),
            row.user_email.clone(),
            row.department.clone().unwrap_or_default(),
            row.course_title.clone().unwrap_or_default(),
            row.score.to_string(),
            row.total.to_string(),
            if row.passed { "Yes" } else { "No" }.to_string(),
            row.attempt_number.to_string(),
            row.completed_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(format!("{UTF8_BOM}{}", String::from_utf8_lossy(&bytes)))
}
