// src/models/retest.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Scope of a retest directive or reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TargetType {
    All,
    Department,
    Individual,
}

/// Represents the 'retest_requests' table. Append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RetestRequest {
    pub id: i64,
    pub course_id: i64,
    pub target_type: TargetType,

    /// Department name or email; `None` for `all`.
    pub target_value: Option<String>,

    pub requested_by: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) const RETEST_COLUMNS: &str =
    "id, course_id, target_type, target_value, requested_by, created_at";

/// DTO shared by retest grants and reminders.
#[derive(Debug, Deserialize, Validate)]
pub struct TargetSelector {
    pub target_type: TargetType,
    #[validate(length(max = 254))]
    pub target_value: Option<String>,
}

impl TargetSelector {
    /// Trimmed target value, or `None` for `all`.
    /// Department and individual targets must name something.
    pub fn normalized_value(&self) -> Result<Option<String>, &'static str> {
        let value = self
            .target_value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty());
        match (self.target_type, value) {
            (TargetType::All, _) => Ok(None),
            (TargetType::Department, Some(v)) => Ok(Some(v.to_string())),
            (TargetType::Individual, Some(v)) => Ok(Some(v.to_lowercase())),
            (_, None) => Err("target_value is required for department and individual targets"),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct GrantRetestRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub target: TargetSelector,
}

fn default_reminder_message() -> String {
    "Please complete your assigned training.".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReminderRequest {
    pub course_id: i64,
    #[serde(flatten)]
    #[validate(nested)]
    pub target: TargetSelector,
    #[serde(default = "default_reminder_message")]
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

/// Outcome of fanning an email out to the resolved recipients.
#[derive(Debug, Serialize)]
pub struct DispatchReport {
    pub targets: usize,
    pub sent: usize,
    pub message: String,
}

impl DispatchReport {
    pub fn new(targets: usize, sent: usize, action: &str) -> Self {
        let message = if targets == 0 {
            format!("{action}: no matching learners found.")
        } else if sent == 0 {
            format!("{action} recorded for {targets} learner(s) but no email could be sent. Check the SMTP settings.")
        } else if sent < targets {
            format!("{action} recorded for {targets} learner(s); only {sent} email(s) were sent. Check the SMTP settings.")
        } else {
            format!("{action} sent to {targets} learner(s).")
        };
        Self {
            targets,
            sent,
            message,
        }
    }
}

/// A user an email fan-out resolved to.
#[derive(Debug, Clone, FromRow)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct RetestGrantResponse {
    pub request: RetestRequest,
    #[serde(flatten)]
    pub dispatch: DispatchReport,
}
