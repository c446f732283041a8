// src/models/result.rs

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};

use crate::quiz::eligibility::Eligibility;

/// Represents the 'results' table: one row per submitted attempt.
/// Rows are never edited except for `is_valid`, which a retest grant clears.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: i64,
    pub user_email: String,
    pub course_id: i64,
    pub score: i64,
    pub total: i64,
    pub passed: bool,

    /// Question id -> chosen letter (empty when unanswered).
    pub answers_json: Json<BTreeMap<i64, String>>,

    pub attempt_number: i64,
    pub is_valid: bool,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) const RESULT_COLUMNS: &str = "id, user_email, course_id, score, total, passed, answers_json, \
     attempt_number, is_valid, completed_at";

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    /// The question ids exactly as they were presented, in order.
    pub question_ids: Vec<i64>,

    /// User's answers map.
    /// Key: Question ID (i64)
    /// Value: User's selected option letter
    #[serde(default)]
    pub answers: HashMap<i64, String>,
}

#[derive(Debug, Serialize)]
pub struct SubmitQuizResponse {
    pub result: QuizResult,
    pub pass_score: i64,
    pub certificate_sent: bool,
    pub message: String,
}

/// One answered question on the result page.
#[derive(Debug, Serialize)]
pub struct ReviewedAnswer {
    pub question_id: i64,
    pub text: String,
    pub chosen: String,
    pub correct: String,
    pub is_correct: bool,
    pub explanation: String,
}

#[derive(Debug, Serialize)]
pub struct ResultDetailResponse {
    pub result: QuizResult,
    pub course_title: String,
    pub review: Vec<ReviewedAnswer>,
    pub eligibility: Eligibility,
}

/// A valid result joined with learner and course, used for reports and certificates.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ResultReportRow {
    pub id: i64,
    pub user_email: String,
    pub name: Option<String>,
    pub department: Option<String>,
    pub course_id: i64,
    pub course_title: Option<String>,
    pub category: Option<String>,
    pub score: i64,
    pub total: i64,
    pub passed: bool,
    pub attempt_number: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// Joined SELECT producing [`ResultReportRow`]; callers append WHERE/ORDER clauses.
pub(crate) const REPORT_SELECT: &str = r#"
    SELECT
        r.id, r.user_email, u.name, u.department, r.course_id,
        COALESCE(NULLIF(c.title_local, ''), c.title_en) AS course_title,
        c.category, r.score, r.total, r.passed, r.attempt_number, r.completed_at
    FROM results r
    LEFT JOIN users u ON u.email = r.user_email
    LEFT JOIN courses c ON c.id = r.course_id
"#;

/// Printable certificate for one passing result.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Certificate {
    pub result_id: i64,
    pub learner_email: String,
    pub learner_name: String,
    pub signature_data: Option<String>,
    pub course_id: i64,
    pub course_title: String,
    pub category: String,
    pub score: i64,
    pub total: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,

    /// Name of the course creator, when they still have an account.
    pub trainer_name: Option<String>,
}

pub(crate) const CERTIFICATE_SELECT: &str = r#"
    SELECT
        r.id AS result_id, u.email AS learner_email, u.name AS learner_name, u.signature_data,
        c.id AS course_id, COALESCE(NULLIF(c.title_local, ''), c.title_en) AS course_title,
        c.category, r.score, r.total, r.completed_at, t.name AS trainer_name
    FROM results r
    JOIN users u ON u.email = r.user_email
    JOIN courses c ON c.id = r.course_id
    LEFT JOIN users t ON t.email = c.created_by
"#;
