// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum QuestionSource {
    Manual,
    Csv,
    Sample,
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: i64,
    pub course_id: i64,

    /// The prompt text.
    pub text: String,

    pub option_a: String,
    pub option_b: String,

    /// Options C and D are optional and stored empty when absent.
    pub option_c: String,
    pub option_d: String,

    /// Correct option letter, `a` to `d`.
    pub answer: String,

    pub explanation: String,
    pub source: QuestionSource,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) const QUESTION_COLUMNS: &str = "id, course_id, text, option_a, option_b, option_c, option_d, \
     answer, explanation, source, created_at";

/// DTO for sending a question to a learner (excludes answer and explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub text: String,
    pub option_a: String,
    pub option_b: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub option_c: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub option_d: String,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            text: q.text,
            option_a: q.option_a,
            option_b: q.option_b,
            option_c: q.option_c,
            option_d: q.option_d,
        }
    }
}

/// One shuffled attempt as served to the learner.
#[derive(Debug, Serialize)]
pub struct QuizPaper {
    pub course_id: i64,
    pub course_title: String,
    pub time_limit: i64,
    pub pass_score: i64,
    pub attempt_number: i64,
    pub max_attempts: i64,
    pub questions: Vec<PublicQuestion>,
}

#[derive(Debug, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub rejected_lines: Vec<usize>,
}

/// Accepts `a`..`d` in any case.
pub fn normalize_answer_letter(letter: &str) -> Option<String> {
    let letter = letter.trim().to_lowercase();
    matches!(letter.as_str(), "a" | "b" | "c" | "d").then_some(letter)
}

fn validate_answer_letter(letter: &str) -> Result<(), validator::ValidationError> {
    normalize_answer_letter(letter)
        .map(|_| ())
        .ok_or_else(|| validator::ValidationError::new("answer_must_be_a_to_d"))
}

/// DTO for creating a question by hand.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub text: String,
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub option_c: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub option_d: String,
    #[validate(custom(function = validate_answer_letter))]
    pub answer: String,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub explanation: String,
}

/// DTO for bulk import: the raw `|`-separated text.
#[derive(Debug, Deserialize, Validate)]
pub struct ImportQuestionsRequest {
    #[validate(length(min = 1, max = 1000000))]
    pub data: String,
}
