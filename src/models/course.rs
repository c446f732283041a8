// src/models/course.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use url::Url;
use validator::Validate;

use crate::{
    models::{result::QuizResult, user::validate_department},
    quiz::eligibility::Eligibility,
};

pub const CATEGORIES: &[&str] = &[
    "Compliance",
    "SOP",
    "Product Training",
    "Skills Training",
    "Education",
];

/// Represents the 'courses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Course {
    pub id: i64,

    /// Title in the organization's working language.
    pub title_local: String,
    pub title_en: String,
    pub description_local: String,
    pub description_en: String,

    /// One of [`CATEGORIES`].
    pub category: String,

    pub video_url: String,
    pub pdf_url: String,

    /// Departments allowed to see the course. Stored as a JSON array.
    /// Empty means hidden from everyone without catalog-wide access.
    pub target_groups: Json<Vec<String>>,

    pub deadline: String,

    /// Minimum number of correct answers to pass (inclusive).
    pub pass_score: i64,

    /// Questions served per attempt; 0 or less serves the whole bank.
    pub quiz_count: i64,

    /// Minutes, informational only.
    pub time_limit: i64,

    pub max_attempts: i64,

    /// Email of the creator; shown as trainer on certificates.
    pub created_by: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) const COURSE_COLUMNS: &str = "id, title_local, title_en, description_local, description_en, \
     category, video_url, pdf_url, target_groups, deadline, pass_score, quiz_count, time_limit, \
     max_attempts, created_by, created_at";

impl Course {
    /// Local title, falling back to the English one.
    pub fn display_title(&self) -> &str {
        if self.title_local.trim().is_empty() {
            &self.title_en
        } else {
            &self.title_local
        }
    }

    /// Catalog visibility for a non-privileged user in `department`.
    pub fn is_targeted_at(&self, department: &str) -> bool {
        self.target_groups.iter().any(|group| group == department)
    }
}

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([\w-]+)").expect("valid youtube regex")
});

/// Turns a YouTube watch/share link into an embeddable URL; other links pass through.
pub fn embed_video_url(url: &str) -> Option<String> {
    if url.trim().is_empty() {
        return None;
    }
    if url.contains("embed") {
        return Some(url.to_string());
    }
    match YOUTUBE_ID.captures(url).and_then(|caps| caps.get(1)) {
        Some(id) => Some(format!("https://www.youtube.com/embed/{}", id.as_str())),
        None => Some(url.to_string()),
    }
}

/// Catalog entry as listed to a user.
#[derive(Debug, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub question_count: i64,
    pub passed: bool,
}

#[derive(Debug, Serialize)]
pub struct CourseDetailResponse {
    pub course: Course,
    pub embed_url: Option<String>,
    pub question_count: i64,
    pub eligibility: Eligibility,

    /// The caller's valid results, newest first.
    pub results: Vec<QuizResult>,
}

/// Query parameters for listing courses.
#[derive(Debug, Deserialize)]
pub struct CourseListParams {
    /// Search keyword matched against titles and descriptions.
    pub q: Option<String>,
    pub category: Option<String>,
}

fn validate_category(value: &str) -> Result<(), validator::ValidationError> {
    if CATEGORIES.contains(&value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("unknown_category"))
    }
}

/// Empty is allowed; anything else must parse as a URL.
fn validate_optional_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.is_empty() || Url::parse(url).is_ok() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_url"))
    }
}

fn validate_target_groups(groups: &[String]) -> Result<(), validator::ValidationError> {
    for group in groups {
        validate_department(group)?;
    }
    Ok(())
}

fn validate_deadline(deadline: &str) -> Result<(), validator::ValidationError> {
    if deadline.is_empty() || chrono::NaiveDate::parse_from_str(deadline, "%Y-%m-%d").is_ok() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_date"))
    }
}

fn default_category() -> String {
    "Compliance".to_string()
}

fn default_pass_score() -> i64 {
    3
}

fn default_time_limit() -> i64 {
    15
}

fn default_max_attempts() -> i64 {
    3
}

/// DTO for creating or fully replacing a course.
#[derive(Debug, Deserialize, Validate)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 200))]
    pub title_local: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub title_en: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub description_local: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub description_en: String,
    #[serde(default = "default_category")]
    #[validate(custom(function = validate_category))]
    pub category: String,
    #[serde(default)]
    #[validate(length(max = 500), custom(function = validate_optional_url))]
    pub video_url: String,
    #[serde(default)]
    #[validate(length(max = 500), custom(function = validate_optional_url))]
    pub pdf_url: String,
    #[serde(default)]
    #[validate(custom(function = validate_target_groups))]
    pub target_groups: Vec<String>,
    #[serde(default)]
    #[validate(custom(function = validate_deadline))]
    pub deadline: String,
    #[serde(default = "default_pass_score")]
    #[validate(range(min = 1, max = 1000))]
    pub pass_score: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 1000))]
    pub quiz_count: i64,
    #[serde(default = "default_time_limit")]
    #[validate(range(min = 1, max = 600))]
    pub time_limit: i64,
    #[serde(default = "default_max_attempts")]
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: i64,
}

/// DTO for the quiz settings panel of the question manager.
#[derive(Debug, Deserialize, Validate)]
pub struct QuizSettingsRequest {
    #[validate(range(min = 0, max = 1000))]
    pub quiz_count: i64,
    #[validate(range(min = 1, max = 1000))]
    pub pass_score: i64,
    #[validate(range(min = 1, max = 100))]
    pub max_attempts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_url_from_watch_link() {
        assert_eq!(
            embed_video_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("https://www.youtube.com/embed/dQw4w9WgXcQ")
        );
        assert_eq!(
            embed_video_url("https://youtu.be/abc-123").as_deref(),
            Some("https://www.youtube.com/embed/abc-123")
        );
    }

    #[test]
    fn test_embed_url_passthrough() {
        let embed = "https://www.youtube.com/embed/xyz";
        assert_eq!(embed_video_url(embed).as_deref(), Some(embed));
        assert_eq!(
            embed_video_url("https://vimeo.com/1").as_deref(),
            Some("https://vimeo.com/1")
        );
        assert_eq!(embed_video_url(""), None);
    }

    #[test]
    fn test_course_request_defaults_and_validation() {
        let req: CourseRequest = serde_json::from_value(serde_json::json!({
            "title_local": "Safety",
            "target_groups": ["Back-office"]
        }))
        .unwrap();
        assert_eq!(req.pass_score, 3);
        assert_eq!(req.max_attempts, 3);
        assert!(req.validate().is_ok());

        let bad: CourseRequest = serde_json::from_value(serde_json::json!({
            "title_local": "Safety",
            "target_groups": ["Nowhere"],
            "max_attempts": 0
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }
}
