// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

pub const DEPARTMENTS: &[&str] = &["Sales & Marketing Vietnam", "Back-office", "Management"];

pub const TEAMS: &[&str] = &[
    "N/A",
    "Product Team",
    "Marketing Team",
    "Dental Sales Team",
    "Surgical Sales Team",
    "Stock Team",
];

pub const JOB_TITLES: &[&str] = &[
    "General Director",
    "Head of Sales & Marketing Vietnam",
    "Head of Back Office",
    "Product Team Leader",
    "Marketing Team Leader",
    "Designer",
    "Digital Marketing Executive",
    "Trade Marketing Executive",
    "Sales Representative",
    "Sale Team Leader",
    "Accounting & Import-Export Executive",
    "Purchasing & Sales Support Executive",
    "Operations & Registration Team Leader",
    "Operations Executive",
    "Stock Executive",
    "Other",
];

pub const JOB_LEVELS: &[&str] = &["Manager", "Assistant Manager", "Senior Staff", "Staff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Learner,
    Trainer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Learner => "learner",
            Role::Trainer => "trainer",
            Role::Admin => "admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: i64,

    /// Identity key, stored lower-case.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    pub name: String,
    pub department: String,
    pub team: String,
    pub job_title: String,
    pub job_level: String,
    pub role: Role,
    pub status: UserStatus,
    pub verified: bool,

    #[serde(skip)]
    pub verify_code: Option<String>,

    /// Reference to an avatar stored elsewhere.
    pub avatar_url: Option<String>,

    /// Drawn signature payload, printed on certificates.
    pub signature_data: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub(crate) const USER_COLUMNS: &str = "id, email, password_hash, name, department, team, job_title, \
     job_level, role, status, verified, verify_code, avatar_url, signature_data, created_at";

/// Aggregated profile data for the current user.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    #[serde(flatten)]
    pub user: User,
    pub attempts_count: i64,
    pub passed_courses: i64,
}

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), validator::ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(validator::ValidationError::new(code))
    }
}

pub(crate) fn validate_department(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, DEPARTMENTS, "unknown_department")
}

fn validate_team(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, TEAMS, "unknown_team")
}

fn validate_job_title(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, JOB_TITLES, "unknown_job_title")
}

fn validate_job_level(value: &str) -> Result<(), validator::ValidationError> {
    one_of(value, JOB_LEVELS, "unknown_job_level")
}

fn default_department() -> String {
    DEPARTMENTS[0].to_string()
}

fn default_team() -> String {
    "N/A".to_string()
}

fn default_job_title() -> String {
    "Other".to_string()
}

fn default_job_level() -> String {
    "Staff".to_string()
}

/// DTO for self-registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    pub email: String,
    #[validate(length(min = 4, max = 128, message = "Password must be at least 4 characters."))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Name is required."))]
    pub name: String,
    #[serde(default = "default_department")]
    #[validate(custom(function = validate_department))]
    pub department: String,
    #[serde(default = "default_team")]
    #[validate(custom(function = validate_team))]
    pub team: String,
    #[serde(default = "default_job_title")]
    #[validate(custom(function = validate_job_title))]
    pub job_title: String,
    #[serde(default = "default_job_level")]
    #[validate(custom(function = validate_job_level))]
    pub job_level: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct ResendCodeRequest {
    pub email: String,
}

/// DTO for updating one's own profile. Missing fields keep their value.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(custom(function = validate_department))]
    pub department: Option<String>,
    #[validate(custom(function = validate_team))]
    pub team: Option<String>,
    #[validate(custom(function = validate_job_title))]
    pub job_title: Option<String>,
    #[validate(custom(function = validate_job_level))]
    pub job_level: Option<String>,
    #[validate(length(max = 500))]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(length(min = 4, max = 128, message = "New password must be at least 4 characters."))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignatureRequest {
    #[validate(length(max = 200000))]
    pub signature_data: String,
}

/// DTO for an admin/trainer updating a user.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateUserRequest {
    pub role: Role,
    #[validate(custom(function = validate_department))]
    pub department: String,
    #[serde(default = "default_team")]
    #[validate(custom(function = validate_team))]
    pub team: String,
    #[serde(default = "default_job_title")]
    #[validate(custom(function = validate_job_title))]
    pub job_title: String,
    #[serde(default = "default_job_level")]
    #[validate(custom(function = validate_job_level))]
    pub job_level: String,
    pub status: UserStatus,
}
